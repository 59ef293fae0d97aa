//! # Signal Core
//!
//! 다중 타임프레임 신호 분석의 핵심 도메인 모델과 타입을 제공합니다:
//! - 캔들 및 타임프레임 정의
//! - 매물대/형태/추세 반전/돌파 분석 결과 타입
//! - 외부 분석기 및 데이터 제공자 trait
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
