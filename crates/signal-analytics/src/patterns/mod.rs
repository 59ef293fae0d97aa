//! 차트 형태 분석 모듈.
//!
//! - [`pivots`]: 피크/밸리 감지
//! - [`detectors`]: 형태 계열별 기본 감지기
//! - [`analyzer`]: 타임프레임별 최근성 보정과 순위화
//! - [`combiner`]: 타임프레임 간 가중 결합

pub mod analyzer;
pub mod combiner;
pub mod detectors;
pub mod pivots;

pub use analyzer::{
    adjust_for_recency, confirmed_bonus, decay_significance, forming_bonus, pattern_signal,
    rank_patterns, MultiTimeframePatternAnalysis, PatternAnalyzer,
};
pub use combiner::{ComprehensivePatternAnalysis, PatternCombiner};
pub use detectors::default_detectors;
pub use pivots::detect_pivots;
