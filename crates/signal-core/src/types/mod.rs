//! 분석 전반에서 사용되는 공통 타입.

mod candle;
mod timeframe;

pub use candle::*;
pub use timeframe::*;
