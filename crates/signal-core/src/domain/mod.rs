//! 다중 타임프레임 신호 분석을 위한 도메인 모델.

mod breakout;
mod chip;
mod direction;
mod pattern;
mod providers;
mod reversal;

pub use breakout::*;
pub use chip::*;
pub use direction::*;
pub use pattern::*;
pub use providers::*;
pub use reversal::*;
