//! 방향성 태그.
//!
//! 분석 결과마다 생성 시점에 명시적인 방향 태그를 붙여,
//! 자유 텍스트에서 방향을 추론하지 않도록 합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 방향성 (강세/약세/중립).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// 강세 (매수 우위)
    Bullish,
    /// 약세 (매도 우위)
    Bearish,
    /// 중립
    #[default]
    Neutral,
}

impl Direction {
    /// 강세인지 확인.
    pub fn is_bullish(&self) -> bool {
        matches!(self, Direction::Bullish)
    }

    /// 리포트 문구용 한글 이름.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Bullish => "상승",
            Direction::Bearish => "하락",
            Direction::Neutral => "중립",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
            Direction::Neutral => write!(f, "neutral"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_labels() {
        assert_eq!(Direction::Bearish.label(), "하락");
        assert_eq!(Direction::Bullish.to_string(), "bullish");
        assert!(Direction::Bullish.is_bullish());
        assert!(Direction::default() == Direction::Neutral);
    }
}
