//! 추세 반전 감지 신호.

use crate::types::{Price, Timeframe};
use serde::{Deserialize, Serialize};

/// 반전 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReversalDirection {
    /// 상승 방향 (롱)
    Up,
    /// 하락 방향 (숏)
    Down,
}

/// 반전 목표가.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalTargets {
    /// 보수적 목표
    pub target1: Price,
    /// 측정 이동 목표
    pub target2: Price,
    /// 확장 목표 (보통 1.618배)
    pub target3: Price,
    /// 목표1 손익비
    pub risk_reward_ratio1: f64,
    /// 목표2 손익비
    pub risk_reward_ratio2: f64,
    /// 목표3 손익비
    pub risk_reward_ratio3: f64,
}

/// 소/대 타임프레임 간 추세 반전 감지 결과 (외부 감지기 출력).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalSignal {
    /// 작은 타임프레임
    pub small_timeframe: Timeframe,
    /// 큰 타임프레임
    pub large_timeframe: Timeframe,
    /// 반전 여부
    pub is_reversal: bool,
    /// 반전 강도 (0 ~ 100)
    pub reversal_strength: f64,
    /// 반전 방향
    pub direction: ReversalDirection,
    /// 진입가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<Price>,
    /// 손절가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Price>,
    /// 목표가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<ReversalTargets>,
    /// 설명
    #[serde(default)]
    pub description: String,
}

impl ReversalSignal {
    /// 반전이 감지되지 않은 신호.
    pub fn none(small_timeframe: Timeframe, large_timeframe: Timeframe) -> Self {
        Self {
            small_timeframe,
            large_timeframe,
            is_reversal: false,
            reversal_strength: 0.0,
            direction: ReversalDirection::Up,
            entry_price: None,
            stop_loss: None,
            targets: None,
            description: String::new(),
        }
    }
}
