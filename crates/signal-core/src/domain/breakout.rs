//! 지지/저항 돌파 감지기 출력.

use crate::domain::Direction;
use crate::types::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 개별 돌파 신호.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakSignal {
    /// 돌파된 가격 레벨
    pub level: Price,
    /// 돌파 방향 (상향 돌파 = bullish)
    pub direction: Direction,
    /// 돌파 시점
    pub timestamp: DateTime<Utc>,
    /// 거래량 확인 여부
    pub volume_confirmed: bool,
}

/// 돌파 감지기의 스냅샷.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakoutSnapshot {
    /// 동적 지지선
    #[serde(default)]
    pub dynamic_support: Vec<Price>,
    /// 동적 저항선
    #[serde(default)]
    pub dynamic_resistance: Vec<Price>,
    /// 돌파 신호 목록
    #[serde(default)]
    pub break_signals: Vec<BreakSignal>,
}

impl BreakoutSnapshot {
    /// 거래량이 확인된 가장 최근 돌파 신호.
    pub fn latest_confirmed(&self) -> Option<&BreakSignal> {
        self.break_signals
            .iter()
            .filter(|s| s.volume_confirmed)
            .max_by_key(|s| s.timestamp)
    }
}
