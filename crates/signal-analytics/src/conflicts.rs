//! 타임프레임 간 충돌 감지.
//!
//! 인접 타임프레임(1시간봉-일봉, 일봉-주봉)의 방향 불일치와
//! 타임프레임 내부의 기술적 지표/매물대 형태 불일치를 찾아 경고를 만듭니다.
//! 비교에 필요한 타임프레임이 없으면 해당 규칙은 조용히 건너뜁니다.

use serde::{Deserialize, Serialize};
use signal_core::{ChipAnalysis, Direction, Timeframe, WeightedTimeframeAnalysis};
use std::fmt;

/// 타임프레임 충돌 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeframeConflict {
    /// 단기 상승, 중기 하락 → 반전 위험
    ShortTermReversalRisk,
    /// 단기 하락, 중기 상승 → 눌림목 기회
    ShortTermPullbackOpportunity,
    /// 중기 상승, 장기 하락 → 장기 저항 주의
    LongTermResistance,
    /// 중기 하락, 장기 상승 → 장기 상승 추세 중 조정
    UptrendPullback,
    /// 기술적 지표는 매수인데 매물대 형태가 지지하지 않음
    IndicatorBullishShapeNot { timeframe: Timeframe },
    /// 기술적 지표는 매도인데 매물대 형태는 매수
    IndicatorBearishShapeBullish { timeframe: Timeframe },
}

impl TimeframeConflict {
    /// 경고 문구.
    pub fn message(&self) -> String {
        match self {
            TimeframeConflict::ShortTermReversalRisk => {
                "단기 상승이나 중기 하락 관점, 반전 위험 존재".to_string()
            }
            TimeframeConflict::ShortTermPullbackOpportunity => {
                "단기 하락이나 중기 상승 관점, 눌림목 매수 기회 가능".to_string()
            }
            TimeframeConflict::LongTermResistance => {
                "중기 상승이나 장기 하락 관점, 장기 저항선 주의".to_string()
            }
            TimeframeConflict::UptrendPullback => {
                "중기 하락이나 장기 상승 관점, 장기 상승 추세 중 조정 가능".to_string()
            }
            TimeframeConflict::IndicatorBullishShapeNot { timeframe } => {
                format!("{} 기술적 지표는 상승이나 매물대 형태가 뒷받침하지 않음", timeframe.label())
            }
            TimeframeConflict::IndicatorBearishShapeBullish { timeframe } => {
                format!("{} 기술적 지표는 하락이나 매물대 형태는 상승", timeframe.label())
            }
        }
    }
}

impl fmt::Display for TimeframeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// 타임프레임 간 충돌을 감지합니다.
///
/// 각 규칙은 독립적으로 평가되며, 발생 순서대로 반환됩니다.
pub fn detect_conflicts(analyses: &[WeightedTimeframeAnalysis]) -> Vec<TimeframeConflict> {
    let find = |tf: Timeframe| -> Option<&ChipAnalysis> {
        analyses
            .iter()
            .find(|a| a.timeframe == tf)
            .map(|a| &a.analysis)
    };

    let mut conflicts = Vec::new();

    let short_term = find(Timeframe::H1);
    let medium_term = find(Timeframe::D1);
    let long_term = find(Timeframe::W1);

    if let (Some(short), Some(medium)) = (short_term, medium_term) {
        match (short.bias, medium.bias) {
            (Direction::Bullish, Direction::Bearish) => {
                conflicts.push(TimeframeConflict::ShortTermReversalRisk)
            }
            (Direction::Bearish, Direction::Bullish) => {
                conflicts.push(TimeframeConflict::ShortTermPullbackOpportunity)
            }
            _ => {}
        }
    }

    if let (Some(medium), Some(long)) = (medium_term, long_term) {
        match (medium.bias, long.bias) {
            (Direction::Bullish, Direction::Bearish) => {
                conflicts.push(TimeframeConflict::LongTermResistance)
            }
            (Direction::Bearish, Direction::Bullish) => {
                conflicts.push(TimeframeConflict::UptrendPullback)
            }
            _ => {}
        }
    }

    for weighted in analyses {
        let analysis = &weighted.analysis;
        match analysis.technical_bias {
            Direction::Bullish if !analysis.shape_buy_signal => {
                conflicts.push(TimeframeConflict::IndicatorBullishShapeNot {
                    timeframe: weighted.timeframe,
                })
            }
            Direction::Bearish if analysis.shape_buy_signal => {
                conflicts.push(TimeframeConflict::IndicatorBearishShapeBullish {
                    timeframe: weighted.timeframe,
                })
            }
            _ => {}
        }
    }

    conflicts
}
