//! 매물대(칩 분포) 분석 결과 및 타임프레임 가중치.

use crate::domain::Direction;
use crate::types::{Price, Timeframe};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 점수형 값(강도, 신뢰도 등)을 0~100 범위로 고정합니다.
///
/// NaN은 0으로 취급합니다.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// 단일 타임프레임의 매물대 분석 결과.
///
/// 외부 매물대 분석기가 (심볼, 타임프레임) 쌍마다 하나씩 생성합니다.
/// `overall_recommendation`, `technical_signal` 텍스트는 표시용이며
/// 방향 판단은 `bias`, `technical_bias` 태그만 사용합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipAnalysis {
    /// 종목 심볼
    pub symbol: String,
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 현재가
    pub current_price: Price,
    /// 매수 신호 강도 (0 ~ 100)
    pub buy_signal_strength: f64,
    /// 공매도 신호 강도 (0 ~ 100)
    pub short_signal_strength: f64,
    /// 종합 의견 (표시용)
    pub overall_recommendation: String,
    /// 종합 의견 방향 태그
    pub bias: Direction,
    /// 강한 지지선
    #[serde(default)]
    pub strong_support_levels: Vec<Price>,
    /// 보통 지지선
    #[serde(default)]
    pub moderate_support_levels: Vec<Price>,
    /// 강한 저항선
    #[serde(default)]
    pub strong_resistance_levels: Vec<Price>,
    /// 보통 저항선
    #[serde(default)]
    pub moderate_resistance_levels: Vec<Price>,
    /// 기술적 지표 신호 (표시용)
    pub technical_signal: String,
    /// 기술적 지표 방향 태그
    pub technical_bias: Direction,
    /// 매물대 형태가 매수를 지지하는지 여부
    pub shape_buy_signal: bool,
}

impl ChipAnalysis {
    /// 강도 값을 0~100 범위로 고정한 사본을 반환합니다.
    pub fn clamped(mut self) -> Self {
        self.buy_signal_strength = clamp_score(self.buy_signal_strength);
        self.short_signal_strength = clamp_score(self.short_signal_strength);
        self
    }

    /// 강한 지지선과 보통 지지선을 합친 목록.
    pub fn support_levels(&self) -> impl Iterator<Item = Price> + '_ {
        self.strong_support_levels
            .iter()
            .chain(self.moderate_support_levels.iter())
            .copied()
    }

    /// 강한 저항선과 보통 저항선을 합친 목록.
    pub fn resistance_levels(&self) -> impl Iterator<Item = Price> + '_ {
        self.strong_resistance_levels
            .iter()
            .chain(self.moderate_resistance_levels.iter())
            .copied()
    }
}

/// 가중치가 부여된 타임프레임 분석.
///
/// 분석 실행마다 한 번 생성되고 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTimeframeAnalysis {
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 매물대 분석 결과
    pub analysis: ChipAnalysis,
    /// 가중치 (합이 1일 필요 없음, 결합 시 정규화)
    pub weight: f64,
}

/// 매물대 결합 시 가중치 테이블에 없는 타임프레임의 기본 가중치.
pub const DEFAULT_CHIP_WEIGHT: f64 = 0.33;

/// 형태 결합 시 가중치 테이블에 없는 타임프레임의 기본 가중치.
pub const DEFAULT_PATTERN_WEIGHT: f64 = 1.0;

/// 타임프레임별 가중치 테이블.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeWeights {
    /// 타임프레임별 가중치
    pub weights: BTreeMap<Timeframe, f64>,
    /// 테이블에 없는 타임프레임의 가중치
    pub default_weight: f64,
}

impl TimeframeWeights {
    /// 새 가중치 테이블을 생성합니다.
    pub fn new(weights: impl IntoIterator<Item = (Timeframe, f64)>, default_weight: f64) -> Self {
        Self {
            weights: weights.into_iter().collect(),
            default_weight,
        }
    }

    /// 매물대 결합 기본 가중치 (주봉 0.3, 일봉 0.5, 1시간봉 0.2).
    pub fn chip_defaults() -> Self {
        Self::new(
            [
                (Timeframe::W1, 0.3),
                (Timeframe::D1, 0.5),
                (Timeframe::H1, 0.2),
            ],
            DEFAULT_CHIP_WEIGHT,
        )
    }

    /// 형태 결합 기본 가중치 (단기 타임프레임일수록 높음).
    pub fn pattern_defaults() -> Self {
        Self::new(
            [
                (Timeframe::W1, 1.0),
                (Timeframe::D1, 1.5),
                (Timeframe::H1, 2.0),
            ],
            DEFAULT_PATTERN_WEIGHT,
        )
    }

    /// 타임프레임의 가중치 (없으면 기본값).
    pub fn get(&self, timeframe: Timeframe) -> f64 {
        self.weights
            .get(&timeframe)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// 테이블에 설정된 가중치 합계.
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(120.0), 100.0);
        assert_eq!(clamp_score(-5.0), 0.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(42.5), 42.5);
    }

    #[test]
    fn test_weights_fallback() {
        let weights = TimeframeWeights::new([(Timeframe::D1, 0.5)], DEFAULT_CHIP_WEIGHT);
        assert_eq!(weights.get(Timeframe::D1), 0.5);
        assert_eq!(weights.get(Timeframe::H1), 0.33);
    }

    #[test]
    fn test_pattern_defaults_total() {
        let weights = TimeframeWeights::pattern_defaults();
        assert!((weights.total() - 4.5).abs() < 1e-9);
        assert_eq!(weights.get(Timeframe::H1), 2.0);
    }
}
