//! 타임프레임 간 형태 신호 결합.
//!
//! 타임프레임별 형태 신호를 가중 투표로 합치고 신호 강도(0~100)와
//! 설명 문구를 만듭니다. 단기 타임프레임일수록 가중치가 높습니다.

use super::analyzer::MultiTimeframePatternAnalysis;
use serde::{Deserialize, Serialize};
use signal_core::{clamp_score, Direction, PatternAnalysisResult, PatternConfig, Timeframe, TimeframeWeights};
use tracing::debug;

/// 신호 강도 시작값.
const BASE_STRENGTH: f64 = 50.0;

/// 전체 타임프레임 형태 분석 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensivePatternAnalysis {
    /// 타임프레임별 분석
    pub timeframe_analyses: Vec<MultiTimeframePatternAnalysis>,
    /// 결합 신호
    pub combined_signal: Direction,
    /// 신호 강도 (0 ~ 100)
    pub signal_strength: f64,
    /// 설명
    pub description: String,
}

/// 형태 신호 결합기.
#[derive(Debug, Clone)]
pub struct PatternCombiner {
    weights: TimeframeWeights,
    combine_ratio: f64,
}

impl Default for PatternCombiner {
    fn default() -> Self {
        Self::new(&PatternConfig::default())
    }
}

impl PatternCombiner {
    /// 설정에서 결합기를 생성합니다.
    pub fn new(config: &PatternConfig) -> Self {
        Self {
            weights: config.weights.clone(),
            combine_ratio: config.combine_ratio,
        }
    }

    /// 가중치 테이블을 교체합니다.
    pub fn with_weights(mut self, weights: TimeframeWeights) -> Self {
        self.weights = weights;
        self
    }

    /// 타임프레임별 형태 분석을 결합합니다.
    pub fn combine(
        &self,
        analyses: Vec<MultiTimeframePatternAnalysis>,
    ) -> ComprehensivePatternAnalysis {
        let (mut bullish, mut bearish) = (0.0, 0.0);
        for analysis in &analyses {
            let weight = self.weights.get(analysis.timeframe);
            match analysis.pattern_signal {
                Direction::Bullish => bullish += weight,
                Direction::Bearish => bearish += weight,
                Direction::Neutral => {}
            }
        }

        let ratio = self.combine_ratio;
        let combined_signal = if bullish > bearish * ratio {
            Direction::Bullish
        } else if bearish > bullish * ratio {
            Direction::Bearish
        } else if bullish > bearish {
            Direction::Bullish
        } else if bearish > bullish {
            Direction::Bearish
        } else {
            Direction::Neutral
        };

        let find = |tf: Timeframe| analyses.iter().find(|a| a.timeframe == tf);
        let hourly = find(Timeframe::H1);
        let daily = find(Timeframe::D1);
        let weekly = find(Timeframe::W1);

        let mut strength = BASE_STRENGTH;

        if combined_signal != Direction::Neutral {
            let side = if combined_signal.is_bullish() { bullish } else { bearish };
            let total_weight = self.weights.total();

            if total_weight > 0.0 {
                strength += 20.0 * (side / total_weight);
                let half = total_weight / 2.0;
                strength += 15.0 * if side > half { 1.0 } else { side / half };
            }

            if hourly.is_some_and(|a| a.pattern_signal == combined_signal) {
                strength += 10.0;
            }
            if daily.is_some_and(|a| a.pattern_signal == combined_signal) {
                strength += 15.0;
            }
        }

        for analysis in &analyses {
            if let Some(dominant) = &analysis.dominant_pattern {
                strength += dominant_bonus(dominant);
            }
        }

        let signal_strength = clamp_score(strength);

        debug!(
            bullish_weight = bullish,
            bearish_weight = bearish,
            signal = %combined_signal,
            signal_strength,
            "Pattern timeframes combined"
        );

        let description = describe(combined_signal, signal_strength, hourly, daily, weekly);

        ComprehensivePatternAnalysis {
            timeframe_analyses: analyses,
            combined_signal,
            signal_strength,
            description,
        }
    }
}

/// 주도 형태의 신뢰도와 최근성 가점.
///
/// 최근성 비율은 `end / (end + (end - start))`로 추정하며,
/// 분모가 0이면 최근성 가점을 주지 않습니다.
fn dominant_bonus(pattern: &PatternAnalysisResult) -> f64 {
    let mut bonus = 0.0;

    if pattern.reliability > 70.0 {
        bonus += 10.0;
    }

    let end = pattern.component.end_index as f64;
    let start = pattern.component.start_index as f64;
    let estimated_length = end + (end - start);

    if estimated_length > 0.0 {
        let recency = end / estimated_length;
        if recency > 0.8 {
            bonus += 10.0;
        } else if recency > 0.6 {
            bonus += 5.0;
        }
    }

    bonus
}

fn describe(
    signal: Direction,
    strength: f64,
    hourly: Option<&MultiTimeframePatternAnalysis>,
    daily: Option<&MultiTimeframePatternAnalysis>,
    weekly: Option<&MultiTimeframePatternAnalysis>,
) -> String {
    let mut description = format!(
        "종합 형태 분석 결과 {} 신호, 신호 강도: {:.2}/100.",
        signal.label(),
        strength
    );

    let hourly_signal = hourly.map(|a| a.pattern_signal);
    let daily_signal = daily.map(|a| a.pattern_signal);
    let weekly_signal = weekly.map(|a| a.pattern_signal);
    let directional = |s: Option<Direction>| s.filter(|d| *d != Direction::Neutral);

    if let Some(d) = directional(hourly_signal)
        .filter(|_| hourly_signal == daily_signal && hourly_signal == weekly_signal)
    {
        description.push_str(&format!(
            " 단기와 장기 형태가 모두 {}으로 일치하여 신호 신뢰도가 매우 높습니다.",
            d.label()
        ));
    } else if let Some(d) = directional(hourly_signal).filter(|_| hourly_signal == daily_signal) {
        description.push_str(&format!(
            " 단기와 중기 형태가 {}으로 일치하여 신호 신뢰도가 비교적 높습니다.",
            d.label()
        ));
    } else if let Some(d) = directional(daily_signal).filter(|_| daily_signal == weekly_signal) {
        description.push_str(&format!(
            " 중기와 장기 형태가 {}으로 일치하나 단기 변동 가능성이 있습니다.",
            d.label()
        ));
    } else if let Some(d) = directional(hourly_signal) {
        description.push_str(&format!(
            " 단기 형태가 {}을 가리키므로 단기 매매 기회에 주목하십시오.",
            d.label()
        ));
    }

    for (label, analysis) in [("1시간봉", hourly), ("일봉", daily)] {
        if let Some(dominant) = analysis.and_then(|a| a.dominant_pattern.as_ref()) {
            description.push_str(&format!(
                " {} 주도 형태: {} ({}), 신뢰도: {:.2}/100.",
                label,
                dominant.pattern_type,
                dominant.direction.label(),
                dominant.reliability
            ));
        }
    }

    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pattern;
    use signal_core::PatternType;

    fn tf_analysis(
        timeframe: Timeframe,
        signal: Direction,
        dominant: Option<PatternAnalysisResult>,
    ) -> MultiTimeframePatternAnalysis {
        MultiTimeframePatternAnalysis {
            timeframe,
            patterns: dominant.iter().cloned().collect(),
            dominant_pattern: dominant,
            pattern_signal: signal,
        }
    }

    #[test]
    fn test_all_bullish_strength() {
        let analyses = vec![
            tf_analysis(Timeframe::W1, Direction::Bullish, None),
            tf_analysis(Timeframe::D1, Direction::Bullish, None),
            tf_analysis(Timeframe::H1, Direction::Bullish, None),
        ];

        let result = PatternCombiner::default().combine(analyses);
        assert_eq!(result.combined_signal, Direction::Bullish);
        // 50 + 20 + 15 + 10 + 15 = 110 → 100
        assert_eq!(result.signal_strength, 100.0);
        assert!(result.description.contains("매우 높습니다"));
    }

    #[test]
    fn test_weighted_vote_prefers_short_timeframe() {
        // 1시간봉(2.0) 하락 vs 주봉(1.0) 상승 → 하락
        let analyses = vec![
            tf_analysis(Timeframe::W1, Direction::Bullish, None),
            tf_analysis(Timeframe::D1, Direction::Neutral, None),
            tf_analysis(Timeframe::H1, Direction::Bearish, None),
        ];

        let result = PatternCombiner::default().combine(analyses);
        assert_eq!(result.combined_signal, Direction::Bearish);
        // 50 + 20×(2/4.5) + 15×(2/2.25) + 10
        let expected = 50.0 + 20.0 * (2.0 / 4.5) + 15.0 * (2.0 / 2.25) + 10.0;
        assert!((result.signal_strength - expected).abs() < 1e-9);
        assert!(result.description.contains("단기 형태가 하락"));
    }

    #[test]
    fn test_neutral_has_base_strength() {
        let analyses = vec![
            tf_analysis(Timeframe::W1, Direction::Neutral, None),
            tf_analysis(Timeframe::D1, Direction::Neutral, None),
        ];

        let result = PatternCombiner::default().combine(analyses);
        assert_eq!(result.combined_signal, Direction::Neutral);
        assert_eq!(result.signal_strength, 50.0);
    }

    #[test]
    fn test_dominant_bonus() {
        // 신뢰도 80, 시작 0 / 끝 10 → 비율 0.5, 최근성 가점 없음
        let old = pattern(PatternType::DoubleBottom, Direction::Bullish, 80.0, 50.0, 0, 10);
        assert_eq!(dominant_bonus(&old), 10.0);

        // 시작 90 / 끝 99 → 99 / 108 ≈ 0.917
        let recent = pattern(PatternType::Flag, Direction::Bullish, 60.0, 50.0, 90, 99);
        assert_eq!(dominant_bonus(&recent), 10.0);

        // 시작 10 / 끝 30 → 30 / 50 = 0.6, 경계값은 가점 없음
        let mid = pattern(PatternType::Flag, Direction::Bullish, 60.0, 50.0, 10, 30);
        assert_eq!(dominant_bonus(&mid), 0.0);

        // 분모 0
        let zero = pattern(PatternType::Flag, Direction::Bullish, 60.0, 50.0, 0, 0);
        assert_eq!(dominant_bonus(&zero), 0.0);
    }

    #[test]
    fn test_neutral_dominant_labelled_neutral() {
        let neutral = pattern(PatternType::Rectangle, Direction::Neutral, 60.0, 50.0, 0, 10);
        let analyses = vec![tf_analysis(Timeframe::D1, Direction::Neutral, Some(neutral))];

        let result = PatternCombiner::default().combine(analyses);
        assert!(result
            .description
            .contains("일봉 주도 형태: rectangle (중립), 신뢰도: 60.00/100."));
    }

    #[test]
    fn test_custom_weights() {
        let weights = TimeframeWeights::new([(Timeframe::W1, 5.0)], 1.0);
        let analyses = vec![
            tf_analysis(Timeframe::W1, Direction::Bullish, None),
            tf_analysis(Timeframe::H1, Direction::Bearish, None),
        ];

        let result = PatternCombiner::default()
            .with_weights(weights)
            .combine(analyses);
        assert_eq!(result.combined_signal, Direction::Bullish);
    }
}
