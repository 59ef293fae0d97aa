//! 타임프레임별 신호 정규화.
//!
//! 단일 타임프레임의 매물대 분석 결과에 설정된 가중치를 붙이고
//! 강도 값을 0~100 범위로 고정합니다.

use signal_core::{
    AnalysisError, AnalysisResult, ChipAnalysis, Timeframe, TimeframeWeights,
    WeightedTimeframeAnalysis,
};
use tracing::warn;

/// 한 타임프레임의 분석 결과에 가중치를 붙입니다.
///
/// 가중치 테이블에 없는 타임프레임은 테이블의 기본 가중치(0.33)를 사용합니다.
pub fn weight_analysis(
    timeframe: Timeframe,
    analysis: ChipAnalysis,
    weights: &TimeframeWeights,
) -> WeightedTimeframeAnalysis {
    WeightedTimeframeAnalysis {
        timeframe,
        analysis: analysis.clamped(),
        weight: weights.get(timeframe),
    }
}

/// 타임프레임별 분석 결과 전체를 정규화합니다.
///
/// 분석이 없는 타임프레임은 건너뛰지만, 주요 타임프레임의 분석이 없으면
/// [`AnalysisError::MissingPrimaryTimeframe`]으로 실패합니다.
pub fn normalize_all<I>(
    analyses: I,
    primary: Timeframe,
    weights: &TimeframeWeights,
) -> AnalysisResult<Vec<WeightedTimeframeAnalysis>>
where
    I: IntoIterator<Item = (Timeframe, Option<ChipAnalysis>)>,
{
    let mut weighted = Vec::new();

    for (timeframe, analysis) in analyses {
        match analysis {
            Some(analysis) => weighted.push(weight_analysis(timeframe, analysis, weights)),
            None if timeframe == primary => {
                return Err(AnalysisError::MissingPrimaryTimeframe(primary));
            }
            None => warn!(%timeframe, "Chip analysis unavailable, timeframe skipped"),
        }
    }

    if !weighted.iter().any(|w| w.timeframe == primary) {
        return Err(AnalysisError::MissingPrimaryTimeframe(primary));
    }

    Ok(weighted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::chip_analysis;
    use signal_core::Direction;

    #[test]
    fn test_default_weight_fallback() {
        let weights = TimeframeWeights::new([(Timeframe::D1, 0.5)], 0.33);
        let weighted = weight_analysis(
            Timeframe::H1,
            chip_analysis(Timeframe::H1, 60.0, 30.0, Direction::Bullish),
            &weights,
        );

        assert_eq!(weighted.weight, 0.33);
    }

    #[test]
    fn test_strengths_clamped() {
        let weighted = weight_analysis(
            Timeframe::D1,
            chip_analysis(Timeframe::D1, 140.0, -3.0, Direction::Bullish),
            &TimeframeWeights::chip_defaults(),
        );

        assert_eq!(weighted.analysis.buy_signal_strength, 100.0);
        assert_eq!(weighted.analysis.short_signal_strength, 0.0);
    }

    #[test]
    fn test_missing_primary_fails() {
        let result = normalize_all(
            [
                (
                    Timeframe::W1,
                    Some(chip_analysis(Timeframe::W1, 50.0, 50.0, Direction::Neutral)),
                ),
                (Timeframe::D1, None),
            ],
            Timeframe::D1,
            &TimeframeWeights::chip_defaults(),
        );

        assert!(matches!(
            result,
            Err(AnalysisError::MissingPrimaryTimeframe(Timeframe::D1))
        ));
    }

    #[test]
    fn test_missing_secondary_skipped() {
        let weighted = normalize_all(
            [
                (Timeframe::H1, None),
                (
                    Timeframe::D1,
                    Some(chip_analysis(Timeframe::D1, 70.0, 20.0, Direction::Bullish)),
                ),
            ],
            Timeframe::D1,
            &TimeframeWeights::chip_defaults(),
        )
        .unwrap();

        assert_eq!(weighted.len(), 1);
        assert_eq!(weighted[0].weight, 0.5);
    }
}
