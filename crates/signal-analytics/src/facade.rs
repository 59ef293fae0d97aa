//! 외부 공개 분석 연산.
//!
//! 이미 조회된 타임프레임별 캔들을 받아 매물대 결합, 형태 결합,
//! 추세 반전 판정을 수행하는 동기 함수들입니다.
//! 캔들 조회와 동시성은 [`crate::service::SignalService`]가 담당합니다.

use crate::chip_combiner::{ChipCombiner, CombinedChipResult};
use crate::normalizer::normalize_all;
use crate::patterns::{ComprehensivePatternAnalysis, PatternAnalyzer, PatternCombiner};
use crate::reversal::{evaluate, TrendReversalVerdict};
use signal_core::{
    analysis_span, AnalysisResult, BreakoutSnapshot, Candle, ChipConfig, ChipDistributionAnalyzer,
    Timeframe, TrendReversalDetector,
};
use tracing::{info, warn};

/// 타임프레임별 캔들 묶음 (주봉/일봉/1시간봉).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeframeCandles {
    /// 주봉
    pub weekly: Vec<Candle>,
    /// 일봉
    pub daily: Vec<Candle>,
    /// 1시간봉
    pub hourly: Vec<Candle>,
}

impl TimeframeCandles {
    /// 새 캔들 묶음을 생성합니다.
    pub fn new(weekly: Vec<Candle>, daily: Vec<Candle>, hourly: Vec<Candle>) -> Self {
        Self {
            weekly,
            daily,
            hourly,
        }
    }

    /// 타임프레임의 캔들.
    pub fn get(&self, timeframe: Timeframe) -> &[Candle] {
        match timeframe {
            Timeframe::W1 => &self.weekly,
            Timeframe::D1 => &self.daily,
            Timeframe::H1 => &self.hourly,
        }
    }

    /// 타임프레임의 캔들을 설정합니다.
    pub fn set(&mut self, timeframe: Timeframe, candles: Vec<Candle>) {
        match timeframe {
            Timeframe::W1 => self.weekly = candles,
            Timeframe::D1 => self.daily = candles,
            Timeframe::H1 => self.hourly = candles,
        }
    }
}

/// 다중 타임프레임 매물대 분석.
///
/// `include_timeframes`의 각 타임프레임에 매물대 분석기를 실행하고,
/// 가중치를 붙인 뒤 주요 타임프레임 기준으로 결합합니다.
/// 캔들이 없는 타임프레임은 건너뛰며, 주요 타임프레임 분석이 없으면 실패합니다.
pub fn multi_timeframe_chip_analysis(
    symbol: &str,
    candles: &TimeframeCandles,
    analyzer: &dyn ChipDistributionAnalyzer,
    config: &ChipConfig,
    breakout: Option<BreakoutSnapshot>,
) -> AnalysisResult<CombinedChipResult> {
    let span = analysis_span!("multi_timeframe_chip_analysis", symbol, config.primary_timeframe);
    let _guard = span.enter();

    let per_timeframe = config.include_timeframes.iter().map(|&timeframe| {
        let series = candles.get(timeframe);
        if series.len() < config.min_candles {
            warn!(
                %timeframe,
                candles = series.len(),
                required = config.min_candles,
                "Insufficient candles for chip analysis"
            );
        }

        let analysis = if series.is_empty() {
            None
        } else {
            analyzer.analyze(symbol, timeframe, series)
        };
        (timeframe, analysis)
    });

    let weighted = normalize_all(per_timeframe, config.primary_timeframe, &config.weights)?;

    let mut combiner = ChipCombiner::new(config.clone());
    if let Some(snapshot) = breakout {
        combiner = combiner.with_breakout(snapshot);
    }
    let result = combiner.combine(weighted, config.primary_timeframe)?;

    info!(
        recommendation = %result.recommendation,
        buy = result.combined_buy_signal_strength,
        short = result.combined_short_signal_strength,
        alignment = ?result.timeframe_alignment,
        "Chip analysis combined"
    );

    Ok(result)
}

/// 다중 타임프레임 형태 분석.
///
/// 주봉, 일봉, 1시간봉 순으로 형태를 분석한 뒤 분석기 설정의 가중치로 결합합니다.
pub fn analyze_multi_timeframe_patterns(
    symbol: &str,
    candles: &TimeframeCandles,
    analyzer: &PatternAnalyzer,
) -> ComprehensivePatternAnalysis {
    let span = analysis_span!("analyze_multi_timeframe_patterns", symbol);
    let _guard = span.enter();

    let window = analyzer.config().window;
    let analyses = Timeframe::ALL
        .iter()
        .map(|&timeframe| {
            let series = candles.get(timeframe);
            if series.len() < window {
                warn!(
                    %timeframe,
                    candles = series.len(),
                    window,
                    "Insufficient candles for pattern analysis"
                );
            }
            analyzer.analyze(series, timeframe)
        })
        .collect();

    let result = PatternCombiner::new(analyzer.config()).combine(analyses);

    info!(
        signal = %result.combined_signal,
        strength = result.signal_strength,
        "Pattern analysis combined"
    );

    result
}

/// 1시간봉-일봉 추세 복귀 반전 신호 판정.
pub fn has_trend_reversal_signal(
    hourly: &[Candle],
    daily: &[Candle],
    detector: &dyn TrendReversalDetector,
    threshold: f64,
) -> TrendReversalVerdict {
    let signal = detector.detect(hourly, daily, Timeframe::H1, Timeframe::D1);
    let verdict = evaluate(&signal, threshold);

    info!(
        has_signal = verdict.has_signal,
        strength = signal.reversal_strength,
        threshold,
        "Trend reversal evaluated"
    );

    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{candles_from_closes, chip_analysis, FixedChipAnalyzer};
    use signal_core::{AnalysisError, Direction};

    #[test]
    fn test_timeframe_candles_get_set() {
        let mut candles = TimeframeCandles::default();
        candles.set(Timeframe::H1, candles_from_closes(&[100, 101]));

        assert_eq!(candles.get(Timeframe::H1).len(), 2);
        assert!(candles.get(Timeframe::W1).is_empty());
    }

    #[test]
    fn test_chip_analysis_missing_primary() {
        // 일봉 캔들이 없으면 일봉 분석이 없으므로 실패
        let candles = TimeframeCandles::new(
            candles_from_closes(&[100, 101]),
            Vec::new(),
            candles_from_closes(&[100, 101]),
        );
        let analyzer = FixedChipAnalyzer::uniform(chip_analysis(Timeframe::D1, 80.0, 10.0, Direction::Bullish));

        let result =
            multi_timeframe_chip_analysis("AAPL", &candles, &analyzer, &ChipConfig::default(), None);
        assert!(matches!(
            result,
            Err(AnalysisError::MissingPrimaryTimeframe(Timeframe::D1))
        ));
    }

    #[test]
    fn test_chip_analysis_skips_empty_secondary() {
        let candles = TimeframeCandles::new(
            Vec::new(),
            candles_from_closes(&[100, 101, 102]),
            candles_from_closes(&[100, 101, 102]),
        );
        let analyzer = FixedChipAnalyzer::uniform(chip_analysis(Timeframe::D1, 80.0, 10.0, Direction::Bullish));

        let result =
            multi_timeframe_chip_analysis("AAPL", &candles, &analyzer, &ChipConfig::default(), None)
                .unwrap();
        assert_eq!(result.timeframes.len(), 2);
        assert!(result.timeframes.iter().all(|w| w.timeframe != Timeframe::W1));
    }

    #[test]
    fn test_pattern_analysis_empty_candles() {
        let result = analyze_multi_timeframe_patterns(
            "AAPL",
            &TimeframeCandles::default(),
            &PatternAnalyzer::default(),
        );

        assert_eq!(result.timeframe_analyses.len(), 3);
        assert_eq!(result.combined_signal, Direction::Neutral);
        assert_eq!(result.signal_strength, 50.0);
    }
}
