//! 결합 연산 시나리오 테스트.
//!
//! 외부 분석기를 고정 응답 스텁으로 대체하여 공개 연산의
//! 결합 규칙, 경계값, 결과 재현성을 검증합니다.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signal_analytics::{
    analyze_multi_timeframe_patterns, group_nearby_levels, has_trend_reversal_signal,
    multi_timeframe_chip_analysis, ChipCombiner, MultiTimeframePatternAnalysis, PatternAnalyzer,
    PatternCombiner, Recommendation, TimeframeAlignment, TimeframeCandles,
};
use signal_analytics::patterns::pattern_signal;
use signal_core::{
    Candle, ChipAnalysis, ChipConfig, ChipDistributionAnalyzer, Direction, PatternAnalysisResult,
    PatternComponent, PatternStatus, PatternType, ReversalDirection, ReversalSignal, Timeframe,
    TrendReversalDetector, WeightedTimeframeAnalysis,
};
use std::collections::HashMap;

// ==================== 픽스처 ====================

fn candles(closes: &[i64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let close = Decimal::from(close);
            Candle::new(
                "TSLA",
                start + Duration::hours(i as i64),
                close,
                close + dec!(1),
                close - dec!(1),
                close,
                dec!(5000),
            )
        })
        .collect()
}

fn analysis(timeframe: Timeframe, buy: f64, short: f64, bias: Direction) -> ChipAnalysis {
    ChipAnalysis {
        symbol: "TSLA".to_string(),
        timeframe,
        current_price: dec!(200),
        buy_signal_strength: buy,
        short_signal_strength: short,
        overall_recommendation: bias.label().to_string(),
        bias,
        strong_support_levels: vec![dec!(190)],
        moderate_support_levels: vec![dec!(185)],
        strong_resistance_levels: vec![dec!(210)],
        moderate_resistance_levels: vec![dec!(220)],
        technical_signal: bias.label().to_string(),
        technical_bias: bias,
        shape_buy_signal: bias.is_bullish(),
    }
}

/// 타임프레임별 고정 분석을 돌려주는 스텁.
struct StubChipAnalyzer {
    by_timeframe: HashMap<Timeframe, ChipAnalysis>,
}

impl StubChipAnalyzer {
    fn all(buy: f64, short: f64, bias: Direction) -> Self {
        let by_timeframe = Timeframe::ALL
            .iter()
            .map(|&tf| (tf, analysis(tf, buy, short, bias)))
            .collect();
        Self { by_timeframe }
    }
}

impl ChipDistributionAnalyzer for StubChipAnalyzer {
    fn analyze(&self, _symbol: &str, timeframe: Timeframe, _candles: &[Candle]) -> Option<ChipAnalysis> {
        self.by_timeframe.get(&timeframe).cloned()
    }
}

struct StubReversalDetector {
    signal: ReversalSignal,
}

impl TrendReversalDetector for StubReversalDetector {
    fn detect(
        &self,
        _small: &[Candle],
        _large: &[Candle],
        _small_timeframe: Timeframe,
        _large_timeframe: Timeframe,
    ) -> ReversalSignal {
        self.signal.clone()
    }
}

fn full_candles() -> TimeframeCandles {
    let series = candles(&(0..60).map(|i| 200 + (i % 7) - 3).collect::<Vec<_>>());
    TimeframeCandles::new(series.clone(), series.clone(), series)
}

fn pattern(direction: Direction, reliability: f64, significance: f64) -> PatternAnalysisResult {
    PatternAnalysisResult {
        pattern_type: PatternType::DoubleBottom,
        status: PatternStatus::Completed,
        direction,
        reliability,
        significance,
        component: PatternComponent {
            start_index: 10,
            end_index: 40,
            key_points: Vec::new(),
            pattern_height: dec!(12),
            breakout_level: dec!(205),
            volume_pattern: "flat".to_string(),
        },
        price_target: None,
        stop_loss: None,
        breakout_expected: false,
        description: String::new(),
    }
}

// ==================== 매물대 결합 ====================

#[test]
fn test_all_timeframes_bullish_scenario() {
    let analyzer = StubChipAnalyzer::all(80.0, 10.0, Direction::Bullish);

    let result = multi_timeframe_chip_analysis(
        "TSLA",
        &full_candles(),
        &analyzer,
        &ChipConfig::default(),
        None,
    )
    .unwrap();

    assert_eq!(result.combined_buy_signal_strength, 80.0);
    assert_eq!(result.combined_short_signal_strength, 10.0);
    assert_eq!(result.recommendation, Recommendation::Long);
    assert_eq!(result.timeframe_alignment, TimeframeAlignment::Bullish);
    assert_eq!(result.alignment_strength, 100.0);
    assert!(result.timeframe_conflicts.is_empty());
    assert_eq!(result.stop_loss_levels, vec![dec!(190), dec!(185)]);
    assert_eq!(result.take_profit_levels, vec![dec!(210), dec!(220)]);
}

#[test]
fn test_chip_output_is_reproducible() {
    let analyzer = StubChipAnalyzer::all(64.0, 31.0, Direction::Neutral);
    let run = || {
        let result = multi_timeframe_chip_analysis(
            "TSLA",
            &full_candles(),
            &analyzer,
            &ChipConfig::default(),
            None,
        )
        .unwrap();
        serde_json::to_string(&result).unwrap()
    };

    assert_eq!(run(), run());
}

proptest! {
    #[test]
    fn combined_buy_is_monotonic_in_daily_strength(
        low in 0.0f64..=100.0,
        delta in 0.0f64..=100.0,
        weekly in 0.0f64..=100.0,
        hourly in 0.0f64..=100.0,
    ) {
        let high = (low + delta).min(100.0);
        let combine = |daily: f64| {
            let analyses = vec![
                WeightedTimeframeAnalysis {
                    timeframe: Timeframe::W1,
                    analysis: analysis(Timeframe::W1, weekly, 20.0, Direction::Neutral),
                    weight: 0.3,
                },
                WeightedTimeframeAnalysis {
                    timeframe: Timeframe::D1,
                    analysis: analysis(Timeframe::D1, daily, 20.0, Direction::Neutral),
                    weight: 0.5,
                },
                WeightedTimeframeAnalysis {
                    timeframe: Timeframe::H1,
                    analysis: analysis(Timeframe::H1, hourly, 20.0, Direction::Neutral),
                    weight: 0.2,
                },
            ];
            ChipCombiner::default()
                .combine(analyses, Timeframe::D1)
                .unwrap()
                .combined_buy_signal_strength
        };

        prop_assert!(combine(low) <= combine(high));
    }

    #[test]
    fn combined_short_is_monotonic_in_daily_strength(
        low in 0.0f64..=100.0,
        delta in 0.0f64..=100.0,
        weekly in 0.0f64..=100.0,
        hourly in 0.0f64..=100.0,
    ) {
        let high = (low + delta).min(100.0);
        let combine = |daily: f64| {
            let analyses = vec![
                WeightedTimeframeAnalysis {
                    timeframe: Timeframe::W1,
                    analysis: analysis(Timeframe::W1, 20.0, weekly, Direction::Neutral),
                    weight: 0.3,
                },
                WeightedTimeframeAnalysis {
                    timeframe: Timeframe::D1,
                    analysis: analysis(Timeframe::D1, 20.0, daily, Direction::Neutral),
                    weight: 0.5,
                },
                WeightedTimeframeAnalysis {
                    timeframe: Timeframe::H1,
                    analysis: analysis(Timeframe::H1, 20.0, hourly, Direction::Neutral),
                    weight: 0.2,
                },
            ];
            ChipCombiner::default()
                .combine(analyses, Timeframe::D1)
                .unwrap()
                .combined_short_signal_strength
        };

        prop_assert!(combine(low) <= combine(high));
    }

    #[test]
    fn grouping_never_grows(raw in proptest::collection::vec(1u32..500, 0..40)) {
        let levels: Vec<Decimal> = raw.iter().map(|&v| Decimal::from(v)).collect();
        let grouped = group_nearby_levels(&levels, dec!(250), 0.02);
        prop_assert!(grouped.len() <= levels.len());
    }
}

// ==================== 형태 결합 ====================

#[test]
fn test_strong_bullish_pattern_outweighs_weaker_bearish() {
    let signal = pattern_signal(
        &[
            pattern(Direction::Bullish, 80.0, 80.0),
            pattern(Direction::Bearish, 50.0, 50.0),
        ],
        1.5,
    );
    assert_eq!(signal, Direction::Bullish);
}

#[test]
fn test_pattern_output_is_reproducible() {
    let closes: Vec<i64> = (0..120)
        .map(|i| 200 + ((i as f64 / 6.0).sin() * 15.0) as i64)
        .collect();
    let series = candles(&closes);
    let input = TimeframeCandles::new(series.clone(), series.clone(), series);
    let analyzer = PatternAnalyzer::default();

    let first = analyze_multi_timeframe_patterns("TSLA", &input, &analyzer);
    let second = analyze_multi_timeframe_patterns("TSLA", &input, &analyzer);

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert!((0.0..=100.0).contains(&first.signal_strength));
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Bullish),
        Just(Direction::Bearish),
        Just(Direction::Neutral),
    ]
}

proptest! {
    #[test]
    fn pattern_strength_is_clamped(
        signals in proptest::collection::vec(direction_strategy(), 3),
        reliability in 0.0f64..=100.0,
        start in 0usize..50,
        length in 0usize..50,
    ) {
        let analyses: Vec<MultiTimeframePatternAnalysis> = Timeframe::ALL
            .iter()
            .zip(signals)
            .map(|(&timeframe, signal)| {
                let mut dominant = pattern(signal, reliability, 90.0);
                dominant.component.start_index = start;
                dominant.component.end_index = start + length;
                MultiTimeframePatternAnalysis {
                    timeframe,
                    patterns: vec![dominant.clone()],
                    dominant_pattern: Some(dominant),
                    pattern_signal: signal,
                }
            })
            .collect();

        let result = PatternCombiner::default().combine(analyses);
        prop_assert!((0.0..=100.0).contains(&result.signal_strength));
    }
}

// ==================== 추세 반전 ====================

#[test]
fn test_weak_reversal_recommends_waiting() {
    let detector = StubReversalDetector {
        signal: ReversalSignal {
            is_reversal: true,
            reversal_strength: 35.0,
            direction: ReversalDirection::Up,
            ..ReversalSignal::none(Timeframe::H1, Timeframe::D1)
        },
    };

    let series = candles(&[200, 201, 199]);
    let verdict = has_trend_reversal_signal(&series, &series, &detector, 40.0);

    assert!(!verdict.has_signal);
    assert!(verdict.primary_signal.is_none());
    assert!(verdict.summary.contains("기다리십시오"));
}

#[test]
fn test_strong_reversal_short() {
    let detector = StubReversalDetector {
        signal: ReversalSignal {
            is_reversal: true,
            reversal_strength: 66.0,
            direction: ReversalDirection::Down,
            entry_price: Some(dec!(198.4)),
            ..ReversalSignal::none(Timeframe::H1, Timeframe::D1)
        },
    };

    let series = candles(&[200, 201, 199]);
    let verdict = has_trend_reversal_signal(&series, &series, &detector, 40.0);

    assert!(verdict.has_signal);
    assert!(verdict.summary.contains("매도(숏)"));
    assert!(verdict.summary.contains("진입가: 198.40"));
    assert!(verdict.risk_reward_ratios.is_none());
}
