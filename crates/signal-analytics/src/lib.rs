//! 다중 타임프레임 신호 결합 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 지지/저항 레벨 집계
//! - 타임프레임별 매물대 신호 정규화 및 가중 결합
//! - 타임프레임 충돌 감지
//! - 차트 형태 감지, 최근성 보정, 타임프레임 간 결합
//! - 추세 반전 신호 필터
//! - 캔들 병렬 조회를 포함한 비동기 분석 서비스
//!
//! # Re-exports
//!
//! - [`chip_combiner`]: 매물대 결합 (ChipCombiner, CombinedChipResult 등)
//! - [`patterns`]: 형태 분석 (PatternAnalyzer, PatternCombiner 등)
//! - [`facade`]: 외부 공개 분석 연산

pub mod chip_combiner;
pub mod conflicts;
pub mod facade;
pub mod levels;
pub mod normalizer;
pub mod patterns;
pub mod reversal;
pub mod service;

// 매물대 결합 re-exports
pub use chip_combiner::{
    ChipCombiner, CombinedChipResult, Outlook, Recommendation, TimeframeAlignment,
    TrendConsistency, TrendDirection,
};
pub use conflicts::{detect_conflicts, TimeframeConflict};
pub use levels::{group_nearby_levels, nearest_above, nearest_below, DEFAULT_PROXIMITY_THRESHOLD};
pub use normalizer::{normalize_all, weight_analysis};

// 형태 분석 re-exports
pub use patterns::{
    ComprehensivePatternAnalysis, MultiTimeframePatternAnalysis, PatternAnalyzer, PatternCombiner,
};

// 추세 반전 re-exports
pub use reversal::{evaluate, TrendReversalVerdict, DEFAULT_SIGNAL_THRESHOLD};

// 공개 연산 re-exports
pub use facade::{
    analyze_multi_timeframe_patterns, has_trend_reversal_signal, multi_timeframe_chip_analysis,
    TimeframeCandles,
};
pub use service::{ReversalScanResult, SignalService};

#[cfg(test)]
pub(crate) mod test_support {
    //! 단위 테스트 공용 픽스처.

    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use signal_core::{
        Candle, ChipAnalysis, ChipDistributionAnalyzer, Direction, PatternAnalysisResult,
        PatternComponent, PatternStatus, PatternType, Timeframe, WeightedTimeframeAnalysis,
    };

    /// 레벨이 비어 있는 매물대 분석 (현재가 100).
    pub fn chip_analysis(
        timeframe: Timeframe,
        buy: f64,
        short: f64,
        bias: Direction,
    ) -> ChipAnalysis {
        ChipAnalysis {
            symbol: "AAPL".to_string(),
            timeframe,
            current_price: dec!(100),
            buy_signal_strength: buy,
            short_signal_strength: short,
            overall_recommendation: bias.label().to_string(),
            bias,
            strong_support_levels: Vec::new(),
            moderate_support_levels: Vec::new(),
            strong_resistance_levels: Vec::new(),
            moderate_resistance_levels: Vec::new(),
            technical_signal: bias.label().to_string(),
            technical_bias: bias,
            shape_buy_signal: bias.is_bullish(),
        }
    }

    pub fn weighted(analysis: ChipAnalysis, weight: f64) -> WeightedTimeframeAnalysis {
        WeightedTimeframeAnalysis {
            timeframe: analysis.timeframe,
            analysis,
            weight,
        }
    }

    /// 종가 목록으로 캔들 생성 (고가 = 종가 + 1, 저가 = 종가 - 1).
    pub fn candles_from_closes(closes: &[i64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let close = Decimal::from(close);
                Candle::new(
                    "AAPL",
                    start + Duration::hours(i as i64),
                    close,
                    close + dec!(1),
                    close - dec!(1),
                    close,
                    dec!(1000),
                )
            })
            .collect()
    }

    /// 완성 상태의 형태 레코드.
    pub fn pattern(
        pattern_type: PatternType,
        direction: Direction,
        reliability: f64,
        significance: f64,
        start_index: usize,
        end_index: usize,
    ) -> PatternAnalysisResult {
        PatternAnalysisResult {
            pattern_type,
            status: PatternStatus::Completed,
            direction,
            reliability,
            significance,
            component: PatternComponent {
                start_index,
                end_index,
                key_points: Vec::new(),
                pattern_height: dec!(10),
                breakout_level: dec!(100),
                volume_pattern: "flat".to_string(),
            },
            price_target: None,
            stop_loss: None,
            breakout_expected: false,
            description: String::new(),
        }
    }

    /// 요청된 타임프레임과 심볼로 고정 분석을 돌려주는 매물대 분석기.
    pub struct FixedChipAnalyzer {
        template: ChipAnalysis,
    }

    impl FixedChipAnalyzer {
        pub fn uniform(template: ChipAnalysis) -> Self {
            Self { template }
        }
    }

    impl ChipDistributionAnalyzer for FixedChipAnalyzer {
        fn analyze(
            &self,
            symbol: &str,
            timeframe: Timeframe,
            _candles: &[Candle],
        ) -> Option<ChipAnalysis> {
            Some(ChipAnalysis {
                symbol: symbol.to_string(),
                timeframe,
                ..self.template.clone()
            })
        }
    }
}
