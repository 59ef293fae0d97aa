//! 타임프레임별 형태 분석.
//!
//! 최근 캔들 구간에서 모든 감지기를 실행한 뒤 최근성 보정을 거쳐
//! 형태를 순위화하고 타임프레임의 형태 신호를 결정합니다.
//!
//! 최근성 보정은 순수 단계의 연결입니다:
//! 거리 감쇠 → 돌파 확인 가중 → 돌파 임박 가중. 각 단계는 새 레코드를 반환합니다.

use super::detectors::default_detectors;
use super::pivots::detect_pivots;
use serde::{Deserialize, Serialize};
use signal_core::{
    latest_window, Candle, Direction, PatternAnalysisResult, PatternConfig, PatternDetector,
    PatternStatus, Timeframe,
};
use tracing::debug;

/// 단일 타임프레임의 형태 분석 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTimeframePatternAnalysis {
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 순위순 형태 목록
    pub patterns: Vec<PatternAnalysisResult>,
    /// 주도 형태 (순위 1위)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_pattern: Option<PatternAnalysisResult>,
    /// 형태 신호
    pub pattern_signal: Direction,
}

impl MultiTimeframePatternAnalysis {
    /// 형태가 없는 중립 결과.
    pub fn empty(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            patterns: Vec::new(),
            dominant_pattern: None,
            pattern_signal: Direction::Neutral,
        }
    }

    /// 이미 감지된 형태 목록으로 결과를 구성합니다.
    ///
    /// 최근성 보정이 끝난 형태를 받아 순위화와 신호 결정만 수행합니다.
    pub fn from_ranked(
        timeframe: Timeframe,
        mut patterns: Vec<PatternAnalysisResult>,
        top_patterns: usize,
        dominance_ratio: f64,
    ) -> Self {
        rank_patterns(&mut patterns);
        let top = top_patterns.min(patterns.len());
        let pattern_signal = pattern_signal(&patterns[..top], dominance_ratio);

        Self {
            timeframe,
            dominant_pattern: patterns.first().cloned(),
            patterns,
            pattern_signal,
        }
    }
}

// ==================== 최근성 보정 ====================

/// 거리 감쇠: `significance × exp(-decay_rate × distance)`.
pub fn decay_significance(
    pattern: &PatternAnalysisResult,
    distance: usize,
    decay_rate: f64,
) -> PatternAnalysisResult {
    let factor = (-decay_rate * distance as f64).exp();
    pattern.with_significance(pattern.significance * factor)
}

/// 돌파가 확인된 형태 가중.
pub fn confirmed_bonus(pattern: PatternAnalysisResult, bonus: f64) -> PatternAnalysisResult {
    if pattern.status == PatternStatus::Confirmed {
        pattern.with_significance(pattern.significance * bonus)
    } else {
        pattern
    }
}

/// 돌파가 임박한 형성 중 형태 가중 (거리 `max_distance` 미만).
pub fn forming_bonus(
    pattern: PatternAnalysisResult,
    distance: usize,
    max_distance: usize,
    bonus: f64,
) -> PatternAnalysisResult {
    if pattern.status == PatternStatus::Forming
        && pattern.breakout_expected
        && distance < max_distance
    {
        pattern.with_significance(pattern.significance * bonus)
    } else {
        pattern
    }
}

/// 최근성 보정 전체 단계. 결과 중요도는 100을 넘을 수 있습니다.
pub fn adjust_for_recency(
    pattern: &PatternAnalysisResult,
    last_index: usize,
    config: &PatternConfig,
) -> PatternAnalysisResult {
    let distance = last_index.saturating_sub(pattern.component.end_index);

    let decayed = decay_significance(pattern, distance, config.decay_rate);
    let confirmed = confirmed_bonus(decayed, config.confirmed_bonus);
    forming_bonus(
        confirmed,
        distance,
        config.forming_distance,
        config.forming_bonus,
    )
}

/// 신뢰도 × 중요도 내림차순 안정 정렬.
pub fn rank_patterns(patterns: &mut [PatternAnalysisResult]) {
    patterns.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));
}

/// 상위 형태의 상승/하락 점수 합으로 신호를 결정합니다.
///
/// `dominance_ratio`배 우세를 먼저 보고, 없으면 단순 우세로 판단합니다.
pub fn pattern_signal(patterns: &[PatternAnalysisResult], dominance_ratio: f64) -> Direction {
    let (mut bullish, mut bearish) = (0.0, 0.0);

    for pattern in patterns {
        match pattern.direction {
            Direction::Bullish => bullish += pattern.rank_score(),
            Direction::Bearish => bearish += pattern.rank_score(),
            Direction::Neutral => {}
        }
    }

    if bullish > bearish * dominance_ratio {
        Direction::Bullish
    } else if bearish > bullish * dominance_ratio {
        Direction::Bearish
    } else if bullish > bearish {
        Direction::Bullish
    } else if bearish > bullish {
        Direction::Bearish
    } else {
        Direction::Neutral
    }
}

// ==================== 분석기 ====================

/// 타임프레임별 형태 분석기.
pub struct PatternAnalyzer {
    config: PatternConfig,
    detectors: Vec<Box<dyn PatternDetector>>,
}

impl std::fmt::Debug for PatternAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.detectors.iter().map(|d| d.name()).collect();
        f.debug_struct("PatternAnalyzer")
            .field("config", &self.config)
            .field("detectors", &names)
            .finish()
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new(PatternConfig::default())
    }
}

impl PatternAnalyzer {
    /// 기본 감지기로 새 분석기를 생성합니다.
    pub fn new(config: PatternConfig) -> Self {
        let detectors = default_detectors(&config);
        Self { config, detectors }
    }

    /// 감지기 목록을 지정하여 생성합니다.
    pub fn with_detectors(config: PatternConfig, detectors: Vec<Box<dyn PatternDetector>>) -> Self {
        Self { config, detectors }
    }

    /// 설정 참조.
    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// 한 타임프레임의 캔들에서 형태를 분석합니다.
    ///
    /// 최근 `window`개 캔들만 사용하며, 캔들이 없으면 중립 결과를 반환합니다.
    pub fn analyze(&self, candles: &[Candle], timeframe: Timeframe) -> MultiTimeframePatternAnalysis {
        let window = latest_window(candles, self.config.window);
        let Some(last_index) = window.len().checked_sub(1) else {
            return MultiTimeframePatternAnalysis::empty(timeframe);
        };

        let pivots = detect_pivots(window, self.config.pivot_lookback);

        let detected: Vec<PatternAnalysisResult> = self
            .detectors
            .iter()
            .flat_map(|detector| {
                let found = detector.detect(window, &pivots);
                debug!(
                    %timeframe,
                    detector = detector.name(),
                    count = found.len(),
                    "Pattern detector finished"
                );
                found
            })
            .map(PatternAnalysisResult::clamped)
            .collect();

        let adjusted: Vec<PatternAnalysisResult> = detected
            .iter()
            .map(|p| adjust_for_recency(p, last_index, &self.config))
            .collect();

        let analysis = MultiTimeframePatternAnalysis::from_ranked(
            timeframe,
            adjusted,
            self.config.top_patterns,
            self.config.dominance_ratio,
        );

        debug!(
            %timeframe,
            pivots = pivots.len(),
            patterns = analysis.patterns.len(),
            signal = %analysis.pattern_signal,
            "Timeframe patterns ranked"
        );

        analysis
    }
}
