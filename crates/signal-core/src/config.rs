//! 설정 관리.
//!
//! 결합 로직의 가중치와 경험적 상수를 한곳에서 정의합니다.
//! 파일(TOML)과 `SIGNAL__` 접두사 환경 변수로 덮어쓸 수 있습니다.

use crate::domain::TimeframeWeights;
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::Timeframe;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 분석 설정.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// 매물대 결합 설정
    #[serde(default)]
    pub chip: ChipConfig,
    /// 형태 분석 설정
    #[serde(default)]
    pub pattern: PatternConfig,
    /// 추세 반전 필터 설정
    #[serde(default)]
    pub reversal: ReversalConfig,
    /// 데이터 조회 설정
    #[serde(default)]
    pub fetch: FetchConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 매물대 결합 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChipConfig {
    /// 주요 타임프레임
    pub primary_timeframe: Timeframe,
    /// 분석에 포함할 타임프레임
    pub include_timeframes: Vec<Timeframe>,
    /// 타임프레임별 가중치 (누락 시 0.33)
    pub weights: TimeframeWeights,
    /// 가격 레벨 그룹화 근접 비율
    pub proximity_threshold: f64,
    /// 방향 판단을 위한 매수/매도 강도 차이
    pub signal_margin: f64,
    /// 강한 정렬로 보는 정렬 강도 임계값
    pub strong_alignment: f64,
    /// 타임프레임별 최소 캔들 수 (미달 시 경고)
    pub min_candles: usize,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            primary_timeframe: Timeframe::D1,
            include_timeframes: Timeframe::ALL.to_vec(),
            weights: TimeframeWeights::chip_defaults(),
            proximity_threshold: 0.02,
            signal_margin: 20.0,
            strong_alignment: 70.0,
            min_candles: 30,
        }
    }
}

/// 형태 분석 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternConfig {
    /// 분석할 최근 캔들 수
    pub window: usize,
    /// 피크/밸리 감지 좌우 범위
    pub pivot_lookback: usize,
    /// 같은 가격대로 보는 허용 오차 비율
    pub price_tolerance: f64,
    /// 최근성 지수 감쇠율
    pub decay_rate: f64,
    /// 돌파 확인 형태 가중
    pub confirmed_bonus: f64,
    /// 돌파 임박 형성 중 형태 가중
    pub forming_bonus: f64,
    /// 형성 중 가중을 받는 최대 거리 (캔들 수, 미만)
    pub forming_distance: usize,
    /// 방향 판단에 사용할 상위 형태 수
    pub top_patterns: usize,
    /// 타임프레임 내 우세 판단 비율
    pub dominance_ratio: f64,
    /// 타임프레임 간 우세 판단 비율
    pub combine_ratio: f64,
    /// 타임프레임별 가중치 (누락 시 1.0)
    pub weights: TimeframeWeights,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            window: 100,
            pivot_lookback: 3,
            price_tolerance: 0.03,
            decay_rate: 0.05,
            confirmed_bonus: 1.5,
            forming_bonus: 1.3,
            forming_distance: 5,
            top_patterns: 10,
            dominance_ratio: 1.5,
            combine_ratio: 1.2,
            weights: TimeframeWeights::pattern_defaults(),
        }
    }
}

/// 추세 반전 필터 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReversalConfig {
    /// 유효 신호로 인정하는 최소 반전 강도
    pub signal_threshold: f64,
}

impl Default for ReversalConfig {
    fn default() -> Self {
        Self {
            signal_threshold: 40.0,
        }
    }
}

/// 데이터 조회 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// 전체 조회 단계 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl FetchConfig {
    /// 타임아웃을 Duration으로 반환합니다.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> AnalysisResult<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("SIGNAL")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AnalysisConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> AnalysisResult<Self> {
        Self::load("config/default.toml")
    }

    /// 값 범위를 검증합니다.
    pub fn validate(&self) -> AnalysisResult<()> {
        let weight_tables = [("chip", &self.chip.weights), ("pattern", &self.pattern.weights)];
        for (name, table) in weight_tables {
            if table.default_weight < 0.0 || table.weights.values().any(|w| *w < 0.0) {
                return Err(AnalysisError::Config(format!(
                    "{} 가중치는 음수일 수 없음",
                    name
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.chip.proximity_threshold) {
            return Err(AnalysisError::Config(format!(
                "proximity_threshold 범위 오류: {}",
                self.chip.proximity_threshold
            )));
        }

        if self.chip.include_timeframes.is_empty() {
            return Err(AnalysisError::Config(
                "include_timeframes가 비어 있음".to_string(),
            ));
        }

        if self.pattern.decay_rate < 0.0 || self.pattern.window == 0 {
            return Err(AnalysisError::Config(
                "pattern.decay_rate/window 범위 오류".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.reversal.signal_threshold) {
            return Err(AnalysisError::Config(format!(
                "signal_threshold 범위 오류: {}",
                self.reversal.signal_threshold
            )));
        }

        Ok(())
    }
}
