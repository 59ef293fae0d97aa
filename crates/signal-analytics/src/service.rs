//! 비동기 신호 분석 서비스.
//!
//! 캔들 제공자에서 필요한 타임프레임을 병렬 조회한 뒤
//! 공개 분석 연산을 실행합니다. 조회 단계 전체에 타임아웃이 걸립니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! let service = SignalService::new(provider, config, chip_analyzer, reversal_detector);
//! let report = service.chip_report("AAPL", None).await?;
//! let scans = service.scan_symbols(&["AAPL", "MSFT"]).await;
//! ```

use crate::chip_combiner::CombinedChipResult;
use crate::facade::{
    analyze_multi_timeframe_patterns, has_trend_reversal_signal, multi_timeframe_chip_analysis,
    TimeframeCandles,
};
use crate::patterns::{ComprehensivePatternAnalysis, PatternAnalyzer};
use crate::reversal::TrendReversalVerdict;
use futures::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};
use signal_core::{
    AnalysisConfig, AnalysisError, AnalysisResult, BreakoutSnapshot, CandleProvider,
    ChipDistributionAnalyzer, Timeframe, TrendReversalDetector,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// 종목별 반전 스캔 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalScanResult {
    /// 종목 심볼
    pub symbol: String,
    /// 판정 결과
    #[serde(flatten)]
    pub verdict: TrendReversalVerdict,
}

/// 신호 분석 서비스.
///
/// 호출 간 상태를 공유하지 않으므로 여러 심볼을 동시에 분석할 수 있습니다.
pub struct SignalService<P: CandleProvider> {
    provider: Arc<P>,
    config: AnalysisConfig,
    chip_analyzer: Arc<dyn ChipDistributionAnalyzer>,
    reversal_detector: Arc<dyn TrendReversalDetector>,
    pattern_analyzer: PatternAnalyzer,
}

impl<P: CandleProvider> SignalService<P> {
    /// 새 서비스를 생성합니다.
    pub fn new(
        provider: Arc<P>,
        config: AnalysisConfig,
        chip_analyzer: Arc<dyn ChipDistributionAnalyzer>,
        reversal_detector: Arc<dyn TrendReversalDetector>,
    ) -> Self {
        let pattern_analyzer = PatternAnalyzer::new(config.pattern.clone());
        Self {
            provider,
            config,
            chip_analyzer,
            reversal_detector,
            pattern_analyzer,
        }
    }

    /// 형태 분석기를 교체합니다.
    pub fn with_pattern_analyzer(mut self, analyzer: PatternAnalyzer) -> Self {
        self.pattern_analyzer = analyzer;
        self
    }

    /// 설정 참조.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// 여러 타임프레임 캔들을 병렬로 조회합니다.
    ///
    /// 하나라도 실패하면 전체가 실패하며, 설정된 시간 안에 끝나지 않으면
    /// [`AnalysisError::Timeout`]을 반환합니다.
    pub async fn fetch_candles(
        &self,
        symbol: &str,
        timeframes: &[Timeframe],
    ) -> AnalysisResult<TimeframeCandles> {
        let fetches = timeframes.iter().map(|&timeframe| async move {
            let candles = self.provider.fetch_candles(symbol, timeframe).await?;
            debug!(
                symbol,
                %timeframe,
                candle_count = candles.len(),
                "Loaded timeframe candles"
            );
            Ok::<_, AnalysisError>((timeframe, candles))
        });

        let timeout = self.config.fetch.timeout();
        let fetched = tokio::time::timeout(timeout, try_join_all(fetches))
            .await
            .map_err(|_| {
                AnalysisError::Timeout(format!(
                    "{} 캔들 조회가 {}초 안에 끝나지 않음",
                    symbol,
                    timeout.as_secs()
                ))
            })??;

        let mut candles = TimeframeCandles::default();
        for (timeframe, series) in fetched {
            candles.set(timeframe, series);
        }
        Ok(candles)
    }

    /// 다중 타임프레임 매물대 결합 리포트.
    #[instrument(skip(self, breakout), level = "info")]
    pub async fn chip_report(
        &self,
        symbol: &str,
        breakout: Option<BreakoutSnapshot>,
    ) -> AnalysisResult<CombinedChipResult> {
        let chip = &self.config.chip;
        let candles = self.fetch_candles(symbol, &chip.include_timeframes).await?;
        multi_timeframe_chip_analysis(symbol, &candles, self.chip_analyzer.as_ref(), chip, breakout)
    }

    /// 다중 타임프레임 형태 리포트.
    #[instrument(skip(self), level = "info")]
    pub async fn pattern_report(&self, symbol: &str) -> AnalysisResult<ComprehensivePatternAnalysis> {
        let candles = self.fetch_candles(symbol, &Timeframe::ALL).await?;
        Ok(analyze_multi_timeframe_patterns(
            symbol,
            &candles,
            &self.pattern_analyzer,
        ))
    }

    /// 1시간봉-일봉 추세 복귀 반전 판정.
    #[instrument(skip(self), level = "info")]
    pub async fn check_reversal(&self, symbol: &str) -> AnalysisResult<TrendReversalVerdict> {
        let candles = self
            .fetch_candles(symbol, &[Timeframe::D1, Timeframe::H1])
            .await?;
        Ok(has_trend_reversal_signal(
            &candles.hourly,
            &candles.daily,
            self.reversal_detector.as_ref(),
            self.config.reversal.signal_threshold,
        ))
    }

    /// 종목 반전 스캔.
    ///
    /// 조회나 분석 오류는 전파하지 않고 오류 내용을 담은 무신호 판정으로 바꿉니다.
    pub async fn scan_reversal(&self, symbol: &str) -> ReversalScanResult {
        let verdict = match self.check_reversal(symbol).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(symbol, error = %e, "Reversal scan failed");
                TrendReversalVerdict::no_signal(format!("{} 분석 중 오류 발생: {}", symbol, e))
            }
        };

        ReversalScanResult {
            symbol: symbol.to_string(),
            verdict,
        }
    }

    /// 여러 종목을 동시에 반전 스캔합니다. 결과는 입력 순서를 따릅니다.
    pub async fn scan_symbols(&self, symbols: &[&str]) -> Vec<ReversalScanResult> {
        join_all(symbols.iter().map(|&symbol| self.scan_reversal(symbol))).await
    }
}
