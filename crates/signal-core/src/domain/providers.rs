//! 외부 분석기 및 데이터 제공자 trait.
//!
//! 매물대 계산, 추세 반전 감지, 캔들 조회는 이 크레이트 바깥에서 구현되며
//! 결합 로직은 아래 trait을 통해서만 접근합니다.

use crate::domain::{ChipAnalysis, PatternAnalysisResult, PeakValley, ReversalSignal};
use crate::error::AnalysisResult;
use crate::types::{Candle, Timeframe};
use async_trait::async_trait;

/// 매물대(칩 분포) 분석기.
pub trait ChipDistributionAnalyzer: Send + Sync {
    /// 한 타임프레임의 캔들로 매물대 분석을 수행합니다.
    ///
    /// 데이터가 부족하면 `None`을 반환합니다.
    fn analyze(&self, symbol: &str, timeframe: Timeframe, candles: &[Candle])
        -> Option<ChipAnalysis>;
}

/// 추세 반전 감지기.
pub trait TrendReversalDetector: Send + Sync {
    /// 작은 타임프레임이 큰 타임프레임 추세로 복귀하는지 감지합니다.
    fn detect(
        &self,
        small: &[Candle],
        large: &[Candle],
        small_timeframe: Timeframe,
        large_timeframe: Timeframe,
    ) -> ReversalSignal;
}

/// 단일 형태 계열 감지기.
pub trait PatternDetector: Send + Sync {
    /// 감지기 이름 (로그용).
    fn name(&self) -> &'static str;

    /// 피크/밸리 목록을 바탕으로 형태를 감지합니다.
    fn detect(&self, candles: &[Candle], pivots: &[PeakValley]) -> Vec<PatternAnalysisResult>;
}

/// 캔들 데이터 제공자.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// 심볼과 타임프레임의 캔들을 시간순으로 조회합니다.
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe)
        -> AnalysisResult<Vec<Candle>>;
}
