//! 피크/밸리(피봇 포인트) 감지.

use signal_core::{Candle, PeakValley, PivotKind};

/// 좌우 `lookback` 범위 내 최고가/최저가인 캔들을 피크/밸리로 감지합니다.
///
/// 한 캔들이 피크이면서 밸리일 수 있으며, 결과는 인덱스 순서입니다.
/// 양 끝 `lookback`개 캔들은 비교 범위가 부족하므로 제외합니다.
pub fn detect_pivots(candles: &[Candle], lookback: usize) -> Vec<PeakValley> {
    let mut pivots = Vec::new();

    if lookback == 0 || candles.len() <= lookback * 2 {
        return pivots;
    }

    for i in lookback..candles.len() - lookback {
        let window = &candles[i - lookback..=i + lookback];
        let current = &candles[i];

        // 피크 검사 (좌우 lookback 범위 내 최고가)
        if window.iter().all(|c| c.high <= current.high) {
            pivots.push(PeakValley {
                index: i,
                price: current.high,
                timestamp: current.timestamp,
                kind: PivotKind::Peak,
            });
        }

        // 밸리 검사 (좌우 lookback 범위 내 최저가)
        if window.iter().all(|c| c.low >= current.low) {
            pivots.push(PeakValley {
                index: i,
                price: current.low,
                timestamp: current.timestamp,
                kind: PivotKind::Valley,
            });
        }
    }

    pivots
}

/// 피크만 골라냅니다.
pub fn peaks(pivots: &[PeakValley]) -> Vec<&PeakValley> {
    pivots.iter().filter(|p| p.kind == PivotKind::Peak).collect()
}

/// 밸리만 골라냅니다.
pub fn valleys(pivots: &[PeakValley]) -> Vec<&PeakValley> {
    pivots.iter().filter(|p| p.kind == PivotKind::Valley).collect()
}
