//! OHLCV 캔들 데이터.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 가격 타입.
pub type Price = Decimal;

/// OHLCV 캔들스틱 데이터.
///
/// 외부 데이터 조회 계층이 생성하며, 같은 심볼/타임프레임 내에서
/// 시간순으로 정렬되어 있고 타임스탬프가 중복되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 종목 심볼
    pub symbol: String,
    /// 캔들 시작 시간
    pub timestamp: DateTime<Utc>,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Decimal,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    pub fn new(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// 캔들 목록에서 가장 최근 `count`개만 남깁니다.
pub fn latest_window(candles: &[Candle], count: usize) -> &[Candle] {
    let start = candles.len().saturating_sub(count);
    &candles[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(close: Decimal) -> Candle {
        Candle::new("AAPL", Utc::now(), close, close + dec!(1), close - dec!(1), close, dec!(1000))
    }

    #[test]
    fn test_latest_window() {
        let candles: Vec<Candle> = (0..5).map(|i| candle(Decimal::from(100 + i))).collect();

        let window = latest_window(&candles, 3);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].close, dec!(102));

        // 요청 수가 더 많으면 전체 반환
        assert_eq!(latest_window(&candles, 100).len(), 5);
    }
}
