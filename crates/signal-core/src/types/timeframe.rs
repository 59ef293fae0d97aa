//! 분석 대상 타임프레임 정의.
//!
//! 다중 타임프레임 분석은 주봉, 일봉, 1시간봉 세 가지 주기만 다룹니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 캔들스틱 타임프레임.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    /// 주봉
    #[serde(rename = "weekly")]
    W1,
    /// 일봉
    #[serde(rename = "daily")]
    D1,
    /// 1시간봉
    #[serde(rename = "1hour")]
    H1,
}

impl Timeframe {
    /// 큰 주기부터 작은 주기 순서의 전체 타임프레임.
    pub const ALL: [Timeframe; 3] = [Timeframe::W1, Timeframe::D1, Timeframe::H1];

    /// 설정 파일 및 리포트에서 사용하는 키.
    pub fn as_key(&self) -> &'static str {
        match self {
            Timeframe::W1 => "weekly",
            Timeframe::D1 => "daily",
            Timeframe::H1 => "1hour",
        }
    }

    /// 리포트 문구용 한글 이름.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::W1 => "주봉",
            Timeframe::D1 => "일봉",
            Timeframe::H1 => "1시간봉",
        }
    }

    /// 키 문자열에서 파싱합니다.
    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "weekly" | "1w" => Some(Timeframe::W1),
            "daily" | "1d" => Some(Timeframe::D1),
            "1hour" | "1h" => Some(Timeframe::H1),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("Invalid timeframe: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_keys() {
        assert_eq!("1hour".parse::<Timeframe>().unwrap(), Timeframe::H1);
        assert_eq!("1d".parse::<Timeframe>().unwrap(), Timeframe::D1);
        assert!("4h".parse::<Timeframe>().is_err());
        assert_eq!(Timeframe::W1.to_string(), "weekly");
    }

    #[test]
    fn test_timeframe_serde_key() {
        let json = serde_json::to_string(&Timeframe::H1).unwrap();
        assert_eq!(json, "\"1hour\"");
    }
}
