//! 신호 분석 에러 타입.

use crate::types::Timeframe;
use thiserror::Error;

/// 분석 에러.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// 주요 타임프레임의 분석 결과가 입력에 없음
    #[error("주요 타임프레임 {0}의 분석 결과를 찾을 수 없음")]
    MissingPrimaryTimeframe(Timeframe),

    /// 캔들 데이터 조회 에러
    #[error("데이터 조회 에러: {0}")]
    DataFetch(String),

    /// 데이터 조회 시간 초과
    #[error("시간 초과: {0}")]
    Timeout(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 분석 작업을 위한 Result 타입.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    /// 호출자가 재시도할 수 있는 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalysisError::DataFetch(_) | AnalysisError::Timeout(_))
    }

    /// 해당 결합 호출 전체를 중단시키는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::MissingPrimaryTimeframe(_))
    }
}

impl From<config::ConfigError> for AnalysisError {
    fn from(err: config::ConfigError) -> Self {
        AnalysisError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let fetch_err = AnalysisError::DataFetch("connection reset".to_string());
        assert!(fetch_err.is_retryable());

        let missing = AnalysisError::MissingPrimaryTimeframe(Timeframe::D1);
        assert!(!missing.is_retryable());
        assert!(missing.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = AnalysisError::MissingPrimaryTimeframe(Timeframe::H1);
        assert_eq!(err.to_string(), "주요 타임프레임 1hour의 분석 결과를 찾을 수 없음");
    }
}
