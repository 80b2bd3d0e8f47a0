//! 파이프라인 공통 에러 타입.
//!
//! 이 모듈은 도메인 레코드 검증과 설정 로딩에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum TraderError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 데이터 에러
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 파이프라인 작업을 위한 Result 타입.
pub type TraderResult<T> = Result<T, TraderError>;

impl TraderError {
    /// 입력 데이터를 고치면 해결되는 에러인지 확인합니다.
    pub fn is_input_error(&self) -> bool {
        matches!(self, TraderError::InvalidInput(_) | TraderError::Data(_))
    }

    /// 설정 문제로 발생한 에러인지 확인합니다.
    pub fn is_config_error(&self) -> bool {
        matches!(self, TraderError::Config(_))
    }
}

impl From<config::ConfigError> for TraderError {
    fn from(err: config::ConfigError) -> Self {
        TraderError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_input() {
        let err = TraderError::InvalidInput("negative volume".to_string());
        assert!(err.is_input_error());
        assert!(!err.is_config_error());

        let err = TraderError::Config("missing split section".to_string());
        assert!(!err.is_input_error());

        let err = TraderError::Data("overflow".to_string());
        assert!(err.is_input_error());
    }

    #[test]
    fn test_error_from_config() {
        let err: TraderError = config::ConfigError::NotFound("split".to_string()).into();
        assert!(err.is_config_error());
        assert!(err.to_string().starts_with("설정 에러"));
    }
}
