//! ML 모듈 에러 타입.

use thiserror::Error;
use trader_core::TraderError;

use crate::indicators::IndicatorError;

/// 피처 파이프라인에서 발생할 수 있는 에러.
#[derive(Debug, Error)]
pub enum MlError {
    /// 유효하지 않은 입력 데이터
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 유효하지 않은 설정 값
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 분석을 위한 데이터 부족
    #[error("Insufficient data: need {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// fit 이전에 transform 호출
    #[error("Not fitted: {0}")]
    NotFitted(String),

    /// 행렬/벡터 크기 불일치
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// 시장 데이터에서 feature 추출 에러
    #[error("Feature extraction error: {0}")]
    FeatureExtraction(String),

    /// 지표 계산 에러
    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    /// 공통 도메인/설정 에러
    #[error(transparent)]
    Core(#[from] TraderError),
}

/// ML 작업을 위한 Result 타입.
pub type MlResult<T> = Result<T, MlError>;

impl MlError {
    /// 이 에러가 복구 가능한지 확인 (다른 데이터로 재시도 가능).
    pub fn is_recoverable(&self) -> bool {
        match self {
            MlError::InsufficientData { .. }
            | MlError::InvalidInput(_)
            | MlError::ShapeMismatch { .. } => true,
            MlError::Core(err) => err.is_input_error(),
            _ => false,
        }
    }

    /// 설정을 고쳐야 하는 에러인지 확인.
    pub fn is_config_error(&self) -> bool {
        match self {
            MlError::InvalidConfig(_) | MlError::Indicator(IndicatorError::InvalidParameter(_)) => {
                true
            }
            MlError::Core(err) => err.is_config_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MlError::InvalidConfig("ratios must sum to 1".to_string());
        assert_eq!(err.to_string(), "Invalid config: ratios must sum to 1");

        let err = MlError::InsufficientData {
            required: 10,
            actual: 5,
        };
        assert_eq!(err.to_string(), "Insufficient data: need 10 samples, got 5");

        let err = MlError::ShapeMismatch {
            expected: "3 columns".to_string(),
            actual: "2 columns".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Shape mismatch: expected 3 columns, got 2 columns"
        );
    }

    #[test]
    fn test_error_recoverable() {
        let err = MlError::InsufficientData {
            required: 100,
            actual: 50,
        };
        assert!(err.is_recoverable());

        let err = MlError::NotFitted("transform".to_string());
        assert!(!err.is_recoverable());

        let err: MlError = TraderError::InvalidInput("bad bar".to_string()).into();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_config() {
        assert!(MlError::InvalidConfig("n_splits".to_string()).is_config_error());

        let err: MlError = IndicatorError::InvalidParameter("width".to_string()).into();
        assert!(err.is_config_error());

        let err: MlError = TraderError::Config("missing file".to_string()).into();
        assert!(err.is_config_error());
        assert!(!MlError::NotFitted("x".to_string()).is_config_error());
    }
}
