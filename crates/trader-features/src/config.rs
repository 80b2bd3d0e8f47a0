//! 파이프라인 설정.
//!
//! 피처 생성, 전처리, 분할 설정을 하나의 구조체로 묶어 TOML 파일과
//! `FEATURES__` 접두사 환경 변수에서 읽습니다.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [features]
//! horizons = [1, 6, 24]
//! include_temporal = true
//!
//! [features.indicators]
//! sma_periods = [7, 14, 30]
//!
//! [preprocessor]
//! scaler_type = "standard"
//! missing_strategy = "interpolate"
//!
//! [split]
//! train_ratio = 0.8
//! val_ratio = 0.1
//! test_ratio = 0.1
//!
//! [walk_forward]
//! n_splits = 5
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use trader_core::config::{load_layered, load_toml_str, LoggingConfig, ENV_PREFIX};

use crate::ml::{
    DataSplitter, FeatureBuilder, FeatureBuilderConfig, MlError, MlResult, Preprocessor,
    PreprocessorConfig, SplitConfig, WalkForwardConfig,
};

/// 파이프라인 전체 설정.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 피처 생성 설정
    pub features: FeatureBuilderConfig,
    /// 전처리 설정
    pub preprocessor: PreprocessorConfig,
    /// train/validation/test 비율
    pub split: SplitConfig,
    /// walk-forward 교차검증 설정
    pub walk_forward: WalkForwardConfig,
}

impl PipelineConfig {
    /// 파일에서 설정을 로드하고 `FEATURES__*` 환경 변수로 덮어씁니다.
    pub fn load<P: AsRef<Path>>(path: P) -> MlResult<Self> {
        let config: Self = load_layered(path, ENV_PREFIX)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 로드합니다.
    pub fn from_toml_str(contents: &str) -> MlResult<Self> {
        let config: Self = load_toml_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// 구성 요소별 설정을 검증합니다.
    pub fn validate(&self) -> MlResult<()> {
        self.features.validate()?;
        self.preprocessor.validate()?;
        self.split.validate()?;
        if self.walk_forward.n_splits < 2 {
            return Err(MlError::InvalidConfig(format!(
                "walk_forward.n_splits must be at least 2, got {}",
                self.walk_forward.n_splits
            )));
        }
        Ok(())
    }

    /// 피처 빌더 생성.
    pub fn feature_builder(&self) -> MlResult<FeatureBuilder> {
        FeatureBuilder::new(self.features.clone())
    }

    /// 학습되지 않은 전처리기 생성.
    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor::new(self.preprocessor.clone())
    }

    /// 분할기 생성.
    pub fn splitter(&self) -> MlResult<DataSplitter> {
        DataSplitter::new(self.split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{MissingStrategy, RowFilter, ScalerType};

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.walk_forward.n_splits, 5);
        assert_eq!(config.features.indicators.sma_periods, vec![7, 14, 30, 50, 200]);
    }

    #[test]
    fn test_from_toml_str_partial() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [features]
            horizons = [1, 12]
            row_filter = "keep_all"

            [features.indicators]
            sma_periods = [5, 10]

            [preprocessor]
            scaler_type = "standard"
            missing_strategy = "interpolate"

            [split]
            train_ratio = 0.8
            val_ratio = 0.1
            test_ratio = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.features.horizons, vec![1, 12]);
        assert_eq!(config.features.lags, vec![1, 6, 24]);
        assert_eq!(config.features.row_filter, RowFilter::KeepAll);
        assert_eq!(config.features.indicators.sma_periods, vec![5, 10]);
        assert_eq!(config.features.indicators.rsi_period, 14);
        assert_eq!(config.preprocessor.scaler_type, ScalerType::Standard);
        assert_eq!(config.preprocessor.missing_strategy, MissingStrategy::Interpolate);
        assert_eq!(config.split.train_ratio, 0.8);
        assert!(config.splitter().is_ok());
    }

    #[test]
    fn test_from_toml_str_rejects_bad_ratios() {
        let result = PipelineConfig::from_toml_str(
            r#"
            [split]
            train_ratio = 0.9
            val_ratio = 0.1
            test_ratio = 0.1
            "#,
        );
        assert!(matches!(result, Err(MlError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_toml_str_rejects_zero_lag() {
        let result = PipelineConfig::from_toml_str("[features]\nlags = [0]");
        assert!(result.unwrap_err().is_config_error());
    }

    #[test]
    fn test_from_toml_str_rejects_negative_outlier_threshold() {
        let result = PipelineConfig::from_toml_str("[preprocessor]\niqr_multiplier = -1.0");
        assert!(matches!(result, Err(MlError::InvalidConfig(_))));

        let result = PipelineConfig::from_toml_str("[preprocessor]\nzscore_threshold = -0.5");
        assert!(result.unwrap_err().is_config_error());
    }

    #[test]
    fn test_from_toml_str_unknown_enum_value() {
        let result = PipelineConfig::from_toml_str("[preprocessor]\nscaler_type = \"zscore\"");
        assert!(result.unwrap_err().is_config_error());
    }

    #[test]
    fn test_load_missing_file() {
        let result = PipelineConfig::load("does/not/exist.toml");
        assert!(result.is_err());
    }
}
