//! ML 피처 엔지니어링 및 시간 안전 분할.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 기술적 지표 계산 (SMA, EMA, RSI, MACD, Bollinger, ATR, OBV, VWAP)
//! - OHLCV → 이름이 붙은 피처 행렬 생성
//! - fit/transform 전처리 (결측치, 이상치, 스케일링)
//! - 시간순 train/validation/test 분할과 walk-forward 교차검증
//!
//! # Re-exports
//!
//! - [`indicators`]: 지표 엔진 (IndicatorEngine, IndicatorConfig 등)
//! - [`ml`]: 피처 빌더, 전처리기, 분할기
//! - [`config`]: 파이프라인 설정 (PipelineConfig)

pub mod config;
pub mod indicators;
pub mod ml;

pub use config::PipelineConfig;

// Indicators 모듈 re-exports
pub use indicators::{
    AtrParams, BollingerBandsParams, BollingerBandsResult, EmaParams, IndicatorConfig,
    IndicatorEngine, IndicatorError, IndicatorMatrix, IndicatorResult, MacdParams, MacdResult,
    MomentumCalculator, RsiParams, SmaParams, TrendIndicators, VolatilityIndicators,
    VolumeIndicators,
};

// ML 모듈 re-exports
pub use ml::{
    verify_no_leakage, DataSplit, DataSplitter, FeatureBuilder, FeatureBuilderConfig,
    FeatureMatrix, MlError, MlResult, Preprocessor, PreprocessorConfig, RowFilter, SplitConfig,
    WalkForwardConfig, WalkForwardFold,
};
