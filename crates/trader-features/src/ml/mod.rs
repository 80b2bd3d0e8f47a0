//! 머신러닝 입력 준비.
//!
//! 이 모듈은 ML 학습 파이프라인의 앞단을 제공합니다:
//!
//! - **Feature Engineering**: OHLCV에서 지표/파생 피처 행렬 생성
//! - **Preprocessor**: 결측치 처리, 이상치 처리, 스케일링 (fit/transform)
//! - **DataSplitter**: 시간순 train/validation/test 분할, walk-forward 교차검증,
//!   누수 검증
//!
//! # 아키텍처
//!
//! ```text
//! OHLCV 레코드 (시간 오름차순)
//!        │
//!        ▼
//! ┌─────────────────┐
//! │ FeatureBuilder  │ ← IndicatorEngine
//! └────────┬────────┘
//!          │ FeatureMatrix
//!          ▼
//! ┌─────────────────┐
//! │  DataSplitter   │ ← 먼저 분할 (미래 데이터로 fit 방지)
//! └────────┬────────┘
//!          │ train / val / test
//!          ▼
//! ┌─────────────────┐
//! │  Preprocessor   │ ← train에서만 fit, 나머지는 transform
//! └────────┬────────┘
//!          │
//!          ▼
//!    외부 학습기
//! ```
//!
//! # 예제
//!
//! ```no_run
//! use ndarray::Array1;
//! use trader_features::ml::{
//!     DataSplitter, FeatureBuilder, Preprocessor, PreprocessorConfig, SplitConfig,
//! };
//! # fn run(records: Vec<trader_core::Ohlcv>) -> trader_features::ml::MlResult<()> {
//! let matrix = FeatureBuilder::with_defaults().build_features(&records)?;
//! let target = Array1::from_iter(matrix.column("ret_1").unwrap().iter().copied());
//!
//! let split = DataSplitter::new(SplitConfig::default())?.split(matrix.data(), &target)?;
//!
//! let mut preprocessor = Preprocessor::new(PreprocessorConfig::default());
//! let x_train = preprocessor.fit_transform(&split.x_train)?;
//! let x_test = preprocessor.transform(&split.x_test)?;
//! # let _ = (x_train, x_test);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod features;
pub mod preprocessor;
pub mod splitter;
pub mod types;

pub use error::{MlError, MlResult};
pub use features::{FeatureBuilder, FeatureBuilderConfig, RowFilter};
pub use preprocessor::{
    MissingStrategy, OutlierBounds, OutlierMethod, OutlierTreatment, Preprocessor,
    PreprocessorConfig, PreprocessorState, ScalerType,
};
pub use splitter::{
    verify_no_leakage, DataSplit, DataSplitter, SplitConfig, WalkForwardConfig, WalkForwardFold,
};
pub use types::FeatureMatrix;
