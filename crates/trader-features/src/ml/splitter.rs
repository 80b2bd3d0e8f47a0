//! 시간순 데이터 분할.
//!
//! 시계열 데이터는 섞지 않고 시간 순서대로 잘라야 미래 정보가 학습에
//! 새어 들어가지 않습니다.
//! - **split**: 연속된 train / validation / test 구간
//! - **walk_forward_splits**: 확장 윈도우 교차검증
//! - **verify_no_leakage**: 경계 타임스탬프 검사 (자동 호출되지 않음)

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::{MlError, MlResult};

/// `split`에 필요한 최소 행 수.
pub const MIN_SPLIT_ROWS: usize = 10;

/// 비율 합 허용 오차.
const RATIO_TOLERANCE: f64 = 1e-6;

/// 기본 최소 학습 구간 비율 (walk-forward).
const DEFAULT_MIN_TRAIN_FRACTION: f64 = 0.3;

/// train/validation/test 비율.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_ratio: f64,
    pub val_ratio: f64,
    pub test_ratio: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.7,
            val_ratio: 0.15,
            test_ratio: 0.15,
        }
    }
}

impl SplitConfig {
    /// 비율이 모두 양수이고 합이 1인지 검증합니다.
    pub fn validate(&self) -> MlResult<()> {
        let sum = self.train_ratio + self.val_ratio + self.test_ratio;
        if !sum.is_finite() || (sum - 1.0).abs() > RATIO_TOLERANCE {
            return Err(MlError::InvalidConfig(format!(
                "split ratios must sum to 1.0, got {sum}"
            )));
        }
        if self.train_ratio <= 0.0 || self.val_ratio <= 0.0 || self.test_ratio <= 0.0 {
            return Err(MlError::InvalidConfig(format!(
                "all split ratios must be positive, got ({}, {}, {})",
                self.train_ratio, self.val_ratio, self.test_ratio
            )));
        }
        Ok(())
    }
}

/// walk-forward 교차검증 설정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// 폴드 수 (2 이상)
    pub n_splits: usize,
    /// 첫 폴드의 학습 행 수. None이면 전체의 30%
    pub min_train_size: Option<usize>,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            n_splits: 5,
            min_train_size: None,
        }
    }
}

/// 시간순 3분할 결과.
///
/// 세 구간은 서로 겹치지 않고 train → validation → test 순으로 이어지며
/// 크기의 합은 입력 행 수와 같습니다.
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub x_train: Array2<f64>,
    pub x_val: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_val: Array1<f64>,
    pub y_test: Array1<f64>,
    train_end: usize,
    val_end: usize,
}

impl DataSplit {
    pub fn train_size(&self) -> usize {
        self.x_train.nrows()
    }

    pub fn val_size(&self) -> usize {
        self.x_val.nrows()
    }

    pub fn test_size(&self) -> usize {
        self.x_test.nrows()
    }

    /// 학습 구간의 끝 (배타적). 검증 구간의 첫 행 인덱스와 같습니다.
    pub fn train_end(&self) -> usize {
        self.train_end
    }

    /// 검증 구간의 끝 (배타적). 테스트 구간의 첫 행 인덱스와 같습니다.
    pub fn val_end(&self) -> usize {
        self.val_end
    }

    /// 사람이 읽을 수 있는 분할 요약.
    pub fn summary(&self) -> String {
        let total = self.train_size() + self.val_size() + self.test_size();
        let pct = |size: usize| 100.0 * size as f64 / total as f64;

        let mut out = String::from("Split summary:\n");
        let _ = writeln!(out, "  Train: {} ({:.1}%)", self.train_size(), pct(self.train_size()));
        let _ = writeln!(out, "  Val:   {} ({:.1}%)", self.val_size(), pct(self.val_size()));
        let _ = writeln!(out, "  Test:  {} ({:.1}%)", self.test_size(), pct(self.test_size()));
        let _ = write!(out, "  Total: {}", total);
        out
    }
}

/// walk-forward 교차검증의 한 폴드.
#[derive(Debug, Clone)]
pub struct WalkForwardFold {
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_val: Array2<f64>,
    pub y_val: Array1<f64>,
    /// 학습 구간의 끝 (배타적, 항상 0부터 시작)
    pub train_end: usize,
    /// 검증 구간의 끝 (배타적)
    pub val_end: usize,
}

/// 시간순 분할기.
#[derive(Debug, Clone, Default)]
pub struct DataSplitter {
    config: SplitConfig,
}

impl DataSplitter {
    /// 비율을 검증하고 분할기를 생성합니다.
    pub fn new(config: SplitConfig) -> MlResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// 시간 순서를 유지한 train/validation/test 분할.
    ///
    /// 경계는 `floor(n·train)`과 그 뒤 `floor(n·val)`이며, 각 구간이 최소
    /// 한 행을 갖도록 필요한 만큼만 조정합니다.
    pub fn split(&self, x: &Array2<f64>, y: &Array1<f64>) -> MlResult<DataSplit> {
        let n = x.nrows();
        if n < MIN_SPLIT_ROWS {
            return Err(MlError::InsufficientData {
                required: MIN_SPLIT_ROWS,
                actual: n,
            });
        }
        check_target_len(x, y)?;

        let (train_end, val_end) = self.boundaries(n);

        let split = DataSplit {
            x_train: x.slice(s![..train_end, ..]).to_owned(),
            x_val: x.slice(s![train_end..val_end, ..]).to_owned(),
            x_test: x.slice(s![val_end.., ..]).to_owned(),
            y_train: y.slice(s![..train_end]).to_owned(),
            y_val: y.slice(s![train_end..val_end]).to_owned(),
            y_test: y.slice(s![val_end..]).to_owned(),
            train_end,
            val_end,
        };

        tracing::info!(
            train = split.train_size(),
            val = split.val_size(),
            test = split.test_size(),
            "Data split"
        );

        Ok(split)
    }

    /// 분할 경계 `(train_end, val_end)`. `n >= 3`이어야 의미가 있습니다.
    fn boundaries(&self, n: usize) -> (usize, usize) {
        let train_len = (n as f64 * self.config.train_ratio).floor() as usize;
        let val_len = (n as f64 * self.config.val_ratio).floor() as usize;

        let train_end = train_len.clamp(1, n - 2);
        let val_end = (train_end + val_len).clamp(train_end + 1, n - 1);
        (train_end, val_end)
    }

    /// 확장 윈도우 walk-forward 폴드 생성.
    ///
    /// 폴드 i의 학습 구간은 `[0, min_train + i·test_size)`, 검증 구간은
    /// 그 다음 `test_size`행(입력 끝에서 잘림)입니다. 검증 구간이 비면
    /// 더 이상 폴드를 만들지 않습니다.
    pub fn walk_forward_splits(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        n_splits: usize,
        min_train_size: Option<usize>,
    ) -> MlResult<Vec<WalkForwardFold>> {
        let n = x.nrows();
        if n == 0 {
            return Err(MlError::InvalidInput("cannot split empty data".to_string()));
        }
        if n_splits < 2 {
            return Err(MlError::InvalidConfig(format!(
                "n_splits must be at least 2, got {n_splits}"
            )));
        }
        check_target_len(x, y)?;

        let min_train = min_train_size
            .unwrap_or_else(|| (n as f64 * DEFAULT_MIN_TRAIN_FRACTION).floor() as usize);
        if min_train == 0 {
            return Err(MlError::InvalidConfig(
                "min_train_size must be positive".to_string(),
            ));
        }
        if min_train >= n {
            return Err(MlError::InvalidConfig(format!(
                "min_train_size ({min_train}) must be less than data size ({n})"
            )));
        }

        let test_size = (n - min_train) / n_splits;
        if test_size < 1 {
            return Err(MlError::InsufficientData {
                required: min_train + n_splits,
                actual: n,
            });
        }

        let mut folds = Vec::with_capacity(n_splits);
        for i in 0..n_splits {
            let train_end = min_train + i * test_size;
            let val_end = (train_end + test_size).min(n);
            if val_end <= train_end {
                break;
            }

            folds.push(WalkForwardFold {
                x_train: x.slice(s![..train_end, ..]).to_owned(),
                y_train: y.slice(s![..train_end]).to_owned(),
                x_val: x.slice(s![train_end..val_end, ..]).to_owned(),
                y_val: y.slice(s![train_end..val_end]).to_owned(),
                train_end,
                val_end,
            });
        }

        tracing::info!(
            folds = folds.len(),
            min_train,
            test_size,
            "Walk-forward splits generated"
        );

        Ok(folds)
    }

    /// 설정 구조체로 walk-forward 폴드를 생성합니다.
    pub fn walk_forward(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        config: &WalkForwardConfig,
    ) -> MlResult<Vec<WalkForwardFold>> {
        self.walk_forward_splits(x, y, config.n_splits, config.min_train_size)
    }
}

fn check_target_len(x: &Array2<f64>, y: &Array1<f64>) -> MlResult<()> {
    if x.nrows() != y.len() {
        return Err(MlError::ShapeMismatch {
            expected: format!("{} target values", x.nrows()),
            actual: format!("{} target values", y.len()),
        });
    }
    Ok(())
}

/// 학습 구간 마지막 시각이 테스트 구간 첫 시각보다 앞서는지 검사합니다.
///
/// 누수가 감지되면 false를 반환합니다. 인덱스가 범위를 벗어나거나
/// 시퀀스가 비어 있으면 판단할 수 없으므로 경고 후 true를 반환합니다.
pub fn verify_no_leakage(
    timestamps: &[DateTime<Utc>],
    train_end: usize,
    test_start: usize,
) -> bool {
    let (Some(last_train), Some(first_test)) =
        (timestamps.get(train_end), timestamps.get(test_start))
    else {
        tracing::warn!(
            len = timestamps.len(),
            train_end,
            test_start,
            "Leakage check skipped: index out of range"
        );
        return true;
    };

    if last_train >= first_test {
        tracing::error!(
            train_end,
            test_start,
            last_train = %last_train,
            first_test = %first_test,
            "Temporal leakage detected"
        );
        return false;
    }

    true
}
