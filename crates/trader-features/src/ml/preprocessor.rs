//! 피처 행렬 전처리.
//!
//! fit/transform 방식으로 결측치 처리, 이상치 처리, 스케일링을 수행합니다.
//! 학습 구간에서 한 번 `fit`한 뒤 검증/테스트/추론 데이터에는 같은
//! 파라미터로 `transform`만 적용해야 합니다. 암묵적인 재학습은 없습니다.
//!
//! 결측치는 비유한 값(NaN, ±inf)입니다.
//!
//! # 처리 순서
//!
//! 1. 결측치 처리 (설정된 전략)
//! 2. 이상치 처리 (fit 시점의 경계)
//! 3. 스케일링 (fit 시점의 통계)

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::error::{MlError, MlResult};

/// 스케일이 퇴화했다고 판단하는 임계값. 이하이면 스케일 1을 사용합니다.
const MIN_SCALE: f64 = 1e-12;

/// 스케일러 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalerType {
    /// (x - 평균) / 표본표준편차
    Standard,
    /// (x - 중앙값) / IQR
    #[default]
    Robust,
    /// (x - 최소) / (최대 - 최소)
    MinMax,
    /// 스케일링 없음
    None,
}

impl ScalerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalerType::Standard => "standard",
            ScalerType::Robust => "robust",
            ScalerType::MinMax => "minmax",
            ScalerType::None => "none",
        }
    }
}

/// 결측치 처리 전략.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingStrategy {
    /// 결측치가 있는 행 제거
    #[serde(rename = "drop")]
    Drop,
    /// 직전 값으로 채움 (앞부분 결측은 유지)
    #[default]
    #[serde(rename = "ffill", alias = "forward_fill")]
    ForwardFill,
    /// 직후 값으로 채움 (뒷부분 결측은 유지)
    #[serde(rename = "bfill", alias = "backward_fill")]
    BackwardFill,
    /// 열 평균으로 채움
    #[serde(rename = "mean")]
    Mean,
    /// 선형 보간 (양 끝은 가장 가까운 값으로 연장)
    #[serde(rename = "interpolate")]
    Interpolate,
}

impl MissingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingStrategy::Drop => "drop",
            MissingStrategy::ForwardFill => "ffill",
            MissingStrategy::BackwardFill => "bfill",
            MissingStrategy::Mean => "mean",
            MissingStrategy::Interpolate => "interpolate",
        }
    }
}

/// 이상치 탐지 방법.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutlierMethod {
    /// [Q1 - k·IQR, Q3 + k·IQR]
    #[default]
    #[serde(rename = "iqr")]
    Iqr,
    /// 평균 ± t·모표준편차
    #[serde(rename = "zscore", alias = "z_score")]
    ZScore,
    /// 이상치 처리 없음
    #[serde(rename = "none")]
    None,
}

impl OutlierMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutlierMethod::Iqr => "iqr",
            OutlierMethod::ZScore => "zscore",
            OutlierMethod::None => "none",
        }
    }
}

/// 이상치 처리 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierTreatment {
    /// 경계로 자름
    #[default]
    Clip,
    /// 경계를 벗어난 값이 있는 행 제거
    Remove,
    /// 경계로 자름 (Clip과 동일)
    Winsorize,
}

impl OutlierTreatment {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutlierTreatment::Clip => "clip",
            OutlierTreatment::Remove => "remove",
            OutlierTreatment::Winsorize => "winsorize",
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display_as_str!(ScalerType, MissingStrategy, OutlierMethod, OutlierTreatment);

/// 전처리 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    /// 스케일러 종류
    pub scaler_type: ScalerType,
    /// 결측치 처리 전략
    pub missing_strategy: MissingStrategy,
    /// 이상치 탐지 방법
    pub outlier_method: OutlierMethod,
    /// 이상치 처리 방식
    pub outlier_treatment: OutlierTreatment,
    /// IQR 경계 승수
    pub iqr_multiplier: f64,
    /// z-score 임계값
    pub zscore_threshold: f64,
    /// 이상치 처리/스케일링에서 제외할 열 인덱스 (예: 시간 인코딩)
    pub exclude_from_scaling: Vec<usize>,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            scaler_type: ScalerType::Robust,
            missing_strategy: MissingStrategy::ForwardFill,
            outlier_method: OutlierMethod::Iqr,
            outlier_treatment: OutlierTreatment::Clip,
            iqr_multiplier: 3.0,
            zscore_threshold: 3.0,
            exclude_from_scaling: Vec::new(),
        }
    }
}

/// 열 하나의 이상치 경계.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }
}

/// fit으로 학습된 열별 파라미터.
///
/// `location`/`scale`의 의미는 스케일러 종류에 따라 다릅니다
/// (평균/표준편차, 중앙값/IQR, 최소/범위). 제외된 열은 (0, 1)이며
/// 이상치 경계가 없습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorState {
    /// fit 시점의 열 수
    pub n_features: usize,
    /// 이상치 처리/스케일링 대상 열 인덱스
    pub scalable_cols: Vec<usize>,
    /// 열별 위치 파라미터
    pub location: Vec<f64>,
    /// 열별 스케일 파라미터
    pub scale: Vec<f64>,
    /// 열별 이상치 경계
    pub bounds: Vec<Option<OutlierBounds>>,
}

impl PreprocessorConfig {
    /// 임계값 설정을 검증합니다.
    pub fn validate(&self) -> MlResult<()> {
        for (name, value) in [
            ("iqr_multiplier", self.iqr_multiplier),
            ("zscore_threshold", self.zscore_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MlError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl PreprocessorState {
    fn validate(&self) -> MlResult<()> {
        let n = self.n_features;
        if self.location.len() != n || self.scale.len() != n || self.bounds.len() != n {
            return Err(MlError::InvalidConfig(format!(
                "state vectors must have {} entries (location {}, scale {}, bounds {})",
                n,
                self.location.len(),
                self.scale.len(),
                self.bounds.len()
            )));
        }
        if let Some(&col) = self.scalable_cols.iter().find(|&&c| c >= n) {
            return Err(MlError::InvalidConfig(format!(
                "scalable column {} out of range for {} features",
                col, n
            )));
        }
        let bad_bounds =
            |b: &OutlierBounds| b.lower.is_nan() || b.upper.is_nan() || b.lower > b.upper;
        if self.bounds.iter().flatten().any(bad_bounds) {
            return Err(MlError::InvalidConfig(
                "outlier bounds must satisfy lower <= upper".to_string(),
            ));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(MlError::InvalidConfig(
                "scale parameters must be finite and non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// fit/transform 전처리기.
///
/// 한 인스턴스의 `fit`과 `transform`을 동시에 호출하려면 호출자가 직렬화해야 합니다.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessorConfig,
    state: Option<PreprocessorState>,
}

impl Preprocessor {
    /// 학습되지 않은 전처리기를 생성합니다.
    pub fn new(config: PreprocessorConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// 저장된 파라미터로 학습된 전처리기를 복원합니다.
    pub fn from_state(config: PreprocessorConfig, state: PreprocessorState) -> MlResult<Self> {
        state.validate()?;
        Ok(Self {
            config,
            state: Some(state),
        })
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    /// 학습된 파라미터. `fit` 이전에는 None.
    pub fn state(&self) -> Option<&PreprocessorState> {
        self.state.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// 모델 레지스트리에 저장할 설정 맵.
    pub fn config_map(&self) -> BTreeMap<String, String> {
        let n_features = self.state.as_ref().map_or(0, |s| s.n_features);
        [
            ("scaler_type", self.config.scaler_type.to_string()),
            ("missing_strategy", self.config.missing_strategy.to_string()),
            ("outlier_method", self.config.outlier_method.to_string()),
            ("outlier_treatment", self.config.outlier_treatment.to_string()),
            ("iqr_multiplier", self.config.iqr_multiplier.to_string()),
            ("zscore_threshold", self.config.zscore_threshold.to_string()),
            ("n_features", n_features.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// 학습 데이터로 이상치 경계와 스케일 통계를 계산합니다.
    ///
    /// 통계는 결측치 처리만 거친(이상치 처리 전) 데이터에서 계산합니다.
    /// 다시 호출하면 이전 파라미터를 대체합니다.
    pub fn fit(&mut self, x: &Array2<f64>) -> MlResult<()> {
        self.config.validate()?;
        if x.nrows() == 0 {
            return Err(MlError::InvalidInput("cannot fit on empty data".to_string()));
        }

        let n_features = x.ncols();
        for &col in &self.config.exclude_from_scaling {
            if col >= n_features {
                tracing::warn!(col, n_features, "Excluded column index out of range");
            }
        }
        let scalable_cols: Vec<usize> = (0..n_features)
            .filter(|c| !self.config.exclude_from_scaling.contains(c))
            .collect();

        let (clean, _) = self.handle_missing(x);
        if clean.nrows() == 0 {
            tracing::warn!("No complete rows after missing-value handling; using neutral parameters");
        }

        let mut location = vec![0.0; n_features];
        let mut scale = vec![1.0; n_features];
        let mut bounds = vec![None; n_features];

        for &c in &scalable_cols {
            let values = sorted_finite(clean.column(c));
            if values.is_empty() {
                continue;
            }

            bounds[c] = self.outlier_bounds(&values);
            if let Some((loc, sc)) = self.scale_params(&values) {
                location[c] = loc;
                scale[c] = sc;
            }
        }

        tracing::info!(
            scaler = %self.config.scaler_type,
            outlier_method = %self.config.outlier_method,
            rows = x.nrows(),
            features = n_features,
            scaled = scalable_cols.len(),
            "Preprocessor fitted"
        );

        self.state = Some(PreprocessorState {
            n_features,
            scalable_cols,
            location,
            scale,
            bounds,
        });
        Ok(())
    }

    /// fit 후 같은 입력을 변환합니다.
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> MlResult<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// 학습된 파라미터로 행렬을 변환합니다.
    pub fn transform(&self, x: &Array2<f64>) -> MlResult<Array2<f64>> {
        self.transform_with_index(x).map(|(data, _)| data)
    }

    /// 변환 결과와 함께 살아남은 입력 행 인덱스를 반환합니다.
    ///
    /// `Drop` 결측치 전략이나 `Remove` 이상치 처리로 행이 제거될 수 있으므로
    /// 호출자는 인덱스로 타깃을 다시 정렬합니다.
    pub fn transform_with_index(&self, x: &Array2<f64>) -> MlResult<(Array2<f64>, Vec<usize>)> {
        let state = self.fitted_state("transform")?;
        check_width(state, x)?;

        let (mut data, mut index) = self.handle_missing(x);

        if self.config.outlier_method != OutlierMethod::None {
            match self.config.outlier_treatment {
                OutlierTreatment::Clip | OutlierTreatment::Winsorize => {
                    for &c in &state.scalable_cols {
                        let Some(b) = state.bounds[c] else { continue };
                        data.column_mut(c)
                            .iter_mut()
                            .filter(|v| v.is_finite())
                            .for_each(|v| *v = b.clamp(*v));
                    }
                }
                OutlierTreatment::Remove => {
                    let keep: Vec<usize> = (0..data.nrows())
                        .filter(|&r| {
                            state.scalable_cols.iter().all(|&c| {
                                let v = data[[r, c]];
                                !v.is_finite() || state.bounds[c].map_or(true, |b| b.contains(v))
                            })
                        })
                        .collect();

                    let removed = data.nrows() - keep.len();
                    if removed > 0 {
                        tracing::debug!(removed, "Removed outlier rows");
                        data = data.select(Axis(0), &keep);
                        index = keep.iter().map(|&r| index[r]).collect();
                    }
                }
            }
        }

        if self.config.scaler_type != ScalerType::None {
            for &c in &state.scalable_cols {
                let (loc, sc) = (state.location[c], state.scale[c]);
                data.column_mut(c)
                    .iter_mut()
                    .filter(|v| v.is_finite())
                    .for_each(|v| *v = (*v - loc) / sc);
            }
        }

        Ok((data, index))
    }

    /// 스케일링의 역변환. 결측치 보간과 이상치 처리는 되돌리지 않습니다.
    pub fn inverse_transform(&self, x: &Array2<f64>) -> MlResult<Array2<f64>> {
        let state = self.fitted_state("inverse_transform")?;
        check_width(state, x)?;

        let mut data = x.clone();
        if self.config.scaler_type == ScalerType::None {
            return Ok(data);
        }

        for &c in &state.scalable_cols {
            let (loc, sc) = (state.location[c], state.scale[c]);
            data.column_mut(c)
                .iter_mut()
                .filter(|v| v.is_finite())
                .for_each(|v| *v = *v * sc + loc);
        }

        Ok(data)
    }

    fn fitted_state(&self, operation: &str) -> MlResult<&PreprocessorState> {
        self.state.as_ref().ok_or_else(|| {
            MlError::NotFitted(format!("Preprocessor must be fitted before {operation}"))
        })
    }

    /// 결측치를 처리한 복사본과 남은 행의 원래 인덱스를 반환합니다.
    fn handle_missing(&self, x: &Array2<f64>) -> (Array2<f64>, Vec<usize>) {
        let rows = x.nrows();

        if self.config.missing_strategy == MissingStrategy::Drop {
            let keep: Vec<usize> = (0..rows)
                .filter(|&r| x.row(r).iter().all(|v| v.is_finite()))
                .collect();
            return (x.select(Axis(0), &keep), keep);
        }

        let mut data = x.clone();
        for mut column in data.columns_mut() {
            match self.config.missing_strategy {
                MissingStrategy::ForwardFill => {
                    for r in 1..rows {
                        if !column[r].is_finite() {
                            column[r] = column[r - 1];
                        }
                    }
                }
                MissingStrategy::BackwardFill => {
                    for r in (0..rows.saturating_sub(1)).rev() {
                        if !column[r].is_finite() {
                            column[r] = column[r + 1];
                        }
                    }
                }
                MissingStrategy::Mean => {
                    let (sum, count) = column
                        .iter()
                        .filter(|v| v.is_finite())
                        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                    if count > 0 {
                        let mean = sum / count as f64;
                        column
                            .iter_mut()
                            .filter(|v| !v.is_finite())
                            .for_each(|v| *v = mean);
                    }
                }
                MissingStrategy::Interpolate => {
                    let valid: Vec<usize> = (0..rows).filter(|&r| column[r].is_finite()).collect();
                    let (Some(&first), Some(&last)) = (valid.first(), valid.last()) else {
                        continue;
                    };

                    for r in 0..first {
                        column[r] = column[first];
                    }
                    for r in last + 1..rows {
                        column[r] = column[last];
                    }
                    for pair in valid.windows(2) {
                        let (a, b) = (pair[0], pair[1]);
                        let gap = (b - a) as f64;
                        let (start, end) = (column[a], column[b]);
                        for r in a + 1..b {
                            column[r] = start + (end - start) * (r - a) as f64 / gap;
                        }
                    }
                }
                MissingStrategy::Drop => {}
            }
        }

        (data, (0..rows).collect())
    }

    /// 정렬된 값에서 이상치 경계를 계산합니다.
    fn outlier_bounds(&self, sorted: &[f64]) -> Option<OutlierBounds> {
        match self.config.outlier_method {
            OutlierMethod::Iqr => {
                let (q1, q3) = quartiles(sorted);
                let k = self.config.iqr_multiplier * (q3 - q1);
                Some(OutlierBounds {
                    lower: q1 - k,
                    upper: q3 + k,
                })
            }
            OutlierMethod::ZScore => {
                let (mean, var) = mean_and_sum_sq(sorted);
                // 모표준편차
                let std = (var / sorted.len() as f64).sqrt();
                let t = self.config.zscore_threshold * std;
                Some(OutlierBounds {
                    lower: mean - t,
                    upper: mean + t,
                })
            }
            OutlierMethod::None => None,
        }
    }

    /// 정렬된 값에서 (위치, 스케일) 파라미터를 계산합니다.
    fn scale_params(&self, sorted: &[f64]) -> Option<(f64, f64)> {
        let n = sorted.len();
        match self.config.scaler_type {
            ScalerType::Standard => {
                let (mean, sum_sq) = mean_and_sum_sq(sorted);
                let std = if n > 1 {
                    (sum_sq / (n - 1) as f64).sqrt()
                } else {
                    1.0
                };
                Some((mean, floor_scale(std)))
            }
            ScalerType::Robust => {
                let (q1, q3) = quartiles(sorted);
                Some((sorted[n / 2], floor_scale(q3 - q1)))
            }
            ScalerType::MinMax => {
                let (min, max) = (sorted[0], sorted[n - 1]);
                let range = max - min;
                Some((min, if range > MIN_SCALE { range } else { 1.0 }))
            }
            ScalerType::None => None,
        }
    }
}

fn check_width(state: &PreprocessorState, x: &Array2<f64>) -> MlResult<()> {
    if x.ncols() != state.n_features {
        return Err(MlError::ShapeMismatch {
            expected: format!("{} columns", state.n_features),
            actual: format!("{} columns", x.ncols()),
        });
    }
    Ok(())
}

fn sorted_finite(column: ArrayView1<f64>) -> Vec<f64> {
    let mut values: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
    values.sort_by(f64::total_cmp);
    values
}

/// 정렬된 값의 `n/4`, `3n/4` 위치 값.
fn quartiles(sorted: &[f64]) -> (f64, f64) {
    let n = sorted.len();
    (sorted[n / 4], sorted[3 * n / 4])
}

/// 평균과 편차 제곱합.
fn mean_and_sum_sq(values: &[f64]) -> (f64, f64) {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, sum_sq)
}

fn floor_scale(scale: f64) -> f64 {
    if scale < MIN_SCALE {
        1.0
    } else {
        scale
    }
}
