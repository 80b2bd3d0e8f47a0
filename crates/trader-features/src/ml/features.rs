//! ML 모델을 위한 feature engineering.
//!
//! 시간순 OHLCV 레코드에서 기술 지표, 수익률, 래그, 롤링 통계,
//! 다중 호라이즌 피처, 시간 인코딩을 계산해 이름이 붙은 피처 행렬을 만듭니다.
//!
//! 빌드는 두 단계로 진행됩니다:
//! 1. 설정에서 전체 컬럼 스키마를 먼저 계산해 행렬을 한 번에 할당
//! 2. 각 피처 그룹을 인덱스로 채운 뒤 미정의 값이 있는 행을 제거
//!
//! # 컬럼 순서
//!
//! ```text
//! [OHLCV | 지표 | ret_h | close_lag_l, vol_lag_l | roll_*_w | hz_*_h | hour, dayofweek, month]
//! ```

use chrono::{DateTime, Datelike, Timelike, Utc};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use trader_core::Ohlcv;

use crate::indicators::{IndicatorConfig, IndicatorEngine, SmaParams, TrendIndicators};
use crate::ml::{FeatureMatrix, MlError, MlResult};

/// 변동성 비율 계산 시 평균이 0으로 간주되는 임계값.
const MEAN_EPSILON: f64 = 1e-12;

/// 미정의 값이 있는 행의 처리 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFilter {
    /// 하나라도 미정의 값이 있는 행 제거 (가장 긴 lookback에 맞춰 정렬)
    #[default]
    DropIncomplete,
    /// 모든 행 유지, 미정의 값은 NaN으로 표시
    ///
    /// [`FeatureMatrix::validity_mask`]로 피처별 유효 구간을 고릅니다.
    KeepAll,
}

/// feature 빌드 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureBuilderConfig {
    /// 기술 지표 설정
    pub indicators: IndicatorConfig,
    /// 단기/중기/장기 호라이즌 (봉 수)
    pub horizons: Vec<usize>,
    /// 종가/거래량 래그
    pub lags: Vec<usize>,
    /// 롤링 통계 윈도우 크기
    pub rolling_windows: Vec<usize>,
    /// 시간 인코딩(hour, dayofweek, month) 포함 여부
    pub include_temporal: bool,
    /// 미정의 행 처리 방식
    pub row_filter: RowFilter,
}

impl Default for FeatureBuilderConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorConfig::default(),
            horizons: vec![1, 6, 24],
            lags: vec![1, 6, 24],
            rolling_windows: vec![6, 20],
            include_temporal: true,
            row_filter: RowFilter::default(),
        }
    }
}

impl FeatureBuilderConfig {
    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> MlResult<()> {
        let groups = [
            ("horizons", &self.horizons),
            ("lags", &self.lags),
            ("rolling_windows", &self.rolling_windows),
        ];
        for (name, values) in groups {
            if values.contains(&0) {
                return Err(MlError::InvalidConfig(format!(
                    "{name} must be positive, got {values:?}"
                )));
            }
        }
        Ok(())
    }

    /// 출력 행렬의 전체 컬럼 이름을 순서대로 반환.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.indicators.column_names();
        names.reserve(self.column_count() - names.len());

        names.extend(self.horizons.iter().map(|h| format!("ret_{}", h)));
        for lag in &self.lags {
            names.push(format!("close_lag_{}", lag));
            names.push(format!("vol_lag_{}", lag));
        }
        for w in &self.rolling_windows {
            names.push(format!("roll_mean_{}", w));
            names.push(format!("roll_std_{}", w));
            names.push(format!("roll_vol_mean_{}", w));
        }
        for h in &self.horizons {
            names.push(format!("hz_roll_mean_{}", h));
            names.push(format!("hz_roll_std_{}", h));
            names.push(format!("hz_vol_mean_{}", h));
            names.push(format!("hz_momentum_{}", h));
            names.push(format!("hz_vol_ratio_{}", h));
        }
        if self.include_temporal {
            names.extend(["hour", "dayofweek", "month"].map(String::from));
        }
        names
    }

    /// 예상되는 feature 컬럼 수 반환.
    pub fn column_count(&self) -> usize {
        // OHLCV + 지표
        let base = self.indicators.column_count();
        // 수익률
        let returns = self.horizons.len();
        // 종가/거래량 래그
        let lags = 2 * self.lags.len();
        // 평균, 표준편차, 거래량 평균
        let rolling = 3 * self.rolling_windows.len();
        // 평균, 표준편차, 거래량 평균, 모멘텀, 변동성 비율
        let horizon = 5 * self.horizons.len();
        let temporal = if self.include_temporal { 3 } else { 0 };

        base + returns + lags + rolling + horizon + temporal
    }
}

/// OHLCV 레코드를 피처 행렬로 변환하는 빌더.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureBuilderConfig,
    engine: IndicatorEngine,
}

impl FeatureBuilder {
    /// 설정을 검증하고 새 빌더를 생성합니다.
    pub fn new(config: FeatureBuilderConfig) -> MlResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            engine: IndicatorEngine::new(),
        })
    }

    /// 기본 설정으로 빌더 생성.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// 설정 반환.
    pub fn config(&self) -> &FeatureBuilderConfig {
        &self.config
    }

    /// 피처 행렬을 생성합니다.
    ///
    /// 레코드는 시간 오름차순이어야 합니다. 모든 행이 제거되면
    /// (입력이 가장 긴 lookback보다 짧은 경우) 컬럼 정보만 있는
    /// 0행 행렬을 반환합니다.
    pub fn build_features(&self, records: &[Ohlcv]) -> MlResult<FeatureMatrix> {
        let symbol = records.first().map(|r| r.symbol.as_str()).unwrap_or("");
        let span = trader_core::pipeline_span!("build_features", symbol);
        let _guard = span.enter();

        let column_names = self.config.column_names();
        let n = records.len();
        if n == 0 {
            tracing::debug!("No records; returning empty feature matrix");
            return FeatureMatrix::new(
                Array2::zeros((0, column_names.len())),
                column_names,
                Vec::new(),
            );
        }

        let timestamps: Vec<DateTime<Utc>> = records.iter().map(|r| r.timestamp).collect();
        let mut ohlcv = Array2::<f64>::zeros((n, 5));
        for (i, record) in records.iter().enumerate() {
            let row = record.to_f64_row()?;
            ohlcv.row_mut(i).assign(&ndarray::aview1(&row));
        }

        let base = self.engine.build_all(ohlcv.view(), &self.config.indicators)?;
        let close = ohlcv.column(3).to_vec();
        let volume = ohlcv.column(4).to_vec();

        let mut data = Array2::<Option<f64>>::from_elem((n, column_names.len()), None);
        let base_cols = base.column_names.len();
        data.slice_mut(s![.., ..base_cols]).assign(&base.data);

        let mut col = base_cols;
        let mut put = |values: Vec<Option<f64>>| {
            for (dst, v) in data.column_mut(col).iter_mut().zip(values) {
                *dst = v;
            }
            col += 1;
        };

        for &h in &self.config.horizons {
            put(pct_change(&close, h));
        }

        for &lag in &self.config.lags {
            put(shift(&close, lag));
            put(shift(&volume, lag));
        }

        for &w in &self.config.rolling_windows {
            put(rolling_mean(&close, w));
            put(rolling_std(&close, w));
            put(rolling_mean(&volume, w));
        }

        for &h in &self.config.horizons {
            let mean = rolling_mean(&close, h);
            let std = rolling_std(&close, h);
            let ratio = volatility_ratio(&std, &mean);
            put(mean);
            put(std);
            put(rolling_mean(&volume, h));
            put(momentum(&close, h));
            put(ratio);
        }

        if self.config.include_temporal {
            put(timestamps.iter().map(|t| Some(t.hour() as f64)).collect());
            put(timestamps
                .iter()
                .map(|t| Some(t.weekday().num_days_from_sunday() as f64))
                .collect());
            put(timestamps.iter().map(|t| Some(t.month() as f64)).collect());
        }

        if col != column_names.len() {
            return Err(MlError::FeatureExtraction(format!(
                "filled {} of {} columns",
                col,
                column_names.len()
            )));
        }

        let matrix = match self.config.row_filter {
            RowFilter::DropIncomplete => drop_incomplete_rows(data, column_names, timestamps)?,
            RowFilter::KeepAll => FeatureMatrix::new(
                data.mapv(|v| v.unwrap_or(f64::NAN)),
                column_names,
                timestamps,
            )?,
        };

        tracing::info!(
            rows = matrix.rows(),
            cols = matrix.cols(),
            "Feature matrix built"
        );

        Ok(matrix)
    }
}

/// 미정의(또는 비유한) 값이 하나라도 있는 행을 제거합니다.
fn drop_incomplete_rows(
    data: Array2<Option<f64>>,
    column_names: Vec<String>,
    timestamps: Vec<DateTime<Utc>>,
) -> MlResult<FeatureMatrix> {
    let is_defined = |v: &Option<f64>| v.is_some_and(f64::is_finite);
    let keep: Vec<usize> = data
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().all(is_defined))
        .map(|(i, _)| i)
        .collect();

    let removed = data.nrows() - keep.len();
    if removed > 0 {
        tracing::info!(
            removed,
            remaining = keep.len(),
            "Removed rows containing undefined values"
        );
    }

    let filtered = data
        .select(ndarray::Axis(0), &keep)
        .mapv(|v| v.unwrap_or(f64::NAN));
    let timestamps = keep.iter().map(|&i| timestamps[i]).collect();

    FeatureMatrix::new(filtered, column_names, timestamps)
}

/// h 기간 변화율: `(x[i] - x[i-h]) / x[i-h]`. 분모가 0이면 None.
pub fn pct_change(data: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..data.len())
        .map(|i| {
            let prev = data[i.checked_sub(period)?];
            (prev != 0.0).then(|| (data[i] - prev) / prev)
        })
        .collect()
}

/// `lag`칸 뒤로 민 시계열 (`x[i-lag]`).
pub fn shift(data: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..data.len())
        .map(|i| i.checked_sub(lag).map(|j| data[j]))
        .collect()
}

/// h 기간 모멘텀: `x[i] - x[i-h]`.
pub fn momentum(data: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..data.len())
        .map(|i| i.checked_sub(period).map(|j| data[i] - data[j]))
        .collect()
}

/// 롤링 평균 (SMA와 동일).
pub fn rolling_mean(data: &[f64], window: usize) -> Vec<Option<f64>> {
    TrendIndicators::new().sma(data, SmaParams { period: window })
}

/// 롤링 표본표준편차 (n-1로 나눔). 윈도우가 1이면 0.
///
/// 볼린저 밴드의 모표준편차와 다른 관례입니다.
pub fn rolling_std(data: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = data.len();
    let mut result = vec![None; n];
    if window == 0 || window > n {
        return result;
    }

    for i in window - 1..n {
        if window == 1 {
            result[i] = Some(0.0);
            continue;
        }
        let slice = &data[i + 1 - window..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let sum_sq: f64 = slice.iter().map(|x| (x - mean).powi(2)).sum();
        result[i] = Some((sum_sq / (window - 1) as f64).sqrt());
    }

    result
}

/// 변동성 비율 `std / mean`. 평균이 0에 가깝거나 어느 쪽이든 미정의면 None.
fn volatility_ratio(std: &[Option<f64>], mean: &[Option<f64>]) -> Vec<Option<f64>> {
    std.iter()
        .zip(mean)
        .map(|(s, m)| {
            let (s, m) = ((*s)?, (*m)?);
            (m.abs() >= MEAN_EPSILON).then(|| s / m)
        })
        .collect()
}
