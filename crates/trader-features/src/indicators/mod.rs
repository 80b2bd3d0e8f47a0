//! 기술적 지표 모듈.
//!
//! ML 피처 생성에 사용되는 기술적 지표를 f64 시계열 위에서 계산합니다.
//! 모든 함수는 입력과 같은 길이의 `Vec<Option<f64>>`를 반환하며,
//! 히스토리가 부족한 위치는 `None`(미정의)입니다. 기간이 0이거나
//! 입력 길이보다 크면 전체가 `None`입니다.
//!
//! # 지원 지표
//!
//! ## 추세 지표 (Trend Indicators)
//! - **SMA**: 단순 이동평균 (Simple Moving Average)
//! - **EMA**: 지수 이동평균 (Exponential Moving Average), SMA로 시드
//! - **MACD**: 이동평균 수렴/확산 (Moving Average Convergence Divergence)
//!
//! ## 모멘텀 지표 (Momentum Indicators)
//! - **RSI**: 상대강도지수 (Relative Strength Index), Wilder 평활
//!
//! ## 변동성 지표 (Volatility Indicators)
//! - **Bollinger Bands**: 볼린저 밴드 (모표준편차)
//! - **True Range**: 실제 범위
//! - **ATR**: 평균 실제 범위 (Average True Range), Wilder 평활
//!
//! ## 거래량 지표 (Volume Indicators)
//! - **OBV**: 누적 거래량 균형 (On-Balance Volume)
//! - **VWAP**: 거래량 가중 평균 가격
//!
//! # 사용 예시
//!
//! ```
//! use trader_features::indicators::{IndicatorEngine, RsiParams, SmaParams};
//!
//! let engine = IndicatorEngine::new();
//! let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
//!
//! let sma = engine.sma(&prices, SmaParams { period: 20 });
//! assert!(sma[18].is_none());
//! assert!(sma[19].is_some());
//!
//! let rsi = engine.rsi(&prices, RsiParams { period: 14 });
//! assert_eq!(rsi[29], Some(100.0));
//! ```

pub mod momentum;
pub mod trend;
pub mod volatility;
pub mod volume;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use momentum::{MomentumCalculator, RsiParams};
pub use trend::{EmaParams, MacdParams, MacdResult, SmaParams, TrendIndicators};
pub use volatility::{AtrParams, BollingerBandsParams, BollingerBandsResult, VolatilityIndicators};
pub use volume::VolumeIndicators;

/// OHLCV 기본 컬럼 이름 (입력 행렬의 컬럼 순서).
pub const OHLCV_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// 기간 목록과 무관한 지표 컬럼 수: rsi, macd(3), bb(3), atr, true_range, obv, vwap.
const FIXED_INDICATOR_COLUMNS: usize = 11;

/// 지표 계산 오류.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 입력 시계열 길이 불일치
    #[error("입력 길이가 일치하지 않습니다: {name} 기대 {expected}개, 제공 {actual}개")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// 다중 입력 지표의 길이를 검증합니다.
pub(crate) fn ensure_same_len(
    expected: usize,
    series: &[(&'static str, &[f64])],
) -> IndicatorResult<()> {
    for &(name, values) in series {
        if values.len() != expected {
            return Err(IndicatorError::LengthMismatch {
                name,
                expected,
                actual: values.len(),
            });
        }
    }
    Ok(())
}

/// Wilder 평활 (alpha = 1/period).
///
/// `values[1..=period]`의 단순 평균으로 `period` 위치를 시드하고 이후
/// `avg[i] = alpha * x[i] + (1 - alpha) * avg[i-1]`로 갱신합니다.
/// 인덱스 0은 직전 값이 없는 자리(가격 차분, True Range)이므로 사용하지 않습니다.
pub(crate) fn wilder_smooth(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || period >= n {
        return result;
    }

    let alpha = 1.0 / period as f64;
    let mut avg = values[1..=period].iter().sum::<f64>() / period as f64;
    result[period] = Some(avg);

    for i in period + 1..n {
        avg = alpha * values[i] + (1.0 - alpha) * avg;
        result[i] = Some(avg);
    }

    result
}

/// 배치 지표 계산 설정.
///
/// 기본값은 시간봉 암호화폐 데이터 기준입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// 계산할 SMA 기간
    pub sma_periods: Vec<usize>,
    /// 계산할 EMA 기간
    pub ema_periods: Vec<usize>,
    /// RSI 기간
    pub rsi_period: usize,
    /// MACD 파라미터
    pub macd_params: MacdParams,
    /// Bollinger Bands 기간
    pub bb_period: usize,
    /// Bollinger Bands 표준편차 승수
    pub bb_std_dev: f64,
    /// ATR 기간
    pub atr_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_periods: vec![7, 14, 30, 50, 200],
            ema_periods: vec![12, 26, 50],
            rsi_period: 14,
            macd_params: MacdParams::default(),
            bb_period: 20,
            bb_std_dev: 2.0,
            atr_period: 14,
        }
    }
}

impl IndicatorConfig {
    /// `build_all` 결과의 컬럼 이름을 순서대로 반환.
    ///
    /// OHLCV 5개 컬럼 다음에 SMA, EMA, RSI, MACD(3), Bollinger(3), ATR,
    /// True Range, OBV, VWAP 순서로 이어집니다.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = OHLCV_COLUMNS.iter().map(|s| s.to_string()).collect();
        names.extend(self.sma_periods.iter().map(|p| format!("sma_{}", p)));
        names.extend(self.ema_periods.iter().map(|p| format!("ema_{}", p)));
        names.push(format!("rsi_{}", self.rsi_period));
        names.extend(["macd", "macd_signal", "macd_hist"].map(String::from));
        names.extend(["bb_upper", "bb_middle", "bb_lower"].map(String::from));
        names.push(format!("atr_{}", self.atr_period));
        names.extend(["true_range", "obv", "vwap"].map(String::from));
        names
    }

    /// `build_all` 결과의 컬럼 수.
    pub fn column_count(&self) -> usize {
        OHLCV_COLUMNS.len()
            + self.sma_periods.len()
            + self.ema_periods.len()
            + FIXED_INDICATOR_COLUMNS
    }

    /// 가장 긴 워밍업 구간 (첫 완전 정의 행의 인덱스).
    pub fn max_lookback(&self) -> usize {
        let max_sma = self.sma_periods.iter().max().map_or(0, |p| p.saturating_sub(1));
        let max_ema = self.ema_periods.iter().max().map_or(0, |p| p.saturating_sub(1));
        let macd = &self.macd_params;
        let macd_lookback = (macd.fast_period.max(macd.slow_period) + macd.signal_period)
            .saturating_sub(2);

        [
            max_sma,
            max_ema,
            self.rsi_period,
            macd_lookback,
            self.bb_period.saturating_sub(1),
            self.atr_period,
            1, // true range
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// `build_all` 결과: `[OHLCV | 지표...]` 행렬과 컬럼 이름.
#[derive(Debug, Clone)]
pub struct IndicatorMatrix {
    /// 행 = 시점, 열 = 컬럼. `None`은 미정의 값.
    pub data: Array2<Option<f64>>,
    /// `data`의 컬럼 이름
    pub column_names: Vec<String>,
}

/// 통합 지표 엔진.
///
/// 모든 기술적 지표 계산을 위한 통합 인터페이스를 제공합니다.
/// 상태가 없으므로 여러 스레드에서 공유해도 됩니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndicatorEngine {
    trend: TrendIndicators,
    momentum: MomentumCalculator,
    volatility: VolatilityIndicators,
    volume: VolumeIndicators,
}

impl IndicatorEngine {
    /// 새로운 지표 엔진 생성.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 추세 지표 ====================

    /// 단순 이동평균 (SMA) 계산.
    pub fn sma(&self, prices: &[f64], params: SmaParams) -> Vec<Option<f64>> {
        self.trend.sma(prices, params)
    }

    /// 지수 이동평균 (EMA) 계산.
    pub fn ema(&self, prices: &[f64], params: EmaParams) -> Vec<Option<f64>> {
        self.trend.ema(prices, params)
    }

    /// MACD 라인, 시그널 라인, 히스토그램 계산.
    pub fn macd(&self, prices: &[f64], params: MacdParams) -> MacdResult {
        self.trend.macd(prices, params)
    }

    // ==================== 모멘텀 지표 ====================

    /// RSI 계산 (0-100).
    pub fn rsi(&self, prices: &[f64], params: RsiParams) -> Vec<Option<f64>> {
        self.momentum.rsi(prices, params)
    }

    // ==================== 변동성 지표 ====================

    /// 볼린저 밴드 계산.
    pub fn bollinger_bands(
        &self,
        prices: &[f64],
        params: BollingerBandsParams,
    ) -> BollingerBandsResult {
        self.volatility.bollinger_bands(prices, params)
    }

    /// True Range 계산 (인덱스 0은 미정의).
    pub fn true_range(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
    ) -> IndicatorResult<Vec<Option<f64>>> {
        self.volatility.true_range(high, low, close)
    }

    /// ATR 계산.
    pub fn atr(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        params: AtrParams,
    ) -> IndicatorResult<Vec<Option<f64>>> {
        self.volatility.atr(high, low, close, params)
    }

    // ==================== 거래량 지표 ====================

    /// OBV 계산.
    pub fn obv(&self, close: &[f64], volume: &[f64]) -> IndicatorResult<Vec<Option<f64>>> {
        self.volume.obv(close, volume)
    }

    /// VWAP 계산.
    pub fn vwap(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        volume: &[f64],
    ) -> IndicatorResult<Vec<Option<f64>>> {
        self.volume.vwap(high, low, close, volume)
    }

    // ==================== 배치 계산 ====================

    /// OHLCV 행렬에 설정된 모든 지표를 붙인 행렬을 생성합니다.
    ///
    /// # 인자
    /// * `ohlcv` - `[open, high, low, close, volume]` 5개 컬럼 행렬
    /// * `config` - 지표 기간 설정
    ///
    /// # 반환
    /// 컬럼 순서는 [`IndicatorConfig::column_names`]와 같습니다.
    pub fn build_all(
        &self,
        ohlcv: ArrayView2<f64>,
        config: &IndicatorConfig,
    ) -> IndicatorResult<IndicatorMatrix> {
        if ohlcv.ncols() != OHLCV_COLUMNS.len() {
            return Err(IndicatorError::InvalidParameter(format!(
                "OHLCV 행렬은 5개 컬럼이어야 합니다 (제공: {})",
                ohlcv.ncols()
            )));
        }

        let high = ohlcv.column(1).to_vec();
        let low = ohlcv.column(2).to_vec();
        let close = ohlcv.column(3).to_vec();
        let volume = ohlcv.column(4).to_vec();

        let column_names = config.column_names();
        let mut data = Array2::from_elem((ohlcv.nrows(), column_names.len()), None);
        data.slice_mut(ndarray::s![.., ..OHLCV_COLUMNS.len()])
            .assign(&ohlcv.mapv(Some));

        let mut col = OHLCV_COLUMNS.len();
        let mut put = |values: Vec<Option<f64>>| {
            data.column_mut(col)
                .iter_mut()
                .zip(values)
                .for_each(|(dst, v)| *dst = v);
            col += 1;
        };

        for &period in &config.sma_periods {
            put(self.sma(&close, SmaParams { period }));
        }
        for &period in &config.ema_periods {
            put(self.ema(&close, EmaParams { period }));
        }
        put(self.rsi(&close, RsiParams { period: config.rsi_period }));

        let macd = self.macd(&close, config.macd_params);
        put(macd.macd);
        put(macd.signal);
        put(macd.histogram);

        let bb = self.bollinger_bands(
            &close,
            BollingerBandsParams {
                period: config.bb_period,
                std_dev_multiplier: config.bb_std_dev,
            },
        );
        put(bb.upper);
        put(bb.middle);
        put(bb.lower);

        put(self.atr(&high, &low, &close, AtrParams { period: config.atr_period })?);
        put(self.true_range(&high, &low, &close)?);
        put(self.obv(&close, &volume)?);
        put(self.vwap(&high, &low, &close, &volume)?);

        debug_assert_eq!(col, column_names.len());

        Ok(IndicatorMatrix { data, column_names })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn sample_ohlcv(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 5), |(i, c)| {
            let close = 100.0 + 0.5 * i as f64 + 2.0 * (0.3 * i as f64).sin();
            match c {
                0 => close,
                1 => close + 2.0,
                2 => close - 2.0,
                3 => close,
                _ => 1000.0 + (i % 10) as f64 * 100.0,
            }
        })
    }

    #[test]
    fn test_column_names_order() {
        let config = IndicatorConfig {
            sma_periods: vec![5],
            ema_periods: vec![3, 8],
            ..Default::default()
        };

        let names = config.column_names();
        assert_eq!(names.len(), config.column_count());
        assert_eq!(
            names,
            vec![
                "open", "high", "low", "close", "volume", "sma_5", "ema_3", "ema_8", "rsi_14",
                "macd", "macd_signal", "macd_hist", "bb_upper", "bb_middle", "bb_lower",
                "atr_14", "true_range", "obv", "vwap",
            ]
        );
    }

    #[test]
    fn test_column_count_matches_names() {
        let config = IndicatorConfig::default();
        // OHLCV 5 + SMA 5 + EMA 3 + 고정 11
        assert_eq!(config.column_count(), 24);
        assert_eq!(config.column_names().len(), config.column_count());

        let config = IndicatorConfig {
            sma_periods: Vec::new(),
            ema_periods: Vec::new(),
            ..Default::default()
        };
        assert_eq!(config.column_count(), 16);
        assert_eq!(config.column_names().len(), 16);
    }

    #[test]
    fn test_build_all_shape_and_base_columns() {
        let engine = IndicatorEngine::new();
        let ohlcv = sample_ohlcv(60);
        let config = IndicatorConfig {
            sma_periods: vec![5, 10],
            ema_periods: vec![12],
            ..Default::default()
        };

        let result = engine.build_all(ohlcv.view(), &config).unwrap();

        assert_eq!(result.data.nrows(), 60);
        assert_eq!(result.data.ncols(), result.column_names.len());
        for i in 0..60 {
            for c in 0..5 {
                assert_eq!(result.data[[i, c]], Some(ohlcv[[i, c]]));
            }
        }

        // sma_5: 처음 4개는 None
        let sma_col = result.column_names.iter().position(|n| n == "sma_5").unwrap();
        assert!(result.data[[3, sma_col]].is_none());
        assert!(result.data[[4, sma_col]].is_some());
    }

    #[test]
    fn test_build_all_rejects_wrong_width() {
        let engine = IndicatorEngine::new();
        let bad = Array2::<f64>::zeros((10, 4));
        let result = engine.build_all(bad.view(), &IndicatorConfig::default());
        assert!(matches!(result, Err(IndicatorError::InvalidParameter(_))));
    }

    #[test]
    fn test_max_lookback_matches_first_complete_row() {
        let engine = IndicatorEngine::new();
        let ohlcv = sample_ohlcv(120);
        let config = IndicatorConfig {
            sma_periods: vec![7, 30],
            ..Default::default()
        };

        let result = engine.build_all(ohlcv.view(), &config).unwrap();
        let first_complete = (0..result.data.nrows())
            .find(|&i| result.data.row(i).iter().all(Option::is_some))
            .unwrap();

        assert_eq!(first_complete, config.max_lookback());
    }

    #[test]
    fn test_wilder_smooth_seed() {
        let values = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let smoothed = wilder_smooth(&values, 2);

        assert_eq!(smoothed[0], None);
        assert_eq!(smoothed[1], None);
        assert_eq!(smoothed[2], Some(1.5));
        // 0.5 * 3 + 0.5 * 1.5
        assert_eq!(smoothed[3], Some(2.25));
        assert!(wilder_smooth(&values, 5).iter().all(Option::is_none));
    }

    #[test]
    fn test_length_mismatch() {
        let engine = IndicatorEngine::new();
        let result = engine.obv(&[1.0, 2.0, 3.0], &[10.0, 20.0]);
        assert!(matches!(
            result,
            Err(IndicatorError::LengthMismatch { expected: 3, actual: 2, .. })
        ));
    }
}
