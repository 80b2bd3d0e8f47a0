//! 변동성 지표 (Volatility Indicators).
//!
//! 가격 변동성을 측정하는 지표들을 제공합니다.
//! - Bollinger Bands (볼린저 밴드)
//! - True Range (실제 범위)
//! - ATR (Average True Range, 평균 실제 범위)

use serde::{Deserialize, Serialize};

use super::{ensure_same_len, wilder_smooth, IndicatorResult};

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20).
    pub period: usize,
    /// 표준편차 배수 (기본: 2.0).
    pub std_dev_multiplier: f64,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

/// 볼린저 밴드 결과. 세 밴드 모두 입력과 같은 길이입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerBandsResult {
    /// 상단 밴드 (MA + k × σ).
    pub upper: Vec<Option<f64>>,
    /// 중간 밴드 (이동평균).
    pub middle: Vec<Option<f64>>,
    /// 하단 밴드 (MA - k × σ).
    pub lower: Vec<Option<f64>>,
}

/// ATR 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtrParams {
    /// ATR 기간 (기본: 14).
    pub period: usize,
}

impl Default for AtrParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 변동성 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct VolatilityIndicators;

impl VolatilityIndicators {
    /// 새로운 변동성 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 볼린저 밴드 계산.
    ///
    /// - 중간 밴드 = SMA(period)
    /// - 상단 밴드 = 중간 + k × σ
    /// - 하단 밴드 = 중간 - k × σ
    ///
    /// σ는 윈도우의 모표준편차(N으로 나눔)입니다.
    pub fn bollinger_bands(
        &self,
        prices: &[f64],
        params: BollingerBandsParams,
    ) -> BollingerBandsResult {
        let n = prices.len();
        let period = params.period;
        let mut result = BollingerBandsResult {
            upper: vec![None; n],
            middle: vec![None; n],
            lower: vec![None; n],
        };
        if period == 0 || period > n {
            return result;
        }

        let p = period as f64;
        for i in period - 1..n {
            let window = &prices[i + 1 - period..=i];
            let mean = window.iter().sum::<f64>() / p;
            let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / p;
            let band = params.std_dev_multiplier * variance.sqrt();

            result.upper[i] = Some(mean + band);
            result.middle[i] = Some(mean);
            result.lower[i] = Some(mean - band);
        }

        result
    }

    /// True Range 계산.
    ///
    /// TR = max(고가 - 저가, |고가 - 이전 종가|, |저가 - 이전 종가|)
    ///
    /// 이전 종가가 없는 인덱스 0은 None입니다.
    pub fn true_range(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
    ) -> IndicatorResult<Vec<Option<f64>>> {
        let n = high.len();
        ensure_same_len(n, &[("low", low), ("close", close)])?;

        let mut result = vec![None; n];
        for i in 1..n {
            let prev_close = close[i - 1];
            let tr = (high[i] - low[i])
                .max((high[i] - prev_close).abs())
                .max((low[i] - prev_close).abs());
            result[i] = Some(tr);
        }

        Ok(result)
    }

    /// ATR (Average True Range) 계산.
    ///
    /// 첫 ATR은 TR[1..=period]의 평균이며 이후 Wilder 평활을 적용합니다.
    /// 처음 period개는 None이고, period가 입력 길이 이상이면 전부 None.
    pub fn atr(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        params: AtrParams,
    ) -> IndicatorResult<Vec<Option<f64>>> {
        let tr: Vec<f64> = self
            .true_range(high, low, close)?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();

        Ok(wilder_smooth(&tr, params.period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorError;

    #[test]
    fn test_bollinger_bands_basic() {
        let vol = VolatilityIndicators::new();
        let prices = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = vol.bollinger_bands(
            &prices,
            BollingerBandsParams {
                period: 8,
                std_dev_multiplier: 2.0,
            },
        );

        // 평균 5, 모표준편차 2
        assert!(result.middle[6].is_none());
        assert_eq!(result.middle[7], Some(5.0));
        assert_eq!(result.upper[7], Some(9.0));
        assert_eq!(result.lower[7], Some(1.0));
    }

    #[test]
    fn test_bollinger_bands_constant_collapse() {
        let vol = VolatilityIndicators::new();
        let prices = vec![10.0; 25];
        let result = vol.bollinger_bands(&prices, BollingerBandsParams::default());

        for i in 19..25 {
            assert_eq!(result.upper[i], Some(10.0));
            assert_eq!(result.lower[i], Some(10.0));
        }
    }

    #[test]
    fn test_bollinger_bands_period_too_large() {
        let vol = VolatilityIndicators::new();
        let result = vol.bollinger_bands(&[1.0, 2.0], BollingerBandsParams::default());
        assert!(result.middle.iter().all(Option::is_none));
    }

    #[test]
    fn test_true_range() {
        let vol = VolatilityIndicators::new();
        let high = vec![10.0, 12.0, 11.0];
        let low = vec![8.0, 11.0, 7.0];
        let close = vec![9.0, 11.5, 8.0];

        let tr = vol.true_range(&high, &low, &close).unwrap();

        assert_eq!(tr[0], None);
        // max(1, |12-9|, |11-9|) = 3
        assert_eq!(tr[1], Some(3.0));
        // max(4, |11-11.5|, |7-11.5|) = 4.5
        assert_eq!(tr[2], Some(4.5));
    }

    #[test]
    fn test_atr_seed_and_smoothing() {
        let vol = VolatilityIndicators::new();
        let high = vec![10.0, 11.0, 12.0, 13.0, 14.0];
        let low = vec![9.0, 10.0, 11.0, 12.0, 13.0];
        let close = vec![9.5, 10.5, 11.5, 12.5, 13.5];

        // 모든 TR = max(1, 1.5, 0.5) = 1.5
        let atr = vol
            .atr(&high, &low, &close, AtrParams { period: 2 })
            .unwrap();

        assert_eq!(atr[0], None);
        assert_eq!(atr[1], None);
        assert_eq!(atr[2], Some(1.5));
        assert_eq!(atr[4], Some(1.5));
    }

    #[test]
    fn test_atr_period_not_less_than_length() {
        let vol = VolatilityIndicators::new();
        let series = vec![1.0, 2.0, 3.0];
        let atr = vol
            .atr(&series, &series, &series, AtrParams { period: 3 })
            .unwrap();
        assert!(atr.iter().all(Option::is_none));
    }

    #[test]
    fn test_atr_length_mismatch() {
        let vol = VolatilityIndicators::new();
        let result = vol.atr(&[1.0, 2.0], &[1.0], &[1.0, 2.0], AtrParams::default());
        assert!(matches!(
            result,
            Err(IndicatorError::LengthMismatch { name: "low", .. })
        ));
    }
}
