//! 거래량 기반 지표 (Volume-Based Indicators).
//!
//! ## OBV (On-Balance Volume)
//!
//! ### 계산 방식
//! - 종가 상승: OBV += 거래량
//! - 종가 하락: OBV -= 거래량
//! - 종가 동일: OBV 변화 없음
//!
//! ## VWAP (Volume Weighted Average Price)
//!
//! ### 계산 방식
//! - Typical Price (TP) = (High + Low + Close) / 3
//! - VWAP = Σ(TP × Volume) / Σ(Volume)
//!
//! 세션 리셋 없이 시계열 시작부터 누적합니다.

use super::{ensure_same_len, IndicatorResult};

/// 거래량 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct VolumeIndicators;

impl VolumeIndicators {
    /// 새로운 거래량 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// OBV (On-Balance Volume) 계산.
    ///
    /// 인덱스 0은 0에서 시작하며 모든 위치가 정의됩니다.
    pub fn obv(&self, close: &[f64], volume: &[f64]) -> IndicatorResult<Vec<Option<f64>>> {
        let n = close.len();
        ensure_same_len(n, &[("volume", volume)])?;

        let mut result = Vec::with_capacity(n);
        let mut obv = 0.0;
        for i in 0..n {
            if i > 0 {
                let change = close[i] - close[i - 1];
                if change > 0.0 {
                    obv += volume[i];
                } else if change < 0.0 {
                    obv -= volume[i];
                }
            }
            result.push(Some(obv));
        }

        Ok(result)
    }

    /// VWAP (Volume Weighted Average Price) 계산.
    ///
    /// 누적 거래량이 0 이하인 위치는 None입니다.
    pub fn vwap(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
        volume: &[f64],
    ) -> IndicatorResult<Vec<Option<f64>>> {
        let n = high.len();
        ensure_same_len(n, &[("low", low), ("close", close), ("volume", volume)])?;

        let mut result = Vec::with_capacity(n);
        let mut cumulative_tp_vol = 0.0; // Σ(TP × Volume)
        let mut cumulative_vol = 0.0; // Σ(Volume)

        for i in 0..n {
            let tp = (high[i] + low[i] + close[i]) / 3.0;
            cumulative_tp_vol += tp * volume[i];
            cumulative_vol += volume[i];

            result.push((cumulative_vol > 0.0).then(|| cumulative_tp_vol / cumulative_vol));
        }

        Ok(result)
    }
}
