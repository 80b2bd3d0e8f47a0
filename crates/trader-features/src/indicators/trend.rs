//! 추세 지표 (Trend Indicators).
//!
//! 이동평균 기반의 추세 지표들을 제공합니다.
//! - SMA (Simple Moving Average)
//! - EMA (Exponential Moving Average)
//! - MACD (Moving Average Convergence Divergence)

use serde::{Deserialize, Serialize};

/// SMA 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaParams {
    /// 이동평균 기간.
    pub period: usize,
}

impl Default for SmaParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// EMA 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmaParams {
    /// 이동평균 기간.
    pub period: usize,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self { period: 12 }
    }
}

/// MACD 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    /// 단기 EMA 기간 (기본: 12).
    pub fast_period: usize,
    /// 장기 EMA 기간 (기본: 26).
    pub slow_period: usize,
    /// 시그널 라인 기간 (기본: 9).
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD 결과. 세 시계열 모두 입력과 같은 길이입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    /// MACD 라인 (단기 EMA - 장기 EMA).
    pub macd: Vec<Option<f64>>,
    /// 시그널 라인 (MACD의 EMA).
    pub signal: Vec<Option<f64>>,
    /// 히스토그램 (MACD - 시그널).
    pub histogram: Vec<Option<f64>>,
}

/// 추세 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrendIndicators;

impl TrendIndicators {
    /// 새로운 추세 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 단순 이동평균 (SMA) 계산.
    ///
    /// SMA = (P1 + P2 + ... + Pn) / n
    ///
    /// 누적 합을 유지하며 윈도우를 한 칸씩 이동합니다.
    ///
    /// # 반환
    /// 각 시점의 SMA 값 (처음 period-1개는 None)
    pub fn sma(&self, prices: &[f64], params: SmaParams) -> Vec<Option<f64>> {
        let period = params.period;
        let n = prices.len();
        let mut result = vec![None; n];
        if period == 0 || period > n {
            return result;
        }

        let mut sum: f64 = prices[..period].iter().sum();
        result[period - 1] = Some(sum / period as f64);

        for i in period..n {
            sum += prices[i] - prices[i - period];
            result[i] = Some(sum / period as f64);
        }

        result
    }

    /// 지수 이동평균 (EMA) 계산.
    ///
    /// EMA = (현재가 × k) + (이전 EMA × (1 - k))
    /// k = 2 / (period + 1)
    ///
    /// `period-1` 위치를 처음 period개 가격의 SMA로 시드합니다.
    pub fn ema(&self, prices: &[f64], params: EmaParams) -> Vec<Option<f64>> {
        let period = params.period;
        let n = prices.len();
        let mut result = vec![None; n];
        if period == 0 || period > n {
            return result;
        }

        let k = 2.0 / (period as f64 + 1.0);
        let mut ema = prices[..period].iter().sum::<f64>() / period as f64;
        result[period - 1] = Some(ema);

        for i in period..n {
            ema = k * prices[i] + (1.0 - k) * ema;
            result[i] = Some(ema);
        }

        result
    }

    /// MACD 계산.
    ///
    /// MACD Line = 단기 EMA - 장기 EMA
    /// Signal Line = MACD Line의 EMA
    /// Histogram = MACD Line - Signal Line
    ///
    /// 시그널 라인은 MACD 라인이 처음 정의되는 지점부터의 구간에 대해
    /// EMA를 계산합니다. 그 구간이 시그널 기간보다 짧으면 시그널과
    /// 히스토그램은 전부 None입니다.
    pub fn macd(&self, prices: &[f64], params: MacdParams) -> MacdResult {
        let n = prices.len();
        let fast = self.ema(prices, EmaParams { period: params.fast_period });
        let slow = self.ema(prices, EmaParams { period: params.slow_period });

        let macd: Vec<Option<f64>> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();

        let mut signal = vec![None; n];
        if let Some(first) = macd.iter().position(Option::is_some) {
            let tail: Vec<f64> = macd[first..].iter().map(|v| v.unwrap_or(0.0)).collect();
            let tail_signal = self.ema(&tail, EmaParams { period: params.signal_period });
            signal[first..].copy_from_slice(&tail_signal);
        }

        let histogram = macd
            .iter()
            .zip(&signal)
            .map(|(m, s)| Some((*m)? - (*s)?))
            .collect();

        MacdResult {
            macd,
            signal,
            histogram,
        }
    }
}
