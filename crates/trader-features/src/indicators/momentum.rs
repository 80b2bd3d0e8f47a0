//! 모멘텀 지표 (Momentum Indicators).
//!
//! 가격 모멘텀과 과매수/과매도 상태를 측정하는 지표들을 제공합니다.
//! - RSI (Relative Strength Index)

use serde::{Deserialize, Serialize};

use super::wilder_smooth;

/// RSI 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsiParams {
    /// RSI 기간 (기본: 14).
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 모멘텀 지표 계산기.
#[derive(Debug, Default, Clone, Copy)]
pub struct MomentumCalculator;

impl MomentumCalculator {
    /// 새로운 모멘텀 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// RSI (Relative Strength Index) 계산.
    ///
    /// RSI = 100 - (100 / (1 + RS))
    /// RS = 평균 상승폭 / 평균 하락폭
    ///
    /// 첫 평균은 처음 period개 가격 변화의 단순 평균이며 이후 Wilder 평활
    /// (alpha = 1/period)을 적용합니다. 평균 하락폭이 0이면 100입니다.
    ///
    /// # 반환
    /// 각 시점의 RSI 값 (0-100). 처음 period개는 None이며,
    /// period가 가격 수 이상이면 전부 None.
    pub fn rsi(&self, prices: &[f64], params: RsiParams) -> Vec<Option<f64>> {
        let n = prices.len();
        let period = params.period;
        if period == 0 || period >= n {
            return vec![None; n];
        }

        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let change = prices[i] - prices[i - 1];
            if change > 0.0 {
                gains[i] = change;
            } else {
                losses[i] = -change;
            }
        }

        let avg_gain = wilder_smooth(&gains, period);
        let avg_loss = wilder_smooth(&losses, period);

        avg_gain
            .into_iter()
            .zip(avg_loss)
            .map(|(gain, loss)| {
                let (gain, loss) = (gain?, loss?);
                if loss == 0.0 {
                    Some(100.0)
                } else {
                    let rs = gain / loss;
                    Some(100.0 - 100.0 / (1.0 + rs))
                }
            })
            .collect()
    }
}
