//! 시장 데이터 수집 단계의 Decimal 유틸리티.
//!
//! 가격/거래량은 임의 정밀도 Decimal로 수집되고, 통계 계산 직전에
//! f64로 변환됩니다. 이 변환에서의 정밀도 손실은 허용됩니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{TraderError, TraderResult};

/// 가격 타입.
pub type Price = Decimal;

/// 거래량 타입.
pub type Quantity = Decimal;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 0보다 큰지 확인합니다. 0은 false입니다.
    fn is_strictly_positive(&self) -> bool;

    /// 0보다 작은지 확인합니다.
    fn is_strictly_negative(&self) -> bool;

    /// f64로 변환합니다.
    ///
    /// 표현 가능한 범위를 벗어나면 `TraderError::Data`를 반환합니다.
    fn to_f64_lossy(&self) -> TraderResult<f64>;
}

impl DecimalExt for Decimal {
    fn is_strictly_positive(&self) -> bool {
        *self > Decimal::ZERO
    }

    fn is_strictly_negative(&self) -> bool {
        *self < Decimal::ZERO
    }

    fn to_f64_lossy(&self) -> TraderResult<f64> {
        self.to_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| TraderError::Data(format!("f64로 변환할 수 없는 값: {}", self)))
    }
}
