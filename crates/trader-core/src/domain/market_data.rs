//! 시장 데이터 타입.
//!
//! 이 모듈은 피처 파이프라인의 입력 레코드를 정의합니다:
//! - `Ohlcv` - 한 시간 구간의 시가/고가/저가/종가/거래량

use crate::error::{TraderError, TraderResult};
use crate::types::{DecimalExt, Price, Quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV 캔들 레코드.
///
/// 수집 단계에서 한 심볼의 한 시간 구간을 나타냅니다.
/// 파이프라인은 레코드가 시간 오름차순으로 전달된다고 가정합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    /// 거래 심볼 (예: "BTC-USD")
    pub symbol: String,
    /// 구간 시작 시각
    pub timestamp: DateTime<Utc>,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량 (기준 자산 단위)
    pub volume: Quantity,
}

impl Ohlcv {
    /// 검증을 거쳐 새 레코드를 생성합니다.
    ///
    /// 심볼이 비어 있거나, 가격이 양수가 아니거나, 거래량이 음수이면
    /// `TraderError::InvalidInput`을 반환합니다. 고가/저가가 시가·종가와
    /// 어긋나는 경우는 경고 로그만 남기고 허용합니다.
    pub fn new(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Quantity,
    ) -> TraderResult<Self> {
        let record = Self {
            symbol: symbol.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        record.validate()?;
        Ok(record)
    }

    /// 레코드 값을 검증합니다.
    pub fn validate(&self) -> TraderResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(TraderError::InvalidInput("심볼이 비어 있습니다".to_string()));
        }

        if !(self.open.is_strictly_positive()
            && self.high.is_strictly_positive()
            && self.low.is_strictly_positive()
            && self.close.is_strictly_positive())
        {
            return Err(TraderError::InvalidInput(format!(
                "{} {}: 모든 가격은 양수여야 합니다",
                self.symbol, self.timestamp
            )));
        }

        if self.volume.is_strictly_negative() {
            return Err(TraderError::InvalidInput(format!(
                "{} {}: 거래량은 음수일 수 없습니다 ({})",
                self.symbol, self.timestamp, self.volume
            )));
        }

        if self.high < self.open.max(self.close) {
            tracing::warn!(
                symbol = %self.symbol,
                timestamp = %self.timestamp,
                high = %self.high,
                "High price is lower than open/close"
            );
        }

        if self.low > self.open.min(self.close) {
            tracing::warn!(
                symbol = %self.symbol,
                timestamp = %self.timestamp,
                low = %self.low,
                "Low price is higher than open/close"
            );
        }

        Ok(())
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 대표가(고가+저가+종가 평균)를 반환합니다.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }

    /// `[open, high, low, close, volume]` 순서의 f64 행으로 변환합니다.
    pub fn to_f64_row(&self) -> TraderResult<[f64; 5]> {
        Ok([
            self.open.to_f64_lossy()?,
            self.high.to_f64_lossy()?,
            self.low.to_f64_lossy()?,
            self.close.to_f64_lossy()?,
            self.volume.to_f64_lossy()?,
        ])
    }
}
