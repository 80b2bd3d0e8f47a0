//! # Trader Core
//!
//! 피처 파이프라인의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! 이 크레이트는 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - OHLCV 시장 데이터 레코드
//! - 가격/수량 Decimal 타입
//! - 에러 타입
//! - 계층형 설정 로딩
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
