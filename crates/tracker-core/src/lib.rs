//! # Tracker Core
//!
//! 야간선물 트래커 전반에서 공유하는 기본 타입을 제공합니다:
//! - `QuoteRecord` - 저장 단위가 되는 시세 레코드
//! - `Clock` - 현재 시각과 대기를 추상화한 시계 (실시간/수동)
//! - 로깅 인프라

pub mod clock;
pub mod logging;
pub mod quote;

pub use clock::{Clock, ManualClock, SystemClock};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use quote::QuoteRecord;
