//! KRX 야간 선물 시세 수집기.
//!
//! 이 crate는 야간장(18:00 ~ 06:00 KST) 동안 분 단위로 KOSPI200 최근월
//! 지수선물 시세를 수집하는 데몬과 보조 CLI를 제공합니다:
//! - 세션 판단 및 분 단위 드리프트 보정 (`session`)
//! - 수집 상태 머신 (`monitor`)
//! - 환경변수 설정 (`config`)

pub mod config;
pub mod error;
pub mod monitor;
pub mod session;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use monitor::{decide, Action, Decision, MonitorLoop, MonitorSettings, MonitorState};
pub use session::SessionClock;
pub use stats::CollectionStats;
