//! # Tracker Notification
//!
//! 수집 결과를 화면 쪽에 알리는 하위 캐시 무효화.
//!
//! 지원 채널:
//! - 프론트엔드 revalidate 웹훅 (`GET {FRONTEND_URL}/api/revalidate`)

pub mod revalidate;
pub mod types;

pub use revalidate::*;
pub use types::*;
