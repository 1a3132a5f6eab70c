//! 시세 저장 및 보존 정책.
//!
//! 이 crate는 다음을 제공합니다:
//! - `QuoteStore` - 시세 저장소 경계 trait
//! - PostgreSQL 저장소 (`market_night_futures` 테이블)
//! - 테스트/로컬 실행용 메모리 저장소
//! - 레코드 개수 기반 보존 관리자

pub mod error;
pub mod retention;
pub mod storage;

pub use error::{DataError, Result};
pub use retention::RetentionManager;
pub use storage::memory::MemoryQuoteStore;
pub use storage::postgres::{Database, DatabaseConfig, PgQuoteStore};
pub use storage::QuoteStore;
