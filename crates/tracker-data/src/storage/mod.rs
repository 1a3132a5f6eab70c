//! 시세 저장소.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracker_core::QuoteRecord;

use crate::Result;

/// 시세 저장소 경계.
///
/// 수집 루프와 보존 정책이 쓰는 최소 연산만 노출합니다.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// 시세 1건 추가.
    async fn insert(&self, record: QuoteRecord) -> Result<()>;

    /// `recorded_at` 내림차순으로 `offset`개를 건너뛴 레코드의 시각.
    ///
    /// `offset = 0`이면 가장 최근 레코드. 레코드가 부족하면 `None`.
    async fn recorded_at_from_latest(&self, offset: u64) -> Result<Option<DateTime<Utc>>>;

    /// `recorded_at <= cutoff` 인 레코드를 모두 삭제하고 삭제 건수를 반환.
    async fn delete_through(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// 저장된 레코드 수.
    async fn count(&self) -> Result<u64>;
}
