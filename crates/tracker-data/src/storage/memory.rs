//! 메모리 시세 저장소.
//!
//! 테스트와 DB 없는 로컬 실행(`--dry-run`)에서 사용합니다.
//! 장애 주입 스위치로 저장 실패 경로를 재현할 수 있습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracker_core::QuoteRecord;

use super::QuoteStore;
use crate::error::{DataError, Result};

/// 메모리 저장소.
#[derive(Debug, Default)]
pub struct MemoryQuoteStore {
    records: Mutex<Vec<QuoteRecord>>,
    fail_inserts: AtomicBool,
    fail_queries: AtomicBool,
}

impl MemoryQuoteStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 레코드를 미리 채운 저장소 생성.
    pub fn with_records(records: Vec<QuoteRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// insert 실패 여부 설정.
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// 조회/삭제 실패 여부 설정.
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// 저장된 레코드 스냅샷 (삽입 순서).
    pub fn records(&self) -> Vec<QuoteRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check_queries(&self) -> Result<()> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(DataError::QueryError("injected query failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteStore for MemoryQuoteStore {
    async fn insert(&self, record: QuoteRecord) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DataError::InsertError("injected insert failure".to_string()));
        }
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
        Ok(())
    }

    async fn recorded_at_from_latest(&self, offset: u64) -> Result<Option<DateTime<Utc>>> {
        self.check_queries()?;
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());

        let mut times: Vec<DateTime<Utc>> = records.iter().map(|r| r.recorded_at).collect();
        times.sort_unstable_by(|a, b| b.cmp(a));

        Ok(usize::try_from(offset)
            .ok()
            .and_then(|i| times.get(i).copied()))
    }

    async fn delete_through(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.check_queries()?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());

        let before = records.len();
        records.retain(|r| r.recorded_at > cutoff);
        Ok((before - records.len()) as u64)
    }

    async fn count(&self) -> Result<u64> {
        self.check_queries()?;
        Ok(self.records.lock().unwrap_or_else(|e| e.into_inner()).len() as u64)
    }
}
