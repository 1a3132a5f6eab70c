//! 레코드 개수 기반 보존 정책.
//!
//! 달력 시간이 아니라 "최근 N건"만 남깁니다. 휴장일이나 주말이 끼어도
//! 화면에 보여줄 만큼의 이력이 항상 유지됩니다.
//!
//! 경계 레코드(최신순 `limit+1`번째)와 같은 시각의 레코드까지 함께 지우므로,
//! 동일 시각 레코드가 있으면 정리 후 `limit`보다 적게 남을 수 있습니다.

use std::sync::Arc;
use tracing::{info, warn};

use crate::storage::QuoteStore;

/// 보존 관리자.
pub struct RetentionManager {
    store: Arc<dyn QuoteStore>,
}

impl RetentionManager {
    /// 새 보존 관리자 생성.
    pub fn new(store: Arc<dyn QuoteStore>) -> Self {
        Self { store }
    }

    /// 최근 `limit`건을 넘는 레코드 삭제.
    ///
    /// 최신순 `limit+1`번째 레코드의 시각을 기준으로 그 시각 이하를 모두 지웁니다.
    /// 저장소 오류는 로그만 남기고 0을 반환합니다. 정리 실패가 수집을 막지 않습니다.
    pub async fn enforce_limit(&self, limit: u64) -> u64 {
        let cutoff = match self.store.recorded_at_from_latest(limit).await {
            Ok(Some(cutoff)) => cutoff,
            Ok(None) => {
                info!(limit, "데이터 정리 불필요 (보존 한도 이하)");
                return 0;
            }
            Err(e) => {
                warn!(error = %e, "데이터 정리 실패 (기준 시각 조회)");
                return 0;
            }
        };

        info!(limit, cutoff = %cutoff, "데이터 정리 시작");

        match self.store.delete_through(cutoff).await {
            Ok(deleted) => {
                info!(deleted, "데이터 정리 완료");
                deleted
            }
            Err(e) => {
                warn!(error = %e, "데이터 정리 실패 (삭제)");
                0
            }
        }
    }
}
