//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 프로세스 단위 수집 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 수집 틱 수 (조회 시도)
    pub ticks: usize,
    /// 저장 성공 건수
    pub stored: usize,
    /// 빈 조회 (종목 없음, 시세 없음, 재시도 소진)
    pub empty: usize,
    /// 저장 실패 건수
    pub store_errors: usize,
    /// 틱 자체가 실패해 대기 상태로 들어간 횟수
    pub errors: usize,
    /// 휴장 감지로 건너뛴 틱 수
    pub holiday_ticks: usize,
    /// 보존 정리 실행 횟수
    pub retention_runs: usize,
    /// 보존 정리로 삭제된 행 수
    pub rows_trimmed: u64,
    /// 캐시 무효화 성공 횟수
    pub invalidations: usize,
    /// 캐시 무효화 실패 횟수
    pub invalidation_errors: usize,
    /// 가동 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            (self.stored as f64 / self.ticks as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            ticks = self.ticks,
            stored = self.stored,
            empty = self.empty,
            store_errors = self.store_errors,
            errors = self.errors,
            holiday_ticks = self.holiday_ticks,
            retention_runs = self.retention_runs,
            rows_trimmed = self.rows_trimmed,
            invalidations = self.invalidations,
            invalidation_errors = self.invalidation_errors,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 통계"
        );
    }
}
