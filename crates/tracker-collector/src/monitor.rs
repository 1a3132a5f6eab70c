//! 야간 선물 수집 루프.
//!
//! 매 틱마다 세션 상태를 판단하고, 열려 있으면 시세를 조회해 저장한 뒤
//! 프론트엔드 캐시를 무효화합니다. 모든 I/O는 한 틱 안에서 순차 실행되며
//! 틱끼리 겹치지 않습니다.
//!
//! # 상태
//!
//! ```text
//! Idle ──(17:50)──▶ PreOpenWait ──(18:00)──▶ Collecting
//!  ▲                                          │   │
//!  └──────────(세션 종료, 휴장 플래그 해제)───┘   │ volume == 0
//!  ▲                                              ▼
//!  └──────────────(세션 종료)─────────────── HolidaySuspended
//!
//! 틱 실패 ──▶ ErrorBackoff (60초 대기 후 재평가)
//! ```

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracker_core::{Clock, QuoteRecord};
use tracker_data::{QuoteStore, RetentionManager};
use tracker_exchange::QuoteSource;
use tracker_notification::CacheInvalidator;

use crate::config::{RetentionConfig, ScheduleConfig};
use crate::error::CollectorError;
use crate::session::SessionClock;
use crate::stats::CollectionStats;
use crate::Result;

/// 루프 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// 장외 대기
    Idle,
    /// 개장 임박 (17:50 ~ 18:00)
    PreOpenWait,
    /// 분 단위 수집 중
    Collecting,
    /// 휴장 감지, 세션 종료까지 조회 중단
    HolidaySuspended,
    /// 예기치 못한 실패 후 대기
    ErrorBackoff,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::PreOpenWait => "pre_open_wait",
            Self::Collecting => "collecting",
            Self::HolidaySuspended => "holiday_suspended",
            Self::ErrorBackoff => "error_backoff",
        };
        f.write_str(name)
    }
}

/// 이번 틱에서 할 일.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// 조회 없이 주어진 시간만큼 대기
    Sleep(Duration),
    /// 시세 조회 및 저장
    Collect,
    /// 세션은 열려 있지만 조회하지 않음 (분 단위 주기 유지)
    Hold,
}

/// 상태 판단 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: MonitorState,
    pub action: Action,
}

/// 현재 시각과 휴장 플래그로 상태와 행동을 결정합니다.
pub fn decide(session: &SessionClock, now: DateTime<Utc>, holiday: bool) -> Decision {
    if !session.is_market_open(now) {
        let state = if session.is_pre_open(now) {
            MonitorState::PreOpenWait
        } else {
            MonitorState::Idle
        };
        return Decision {
            state,
            action: Action::Sleep(session.sleep_until_next_tick(now)),
        };
    }

    if holiday {
        Decision {
            state: MonitorState::HolidaySuspended,
            action: Action::Hold,
        }
    } else {
        Decision {
            state: MonitorState::Collecting,
            action: Action::Collect,
        }
    }
}

/// 수집 루프 설정.
#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    /// 보존할 최근 레코드 수
    pub retention_limit: u64,
    /// 보존 정리 주기
    pub retention_interval: Duration,
    /// 틱 실패 후 대기
    pub error_backoff: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::new(RetentionConfig::default(), ScheduleConfig::default())
    }
}

impl MonitorSettings {
    /// 설정 묶음에서 생성.
    pub fn new(retention: RetentionConfig, schedule: ScheduleConfig) -> Self {
        Self {
            retention_limit: retention.limit,
            retention_interval: retention.interval(),
            error_backoff: schedule.error_backoff(),
        }
    }
}

/// 저장 후 캐시 무효화 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Invalidation {
    Done,
    Failed,
    /// 무효화 채널 비활성
    Skipped,
}

/// 한 번의 수집 틱 결과.
#[derive(Debug)]
enum TickOutcome {
    /// 조회 결과 없음
    Empty,
    /// 저장 성공
    Stored {
        record: QuoteRecord,
        invalidation: Invalidation,
    },
    /// 저장 실패 (무효화 생략)
    StoreFailed { record: QuoteRecord },
}

/// 수집 루프.
pub struct MonitorLoop {
    source: Arc<dyn QuoteSource>,
    store: Arc<dyn QuoteStore>,
    retention: RetentionManager,
    invalidator: Arc<dyn CacheInvalidator>,
    clock: Arc<dyn Clock>,
    session: SessionClock,
    settings: MonitorSettings,
    state: MonitorState,
    holiday: bool,
    last_retention: Option<DateTime<Utc>>,
    stats: CollectionStats,
}

impl MonitorLoop {
    /// 새 수집 루프 생성.
    pub fn new(
        source: Arc<dyn QuoteSource>,
        store: Arc<dyn QuoteStore>,
        invalidator: Arc<dyn CacheInvalidator>,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            source,
            retention: RetentionManager::new(Arc::clone(&store)),
            store,
            invalidator,
            clock,
            session: SessionClock::new(),
            settings,
            state: MonitorState::Idle,
            holiday: false,
            last_retention: None,
            stats: CollectionStats::new(),
        }
    }

    /// 현재 상태.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// 휴장 플래그.
    pub fn is_holiday(&self) -> bool {
        self.holiday
    }

    /// 누적 통계.
    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    /// 취소될 때까지 루프 실행.
    ///
    /// 취소는 틱 시작 전과 대기 중에만 확인하며, 진행 중인 I/O는 끊지 않습니다.
    pub async fn run(&mut self, shutdown: CancellationToken) -> CollectionStats {
        let started = Instant::now();
        info!(
            retention_limit = self.settings.retention_limit,
            "야간선물 수집 루프 시작 (18:00 ~ 06:00 KST, 분 단위 보정)"
        );

        self.run_retention().await;

        while !shutdown.is_cancelled() {
            let wait = match self.step().await {
                Ok(wait) => wait,
                Err(e) => {
                    error!(
                        error = %e,
                        backoff_secs = self.settings.error_backoff.as_secs(),
                        "알 수 없는 에러"
                    );
                    self.stats.errors += 1;
                    self.transition(MonitorState::ErrorBackoff);
                    self.settings.error_backoff
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.clock.sleep(wait) => {}
            }
        }

        info!("종료 신호 수신, 수집 루프 종료");
        self.stats.elapsed = started.elapsed();
        self.stats.log_summary("야간선물 수집");
        self.stats.clone()
    }

    /// 틱 하나를 실행하고 다음 틱까지 대기할 시간을 반환합니다.
    pub async fn step(&mut self) -> Result<Duration> {
        let now = self.clock.now();
        let decision = decide(&self.session, now, self.holiday);
        self.transition(decision.state);

        match decision.action {
            Action::Sleep(wait) => {
                if self.holiday {
                    info!("세션 종료, 휴장 플래그 해제");
                    self.holiday = false;
                }
                match decision.state {
                    MonitorState::PreOpenWait => {
                        info!(wait_secs = wait.as_secs_f64(), "개장 임박, 개장 시각까지 대기");
                    }
                    _ if self.session.is_status_boundary(now) => {
                        let local = self.session.local(now);
                        info!(now = %local.format("%H:%M"), "야간장이 아닙니다. 대기 중");
                    }
                    _ => {}
                }
                Ok(wait)
            }
            Action::Hold => {
                self.stats.holiday_ticks += 1;
                debug!("휴장 감지 상태, 조회 생략");
                Ok(self
                    .session
                    .next_tick_with_drift_correction(self.clock.now()))
            }
            Action::Collect => {
                if self.retention_due(now) {
                    self.run_retention().await;
                }
                if self.session.is_settlement_minute(now) {
                    info!("최종 정산 틱");
                }

                let outcome = self.collect_tick().await?;
                self.record_outcome(outcome);

                Ok(self
                    .session
                    .next_tick_with_drift_correction(self.clock.now()))
            }
        }
    }

    fn transition(&mut self, next: MonitorState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "상태 전이");
            self.state = next;
        }
    }

    fn retention_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_retention {
            None => true,
            Some(last) => (now - last)
                .to_std()
                .map(|elapsed| elapsed >= self.settings.retention_interval)
                .unwrap_or(false),
        }
    }

    async fn run_retention(&mut self) {
        let deleted = self.retention.enforce_limit(self.settings.retention_limit).await;
        self.last_retention = Some(self.clock.now());
        self.stats.retention_runs += 1;
        self.stats.rows_trimmed += deleted;
        self.stats.log_summary("보존 정리");
    }

    /// 조회, 저장, 무효화를 별도 태스크에서 실행합니다.
    ///
    /// 태스크가 패닉하면 `CollectorError::Tick`으로 바뀌어 에러 대기로 이어집니다.
    async fn collect_tick(&self) -> Result<TickOutcome> {
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let invalidator = Arc::clone(&self.invalidator);

        tokio::spawn(async move { run_tick(source, store, invalidator).await })
            .await
            .map_err(|e| CollectorError::Tick(e.to_string()))
    }

    fn record_outcome(&mut self, outcome: TickOutcome) {
        self.stats.ticks += 1;

        let record = match outcome {
            TickOutcome::Empty => {
                self.stats.empty += 1;
                return;
            }
            TickOutcome::Stored {
                record,
                invalidation,
            } => {
                self.stats.stored += 1;
                match invalidation {
                    Invalidation::Done => self.stats.invalidations += 1,
                    Invalidation::Failed => self.stats.invalidation_errors += 1,
                    Invalidation::Skipped => {}
                }
                record
            }
            TickOutcome::StoreFailed { record } => {
                self.stats.store_errors += 1;
                record
            }
        };

        if record.is_zero_volume() {
            warn!(symbol = %record.symbol, "거래량 0, 휴장으로 판단하여 세션 종료까지 조회 중단");
            self.holiday = true;
            self.transition(MonitorState::HolidaySuspended);
        }
    }
}

async fn run_tick(
    source: Arc<dyn QuoteSource>,
    store: Arc<dyn QuoteStore>,
    invalidator: Arc<dyn CacheInvalidator>,
) -> TickOutcome {
    let Some(record) = source.fetch_quote().await else {
        debug!("이번 틱 시세 없음");
        return TickOutcome::Empty;
    };

    if let Err(e) = store.insert(record.clone()).await {
        error!(error = %e, symbol = %record.symbol, "DB 저장 실패");
        return TickOutcome::StoreFailed { record };
    }
    info!(
        symbol = %record.symbol,
        price = record.price,
        volume = record.volume,
        "시세 저장"
    );

    let invalidation = if !invalidator.is_enabled() {
        debug!(channel = invalidator.name(), "캐시 무효화 비활성, 건너뜀");
        Invalidation::Skipped
    } else {
        match invalidator.invalidate().await {
            Ok(()) => Invalidation::Done,
            Err(e) => {
                warn!(channel = invalidator.name(), error = %e, "캐시 무효화 실패");
                Invalidation::Failed
            }
        }
    };

    TickOutcome::Stored {
        record,
        invalidation,
    }
}
