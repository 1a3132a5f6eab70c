//! 시계 추상화.
//!
//! 스케줄링 로직은 `Clock`을 통해서만 현재 시각을 읽고 대기합니다.
//! 운영에서는 `SystemClock`, 테스트에서는 `ManualClock`을 주입하여
//! 실제 시간을 기다리지 않고 시간 경과를 시뮬레이션합니다.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// 현재 시각과 대기를 제공하는 시계.
#[async_trait]
pub trait Clock: Send + Sync {
    /// 현재 시각 (UTC).
    fn now(&self) -> DateTime<Utc>;

    /// 주어진 시간만큼 대기.
    async fn sleep(&self, duration: Duration);
}

/// 시스템 시계 (tokio 타이머 사용).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 수동으로 조작하는 시계.
///
/// `sleep`은 즉시 반환하면서 내부 시각을 그만큼 전진시키고,
/// 요청된 대기 시간을 기록합니다.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// 주어진 시각에서 시작하는 시계 생성.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// 시각을 직접 설정.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    /// 대기 기록 없이 시각만 전진.
    pub fn advance(&self, duration: Duration) {
        let delta = TimeDelta::from_std(duration).unwrap_or(TimeDelta::zero());
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += delta;
    }

    /// 지금까지 요청된 대기 시간 목록.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// 대기 요청 횟수.
    pub fn sleep_count(&self) -> usize {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
    }
}
