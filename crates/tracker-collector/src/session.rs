//! KRX 야간 선물 세션 시계.
//!
//! 모든 판단은 `now`만의 순수 함수이며 Asia/Seoul 기준으로 해석합니다.
//!
//! # 세션 규칙
//!
//! - 평일 18:00:00 ~ 익일 06:00:59 (06:00분은 최종 정산 틱)
//! - 월요일 18:00 이전은 닫힘 (일요일 밤 세션 없음)
//! - 토요일은 06:00:00까지만 열림 (금요일 밤 세션의 끝)
//! - 일요일 닫힘

use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Asia::Seoul;
use chrono_tz::Tz;
use std::time::Duration;

/// 야간 세션 시작 시각 (시).
const SESSION_OPEN_HOUR: u32 = 18;
/// 세션 종료 시각 (시). 이 시각의 0분까지 수집합니다.
const SESSION_CLOSE_HOUR: u32 = 6;
/// 개장 임박 구간 시작 (17:50).
const PRE_OPEN_MINUTE: u32 = 50;

/// 세션 시계.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionClock;

impl SessionClock {
    /// 새 세션 시계 생성.
    pub fn new() -> Self {
        Self
    }

    /// 현지(KST) 시각.
    pub fn local(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&Seoul)
    }

    /// 야간장 개장 여부.
    pub fn is_market_open(&self, now: DateTime<Utc>) -> bool {
        let local = self.local(now);
        let (hour, minute, second) = (local.hour(), local.minute(), local.second());

        match local.weekday() {
            // 금요일 밤 세션은 토요일 06:00:00에 끝남
            Weekday::Sat if (hour, minute, second) > (SESSION_CLOSE_HOUR, 0, 0) => return false,
            Weekday::Sun => return false,
            Weekday::Mon if hour < SESSION_OPEN_HOUR => return false,
            _ => {}
        }

        hour >= SESSION_OPEN_HOUR
            || hour < SESSION_CLOSE_HOUR
            || (hour == SESSION_CLOSE_HOUR && minute == 0)
    }

    /// 06:00분 최종 정산 틱 여부.
    pub fn is_settlement_minute(&self, now: DateTime<Utc>) -> bool {
        let local = self.local(now);
        local.hour() == SESSION_CLOSE_HOUR && local.minute() == 0
    }

    /// 개장 임박 구간 (17:50:00 ~ 17:59:59) 여부. 18:00에 세션이 열리는 날만 해당합니다.
    pub fn is_pre_open(&self, now: DateTime<Utc>) -> bool {
        let local = self.local(now);
        let opens_today = !matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
        opens_today && local.hour() == SESSION_OPEN_HOUR - 1 && local.minute() >= PRE_OPEN_MINUTE
    }

    /// 대기 로그를 남길 30분 경계 여부.
    pub fn is_status_boundary(&self, now: DateTime<Utc>) -> bool {
        let local = self.local(now);
        local.minute() % 30 == 0 && local.second() < 2
    }

    /// 개장(18:00:00)까지 남은 시간. 이미 지났으면 0.
    pub fn until_open(&self, now: DateTime<Utc>) -> Duration {
        let local = self.local(now);
        let open = local
            .date_naive()
            .and_hms_opt(SESSION_OPEN_HOUR, 0, 0)
            .and_then(|naive| Seoul.from_local_datetime(&naive).single());

        match open {
            Some(open) => to_std(open.with_timezone(&Utc) - now),
            None => Duration::ZERO,
        }
    }

    /// 장외 시간의 다음 확인까지 대기 시간.
    ///
    /// 개장 임박 구간이면 개장 시각까지 정확히, 그 외에는 다음 분 정각까지 기다립니다.
    pub fn sleep_until_next_tick(&self, now: DateTime<Utc>) -> Duration {
        if self.is_pre_open(now) {
            return self.until_open(now);
        }
        to_std(floor_to_minute(now) + TimeDelta::minutes(1) - now)
    }

    /// 수집 후 다음 틱까지 대기 시간 (드리프트 보정).
    ///
    /// 다음 틱은 항상 "현재 분 + 1분"의 01초입니다. 작업이 오래 걸려도
    /// 분 경계에 다시 맞춰집니다.
    pub fn next_tick_with_drift_correction(&self, now: DateTime<Utc>) -> Duration {
        let target = floor_to_minute(now) + TimeDelta::minutes(1) + TimeDelta::seconds(1);
        to_std(target - now)
    }
}

/// 분 단위 내림. KST는 정시 단위 오프셋이므로 UTC에서 내려도 같습니다.
fn floor_to_minute(now: DateTime<Utc>) -> DateTime<Utc> {
    now - TimeDelta::seconds(i64::from(now.second()))
        - TimeDelta::nanoseconds(i64::from(now.nanosecond()))
}

/// 음수는 0으로.
fn to_std(delta: TimeDelta) -> Duration {
    delta.to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// KST 시각을 UTC로.
    fn kst(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Seoul
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    // 2026-01-05 월요일 ~ 2026-01-11 일요일
    const MON: u32 = 5;
    const TUE: u32 = 6;
    const FRI: u32 = 9;
    const SAT: u32 = 10;
    const SUN: u32 = 11;

    #[test]
    fn test_weekday_fixtures() {
        assert_eq!(kst(2026, 1, MON, 12, 0, 0).with_timezone(&Seoul).weekday(), Weekday::Mon);
        assert_eq!(kst(2026, 1, SUN, 12, 0, 0).with_timezone(&Seoul).weekday(), Weekday::Sun);
    }

    #[test]
    fn test_evening_session_open() {
        let clock = SessionClock::new();

        assert!(!clock.is_market_open(kst(2026, 1, TUE, 17, 59, 59)));
        assert!(clock.is_market_open(kst(2026, 1, TUE, 18, 0, 0)));
        assert!(clock.is_market_open(kst(2026, 1, TUE, 23, 59, 59)));
        assert!(clock.is_market_open(kst(2026, 1, FRI, 23, 0, 0)));
    }

    #[test]
    fn test_overnight_and_settlement_minute() {
        let clock = SessionClock::new();

        assert!(clock.is_market_open(kst(2026, 1, TUE, 0, 0, 0)));
        assert!(clock.is_market_open(kst(2026, 1, TUE, 5, 59, 59)));
        assert!(clock.is_market_open(kst(2026, 1, TUE, 6, 0, 0)));
        assert!(clock.is_market_open(kst(2026, 1, TUE, 6, 0, 30)));
        assert!(!clock.is_market_open(kst(2026, 1, TUE, 6, 1, 0)));
        assert!(!clock.is_market_open(kst(2026, 1, TUE, 12, 0, 0)));

        assert!(clock.is_settlement_minute(kst(2026, 1, TUE, 6, 0, 45)));
        assert!(!clock.is_settlement_minute(kst(2026, 1, TUE, 5, 59, 59)));
    }

    #[test]
    fn test_weekend_boundaries() {
        let clock = SessionClock::new();

        // 금요일 밤 세션의 끝
        assert!(clock.is_market_open(kst(2026, 1, SAT, 5, 59, 59)));
        assert!(clock.is_market_open(kst(2026, 1, SAT, 6, 0, 0)));
        assert!(!clock.is_market_open(kst(2026, 1, SAT, 6, 0, 1)));
        assert!(!clock.is_market_open(kst(2026, 1, SAT, 18, 30, 0)));

        // 일요일 종일, 월요일 개장 전
        assert!(!clock.is_market_open(kst(2026, 1, SUN, 2, 0, 0)));
        assert!(!clock.is_market_open(kst(2026, 1, SUN, 20, 0, 0)));
        assert!(!clock.is_market_open(kst(2026, 1, MON, 3, 0, 0)));
        assert!(!clock.is_market_open(kst(2026, 1, MON, 17, 59, 59)));
        assert!(clock.is_market_open(kst(2026, 1, MON, 18, 0, 0)));
    }

    #[test]
    fn test_weekend_closed_every_minute() {
        let clock = SessionClock::new();
        let mut t = kst(2026, 1, SAT, 6, 0, 1);
        let end = kst(2026, 1, MON, 17, 59, 59);

        while t <= end {
            assert!(!clock.is_market_open(t), "open at {}", clock.local(t));
            t += TimeDelta::minutes(1);
        }
    }

    #[test]
    fn test_pre_open_wait() {
        let clock = SessionClock::new();

        assert!(!clock.is_pre_open(kst(2026, 1, FRI, 17, 49, 59)));
        assert!(clock.is_pre_open(kst(2026, 1, FRI, 17, 50, 0)));
        assert!(clock.is_pre_open(kst(2026, 1, FRI, 17, 59, 59)));
        assert!(!clock.is_pre_open(kst(2026, 1, FRI, 18, 0, 0)));

        // 월요일은 18:00에 열림
        assert!(clock.is_pre_open(kst(2026, 1, MON, 17, 55, 0)));

        let now = kst(2026, 1, FRI, 17, 59, 31);
        assert_eq!(clock.sleep_until_next_tick(now), Duration::from_secs(29));
        assert_eq!(
            clock.sleep_until_next_tick(kst(2026, 1, FRI, 17, 50, 0)),
            Duration::from_secs(600)
        );
    }

    #[test]
    fn test_no_pre_open_on_weekend() {
        let clock = SessionClock::new();

        for day in [SAT, SUN] {
            let now = kst(2026, 1, day, 17, 55, 0);
            assert!(!clock.is_pre_open(now));
            // 개장 대기 대신 다음 분까지
            assert_eq!(clock.sleep_until_next_tick(now), Duration::from_secs(60));
        }
    }

    #[test]
    fn test_idle_sleep_to_next_minute() {
        let clock = SessionClock::new();

        let now = kst(2026, 1, TUE, 12, 0, 15);
        assert_eq!(clock.sleep_until_next_tick(now), Duration::from_secs(45));

        let with_millis = now + TimeDelta::milliseconds(500);
        assert_eq!(
            clock.sleep_until_next_tick(with_millis),
            Duration::from_millis(44_500)
        );
    }

    #[test]
    fn test_drift_correction() {
        let clock = SessionClock::new();
        let tick = kst(2026, 1, TUE, 23, 0, 0);

        // 작업 시간과 무관하게 다음 틱은 23:01:01
        for work_secs in [0, 1, 15, 59] {
            let now = tick + TimeDelta::seconds(work_secs);
            let wait = clock.next_tick_with_drift_correction(now);
            assert_eq!(
                now + TimeDelta::from_std(wait).unwrap(),
                kst(2026, 1, TUE, 23, 1, 1),
                "work {work_secs}s"
            );
        }

        let late = tick + TimeDelta::milliseconds(59_900);
        assert_eq!(
            clock.next_tick_with_drift_correction(late),
            Duration::from_millis(1_100)
        );
    }

    #[test]
    fn test_status_boundary() {
        let clock = SessionClock::new();

        assert!(clock.is_status_boundary(kst(2026, 1, TUE, 12, 30, 0)));
        assert!(clock.is_status_boundary(kst(2026, 1, TUE, 13, 0, 1)));
        assert!(!clock.is_status_boundary(kst(2026, 1, TUE, 13, 0, 2)));
        assert!(!clock.is_status_boundary(kst(2026, 1, TUE, 13, 15, 0)));
    }
}
