//! 환경변수 기반 설정 모듈.

use crate::error::CollectorError;
use crate::Result;
use std::time::Duration;
use tracker_exchange::ls::config::DEFAULT_BASE_URL;
use tracker_exchange::{LsConfig, RetryPolicy};
use tracker_notification::RevalidateConfig;

/// Collector 전체 설정
#[derive(Debug)]
pub struct CollectorConfig {
    /// 데이터베이스 URL (`run --dry-run`, `status`, `revalidate`에서는 불필요)
    pub database_url: Option<String>,
    /// LS증권 API 설정 (`LS_APP_KEY`/`LS_APP_SECRET`이 모두 있을 때만)
    pub ls: Option<LsConfig>,
    /// 시세 조회 재시도 설정
    pub fetch: FetchConfig,
    /// 보존 정책 설정
    pub retention: RetentionConfig,
    /// 캐시 무효화 설정
    pub revalidate: RevalidateConfig,
    /// 스케줄 설정
    pub schedule: ScheduleConfig,
}

/// 시세 조회 재시도 설정
#[derive(Debug, Clone, Copy)]
pub struct FetchConfig {
    /// 최대 시도 횟수
    pub max_retries: u32,
    /// 재시도 간 대기 (초)
    pub retry_delay_secs: u64,
}

/// 보존 정책 설정
#[derive(Debug, Clone, Copy)]
pub struct RetentionConfig {
    /// 보존할 최근 레코드 수
    pub limit: u64,
    /// 정리 주기 (초)
    pub interval_secs: u64,
}

/// 스케줄 설정
#[derive(Debug, Clone, Copy)]
pub struct ScheduleConfig {
    /// 예기치 못한 에러 후 대기 (초)
    pub error_backoff_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_secs: 2,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            limit: 1440,
            interval_secs: 3600,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            error_backoff_secs: 60,
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드 (`.env` 포함)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드
    ///
    /// 필수값 검사는 명령별로 `require_*`에서 합니다.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let timeout_secs = env_var_parse(&lookup, "HTTP_TIMEOUT_SECS", 10);

        let ls = match (lookup("LS_APP_KEY"), lookup("LS_APP_SECRET")) {
            (Some(key), Some(secret)) => Some(
                LsConfig::new(key, secret)
                    .with_base_url(
                        lookup("LS_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                    )
                    .with_timeout_secs(timeout_secs),
            ),
            _ => None,
        };

        Self {
            database_url: lookup("DATABASE_URL"),
            ls,
            fetch: FetchConfig {
                max_retries: env_var_parse(&lookup, "FETCH_MAX_RETRIES", 3),
                retry_delay_secs: env_var_parse(&lookup, "FETCH_RETRY_DELAY_SECS", 2),
            },
            retention: RetentionConfig {
                limit: env_var_parse(&lookup, "RETENTION_LIMIT", 1440),
                interval_secs: env_var_parse(&lookup, "RETENTION_INTERVAL_SECS", 3600),
            },
            revalidate: RevalidateConfig::from_lookup(&lookup),
            schedule: ScheduleConfig {
                error_backoff_secs: env_var_parse(&lookup, "ERROR_BACKOFF_SECS", 60),
            },
        }
    }

    /// 데이터베이스 URL (없으면 설정 에러)
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })
    }

    /// LS증권 API 설정을 꺼냄 (없으면 설정 에러)
    pub fn take_ls_config(&mut self) -> Result<LsConfig> {
        self.ls.take().ok_or_else(|| {
            CollectorError::Config(
                "LS_APP_KEY / LS_APP_SECRET 환경변수가 설정되지 않았습니다".to_string(),
            )
        })
    }
}

impl FetchConfig {
    /// 재시도 정책으로 변환
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }
}

impl RetentionConfig {
    /// 정리 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl ScheduleConfig {
    /// 에러 대기 시간을 Duration으로 반환
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> CollectorConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CollectorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert!(config.database_url.is_none());
        assert!(config.ls.is_none());
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.fetch.retry_delay_secs, 2);
        assert_eq!(config.retention.limit, 1440);
        assert_eq!(config.retention.interval(), Duration::from_secs(3600));
        assert_eq!(config.schedule.error_backoff(), Duration::from_secs(60));
        assert_eq!(
            config.revalidate.endpoint(),
            "https://www.hangon.co.kr/api/revalidate"
        );
        assert!(config.revalidate.secret.is_none());
        assert!(config.require_database_url().is_err());
    }

    #[test]
    fn test_full_environment() {
        let mut config = config_from(&[
            ("LS_APP_KEY", "PSabcdefgh"),
            ("LS_APP_SECRET", "secret"),
            ("LS_BASE_URL", "http://localhost:8080/"),
            ("DATABASE_URL", "postgresql://tracker@localhost/tracker"),
            ("REVALIDATE_SECRET", "s3cret"),
            ("RETENTION_LIMIT", "720"),
            ("FETCH_MAX_RETRIES", "5"),
            ("HTTP_TIMEOUT_SECS", "3"),
        ]);

        assert_eq!(
            config.require_database_url().unwrap(),
            "postgresql://tracker@localhost/tracker"
        );
        assert_eq!(config.retention.limit, 720);
        assert_eq!(config.fetch.policy().max_retries, 5);
        assert_eq!(config.revalidate.timeout_secs, 3);
        assert!(config.revalidate.secret.is_some());

        let ls = config.take_ls_config().unwrap();
        assert_eq!(ls.rest_base_url(), "http://localhost:8080");
        assert_eq!(ls.timeout_secs, 3);
        assert!(config.take_ls_config().is_err());
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[("RETENTION_LIMIT", "many"), ("ERROR_BACKOFF_SECS", "")]);
        assert_eq!(config.retention.limit, 1440);
        assert_eq!(config.schedule.error_backoff_secs, 60);
    }

    #[test]
    fn test_partial_credentials_are_missing() {
        let mut config = config_from(&[("LS_APP_KEY", "PSabcdefgh")]);
        assert!(config.take_ls_config().is_err());
    }
}
