//! 프론트엔드 revalidate 웹훅.
//!
//! 새 시세가 저장되면 프론트엔드에 페이지 재생성을 요청합니다.
//! 요청은 best-effort이며 재시도하지 않습니다. 다음 틱에서 다시 호출됩니다.

use crate::types::{CacheInvalidator, NotificationError, NotificationResult, RevalidateTarget};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 기본 프론트엔드 주소.
pub const DEFAULT_FRONTEND_URL: &str = "https://www.hangon.co.kr";

/// 실패 응답 로그에 남길 본문 최대 글자 수.
const BODY_EXCERPT_CHARS: usize = 100;

/// revalidate 웹훅 설정.
#[derive(Debug)]
pub struct RevalidateConfig {
    /// 공유 비밀값. 없으면 웹훅 비활성화
    pub secret: Option<SecretString>,
    /// 프론트엔드 주소 (끝의 `/` 제거됨)
    pub base_url: String,
    /// 매 틱 무효화할 경로
    pub paths: Vec<String>,
    /// 매 틱 무효화할 태그
    pub tags: Vec<String>,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl RevalidateConfig {
    /// 새 설정을 생성합니다. 기본 대상은 경로 `/`와 태그 `night-futures`입니다.
    pub fn new(base_url: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            secret: secret
                .filter(|s| !s.is_empty())
                .map(|s| SecretString::new(s.into())),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            paths: vec!["/".to_string()],
            tags: vec!["night-futures".to_string()],
            timeout_secs: 10,
        }
    }

    /// 키 조회 함수(보통 환경 변수)로 설정을 생성합니다.
    ///
    /// `REVALIDATE_SECRET`이 없어도 설정은 만들어지며, 이때 웹훅은 비활성 상태입니다.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string());
        let mut config = Self::new(base_url, lookup("REVALIDATE_SECRET"));

        // 변수가 있으면 빈 목록도 그대로 존중
        if let Some(paths) = lookup("REVALIDATE_PATHS") {
            config.paths = parse_list(&paths);
        }
        if let Some(tags) = lookup("REVALIDATE_TAGS") {
            config.tags = parse_list(&tags);
        }
        if let Some(secs) = lookup("HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.timeout_secs = secs;
        }
        config
    }

    /// 설정된 무효화 대상 (경로 먼저, 태그 다음).
    pub fn targets(&self) -> Vec<RevalidateTarget> {
        self.paths
            .iter()
            .cloned()
            .map(RevalidateTarget::Path)
            .chain(self.tags.iter().cloned().map(RevalidateTarget::Tag))
            .collect()
    }

    /// 웹훅 엔드포인트.
    pub fn endpoint(&self) -> String {
        format!("{}/api/revalidate", self.base_url)
    }
}

/// 쉼표 구분 목록.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// revalidate 웹훅 클라이언트.
pub struct RevalidateHook {
    config: RevalidateConfig,
    client: reqwest::Client,
}

impl RevalidateHook {
    /// 새 웹훅 클라이언트를 생성합니다.
    pub fn new(config: RevalidateConfig) -> NotificationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotificationError::InvalidConfig(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// 설정 참조.
    pub fn config(&self) -> &RevalidateConfig {
        &self.config
    }

    /// 경로 하나를 무효화합니다.
    pub async fn revalidate_path(&self, path: &str) -> NotificationResult<()> {
        self.revalidate(&RevalidateTarget::Path(path.to_string()))
            .await
    }

    /// 태그 하나를 무효화합니다.
    pub async fn revalidate_tag(&self, tag: &str) -> NotificationResult<()> {
        self.revalidate(&RevalidateTarget::Tag(tag.to_string()))
            .await
    }

    /// 대상 하나에 대해 웹훅을 호출합니다. HTTP 200만 성공으로 봅니다.
    pub async fn revalidate(&self, target: &RevalidateTarget) -> NotificationResult<()> {
        let Some(secret) = self.config.secret.as_ref() else {
            warn!("REVALIDATE_SECRET이 설정되지 않아 갱신을 건너뜁니다");
            return Err(NotificationError::Disabled);
        };

        let url = self.config.endpoint();
        debug!(url = %url, target = %target, "갱신 요청");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("secret", secret.expose_secret()),
                (target.query_key(), target.value()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            info!(target = %target, "갱신 완료");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        warn!(target = %target, status = status.as_u16(), body = %excerpt, "갱신 실패");

        Err(NotificationError::SendFailed {
            target: target.to_string(),
            status: status.as_u16(),
            body: excerpt,
        })
    }
}

#[async_trait]
impl CacheInvalidator for RevalidateHook {
    async fn invalidate(&self) -> NotificationResult<()> {
        if !self.is_enabled() {
            debug!("갱신 웹훅 비활성, 건너뜀");
            return Ok(());
        }

        // 한 대상이 실패해도 나머지는 계속 요청
        let mut last_error = None;
        for target in self.config.targets() {
            if let Err(e) = self.revalidate(&target).await {
                last_error = Some(e);
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn is_enabled(&self) -> bool {
        self.config.secret.is_some()
    }

    fn name(&self) -> &str {
        "revalidate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RevalidateConfig::new("https://www.hangon.co.kr/", Some("s3cret".into()));
        assert_eq!(config.base_url, "https://www.hangon.co.kr");
        assert_eq!(config.endpoint(), "https://www.hangon.co.kr/api/revalidate");
        assert_eq!(
            config.targets(),
            vec![
                RevalidateTarget::Path("/".to_string()),
                RevalidateTarget::Tag("night-futures".to_string()),
            ]
        );
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_empty_secret_disables() {
        let config = RevalidateConfig::new(DEFAULT_FRONTEND_URL, Some(String::new()));
        assert!(config.secret.is_none());

        let hook = RevalidateHook::new(config).unwrap();
        assert!(!hook.is_enabled());
    }

    #[test]
    fn test_from_lookup() {
        let config = RevalidateConfig::from_lookup(|key| match key {
            "FRONTEND_URL" => Some("http://localhost:3000/".to_string()),
            "REVALIDATE_SECRET" => Some("s3cret".to_string()),
            "REVALIDATE_PATHS" => Some("/, /futures".to_string()),
            "REVALIDATE_TAGS" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.endpoint(), "http://localhost:3000/api/revalidate");
        assert!(config.secret.is_some());
        assert_eq!(config.paths, vec!["/", "/futures"]);
        assert!(config.tags.is_empty());
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("/, /futures ,,"), vec!["/", "/futures"]);
        assert!(parse_list("").is_empty());
    }

    #[tokio::test]
    async fn test_disabled_hook_skips_requests() {
        let hook = RevalidateHook::new(RevalidateConfig::new("http://127.0.0.1:9", None)).unwrap();

        // 비활성 상태의 일괄 무효화는 조용히 성공
        assert!(hook.invalidate().await.is_ok());
        // 단건 호출은 비활성 에러
        assert!(matches!(
            hook.revalidate_path("/").await,
            Err(NotificationError::Disabled)
        ));
    }
}
