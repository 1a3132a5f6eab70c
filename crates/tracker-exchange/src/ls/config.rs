//! LS증권 Open API 설정.

use secrecy::SecretString;

/// 기본 REST 엔드포인트.
pub const DEFAULT_BASE_URL: &str = "https://openapi.ls-sec.co.kr:8080";

/// LS Open API 설정.
#[derive(Debug)]
pub struct LsConfig {
    /// 앱키
    pub app_key: String,
    /// 앱시크릿 (로그에 노출되지 않음)
    pub app_secret: SecretString,
    /// REST 기본 URL
    pub base_url: String,
    /// HTTP 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl LsConfig {
    /// 기본 엔드포인트와 10초 타임아웃으로 설정 생성.
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        let app_secret: String = app_secret.into();
        Self {
            app_key: app_key.into(),
            app_secret: SecretString::new(app_secret.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }

    /// REST 기본 URL 설정 (테스트 서버 등).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 요청 타임아웃 설정.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// 끝의 `/`를 제거한 REST 기본 URL.
    pub fn rest_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// 앱키 앞부분만 노출한 문자열 (로그용).
    pub fn masked_app_key(&self) -> String {
        let prefix: String = self.app_key.chars().take(8).collect();
        format!("{}...", prefix)
    }
}
