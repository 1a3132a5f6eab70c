//! 무효화 trait 및 에러 정의.

use async_trait::async_trait;
use std::fmt;

/// 무효화 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("무효화 요청 실패: {target} (HTTP {status}) {body}")]
    SendFailed {
        target: String,
        status: u16,
        body: String,
    },

    #[error("잘못된 설정: {0}")]
    InvalidConfig(String),

    #[error("무효화 비활성화 (REVALIDATE_SECRET 없음)")]
    Disabled,

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// 무효화 결과 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 무효화 대상.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidateTarget {
    /// 페이지 경로 (예: "/")
    Path(String),
    /// 데이터 캐시 태그 (예: "night-futures")
    Tag(String),
}

impl RevalidateTarget {
    /// 쿼리 파라미터 이름.
    pub fn query_key(&self) -> &'static str {
        match self {
            Self::Path(_) => "path",
            Self::Tag(_) => "tag",
        }
    }

    /// 쿼리 파라미터 값.
    pub fn value(&self) -> &str {
        match self {
            Self::Path(v) | Self::Tag(v) => v,
        }
    }
}

impl fmt::Display for RevalidateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.query_key(), self.value())
    }
}

/// 하위 캐시 무효화 경계.
///
/// 수집 루프는 저장에 성공한 틱마다 `invalidate`를 한 번 호출합니다.
/// 실패는 호출 측에서 로그로만 남기며 재시도하지 않습니다.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// 설정된 모든 대상을 무효화합니다.
    async fn invalidate(&self) -> NotificationResult<()>;

    /// 무효화가 활성화되어 있는지 확인합니다.
    fn is_enabled(&self) -> bool;

    /// 채널 이름.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_query() {
        let path = RevalidateTarget::Path("/".to_string());
        assert_eq!(path.query_key(), "path");
        assert_eq!(path.to_string(), "path=/");

        let tag = RevalidateTarget::Tag("night-futures".to_string());
        assert_eq!(tag.query_key(), "tag");
        assert_eq!(tag.value(), "night-futures");
    }

    #[test]
    fn test_send_failed_message() {
        let err = NotificationError::SendFailed {
            target: "path=/".to_string(),
            status: 401,
            body: "Invalid secret".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("path=/"));
    }
}
