//! LS OAuth 접근 토큰 캐시.
//!
//! LS 토큰 응답에는 신뢰할 만한 만료 시각이 없으므로 시간 기반 갱신은 하지 않습니다.
//! 토큰은 처음 필요할 때 발급되고, 업스트림이 "유효하지 않은 토큰"을 알리거나
//! 재시도가 모두 실패했을 때 `invalidate()`로 폐기됩니다.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::traits::TokenIssuer;
use crate::ExchangeResult;

/// 접근 토큰 제공자.
///
/// 캐시된 토큰은 이 구조체만 변경합니다. 읽기/쓰기는 `RwLock`으로 보호되어
/// 백그라운드 갱신이 추가되더라도 경쟁 상태가 생기지 않습니다.
pub struct TokenProvider {
    issuer: Arc<dyn TokenIssuer>,
    token: RwLock<Option<String>>,
}

impl TokenProvider {
    /// 새 토큰 제공자 생성 (캐시 비어 있음).
    pub fn new(issuer: Arc<dyn TokenIssuer>) -> Self {
        Self {
            issuer,
            token: RwLock::new(None),
        }
    }

    /// 캐시된 토큰 반환, 없으면 새로 발급.
    ///
    /// # Errors
    /// 토큰 엔드포인트가 자격증명을 거부하면 `ExchangeError::Unauthorized`.
    pub async fn get_token(&self) -> ExchangeResult<String> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref().filter(|t| !t.is_empty()) {
                debug!("Using cached LS access token");
                return Ok(token.clone());
            }
        }

        info!("No cached LS access token, requesting new token...");
        let token = self.issuer.issue_token().await?;

        *self.token.write().await = Some(token.clone());
        info!("LS access token obtained");

        Ok(token)
    }

    /// 캐시된 토큰 폐기. 다음 `get_token()`은 반드시 새로 발급합니다.
    pub async fn invalidate(&self) {
        let mut guard = self.token.write().await;
        if guard.take().is_some() {
            debug!("LS access token invalidated");
        }
    }

    /// 토큰 강제 재발급.
    pub async fn refresh(&self) -> ExchangeResult<String> {
        self.invalidate().await;
        self.get_token().await
    }

    /// 캐시된 토큰이 있는지 확인.
    pub async fn has_token(&self) -> bool {
        self.token
            .read()
            .await
            .as_ref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }
}
