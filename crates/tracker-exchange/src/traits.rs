//! 커넥터 경계 trait 정의.

use async_trait::async_trait;
use tracker_core::QuoteRecord;

use crate::ls::{Instrument, QuoteBlock};
use crate::ExchangeResult;

/// 접근 토큰 발급자 (client-credential grant).
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// 새 접근 토큰 발급.
    ///
    /// 자격증명이 거부되면 `ExchangeError::Unauthorized`를 반환합니다.
    async fn issue_token(&self) -> ExchangeResult<String>;
}

/// 선물/옵션 시세 API.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// 지수선물 마스터 전체 조회 (업스트림 반환 순서 유지).
    async fn instrument_master(&self, token: &str) -> ExchangeResult<Vec<Instrument>>;

    /// 종목 코드로 현재 시세 조회. 시세 블록이 없으면 `None`.
    async fn futures_quote(&self, token: &str, code: &str) -> ExchangeResult<Option<QuoteBlock>>;
}

/// 수집 루프가 소비하는 시세 공급원.
///
/// 모든 실패는 경계 안에서 흡수되어 `None`으로 표현됩니다.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// 현재 시세 1건 조회.
    async fn fetch_quote(&self) -> Option<QuoteRecord>;
}
