//! LS증권 Open API 커넥터.
//!
//! 야간선물 수집에 필요한 최소 기능만 다룹니다:
//! - OAuth 접근 토큰 (POST /oauth2/token)
//! - 지수선물 마스터 조회 (t8432)
//! - 선물 현재가 조회 (t8456)

pub mod auth;
pub mod client;
pub mod config;
pub mod fetcher;

pub use auth::TokenProvider;
pub use client::{Instrument, LsRestClient, Numeric, QuoteBlock};
pub use config::LsConfig;
pub use fetcher::{is_index_future, select_front_month, QuoteFetcher, RetryPolicy};

/// 시세 API 거래 코드.
pub mod tr_cd {
    /// 지수선물 마스터 조회
    pub const FUTURES_MASTER: &str = "t8432";
    /// 선물/옵션 현재가 조회
    pub const FUTURES_PRICE: &str = "t8456";
}

/// 토큰 만료 시 응답 본문에 포함되는 메시지.
pub const INVALID_TOKEN_MARKER: &str = "유효하지 않은 토큰";
