//! # Tracker Exchange
//!
//! LS증권 Open API 커넥터.
//!
//! - `ls::TokenProvider` - OAuth 접근 토큰 발급 및 캐싱
//! - `ls::LsRestClient` - 선물/옵션 시세 REST 클라이언트 (t8432, t8456)
//! - `ls::QuoteFetcher` - 최근월물 탐색 + 시세 조회 + 재시도

pub mod error;
pub mod ls;
pub mod traits;

pub use error::{ExchangeError, ExchangeResult};
pub use ls::{
    is_index_future, select_front_month, Instrument, LsConfig, LsRestClient, QuoteBlock,
    QuoteFetcher, RetryPolicy, TokenProvider,
};
pub use traits::{MarketDataApi, QuoteSource, TokenIssuer};
