//! 야간선물 시세 수집기.
//!
//! 한 번의 `fetch_quote()` 호출은 다음 순서로 진행됩니다:
//! 1. 지수선물 마스터(t8432) 전체 조회
//! 2. 종목명이 `"F "`로 시작하고 코드가 `A01`/`101`로 시작하는 첫 항목 선택
//! 3. 선택한 종목의 현재가(t8456) 조회
//! 4. 숫자 문자열을 변환하여 `QuoteRecord` 생성
//!
//! 실패는 모두 경계 안에서 흡수되어 `None`이 됩니다.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracker_core::{Clock, QuoteRecord};

use super::auth::TokenProvider;
use super::client::{Instrument, QuoteBlock};
use crate::traits::{MarketDataApi, QuoteSource};
use crate::{ExchangeError, ExchangeResult};

/// 선물 종목명 접두어.
const FUTURES_NAME_PREFIX: &str = "F ";

/// KOSPI200 지수선물 코드 접두어 (신규/구 코드 체계).
const INDEX_FUTURES_CODE_PREFIXES: [&str; 2] = ["A01", "101"];

/// 재시도 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 일시적 에러에 대한 최대 시도 횟수
    pub max_retries: u32,
    /// 실패 후 다음 시도까지 대기 시간
    pub retry_delay: Duration,
    /// 한 번의 조회에서 허용하는 연속 토큰 재발급 횟수
    pub max_auth_refreshes: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            max_auth_refreshes: 3,
        }
    }
}

impl RetryPolicy {
    /// 시도 횟수와 대기 시간으로 정책 생성. 토큰 재발급 한도는 시도 횟수와 같습니다.
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        let max_retries = max_retries.max(1);
        Self {
            max_retries,
            retry_delay,
            max_auth_refreshes: max_retries,
        }
    }
}

/// KOSPI200 지수선물 종목인지 확인 (코드 접두어 기준).
pub fn is_index_future(instrument: &Instrument) -> bool {
    INDEX_FUTURES_CODE_PREFIXES
        .iter()
        .any(|prefix| instrument.code.starts_with(prefix))
}

/// 마스터 목록에서 최근월 지수선물 선택.
///
/// 업스트림 반환 순서상 첫 번째 일치 항목을 사용합니다.
pub fn select_front_month(master: &[Instrument]) -> Option<&Instrument> {
    master
        .iter()
        .find(|item| item.name.starts_with(FUTURES_NAME_PREFIX) && is_index_future(item))
}

/// 시세 수집기.
pub struct QuoteFetcher {
    api: Arc<dyn MarketDataApi>,
    tokens: TokenProvider,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl QuoteFetcher {
    /// 새 수집기 생성.
    pub fn new(
        api: Arc<dyn MarketDataApi>,
        tokens: TokenProvider,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            api,
            tokens,
            clock,
            policy,
        }
    }

    /// 토큰 제공자 참조.
    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// 재시도 정책.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// 시세 1건 조회 (재시도 포함).
    ///
    /// - 토큰 무효 응답: 토큰 재발급 후 재시도 횟수를 소모하지 않고 즉시 재시도
    /// - 토큰 발급 거부: 이번 틱은 `None`
    /// - 그 외 에러: 재시도 1회 소모, `retry_delay` 대기, 모두 소진하면 토큰 폐기 후 `None`
    pub async fn fetch(&self) -> Option<QuoteRecord> {
        let max_retries = self.policy.max_retries.max(1);
        let mut attempts = 0u32;
        let mut refreshes = 0u32;

        loop {
            let mut err = match self.try_fetch().await {
                Ok(result) => return result,
                Err(e) => e,
            };

            if err.is_invalid_token() {
                if refreshes >= self.policy.max_auth_refreshes {
                    error!(refreshes, "재발급한 토큰도 거부됨, 이번 틱 포기");
                    self.tokens.invalidate().await;
                    return None;
                }
                refreshes += 1;
                warn!("토큰 만료! 재발급 시도... ({})", err);
                match self.tokens.refresh().await {
                    Ok(_) => continue,
                    Err(e) => err = e,
                }
            }

            if err.is_auth_error() {
                error!("토큰 발급 실패, 다음 틱에서 재시도합니다: {}", err);
                return None;
            }

            if !err.is_retryable() {
                error!(error = %err, "재시도할 수 없는 에러");
                return None;
            }

            attempts += 1;
            warn!(
                attempt = attempts,
                max_retries,
                error = %err,
                "API 호출 실패"
            );
            self.clock.sleep(self.policy.retry_delay).await;

            if attempts >= max_retries {
                error!(max_retries, "재시도 모두 실패, 토큰 폐기");
                self.tokens.invalidate().await;
                return None;
            }
        }
    }

    /// 한 번의 시도: 토큰 → 마스터 → 현재가.
    async fn try_fetch(&self) -> ExchangeResult<Option<QuoteRecord>> {
        let token = self.tokens.get_token().await?;

        let master = self.api.instrument_master(&token).await?;
        let target = match select_front_month(&master) {
            Some(item) => item.clone(),
            None => {
                info!(
                    instruments = master.len(),
                    "상장된 KOSPI200 선물 종목 없음"
                );
                return Ok(None);
            }
        };

        debug!(symbol = %target.name, code = %target.code, "근월물 선택");

        let block = match self.api.futures_quote(&token, &target.code).await? {
            Some(block) => block,
            None => {
                warn!(code = %target.code, "현재가 응답에 t8456OutBlock 없음");
                return Ok(None);
            }
        };

        to_record(&target, &block, self.clock.as_ref()).map(Some)
    }
}

/// 현재가 블록을 `QuoteRecord`로 변환.
fn to_record(
    target: &Instrument,
    block: &QuoteBlock,
    clock: &dyn Clock,
) -> ExchangeResult<QuoteRecord> {
    let record = QuoteRecord::new(
        target.name.clone(),
        block.price.as_f64()?,
        block.change.as_f64()?,
        block.diff.as_f64()?,
        block.volume.as_i64()?,
        clock.now(),
    );
    if record.volume < 0 {
        return Err(ExchangeError::ParseError(format!(
            "Negative volume: {}",
            record.volume
        )));
    }
    Ok(record)
}

#[async_trait]
impl QuoteSource for QuoteFetcher {
    async fn fetch_quote(&self) -> Option<QuoteRecord> {
        self.fetch().await
    }
}
