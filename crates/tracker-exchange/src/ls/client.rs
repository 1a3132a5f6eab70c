//! LS 선물/옵션 시세 REST 클라이언트.
//!
//! 모든 시세 TR은 `POST /futureoption/market-data` 하나의 엔드포인트로 보내고
//! `tr_cd` 헤더로 구분합니다.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::config::LsConfig;
use super::{tr_cd, INVALID_TOKEN_MARKER};
use crate::traits::{MarketDataApi, TokenIssuer};
use crate::{ExchangeError, ExchangeResult};

/// OAuth 토큰 응답.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// 지수선물 마스터 항목 (t8432OutBlock).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// 종목명 (예: "F 2603")
    #[serde(rename = "hname")]
    pub name: String,
    /// 단축코드 (예: "A0166000")
    #[serde(rename = "shcode")]
    pub code: String,
    /// 확장코드
    #[serde(rename = "expcode", default, skip_serializing_if = "Option::is_none")]
    pub expiry_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MasterResponse {
    #[serde(rename = "t8432OutBlock", default)]
    out_block: Vec<Instrument>,
}

/// 숫자 문자열 또는 숫자로 오는 필드.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// 실수로 변환. NaN, 무한대는 거부합니다.
    pub fn as_f64(&self) -> ExchangeResult<f64> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ExchangeError::ParseError(format!("Not a number: '{}'", s)))?,
        };
        if !value.is_finite() {
            return Err(ExchangeError::ParseError(format!("Not a finite number: {}", value)));
        }
        Ok(value)
    }

    /// 정수로 변환. 문자열은 정수 표기만, 숫자는 소수부가 없을 때만 허용합니다.
    pub fn as_i64(&self) -> ExchangeResult<i64> {
        match self {
            Numeric::Number(n) if n.is_finite() && n.fract() == 0.0 => Ok(*n as i64),
            Numeric::Number(n) => Err(ExchangeError::ParseError(format!("Not an integer: {}", n))),
            Numeric::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ExchangeError::ParseError(format!("Not an integer: '{}'", s))),
        }
    }
}

/// 선물 현재가 블록 (t8456OutBlock).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuoteBlock {
    /// 현재가
    pub price: Numeric,
    /// 전일대비
    pub change: Numeric,
    /// 등락율
    pub diff: Numeric,
    /// 누적거래량
    pub volume: Numeric,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "t8456OutBlock", default)]
    out_block: Option<QuoteBlock>,
}

/// LS Open API REST 클라이언트.
pub struct LsRestClient {
    config: LsConfig,
    client: Client,
}

impl LsRestClient {
    /// 새 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::Config`.
    pub fn new(config: LsConfig) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::Config(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self { config, client })
    }

    fn market_data_url(&self) -> String {
        format!("{}/futureoption/market-data", self.config.rest_base_url())
    }

    fn build_headers(token: &str, tr: &str) -> ExchangeResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ExchangeError::ParseError("authorization 헤더에 유효하지 않은 문자 포함".into())
            })?,
        );
        headers.insert(
            "tr_cd",
            HeaderValue::from_str(tr)
                .map_err(|_| ExchangeError::ParseError(format!("잘못된 tr_cd: {}", tr)))?,
        );
        headers.insert("tr_cont", HeaderValue::from_static("N"));
        headers.insert("tr_cont_key", HeaderValue::from_static(""));
        headers.insert("mac_address", HeaderValue::from_static("000000000000"));
        Ok(headers)
    }

    /// 시세 TR 요청 후 응답 본문 반환.
    ///
    /// 401 또는 토큰 무효 마커가 있으면 `InvalidToken`, 그 외 비정상 상태는 `ApiError`.
    async fn post_market_data(
        &self,
        token: &str,
        tr: &str,
        body: &serde_json::Value,
    ) -> ExchangeResult<String> {
        let response = self
            .client
            .post(self.market_data_url())
            .headers(Self::build_headers(token, tr)?)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || text.contains(INVALID_TOKEN_MARKER) {
            return Err(ExchangeError::InvalidToken(format!("{} ({})", tr, status)));
        }

        if !status.is_success() {
            error!("LS {} request failed: {} - {}", tr, status, text);
            return Err(ExchangeError::ApiError {
                code: status.as_u16() as i32,
                message: text,
            });
        }

        debug!("LS {} response: {} bytes", tr, text.len());
        Ok(text)
    }
}

#[async_trait]
impl TokenIssuer for LsRestClient {
    async fn issue_token(&self) -> ExchangeResult<String> {
        info!(
            "Requesting LS access token (AppKey: {})",
            self.config.masked_app_key()
        );

        let url = format!("{}/oauth2/token", self.config.rest_base_url());
        let form = [
            ("grant_type", "client_credentials"),
            ("appkey", self.config.app_key.as_str()),
            ("appsecretkey", self.config.app_secret.expose_secret()),
            ("scope", "oob"),
        ];

        let response = self.client.post(&url).form(&form).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            error!("Token request failed: {} - {}", status, body);
            return Err(ExchangeError::Unauthorized(format!(
                "Token fetch failed: {}",
                body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse token response: {}", e))
        })?;

        Ok(token.access_token)
    }
}

#[async_trait]
impl MarketDataApi for LsRestClient {
    async fn instrument_master(&self, token: &str) -> ExchangeResult<Vec<Instrument>> {
        let body = serde_json::json!({ "t8432InBlock": { "gubun": "0" } });
        let text = self
            .post_market_data(token, tr_cd::FUTURES_MASTER, &body)
            .await?;

        let resp: MasterResponse = serde_json::from_str(&text).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse t8432 response: {}", e))
        })?;

        Ok(resp.out_block)
    }

    async fn futures_quote(&self, token: &str, code: &str) -> ExchangeResult<Option<QuoteBlock>> {
        let body = serde_json::json!({ "t8456InBlock": { "focode": code } });
        let text = self
            .post_market_data(token, tr_cd::FUTURES_PRICE, &body)
            .await?;

        let resp: QuoteResponse = serde_json::from_str(&text).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse t8456 response: {}", e))
        })?;

        Ok(resp.out_block)
    }
}
