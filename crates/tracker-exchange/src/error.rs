//! 거래소 API 에러 타입.

use thiserror::Error;

/// LS Open API 호출 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 토큰 발급 거부 (AppKey/AppSecret 불일치 등)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 업스트림이 보낸 토큰 만료/무효 신호 (401 또는 본문 마커)
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// API 에러 응답
    #[error("API error {code}: {message}")]
    ApiError { code: i32, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 클라이언트 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExchangeError {
    /// 토큰 발급 자체가 거부된 경우.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ExchangeError::Unauthorized(_))
    }

    /// 캐시된 토큰을 버리고 재발급해야 하는 경우.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, ExchangeError::InvalidToken(_))
    }

    /// 같은 틱 안에서 재시도할 수 있는 일시적 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::NetworkError(_)
                | ExchangeError::Timeout(_)
                | ExchangeError::ApiError { .. }
                | ExchangeError::ParseError(_)
        )
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_decode() {
            ExchangeError::ParseError(err.to_string())
        } else {
            ExchangeError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

/// 거래소 작업 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;
