//! 에러 타입 정의.

use thiserror::Error;
use tracker_data::DataError;
use tracker_exchange::ExchangeError;
use tracker_notification::NotificationError;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 저장소 에러
    #[error("Database error: {0}")]
    Database(#[from] DataError),

    /// 거래소 API 에러
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    /// 캐시 무효화 에러
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// 수집 틱 실행 중 예기치 못한 실패
    #[error("Tick failed: {0}")]
    Tick(String),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
