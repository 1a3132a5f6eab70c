//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 저장소 관련 오류 (PersistenceError).
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 데이터 삽입 오류
    #[error("Insert error: {0}")]
    InsertError(String),

    /// 데이터 삭제 오류
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    MigrationError(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DataError::ConnectionError(err.to_string())
            }
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

/// 데이터 작업 Result 타입.
pub type Result<T> = std::result::Result<T, DataError>;
