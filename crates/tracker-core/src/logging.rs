//! tracing 기반 로깅 초기화.
//!
//! 출력 형식은 `LOG_FORMAT`으로 고릅니다:
//! - **pretty**: 개발용 여러 줄 형식 (기본값)
//! - **json**: 무인 운영 시 로그 수집기로 보내기 위한 형식
//! - **compact**: 한 줄 형식

use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            "compact" => Self::Compact,
            other => return Err(format!("알 수 없는 로그 형식: {other} (pretty|json|compact)")),
        };
        Ok(format)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 지시문 (예: "info", "tracker_collector=debug,sqlx=warn")
    pub level: String,
    /// 출력 형식
    pub format: LogFormat,
    /// 대상(모듈 경로) 포함 여부
    pub with_target: bool,
    /// 파일명과 줄 번호 포함 여부
    pub with_file: bool,
}

impl LogConfig {
    /// 주어진 필터와 pretty 형식으로 설정을 생성합니다.
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            with_target: true,
            with_file: false,
        }
    }

    /// 로그 형식을 설정합니다.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// 파일/줄 번호 출력 여부를 설정합니다.
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self
    }

    /// `RUST_LOG`/`LOG_FORMAT` 환경 변수로 설정을 생성합니다.
    ///
    /// `RUST_LOG`가 없으면 `default_level`을, `LOG_FORMAT`이 없거나 잘못되면 pretty를 씁니다.
    pub fn from_env_or(default_level: impl Into<String>) -> Self {
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into());
        let format = std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Self::new(level).with_format(format)
    }
}

/// 주어진 설정으로 전역 subscriber를 설치합니다. 두 번째 호출은 에러입니다.
///
/// ```no_run
/// use tracker_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_new(&config.level)?;

    // 형식 전환(pretty/json/compact)은 아래 표시 옵션을 유지함
    let base = fmt::layer()
        .with_target(config.with_target)
        .with_file(config.with_file)
        .with_line_number(config.with_file);

    let layer = match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()?;

    tracing::debug!(format = ?config.format, filter = %config.level, "로깅 초기화 완료");
    Ok(())
}
