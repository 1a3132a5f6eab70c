//! 야간 선물 수집기 CLI.

use anyhow::{anyhow, Context};
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracker_collector::{
    decide, Action, CollectorConfig, CollectorError, MonitorLoop, MonitorSettings, SessionClock,
};
use tracker_core::{init_logging, Clock, LogConfig, SystemClock};
use tracker_data::{
    Database, DatabaseConfig, MemoryQuoteStore, PgQuoteStore, QuoteStore, RetentionManager,
};
use tracker_exchange::{
    is_index_future, Instrument, LsConfig, LsRestClient, MarketDataApi, QuoteFetcher,
    TokenProvider,
};
use tracker_notification::RevalidateHook;

#[derive(Parser)]
#[command(name = "tracker-collector")]
#[command(about = "KRX Night Futures Tracker", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error). RUST_LOG가 있으면 무시됩니다.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 수집 데몬 실행 (야간장 동안 분 단위 수집)
    Run {
        /// DB 없이 메모리 저장소로 실행
        #[arg(long)]
        dry_run: bool,
    },

    /// 지수선물 마스터(t8432) 조회 및 후보 종목 출력
    CheckMaster {
        /// 전체 목록을 JSON으로 저장할 파일
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// 프론트엔드 캐시 무효화 요청 1회
    #[command(group(ArgGroup::new("target").required(true).args(["path", "tag"])))]
    Revalidate {
        /// 무효화할 경로 (예: "/")
        #[arg(long)]
        path: Option<String>,
        /// 무효화할 태그 (예: "night-futures")
        #[arg(long)]
        tag: Option<String>,
    },

    /// 보존 정리 1회 실행
    Cleanup {
        /// 보존할 최근 레코드 수 (기본: RETENTION_LIMIT)
        #[arg(long)]
        limit: Option<u64>,
    },

    /// 현재 세션 상태 출력
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(LogConfig::from_env_or(cli.log_level.as_str()))
        .map_err(|e| anyhow!("로깅 초기화 실패: {e}"))?;

    // 설정 로드
    let mut config = CollectorConfig::from_env();
    tracing::debug!(
        retention_limit = config.retention.limit,
        max_retries = config.fetch.max_retries,
        revalidate = %config.revalidate.base_url,
        "설정 로드 완료"
    );

    match cli.command {
        Commands::Run { dry_run } => {
            let settings = MonitorSettings::new(config.retention, config.schedule);
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);

            let ls = config.take_ls_config()?;
            tracing::info!(
                app_key = %ls.masked_app_key(),
                base_url = %ls.rest_base_url(),
                "LS증권 API 설정"
            );
            let client = Arc::new(LsRestClient::new(ls)?);
            let fetcher = QuoteFetcher::new(
                client.clone(),
                TokenProvider::new(client),
                Arc::clone(&clock),
                config.fetch.policy(),
            );

            let (store, db): (Arc<dyn QuoteStore>, Option<Database>) = if dry_run {
                tracing::warn!("dry-run: 메모리 저장소 사용 (DB에 기록하지 않음)");
                (Arc::new(MemoryQuoteStore::new()), None)
            } else {
                let db = connect_database(&config).await?;
                (Arc::new(PgQuoteStore::new(db.clone())), Some(db))
            };

            let hook = RevalidateHook::new(config.revalidate)?;
            let mut monitor =
                MonitorLoop::new(Arc::new(fetcher), store, Arc::new(hook), clock, settings);

            let shutdown = CancellationToken::new();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("사용자 중단");
                    signal.cancel();
                }
            });

            monitor.run(shutdown).await;

            if let Some(db) = db {
                db.close().await;
            }
        }
        Commands::CheckMaster { output } => {
            let master = fetch_master(config.take_ls_config()?)
                .await
                .context("t8432 조회 실패")?;

            tracing::info!(total = master.len(), "지수선물 마스터 조회 완료");

            let candidates: Vec<_> = master.iter().filter(|i| is_index_future(i)).collect();
            if candidates.is_empty() {
                tracing::warn!("A01/101 코드로 시작하는 종목이 없습니다");
            }
            for instrument in &candidates {
                println!(
                    "종목명: {}, 코드: {}, 확장코드: {}",
                    instrument.name,
                    instrument.code,
                    instrument.expiry_code.as_deref().unwrap_or("-")
                );
            }

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&master)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("{} 저장 실패", path.display()))?;
                tracing::info!(path = %path.display(), "전체 목록 저장 완료");
            }
        }
        Commands::Revalidate { path, tag } => {
            let hook = RevalidateHook::new(config.revalidate)?;
            tracing::info!(endpoint = %hook.config().endpoint(), "갱신 요청");
            revalidate_once(&hook, path, tag).await?;
        }
        Commands::Cleanup { limit } => {
            let limit = limit.unwrap_or(config.retention.limit);
            let db = connect_database(&config).await?;
            let store = Arc::new(PgQuoteStore::new(db.clone()));

            let before = store.count().await?;
            let deleted = RetentionManager::new(store.clone()).enforce_limit(limit).await;
            tracing::info!(limit, before, deleted, "보존 정리 완료");

            db.close().await;
        }
        Commands::Status => {
            let session = SessionClock::new();
            let now = Utc::now();
            let decision = decide(&session, now, false);

            println!("현재 시각 (KST): {}", session.local(now).format("%Y-%m-%d %H:%M:%S %a"));
            println!("야간장 개장: {}", session.is_market_open(now));
            println!("개장 임박: {}", session.is_pre_open(now));
            println!("최종 정산 틱: {}", session.is_settlement_minute(now));
            println!("상태: {}", decision.state);
            match decision.action {
                Action::Sleep(wait) => {
                    println!("다음 확인까지: {:.1}초", wait.as_secs_f64())
                }
                _ => println!(
                    "다음 수집 틱까지: {:.1}초",
                    session.next_tick_with_drift_correction(now).as_secs_f64()
                ),
            }
        }
    }

    tracing::info!("Night Futures Tracker 종료");
    Ok(())
}

/// 토큰 발급 후 지수선물 마스터 조회.
async fn fetch_master(ls: LsConfig) -> tracker_collector::Result<Vec<Instrument>> {
    let client = Arc::new(LsRestClient::new(ls)?);
    let token = TokenProvider::new(client.clone()).get_token().await?;
    Ok(client.instrument_master(&token).await?)
}

/// 경로 또는 태그 하나를 무효화.
async fn revalidate_once(
    hook: &RevalidateHook,
    path: Option<String>,
    tag: Option<String>,
) -> tracker_collector::Result<()> {
    match (path, tag) {
        (Some(path), _) => hook.revalidate_path(&path).await?,
        (None, Some(tag)) => hook.revalidate_tag(&tag).await?,
        (None, None) => {
            return Err(CollectorError::Config(
                "--path 또는 --tag가 필요합니다".to_string(),
            ))
        }
    }
    Ok(())
}

/// DB 연결 및 마이그레이션.
async fn connect_database(config: &CollectorConfig) -> tracker_collector::Result<Database> {
    let url = config.require_database_url()?;
    let db = Database::connect(&DatabaseConfig::new(url)).await?;
    db.migrate().await?;
    tracing::info!("데이터베이스 연결 성공");
    Ok(db)
}
