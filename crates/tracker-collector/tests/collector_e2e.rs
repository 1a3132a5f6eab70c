//! 수집 루프 통합 테스트.
//!
//! 실제 LS REST 클라이언트와 revalidate 웹훅을 mockito 서버에 연결하고,
//! 시간은 `ManualClock`으로 시뮬레이션합니다.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Asia::Seoul;
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;
use tracker_collector::{MonitorLoop, MonitorSettings, MonitorState};
use tracker_core::{Clock, ManualClock};
use tracker_data::MemoryQuoteStore;
use tracker_exchange::{LsConfig, LsRestClient, QuoteFetcher, RetryPolicy, TokenProvider};
use tracker_notification::{RevalidateConfig, RevalidateHook};

const MASTER_BODY: &str = r#"{
    "t8432OutBlock": [
        {"hname": "SP 2603-2606", "shcode": "D0166000", "expcode": "KR4D01660008"},
        {"hname": "F 2603", "shcode": "A0166000", "expcode": "KR4A01660003"}
    ]
}"#;

fn kst(d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Seoul
        .with_ymd_and_hms(2026, 1, d, h, mi, s)
        .unwrap()
        .with_timezone(&Utc)
}

struct Stack {
    clock: Arc<ManualClock>,
    store: Arc<MemoryQuoteStore>,
    monitor: MonitorLoop,
}

fn stack(server: &mockito::ServerGuard, start: DateTime<Utc>) -> Stack {
    let clock = Arc::new(ManualClock::new(start));
    let dyn_clock: Arc<dyn Clock> = clock.clone();

    let ls = LsConfig::new("PSabcdefghijklmnop", "test-secret").with_base_url(server.url());
    let client = Arc::new(LsRestClient::new(ls).unwrap());
    let fetcher = QuoteFetcher::new(
        client.clone(),
        TokenProvider::new(client),
        Arc::clone(&dyn_clock),
        RetryPolicy::default(),
    );

    let mut revalidate = RevalidateConfig::new(server.url(), Some("s3cret".to_string()));
    revalidate.tags.clear();
    let hook = RevalidateHook::new(revalidate).unwrap();

    let store = Arc::new(MemoryQuoteStore::new());
    let monitor = MonitorLoop::new(
        Arc::new(fetcher),
        store.clone(),
        Arc::new(hook),
        dyn_clock,
        MonitorSettings::default(),
    );

    Stack {
        clock,
        store,
        monitor,
    }
}

async fn mock_token(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/oauth2/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok-1", "token_type": "Bearer"}"#)
        .create_async()
        .await
}

async fn mock_master(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/futureoption/market-data")
        .match_header("tr_cd", "t8432")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(MASTER_BODY)
        .create_async()
        .await
}

async fn mock_quote(server: &mut mockito::ServerGuard, volume: &str) -> mockito::Mock {
    let body = format!(
        r#"{{"t8456OutBlock": {{"price": "350.50", "change": "1.25", "diff": "0.36", "volume": "{volume}"}}}}"#
    );
    server
        .mock("POST", "/futureoption/market-data")
        .match_header("tr_cd", "t8456")
        .match_body(Matcher::PartialJsonString(
            r#"{"t8456InBlock": {"focode": "A0166000"}}"#.into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn test_friday_night_tick_persists_one_record_and_invalidates_once() {
    let mut server = mockito::Server::new_async().await;
    mock_token(&mut server).await;
    mock_master(&mut server).await;
    mock_quote(&mut server, "1200").await;
    let revalidate = server
        .mock("GET", "/api/revalidate")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("secret".into(), "s3cret".into()),
            Matcher::UrlEncoded("path".into(), "/".into()),
        ]))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    // 2026-01-09 금요일 23:00:00 KST
    let mut s = stack(&server, kst(9, 23, 0, 0));
    let wait = s.monitor.step().await.unwrap();

    let records = s.store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].symbol, "F 2603");
    assert_eq!(records[0].price, 350.5);
    assert_eq!(records[0].volume, 1200);
    assert_eq!(records[0].recorded_at, kst(9, 23, 0, 0));
    assert_eq!(wait, Duration::from_secs(61));
    revalidate.assert_async().await;
}

#[tokio::test]
async fn test_pre_open_wait_then_first_collection() {
    let mut server = mockito::Server::new_async().await;
    mock_token(&mut server).await;
    mock_master(&mut server).await;
    mock_quote(&mut server, "1200").await;
    server
        .mock("GET", "/api/revalidate")
        .match_query(Matcher::Any)
        .with_status(200)
        .create_async()
        .await;

    let mut s = stack(&server, kst(9, 17, 59, 31));

    let wait = s.monitor.step().await.unwrap();
    assert_eq!(s.monitor.state(), MonitorState::PreOpenWait);
    assert!(wait <= Duration::from_secs(29));
    assert!(s.store.records().is_empty());

    s.clock.advance(wait);
    s.monitor.step().await.unwrap();
    assert_eq!(s.monitor.state(), MonitorState::Collecting);
    assert_eq!(s.store.records().len(), 1);
}

#[tokio::test]
async fn test_zero_volume_suspends_for_the_session() {
    let mut server = mockito::Server::new_async().await;
    mock_token(&mut server).await;
    mock_master(&mut server).await;
    let quote = server
        .mock("POST", "/futureoption/market-data")
        .match_header("tr_cd", "t8456")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"t8456OutBlock": {"price": "0", "change": "0", "diff": "0", "volume": "0"}}"#)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/api/revalidate")
        .match_query(Matcher::Any)
        .with_status(200)
        .create_async()
        .await;

    let mut s = stack(&server, kst(9, 18, 0, 0));
    for _ in 0..5 {
        let wait = s.monitor.step().await.unwrap();
        s.clock.advance(wait);
    }

    assert!(s.monitor.is_holiday());
    assert_eq!(s.monitor.state(), MonitorState::HolidaySuspended);
    assert_eq!(s.store.records().len(), 1);
    assert_eq!(s.monitor.stats().holiday_ticks, 4);
    quote.assert_async().await;
}
