//! 시세 레코드 타입.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 한 번의 수집 틱에서 얻은 선물 시세.
///
/// 생성 이후에는 변경하지 않으며, 저장소에 insert 되는 순간 소유권이 넘어갑니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// 종목명 (예: "F 2612")
    pub symbol: String,
    /// 현재가
    pub price: f64,
    /// 전일 대비
    pub change: f64,
    /// 등락률 (%)
    pub diff: f64,
    /// 누적 거래량
    pub volume: i64,
    /// 수집 시각
    pub recorded_at: DateTime<Utc>,
}

impl QuoteRecord {
    /// 새 시세 레코드를 생성합니다.
    pub fn new(
        symbol: impl Into<String>,
        price: f64,
        change: f64,
        diff: f64,
        volume: i64,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change,
            diff,
            volume,
            recorded_at,
        }
    }

    /// 거래량이 0인지 확인합니다.
    ///
    /// 야간장 도중 거래량 0은 "오늘은 거래가 없음"(휴장)을 뜻합니다.
    pub fn is_zero_volume(&self) -> bool {
        self.volume == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_zero_volume() {
        let at = Utc.with_ymd_and_hms(2026, 1, 9, 14, 0, 0).unwrap();
        let traded = QuoteRecord::new("F 2603", 350.5, 1.25, 0.36, 1200, at);
        let idle = QuoteRecord::new("F 2603", 349.25, 0.0, 0.0, 0, at);

        assert!(!traded.is_zero_volume());
        assert!(idle.is_zero_volume());
    }

    #[test]
    fn test_serializes_with_store_column_names() {
        let at = Utc.with_ymd_and_hms(2026, 1, 9, 14, 0, 0).unwrap();
        let record = QuoteRecord::new("F 2603", 350.5, 1.25, 0.36, 1200, at);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["symbol"], "F 2603");
        assert_eq!(json["volume"], 1200);
        assert!(json["recorded_at"].as_str().unwrap().starts_with("2026-01-09T14:00:00"));
    }
}
