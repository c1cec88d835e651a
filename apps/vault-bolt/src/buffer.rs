//! Time-bucketed chunk building
//!
//! Records of one request are formatted and grouped by the start of their
//! `timekey` bucket; each bucket becomes one chunk.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chunkvault_domain::Chunk;
use serde_json::{Map, Value};

use crate::format::LineFormat;

/// A record with an optional event time
#[derive(Debug, Clone)]
pub struct TimedRecord {
    pub time: Option<DateTime<Utc>>,
    pub record: Map<String, Value>,
}

/// Start of the bucket containing `time`
pub fn bucket_start(time: &DateTime<Utc>, timekey_secs: u64) -> DateTime<Utc> {
    let width = timekey_secs.max(1) as i64;
    let secs = time.timestamp().div_euclid(width) * width;
    DateTime::from_timestamp(secs, 0).unwrap_or(*time)
}

/// Format records and split them into one chunk per time bucket
///
/// Records without a time are stamped with `now`. Chunks come back ordered
/// by bucket start.
pub fn build_chunks(
    tag: &str,
    records: &[TimedRecord],
    format: LineFormat,
    timekey_secs: u64,
    now: DateTime<Utc>,
) -> Vec<Chunk> {
    let mut buckets: BTreeMap<DateTime<Utc>, String> = BTreeMap::new();

    for record in records {
        let time = record.time.unwrap_or(now);
        let line = format.format(tag, &time, &record.record);
        buckets
            .entry(bucket_start(&time, timekey_secs))
            .or_default()
            .push_str(&line);
    }

    buckets
        .into_iter()
        .map(|(start, payload)| {
            Chunk::new(payload.into_bytes())
                .with_tag(tag)
                .with_time_key(start)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn rec(time: Option<DateTime<Utc>>, a: i64) -> TimedRecord {
        TimedRecord {
            time,
            record: json!({ "a": a }).as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_bucket_start_daily() {
        let t = Utc.with_ymd_and_hms(2016, 1, 1, 15, 30, 0).unwrap();
        assert_eq!(
            bucket_start(&t, 86_400),
            Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_bucket_start_hourly() {
        let t = Utc.with_ymd_and_hms(2016, 1, 1, 15, 30, 10).unwrap();
        assert_eq!(
            bucket_start(&t, 3_600),
            Utc.with_ymd_and_hms(2016, 1, 1, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_records_grouped_by_bucket() {
        let day1 = Utc.with_ymd_and_hms(2016, 1, 1, 12, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2016, 1, 2, 1, 0, 0).unwrap();
        let records = vec![rec(Some(day2), 3), rec(Some(day1), 1), rec(Some(day1), 2)];

        let chunks = build_chunks("test", &records, LineFormat::Json, 86_400, day2);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].data().as_ref(), b"{\"a\":1}\n{\"a\":2}\n");
        assert_eq!(chunks[1].data().as_ref(), b"{\"a\":3}\n");
        assert_eq!(chunks[0].tag(), Some("test"));
        assert_eq!(
            chunks[0].time_key(),
            Some(&Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_missing_time_uses_now() {
        let now = Utc.with_ymd_and_hms(2016, 1, 1, 15, 0, 0).unwrap();
        let chunks = build_chunks("test", &[rec(None, 1)], LineFormat::OutFile, 86_400, now);

        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].data().as_ref(),
            b"2016-01-01T15:00:00+00:00\ttest\t{\"a\":1}\n"
        );
    }

    #[test]
    fn test_no_records_no_chunks() {
        assert!(build_chunks("test", &[], LineFormat::Json, 60, Utc::now()).is_empty());
    }
}
