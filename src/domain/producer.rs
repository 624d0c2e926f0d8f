use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Row of the `eosio::producers` table, reduced to what reward estimation needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProducerInfo {
    /// Producer account name
    pub owner: String,
    /// Blocks produced since the last claim
    #[serde(deserialize_with = "deserialize_u64ish")]
    pub unpaid_blocks: u64,
    /// Stake-weighted votes received
    #[serde(deserialize_with = "deserialize_decimalish")]
    pub total_votes: Decimal,
    /// Last successful claim, normalized to millisecond precision
    #[serde(deserialize_with = "deserialize_time_point")]
    pub last_claim_time: DateTime<Utc>,
}

/// Row of the `eosio::global` table, reduced to the reward buckets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GlobalRewardPool {
    #[serde(deserialize_with = "deserialize_decimalish")]
    pub perblock_bucket: Decimal,
    #[serde(deserialize_with = "deserialize_decimalish")]
    pub pervote_bucket: Decimal,
    #[serde(deserialize_with = "deserialize_u64ish")]
    pub total_unpaid_blocks: u64,
    #[serde(deserialize_with = "deserialize_decimalish")]
    pub total_producer_vote_weight: Decimal,
}

/// Parse a decimal from either a JSON number or a numeric string.
///
/// nodeos emits `float64` fields as strings and large `int64` fields as either
/// form depending on magnitude, so both shapes have to be accepted.
pub(crate) fn parse_decimalish(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

fn deserialize_decimalish<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_decimalish(&value)
        .ok_or_else(|| D::Error::custom(format!("expected decimal, got {}", value)))
}

fn deserialize_u64ish<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| D::Error::custom(format!("expected unsigned integer, got {}", value)))
}

/// Accepts the two encodings of `last_claim_time`: a microsecond count
/// (number or digit string) or an ISO-8601 `time_point` without offset.
fn deserialize_time_point<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_time_point(&value)
        .ok_or_else(|| D::Error::custom(format!("invalid time_point: {}", value)))
}

pub(crate) fn parse_time_point(value: &Value) -> Option<DateTime<Utc>> {
    let micros = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse::<i64>().ok()
        }
        Value::String(s) => {
            let naive =
                NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()?;
            return DateTime::from_timestamp_millis(naive.and_utc().timestamp_millis());
        }
        _ => None,
    }?;

    DateTime::from_timestamp_millis(micros / 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn producer_row_with_string_votes_and_iso_time_point() {
        let row = json!({
            "owner": "fibosbpaaaaa",
            "total_votes": "3451282927375613.5000000000",
            "producer_key": "FO6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV",
            "is_active": 1,
            "url": "https://example.org",
            "unpaid_blocks": 1248,
            "last_claim_time": "2019-08-01T12:00:00.500",
            "location": 0
        });

        let producer: ProducerInfo = serde_json::from_value(row).expect("row should parse");
        assert_eq!(producer.owner, "fibosbpaaaaa");
        assert_eq!(producer.unpaid_blocks, 1248);
        assert_eq!(producer.total_votes, dec!(3451282927375613.5));
        assert_eq!(producer.last_claim_time.timestamp_millis(), 1_564_660_800_500);
    }

    #[test]
    fn producer_row_with_microsecond_last_claim_time() {
        let row = json!({
            "owner": "fibosbpaaaaa",
            "total_votes": 12.5,
            "unpaid_blocks": "7",
            "last_claim_time": "1564660800500123"
        });

        let producer: ProducerInfo = serde_json::from_value(row).expect("row should parse");
        assert_eq!(producer.unpaid_blocks, 7);
        assert_eq!(producer.total_votes, dec!(12.5));
        assert_eq!(producer.last_claim_time.timestamp_millis(), 1_564_660_800_500);
    }

    #[test]
    fn global_row_accepts_mixed_number_encodings() {
        let row = json!({
            "max_block_net_usage": 1048576,
            "perblock_bucket": "100000000",
            "pervote_bucket": 50000000,
            "total_unpaid_blocks": 100,
            "total_producer_vote_weight": "1.0e4"
        });

        let pool: GlobalRewardPool = serde_json::from_value(row).expect("row should parse");
        assert_eq!(pool.perblock_bucket, dec!(100000000));
        assert_eq!(pool.pervote_bucket, dec!(50000000));
        assert_eq!(pool.total_unpaid_blocks, 100);
        assert_eq!(pool.total_producer_vote_weight, dec!(10000));
    }

    #[test]
    fn rejects_garbage_time_point() {
        assert!(parse_time_point(&json!("yesterday")).is_none());
        assert!(parse_time_point(&json!(true)).is_none());
    }
}
