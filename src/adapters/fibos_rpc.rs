//! nodeos HTTP adapter.
//!
//! Reads the `eosio` system tables through the chain API and pushes
//! `claimrewards`. Signing is delegated to a keosd-compatible wallet daemon,
//! so no key material lives in this process.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::chain::ChainClient;
use crate::config::{AppConfig, ChainConfig, WalletConfig};
use crate::domain::{GlobalRewardPool, ProducerInfo};
use crate::error::{ClaimerError, Result};

const SYSTEM_ACCOUNT: &str = "eosio";
const CLAIM_ACTION: &str = "claimrewards";
const TX_EXPIRATION_SECS: i64 = 60;
const TIME_POINT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Query,
    Submit,
}

impl CallKind {
    fn error(&self, message: String) -> ClaimerError {
        match self {
            CallKind::Query => ClaimerError::Query(message),
            CallKind::Submit => ClaimerError::Submit(message),
        }
    }
}

/// Subset of `/v1/chain/get_info`
#[derive(Debug, Clone, Deserialize)]
pub struct ChainInfo {
    pub chain_id: String,
    pub head_block_num: u32,
    pub head_block_id: String,
    pub head_block_time: String,
}

/// Reference-block fields binding a transaction to a recent block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tapos {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
}

impl Tapos {
    /// Derive TAPoS fields from a block number and its hex block id
    pub fn from_block(block_num: u32, block_id: &str) -> Result<Self> {
        let bytes = hex::decode(block_id)
            .map_err(|e| ClaimerError::Submit(format!("invalid block id {}: {}", block_id, e)))?;
        let prefix: [u8; 4] = bytes
            .get(8..12)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ClaimerError::Submit(format!("block id too short: {}", block_id)))?;

        Ok(Self {
            ref_block_num: (block_num & 0xffff) as u16,
            ref_block_prefix: u32::from_le_bytes(prefix),
        })
    }
}

#[derive(Clone)]
pub struct FibosRpcClient {
    http: Client,
    endpoint: String,
    wallet_url: String,
    chain_id: String,
    permission: String,
    public_key: String,
}

impl FibosRpcClient {
    pub fn new(chain: &ChainConfig, wallet: &WalletConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent("autoclaim/0.1")
            .timeout(Duration::from_secs(chain.request_timeout_secs))
            .build()
            .map_err(|e| ClaimerError::Validation(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: chain.http_endpoint.trim_end_matches('/').to_string(),
            wallet_url: wallet.url.trim_end_matches('/').to_string(),
            chain_id: chain.chain_id.clone(),
            permission: chain.permission.clone(),
            public_key: wallet.public_key.clone(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.chain, &config.wallet)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_json(&self, url: &str, body: &Value, kind: CallKind) -> Result<Value> {
        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| kind.error(format!("POST {} failed: {}", url, e)))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| kind.error(format!("reading {} response failed: {}", url, e)))?;

        if !status.is_success() {
            return Err(kind.error(format!(
                "POST {} failed: status={} body={}",
                url,
                status,
                Self::error_summary(&text)
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| kind.error(format!("invalid JSON from {}: {}", url, e)))
    }

    async fn chain_call(&self, path: &str, body: &Value, kind: CallKind) -> Result<Value> {
        let url = format!("{}/v1/chain/{}", self.endpoint, path);
        debug!("chain call {}", path);
        self.post_json(&url, body, kind).await
    }

    /// nodeos error bodies nest the useful text under `error.what` / `error.details`
    fn error_summary(text: &str) -> String {
        let Ok(root) = serde_json::from_str::<Value>(text) else {
            return text.to_string();
        };
        let error = root.get("error");
        let what = error.and_then(|e| e.get("what")).and_then(Value::as_str);
        let detail = error
            .and_then(|e| e.get("details"))
            .and_then(Value::as_array)
            .and_then(|d| d.first())
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str);

        match (what, detail) {
            (Some(what), Some(detail)) => format!("{}: {}", what, detail),
            (Some(what), None) => what.to_string(),
            _ => text.to_string(),
        }
    }

    fn first_row(response: &Value) -> Option<&Value> {
        response
            .get("rows")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
    }

    fn parse_producer_rows(account: &str, response: &Value) -> Result<ProducerInfo> {
        let row = Self::first_row(response)
            .ok_or_else(|| ClaimerError::Query(format!("producer {} not found", account)))?;
        let producer: ProducerInfo = serde_json::from_value(row.clone())
            .map_err(|e| ClaimerError::Query(format!("malformed producer row: {}", e)))?;

        // lower_bound returns the next row when the account is not registered
        if producer.owner != account {
            return Err(ClaimerError::Query(format!(
                "{} is not a registered producer (nearest row: {})",
                account, producer.owner
            )));
        }

        Ok(producer)
    }

    fn parse_global_rows(response: &Value) -> Result<GlobalRewardPool> {
        let row = Self::first_row(response)
            .ok_or_else(|| ClaimerError::Query("Can not get global info.".to_string()))?;
        serde_json::from_value(row.clone())
            .map_err(|e| ClaimerError::Query(format!("malformed global row: {}", e)))
    }

    async fn get_info(&self) -> Result<ChainInfo> {
        let info = self
            .chain_call("get_info", &json!({}), CallKind::Submit)
            .await?;
        serde_json::from_value(info)
            .map_err(|e| ClaimerError::Submit(format!("malformed get_info response: {}", e)))
    }

    async fn claim_action_data(&self, account: &str) -> Result<String> {
        let body = json!({
            "code": SYSTEM_ACCOUNT,
            "action": CLAIM_ACTION,
            "args": { "owner": account },
        });
        let resp = self
            .chain_call("abi_json_to_bin", &body, CallKind::Submit)
            .await?;

        resp.get("binargs")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| ClaimerError::Submit("abi_json_to_bin returned no binargs".into()))
    }

    /// Unsigned `claimrewards` transaction in nodeos JSON form
    fn build_transaction(&self, info: &ChainInfo, account: &str, data: &str) -> Result<Value> {
        let tapos = Tapos::from_block(info.head_block_num, &info.head_block_id)?;
        let head_time = parse_block_time(&info.head_block_time)?;
        let expiration = head_time + ChronoDuration::seconds(TX_EXPIRATION_SECS);

        Ok(json!({
            "expiration": expiration.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "ref_block_num": tapos.ref_block_num,
            "ref_block_prefix": tapos.ref_block_prefix,
            "max_net_usage_words": 0,
            "max_cpu_usage_ms": 0,
            "delay_sec": 0,
            "context_free_actions": [],
            "actions": [{
                "account": SYSTEM_ACCOUNT,
                "name": CLAIM_ACTION,
                "authorization": [{ "actor": account, "permission": self.permission }],
                "data": data,
            }],
            "transaction_extensions": [],
        }))
    }

    async fn sign_transaction(&self, trx: &Value) -> Result<Vec<Value>> {
        let url = format!("{}/v1/wallet/sign_transaction", self.wallet_url);
        let body = json!([trx, [self.public_key], self.chain_id]);
        let signed = self.post_json(&url, &body, CallKind::Submit).await?;

        match signed.get("signatures").and_then(Value::as_array) {
            Some(sigs) if !sigs.is_empty() => Ok(sigs.clone()),
            _ => Err(ClaimerError::Submit(
                "wallet returned no signatures".to_string(),
            )),
        }
    }
}

fn parse_block_time(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), TIME_POINT_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|e| ClaimerError::Submit(format!("invalid head_block_time {}: {}", raw, e)))
}

#[async_trait]
impl ChainClient for FibosRpcClient {
    async fn query_account_info(&self, account: &str) -> Result<ProducerInfo> {
        let body = json!({
            "scope": SYSTEM_ACCOUNT,
            "code": SYSTEM_ACCOUNT,
            "table": "producers",
            "lower_bound": account,
            "limit": 1,
            "json": true,
        });
        let resp = self
            .chain_call("get_table_rows", &body, CallKind::Query)
            .await?;
        Self::parse_producer_rows(account, &resp)
    }

    async fn query_global_reward_pool(&self) -> Result<GlobalRewardPool> {
        let body = json!({
            "scope": SYSTEM_ACCOUNT,
            "code": SYSTEM_ACCOUNT,
            "table": "global",
            "json": true,
        });
        let resp = self
            .chain_call("get_table_rows", &body, CallKind::Query)
            .await?;
        Self::parse_global_rows(&resp)
    }

    async fn submit_claim(&self, account: &str) -> Result<String> {
        let info = self.get_info().await?;
        if !info.chain_id.eq_ignore_ascii_case(&self.chain_id) {
            return Err(ClaimerError::Submit(format!(
                "node {} reports chain id {}, expected {}",
                self.endpoint, info.chain_id, self.chain_id
            )));
        }

        let data = self.claim_action_data(account).await?;
        let trx = self.build_transaction(&info, account, &data)?;
        let signatures = self.sign_transaction(&trx).await?;

        let body = json!({
            "signatures": signatures,
            "compression": "none",
            "packed_context_free_data": "",
            "transaction": trx,
        });
        let resp = self
            .chain_call("push_transaction", &body, CallKind::Submit)
            .await?;

        resp.get("transaction_id")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| ClaimerError::Submit("push_transaction returned no transaction_id".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn client() -> FibosRpcClient {
        let config = AppConfig::from_toml_str(
            r#"
            [chain]
            http_endpoint = "http://127.0.0.1:8870/"
            account = "fibosbpaaaaa"

            [wallet]
            url = "http://127.0.0.1:8900/"
            public_key = "FO6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV"
            "#,
        )
        .expect("config should parse");
        FibosRpcClient::from_config(&config).expect("client should build")
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        assert_eq!(client().endpoint(), "http://127.0.0.1:8870");
    }

    #[test]
    fn test_parse_producer_rows() {
        let resp = json!({
            "rows": [{
                "owner": "fibosbpaaaaa",
                "total_votes": "200.00000000000000000",
                "unpaid_blocks": 5,
                "last_claim_time": "1564660800000000",
                "is_active": 1
            }],
            "more": true
        });

        let producer = FibosRpcClient::parse_producer_rows("fibosbpaaaaa", &resp)
            .expect("row should parse");
        assert_eq!(producer.unpaid_blocks, 5);
        assert_eq!(producer.total_votes, dec!(200));
        assert_eq!(producer.last_claim_time.timestamp_millis(), 1_564_660_800_000);
    }

    #[test]
    fn test_lower_bound_mismatch_is_query_error() {
        let resp = json!({
            "rows": [{
                "owner": "fibosbpbbbbb",
                "total_votes": "1.0",
                "unpaid_blocks": 0,
                "last_claim_time": 0
            }],
            "more": false
        });

        let err = FibosRpcClient::parse_producer_rows("fibosbpaaaaa", &resp).unwrap_err();
        assert!(matches!(err, ClaimerError::Query(_)));
    }

    #[test]
    fn test_empty_global_table_is_query_error() {
        let err = FibosRpcClient::parse_global_rows(&json!({ "rows": [], "more": false }))
            .unwrap_err();
        assert!(matches!(err, ClaimerError::Query(_)));

        let err = FibosRpcClient::parse_global_rows(&json!({})).unwrap_err();
        assert!(matches!(err, ClaimerError::Query(_)));
    }

    #[test]
    fn test_tapos_from_block_id() {
        let block_id = "0000ffff0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c";
        let tapos = Tapos::from_block(0x0001_ffff, block_id).expect("valid block id");

        assert_eq!(tapos.ref_block_num, 0xffff);
        assert_eq!(tapos.ref_block_prefix, u32::from_le_bytes([0x05, 0x06, 0x07, 0x08]));
    }

    #[test]
    fn test_tapos_rejects_short_block_id() {
        assert!(Tapos::from_block(1, "00ff").is_err());
        assert!(Tapos::from_block(1, "not-hex").is_err());
    }

    #[test]
    fn test_build_transaction() {
        let info = ChainInfo {
            chain_id: crate::config::FIBOS_MAINNET_CHAIN_ID.to_string(),
            head_block_num: 42,
            head_block_id: "0000002a0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c"
                .to_string(),
            head_block_time: "2019-08-01T12:00:00.500".to_string(),
        };

        let trx = client()
            .build_transaction(&info, "fibosbpaaaaa", "a0986afc4a9bb15d")
            .expect("transaction should build");

        assert_eq!(trx["expiration"], "2019-08-01T12:01:00");
        assert_eq!(trx["ref_block_num"], 42);
        assert_eq!(trx["actions"][0]["name"], "claimrewards");
        assert_eq!(trx["actions"][0]["authorization"][0]["actor"], "fibosbpaaaaa");
        assert_eq!(trx["actions"][0]["authorization"][0]["permission"], "active");
        assert_eq!(trx["actions"][0]["data"], "a0986afc4a9bb15d");
    }

    #[test]
    fn test_error_summary_extracts_nodeos_message() {
        let body = r#"{"code":500,"message":"Internal Service Error","error":{"code":3050003,"name":"eosio_assert_message_exception","what":"eosio_assert_message assertion failure","details":[{"message":"assertion failure with message: already claimed rewards within past day","file":"wasm_interface.cpp"}]}}"#;

        assert_eq!(
            FibosRpcClient::error_summary(body),
            "eosio_assert_message assertion failure: assertion failure with message: already claimed rewards within past day"
        );
        assert_eq!(FibosRpcClient::error_summary("plain"), "plain");
    }
}
