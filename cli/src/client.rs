//! HTTP client for a running node

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use wolochain_node::api::TxResponse;

const TENDERMINT_SERVICE: &str = "/cosmos/base/tendermint/v1beta1";
const NODE_SERVICE: &str = "/cosmos/base/node/v1beta1";

/// API Error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("{0} is not served by this node")]
    NotImplemented(String),

    #[error("Empty response")]
    EmptyResponse,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_response: TxResponse,
}

/// API Client for interacting with a Wolochain node
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", base_url.trim_end_matches('/'))
        };
        Ok(Self {
            base_url,
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a `/cosmos/...` service path
    async fn get_service(&self, path: &str) -> Result<Value, ApiError> {
        let resp = self.client.get(format!("{}{}", self.base_url, path)).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_IMPLEMENTED {
            return Err(ApiError::NotImplemented(path.to_string()));
        }
        if !status.is_success() {
            let message = match resp.json::<ErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => status.to_string(),
            };
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }

    /// Node info, sync state and latest height in one document
    pub async fn status(&self) -> Result<Value, ApiError> {
        let node_info = self.get_service(&format!("{TENDERMINT_SERVICE}/node_info")).await?;
        let syncing = self.get_service(&format!("{TENDERMINT_SERVICE}/syncing")).await?;
        let status = self.get_service(&format!("{NODE_SERVICE}/status")).await?;
        Ok(json!({
            "node_info": node_info["default_node_info"],
            "sync_info": {
                "latest_block_height": status["height"],
                "latest_block_time": status["timestamp"],
                "latest_app_hash": status["app_hash"],
                "earliest_block_height": status["earliest_store_height"],
                "catching_up": syncing["syncing"],
            },
        }))
    }

    /// Block at `height`, or the latest block
    pub async fn block(&self, height: Option<u64>) -> Result<Value, ApiError> {
        let path = match height {
            Some(h) => format!("{TENDERMINT_SERVICE}/blocks/{h}"),
            None => format!("{TENDERMINT_SERVICE}/blocks/latest"),
        };
        self.get_service(&path).await
    }

    pub async fn validator_set(&self) -> Result<Value, ApiError> {
        self.get_service(&format!("{TENDERMINT_SERVICE}/validatorsets/latest"))
            .await
    }

    /// Module query at `height`, or at the latest height
    pub async fn query(&self, module: &str, path: &[String], height: Option<u64>) -> Result<Value, ApiError> {
        let mut url = format!("{}/query/{}/{}", self.base_url, module, path.join("/"));
        if let Some(h) = height {
            url.push_str(&format!("?height={h}"));
        }
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let body: ApiResponse<Value> = resp.json().await?;

        if body.success {
            body.data.ok_or(ApiError::EmptyResponse)
        } else {
            Err(ApiError::Server {
                status: status.as_u16(),
                message: body.error.unwrap_or_default(),
            })
        }
    }

    /// Submit a base64 transaction to the node's pool
    pub async fn broadcast(&self, tx_bytes: &str) -> Result<TxResponse, ApiError> {
        let url = format!("{}/cosmos/tx/v1beta1/txs", self.base_url);
        let resp: BroadcastResponse = self
            .client
            .post(&url)
            .json(&json!({ "tx_bytes": tx_bytes, "mode": "BROADCAST_MODE_SYNC" }))
            .send()
            .await?
            .json()
            .await?;
        Ok(resp.tx_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(ApiClient::new("127.0.0.1:1317").unwrap().base_url(), "http://127.0.0.1:1317");
        assert_eq!(
            ApiClient::new("https://rpc.example.com/").unwrap().base_url(),
            "https://rpc.example.com"
        );
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(client.status().await, Err(ApiError::Http(_))));
    }
}
