//! HTTP API for a Wolochain node
//!
//! `/health`, module queries and transaction broadcast are always served.
//! The consensus-info and node service routes exist only when those services
//! were registered on the application; every other `/cosmos/...` path
//! answers 501.

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};
use wolochain_core::{WolochainError, APP_NAME};

use crate::app::{codes, error_code};
use crate::blocks::StoredBlock;
use crate::runtime::NodeRuntime;

/// API state containing node runtime
pub type ApiState = Arc<NodeRuntime>;

/// gRPC status codes used in error bodies
pub mod grpc {
    pub const INVALID_ARGUMENT: u32 = 3;
    pub const NOT_FOUND: u32 = 5;
    pub const UNIMPLEMENTED: u32 = 12;
    pub const INTERNAL: u32 = 13;
}

const TENDERMINT_SERVICE: &str = "/cosmos/base/tendermint/v1beta1";
const NODE_SERVICE: &str = "/cosmos/base/node/v1beta1";

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Error body of the `/cosmos/...` routes
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u32,
    pub message: String,
}

fn service_error(status: StatusCode, code: u32, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            code,
            message: message.into(),
        }),
    )
        .into_response()
}

fn not_implemented() -> Response {
    service_error(StatusCode::NOT_IMPLEMENTED, grpc::UNIMPLEMENTED, "Not Implemented")
}

fn status_for(err: &WolochainError) -> StatusCode {
    match err {
        WolochainError::NotFound(_)
        | WolochainError::ModuleNotFound(_)
        | WolochainError::UnknownQuery(_)
        | WolochainError::HeightNotFound(_) => StatusCode::NOT_FOUND,
        WolochainError::InvalidAddress(_) | WolochainError::InvalidCoins(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Transaction broadcast request
#[derive(Debug, Deserialize)]
pub struct BroadcastTxRequest {
    pub tx_bytes: String,
    #[serde(default)]
    pub mode: String,
}

/// Outcome of a broadcast; a non-zero code means the transaction was
/// rejected before entering the pool.
#[derive(Debug, Serialize, Deserialize)]
pub struct TxResponse {
    pub txhash: String,
    pub code: u32,
    pub raw_log: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub height: Option<u64>,
}

/// Create API router
pub fn create_router(state: ApiState, enable_cors: bool) -> Router {
    let services = state.app().read().services();

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/query/:module/*path", get(query))
        .route("/cosmos/tx/v1beta1/txs", post(broadcast_tx));

    if services.consensus_info {
        router = router
            .route(&format!("{TENDERMINT_SERVICE}/node_info"), get(node_info))
            .route(&format!("{TENDERMINT_SERVICE}/syncing"), get(syncing))
            .route(&format!("{TENDERMINT_SERVICE}/blocks/latest"), get(latest_block))
            .route(&format!("{TENDERMINT_SERVICE}/blocks/:height"), get(block_by_height))
            .route(
                &format!("{TENDERMINT_SERVICE}/validatorsets/latest"),
                get(latest_validator_set),
            );
    }
    if services.node_info {
        router = router
            .route(&format!("{NODE_SERVICE}/config"), get(node_config))
            .route(&format!("{NODE_SERVICE}/status"), get(node_status));
    }

    let router = router.fallback(fallback).with_state(state);
    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// Health check
async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn fallback(uri: Uri) -> Response {
    if uri.path().starts_with("/cosmos/") {
        debug!("No service registered for {}", uri.path());
        return not_implemented();
    }
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err(format!("no route for {}", uri.path()))),
    )
        .into_response()
}

/// Module query: `/query/<module>/<path...>`
async fn query(
    State(runtime): State<ApiState>,
    Path((module, path)): Path<(String, String)>,
    Query(params): Query<QueryParams>,
) -> Response {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let result = runtime.app().read().query(params.height, &module, &segments);
    match result {
        Ok(value) => (StatusCode::OK, Json(ApiResponse::ok(value))).into_response(),
        Err(e) => (status_for(&e), Json(ApiResponse::<Value>::err(e))).into_response(),
    }
}

/// Check a transaction and add it to the pool
async fn broadcast_tx(
    State(runtime): State<ApiState>,
    Json(request): Json<BroadcastTxRequest>,
) -> impl IntoResponse {
    debug!("Broadcast ({}) of {} bytes", request.mode, request.tx_bytes.len());
    let response = match runtime.submit_tx(&request.tx_bytes) {
        Ok(hash) => TxResponse {
            txhash: hash.to_hex().to_uppercase(),
            code: codes::OK,
            raw_log: String::new(),
        },
        Err(e) => TxResponse {
            txhash: String::new(),
            code: error_code(&e),
            raw_log: e.to_string(),
        },
    };
    Json(json!({ "tx_response": response }))
}

async fn node_info(State(runtime): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "default_node_info": {
            "network": runtime.chain_id(),
            "moniker": runtime.config().moniker,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "application_version": {
            "name": APP_NAME,
            "app_name": format!("{APP_NAME}d"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    }))
}

async fn syncing() -> impl IntoResponse {
    Json(json!({"syncing": false}))
}

fn block_json(block: &StoredBlock) -> Value {
    json!({
        "block_id": { "hash": block.hash },
        "block": {
            "header": {
                "chain_id": block.header.chain_id,
                "height": block.height().to_string(),
                "time": block.header.time.to_rfc3339(),
                "app_hash": block.app_hash,
            },
            "data": { "txs": block.txs },
        },
    })
}

async fn latest_block(State(runtime): State<ApiState>) -> Response {
    match runtime.blocks().latest() {
        Ok(Some(block)) => Json(block_json(&block)).into_response(),
        Ok(None) => service_error(StatusCode::NOT_FOUND, grpc::NOT_FOUND, "no blocks committed yet"),
        Err(e) => service_error(StatusCode::INTERNAL_SERVER_ERROR, grpc::INTERNAL, e.to_string()),
    }
}

async fn block_by_height(
    State(runtime): State<ApiState>,
    Path(height): Path<String>,
) -> Response {
    let height: u64 = match height.parse() {
        Ok(h) => h,
        Err(_) => {
            return service_error(
                StatusCode::BAD_REQUEST,
                grpc::INVALID_ARGUMENT,
                format!("invalid height {height}"),
            )
        }
    };
    match runtime.blocks().load(height) {
        Ok(Some(block)) => Json(block_json(&block)).into_response(),
        Ok(None) => service_error(
            StatusCode::NOT_FOUND,
            grpc::NOT_FOUND,
            format!("block {height} not found"),
        ),
        Err(e) => service_error(StatusCode::INTERNAL_SERVER_ERROR, grpc::INTERNAL, e.to_string()),
    }
}

async fn latest_validator_set(State(runtime): State<ApiState>) -> Response {
    let height = runtime.app().read().last_block_height();
    match runtime.validators() {
        Ok(validators) => {
            let entries: Vec<Value> = validators
                .iter()
                .map(|v| {
                    json!({
                        "address": v.address,
                        "pub_key": v.pub_key,
                        "voting_power": v.power.to_string(),
                        "proposer_priority": "0",
                    })
                })
                .collect();
            Json(json!({
                "block_height": height.to_string(),
                "validators": entries,
                "pagination": { "total": validators.len().to_string() },
            }))
            .into_response()
        }
        Err(e) => service_error(StatusCode::INTERNAL_SERVER_ERROR, grpc::INTERNAL, e.to_string()),
    }
}

async fn node_config(State(runtime): State<ApiState>) -> impl IntoResponse {
    let min_gas_prices = runtime.app().read().settings().min_gas_prices.to_string();
    Json(json!({ "minimum_gas_price": min_gas_prices }))
}

async fn node_status(State(runtime): State<ApiState>) -> Response {
    match runtime.status() {
        Ok(status) => Json(json!({
            "earliest_store_height": status.earliest_height.to_string(),
            "height": status.height.to_string(),
            "timestamp": status.time.to_rfc3339(),
            "app_hash": status.app_hash,
        }))
        .into_response(),
        Err(e) => service_error(StatusCode::INTERNAL_SERVER_ERROR, grpc::INTERNAL, e.to_string()),
    }
}

/// Start API server
pub async fn start_api_server(
    runtime: Arc<NodeRuntime>,
    listen_addr: &str,
    enable_cors: bool,
) -> anyhow::Result<()> {
    let router = create_router(runtime, enable_cors);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("API server listening on {}", listen_addr);
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockStore;
    use crate::testutil::{self, TestChain};
    use crate::AppSettings;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use wolochain_core::NodeConfig;

    fn node(chain: &TestChain, services: bool) -> ApiState {
        let mut app = chain.app(AppSettings::new(chain.home(), testutil::CHAIN_ID));
        if services {
            app.register_consensus_info_service();
            app.register_node_service();
        }
        let blocks = BlockStore::open(&BlockStore::path_in_home(chain.home())).unwrap();
        let runtime = NodeRuntime::new(NodeConfig::default(), chain.genesis.clone(), app, blocks);
        runtime.init_chain_if_needed().unwrap();
        runtime.produce_block().unwrap();
        Arc::new(runtime)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_unregistered_services_are_not_implemented() {
        let chain = TestChain::new();
        let router = create_router(node(&chain, false), false);

        for uri in [
            "/cosmos/base/tendermint/v1beta1/node_info",
            "/cosmos/base/tendermint/v1beta1/blocks/latest",
            "/cosmos/base/node/v1beta1/status",
        ] {
            let (status, body) = get_json(router.clone(), uri).await;
            assert_eq!(status, StatusCode::NOT_IMPLEMENTED, "{uri}");
            assert_eq!(body, json!({"code": 12, "message": "Not Implemented"}));
        }

        let (status, _) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_registered_services_return_live_data() {
        let chain = TestChain::new();
        let router = create_router(node(&chain, true), true);

        let (status, body) = get_json(router.clone(), "/cosmos/base/tendermint/v1beta1/node_info").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default_node_info"]["network"], testutil::CHAIN_ID);

        let (_, body) = get_json(router.clone(), "/cosmos/base/tendermint/v1beta1/blocks/latest").await;
        assert_eq!(body["block"]["header"]["height"], "1");

        let (status, _) = get_json(router.clone(), "/cosmos/base/tendermint/v1beta1/blocks/9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = get_json(router.clone(), "/cosmos/base/tendermint/v1beta1/validatorsets/latest").await;
        assert_eq!(body["validators"][0]["voting_power"], "10");

        let (_, body) = get_json(router.clone(), "/cosmos/base/node/v1beta1/status").await;
        assert_eq!(body["height"], "1");

        let (status, _) = get_json(router, "/cosmos/gov/v1beta1/proposals").await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_module_queries() {
        let chain = TestChain::new();
        let router = create_router(node(&chain, false), false);

        let (status, body) = get_json(router.clone(), "/query/wolochain/params").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({"params": {}}));

        let (status, _) = get_json(router.clone(), "/query/mint/params").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get_json(router, "/query/staking/validators?height=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["validators"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_rejects_garbage() {
        let chain = TestChain::new();
        let router = create_router(node(&chain, false), false);

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cosmos/tx/v1beta1/txs")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"tx_bytes":"not-base64","mode":"BROADCAST_MODE_SYNC"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["tx_response"]["code"], codes::INVALID_REQUEST);
    }
}
