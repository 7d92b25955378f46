use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use mizan_lib::{
    AppState, Config, Derivative, GeneratedWord, HashView, MizanError, Statistics,
    TransformationGroup, TreeView, ValidationResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tracing_subscriber::EnvFilter;

const MAX_BODY_BYTES: usize = 64 * 1024;

// === Request/Response types ===

#[derive(Deserialize)]
struct MorphologyRequest {
    root: Option<String>,
    scheme: Option<String>,
    word: Option<String>,
}

#[derive(Deserialize)]
struct SchemeRequest {
    scheme: Option<String>,
    rule: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    roots: usize,
    schemes: usize,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct AddRootResponse {
    root: String,
    created: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn error_response(e: MizanError) -> ApiError {
    let status = match e {
        MizanError::UnknownRoot(_) | MizanError::UnknownScheme(_) | MizanError::UnknownGroup(_) => {
            StatusCode::NOT_FOUND
        }
        MizanError::MalformedTemplate(_)
        | MizanError::RootLength(_)
        | MizanError::InvalidKey(_)
        | MizanError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        MizanError::Storage(_) | MizanError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| error_response(MizanError::InvalidInput(format!("{} is required", field))))
}

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let stats = state.engine.statistics().map_err(error_response)?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        roots: stats.total_roots,
        schemes: stats.total_schemes,
    }))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MorphologyRequest>,
) -> ApiResult<String> {
    let root = required(req.root, "root")?;
    let scheme = required(req.scheme, "scheme")?;
    state.engine.generate(&root, &scheme)
        .map(Json)
        .map_err(error_response)
}

async fn generate_all(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MorphologyRequest>,
) -> ApiResult<Vec<GeneratedWord>> {
    let root = required(req.root, "root")?;
    state.engine.generate_all(&root)
        .map(Json)
        .map_err(error_response)
}

async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MorphologyRequest>,
) -> ApiResult<ValidationResult> {
    let root = required(req.root, "root")?;
    let word = required(req.word, "word")?;
    state.engine.validate(&root, &word)
        .map(Json)
        .map_err(error_response)
}

async fn derivatives(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MorphologyRequest>,
) -> ApiResult<Vec<Derivative>> {
    let root = required(req.root, "root")?;
    state.engine.derivatives(&root)
        .map(Json)
        .map_err(error_response)
}

async fn list_roots(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    state.engine.list_roots()
        .map(Json)
        .map_err(error_response)
}

async fn add_root(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MorphologyRequest>,
) -> ApiResult<AddRootResponse> {
    let root = required(req.root, "root")?;
    let created = state.engine.add_root(&root).map_err(error_response)?;
    Ok(Json(AddRootResponse { root, created }))
}

async fn list_schemes(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    state.engine.list_schemes()
        .map(Json)
        .map_err(error_response)
}

async fn scheme_details(State(state): State<Arc<AppState>>) -> ApiResult<BTreeMap<String, String>> {
    state.engine.scheme_details()
        .map(Json)
        .map_err(error_response)
}

async fn put_scheme(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SchemeRequest>,
) -> ApiResult<MessageResponse> {
    let scheme = required(req.scheme, "scheme")?;
    let rule = required(req.rule, "rule")?;
    state.engine.put_scheme(&scheme, &rule)
        .map(|message| Json(MessageResponse { message }))
        .map_err(error_response)
}

async fn delete_scheme(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<MessageResponse> {
    state.engine.delete_scheme(&name)
        .map(|()| Json(MessageResponse { message: format!("Scheme deleted: {}", name) }))
        .map_err(error_response)
}

async fn list_groups(State(state): State<Arc<AppState>>) -> ApiResult<Vec<TransformationGroup>> {
    state.engine.list_groups()
        .map(Json)
        .map_err(error_response)
}

async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<TransformationGroup> {
    state.engine.get_group(&key)
        .map(Json)
        .map_err(error_response)
}

async fn save_group(
    State(state): State<Arc<AppState>>,
    Json(group): Json<TransformationGroup>,
) -> ApiResult<TransformationGroup> {
    state.engine.save_group(group)
        .map(Json)
        .map_err(error_response)
}

async fn delete_group(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_group(&key)
        .map(|()| StatusCode::OK)
        .map_err(error_response)
}

async fn debug_tree(State(state): State<Arc<AppState>>) -> ApiResult<Option<TreeView>> {
    state.engine.tree_view()
        .map(Json)
        .map_err(error_response)
}

async fn debug_hash(State(state): State<Arc<AppState>>) -> ApiResult<HashView> {
    state.engine.hash_view()
        .map(Json)
        .map_err(error_response)
}

async fn statistics(State(state): State<Arc<AppState>>) -> ApiResult<Statistics> {
    state.engine.statistics()
        .map(Json)
        .map_err(error_response)
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let morphology = Router::new()
        .route("/generate", post(generate))
        .route("/generate-all", post(generate_all))
        .route("/validate", post(validate))
        .route("/derivatives", post(derivatives))
        .route("/roots", get(list_roots).post(add_root))
        .route("/schemes", get(list_schemes))
        .route("/schemes/details", get(scheme_details))
        .route("/scheme", post(put_scheme))
        .route("/scheme/:name", delete(delete_scheme))
        .route("/admin/transformations", get(list_groups).post(save_group))
        .route("/admin/transformations/:key", get(get_group).delete(delete_group))
        .route("/debug/tree", get(debug_tree))
        .route("/debug/hash", get(debug_hash))
        .route("/statistics", get(statistics));

    Router::new()
        .route("/health", get(health))
        .nest("/api/morphology", morphology)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr;
    tracing::info!("Using data directory: {:?}", config.data_dir);

    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = error_response(MizanError::UnknownRoot("فعل".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = error_response(MizanError::MalformedTemplate("{4}".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = error_response(MizanError::Storage("disk".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(required(Some(" كتب ".into()), "root").unwrap(), "كتب");
        let (status, Json(body)) = required(None, "word").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("word is required"));
        assert!(required(Some("  ".into()), "root").is_err());
    }
}
