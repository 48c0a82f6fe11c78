// Movie Ratings - REST API
// Four routes under /api/v1, each one store operation serialized to JSON

use crate::config::ServerConfig;
use crate::db::{MovieStore, NewMovie, Row};
use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MovieStore>,
}

impl AppState {
    pub fn new(store: Arc<MovieStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/v1/longest-duration-movies
async fn longest_duration_movies(
    State(state): State<AppState>,
) -> Result<Json<Vec<Row>>, ApiError> {
    Ok(Json(state.store.longest_duration_movies()?))
}

/// POST /api/v1/new-movie
///
/// The body is read raw so that every malformed submission (not JSON, not an
/// object, missing keys) gets the same 400 body.
async fn new_movie(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let value: Value = serde_json::from_slice(&body).map_err(|_| ApiError::InvalidBody)?;
    let movie = NewMovie::from_json(&value).ok_or(ApiError::InvalidBody)?;

    state.store.insert_movie(&movie)?;

    Ok(Json(MessageResponse {
        message: "success".to_string(),
    }))
}

/// GET /api/v1/top-rated-movies
async fn top_rated_movies(State(state): State<AppState>) -> Result<Json<Vec<Row>>, ApiError> {
    Ok(Json(state.store.top_rated_movies()?))
}

/// GET /api/v1/genre-movies-with-subtotals
async fn genre_movies_with_subtotals(
    State(state): State<AppState>,
) -> Result<Json<Vec<Row>>, ApiError> {
    Ok(Json(state.store.genre_movies_with_subtotals()?))
}

// ============================================================================
// Router & Server
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/longest-duration-movies", get(longest_duration_movies))
        .route("/new-movie", post(new_movie))
        .route("/top-rated-movies", get(top_rated_movies))
        .route(
            "/genre-movies-with-subtotals",
            get(genre_movies_with_subtotals),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, store: Arc<MovieStore>) -> anyhow::Result<()> {
    let app = router(AppState::new(store));

    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);
    info!("API: http://{}/api/v1/longest-duration-movies", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_csv_from_reader;
    use crate::schema::{MOVIES, RATINGS};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let store = MovieStore::open_in_memory().unwrap();
        let movies = read_csv_from_reader(
            &MOVIES,
            "tconst,titleType,primaryTitle,runtimeMinutes,genres\n\
             t1,movie,Title1,100,Documentary\n\
             t2,movie,Title2,95,Thriller\n"
                .as_bytes(),
        )
        .unwrap();
        let ratings = read_csv_from_reader(
            &RATINGS,
            "tconst,averageRating,numVotes\nt1,7.5,1000\nt2,4.0,20\n".as_bytes(),
        )
        .unwrap();
        store.replace_table(&MOVIES, &movies).unwrap();
        store.replace_table(&RATINGS, &ratings).unwrap();
        store.apply_runtime_adjustment().unwrap();

        AppState::new(Arc::new(store))
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_request(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    fn post_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/new-movie")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_longest_duration_movies() {
        let state = test_state();
        let (status, body) = send(&state, get_request("/api/v1/longest-duration-movies")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"tconst": "t2", "primaryTitle": "Title2", "runtimeMinutes": 140, "genres": "Thriller"},
                {"tconst": "t1", "primaryTitle": "Title1", "runtimeMinutes": 115, "genres": "Documentary"}
            ])
        );
    }

    #[tokio::test]
    async fn test_top_rated_movies() {
        let state = test_state();
        let (status, body) = send(&state, get_request("/api/v1/top-rated-movies")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"tconst": "t1", "primaryTitle": "Title1", "genres": "Documentary", "averageRating": 7.5}
            ])
        );
    }

    #[tokio::test]
    async fn test_genre_movies_with_subtotals() {
        let state = test_state();
        let (status, body) =
            send(&state, get_request("/api/v1/genre-movies-with-subtotals")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"genres": "Documentary", "primaryTitle": "Title1", "numVotes": 1000},
                {"genres": "Thriller", "primaryTitle": "Title2", "numVotes": 20}
            ])
        );
    }

    #[tokio::test]
    async fn test_new_movie_success() {
        let state = test_state();
        let (status, body) = send(
            &state,
            post_request(
                r#"{"tconst":"t3","titleType":"movie","primaryTitle":"Title3","runtimeMinutes":300,"genres":"Animation"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "success"}));
        assert_eq!(state.store.count(&MOVIES).unwrap(), 3);

        // Inserted after the adjustment, so the runtime is stored as sent
        let (_, longest) = send(&state, get_request("/api/v1/longest-duration-movies")).await;
        assert_eq!(longest[0]["tconst"], json!("t3"));
        assert_eq!(longest[0]["runtimeMinutes"], json!(300));
    }

    #[tokio::test]
    async fn test_new_movie_missing_key() {
        let state = test_state();
        let (status, body) = send(
            &state,
            post_request(r#"{"tconst":"t3","titleType":"movie","primaryTitle":"Title3","genres":"Drama"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid request body"}));
        assert_eq!(state.store.count(&MOVIES).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_new_movie_malformed_bodies() {
        let state = test_state();

        for raw in ["", "not json", "[]", "{}", "null"] {
            let (status, body) = send(&state, post_request(raw)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", raw);
            assert_eq!(body, json!({"error": "Invalid request body"}));
        }

        assert_eq!(state.store.count(&MOVIES).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let state = AppState::new(Arc::new(MovieStore::open_in_memory().unwrap()));
        let (status, body) = send(&state, get_request("/api/v1/top-rated-movies")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let state = test_state();
        let (status, _) = send(&state, get_request("/api/v1/movies")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
