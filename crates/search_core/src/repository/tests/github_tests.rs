use super::*;
use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use shared::domain::RepositoryId;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct StubState {
    seen_queries: Arc<Mutex<Vec<String>>>,
    seen_user_agents: Arc<Mutex<Vec<String>>>,
}

async fn handle_search(
    State(state): State<StubState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let query = params.get("q").cloned().unwrap_or_default();
    state.seen_queries.lock().await.push(query.clone());
    if let Some(agent) = headers.get("user-agent").and_then(|v| v.to_str().ok()) {
        state.seen_user_agents.lock().await.push(agent.to_string());
    }

    match query.as_str() {
        "rate-limited" => (
            StatusCode::FORBIDDEN,
            Json(GitHubErrorBody {
                documentation_url: Some("https://docs.github.com/rest".into()),
                ..GitHubErrorBody::new("API rate limit exceeded")
            }),
        )
            .into_response(),
        "broken" => (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response(),
        "garbled" => (StatusCode::OK, "not json").into_response(),
        "partial" => Json(json!({ "items": [] })).into_response(),
        _ => Json(json!({
            "total_count": 1,
            "incomplete_results": false,
            "items": [
                { "id": 99, "name": query, "full_name": format!("octo/{query}"), "stargazers_count": 5 }
            ]
        }))
        .into_response(),
    }
}

async fn spawn_stub(prefix: &str) -> anyhow::Result<(String, StubState)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = StubState::default();
    let app = Router::new()
        .route(&format!("{prefix}/search/repositories"), get(handle_search))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}{prefix}"), state))
}

#[tokio::test]
async fn search_sends_query_and_parses_body() -> anyhow::Result<()> {
    let (base_url, state) = spawn_stub("").await?;
    let repository = GitHubRepository::new(&base_url, "search-tests/1.0")?;

    let response = repository.search("egol lang:rust").await?;

    assert_eq!(response.total_count, Some(1));
    let items = response.items.expect("items");
    assert_eq!(items[0].id, Some(RepositoryId(99)));
    assert_eq!(items[0].full_name.as_deref(), Some("octo/egol lang:rust"));
    assert_eq!(*state.seen_queries.lock().await, vec!["egol lang:rust".to_string()]);
    assert_eq!(
        *state.seen_user_agents.lock().await,
        vec!["search-tests/1.0".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() -> anyhow::Result<()> {
    let (base_url, _state) = spawn_stub("/api/v3").await?;
    let repository = GitHubRepository::new(&base_url, DEFAULT_USER_AGENT)?;
    assert!(repository.search_url().path().ends_with("/api/v3/search/repositories"));

    let response = repository.fetch("egol").await?;
    assert_eq!(response.total_count, Some(1));
    Ok(())
}

#[tokio::test]
async fn error_status_carries_github_message() -> anyhow::Result<()> {
    let (base_url, _state) = spawn_stub("").await?;
    let repository = GitHubRepository::new(&base_url, DEFAULT_USER_AGENT)?;

    let err = repository.fetch("rate-limited").await.expect_err("should fail");
    assert!(matches!(
        &err,
        RepositoryError::Status { status: 403, message } if message == "API rate limit exceeded"
    ));

    let err = repository.search("rate-limited").await.expect_err("should fail");
    assert!(err.to_string().contains("API rate limit exceeded"));
    Ok(())
}

#[tokio::test]
async fn error_status_without_json_uses_raw_body() -> anyhow::Result<()> {
    let (base_url, _state) = spawn_stub("").await?;
    let repository = GitHubRepository::new(&base_url, DEFAULT_USER_AGENT)?;

    let err = repository.fetch("broken").await.expect_err("should fail");
    assert!(matches!(
        &err,
        RepositoryError::Status { status: 502, message } if message == "upstream unavailable"
    ));
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() -> anyhow::Result<()> {
    let (base_url, _state) = spawn_stub("").await?;
    let repository = GitHubRepository::new(&base_url, DEFAULT_USER_AGENT)?;

    let err = repository.fetch("garbled").await.expect_err("should fail");
    assert!(matches!(err, RepositoryError::Decode(_)));
    Ok(())
}

#[tokio::test]
async fn partial_body_is_returned_as_is() -> anyhow::Result<()> {
    let (base_url, _state) = spawn_stub("").await?;
    let repository = GitHubRepository::new(&base_url, DEFAULT_USER_AGENT)?;

    let response = repository.fetch("partial").await?;
    assert_eq!(response.total_count, None);
    assert_eq!(response.items, Some(Vec::new()));
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let repository =
        GitHubRepository::new(&format!("http://{addr}"), DEFAULT_USER_AGENT).expect("repository");

    let err = repository.fetch("egol").await.expect_err("should fail");
    assert!(matches!(err, RepositoryError::Transport(_)));
}
