//! Dispatcher and task facade behavior over real HTTP, using mockito.

use std::sync::{Arc, Mutex};

use mockito::Matcher;
use serde_json::{json, Value};
use task_core::{
    ApiError, ApiRequest, ClientConfig, Dispatcher, HttpMethod, HttpRequest, HttpResponse, MemoryStore,
    NewTask, NoContent, TaskFilter, TaskUpdate, TasksApi, Transport,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("task_core=debug")
        .try_init();
}

fn tasks_api(server: &mockito::Server) -> TasksApi {
    TasksApi::new(Dispatcher::new(ClientConfig::new(&server.url())))
}

const TASK_JSON: &str = r#"{"id":"t-1","title":"Buy milk","completed":false}"#;

// === auth ===

#[tokio::test]
async fn stored_token_is_sent_as_bearer() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/tasks/t-1")
        .match_header("authorization", "Bearer abc123")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TASK_JSON)
        .create_async()
        .await;

    let dispatcher = Dispatcher::new(ClientConfig::new(&server.url())).with_storage(MemoryStore::with_token("abc123"));
    let task = TasksApi::new(dispatcher).get("t-1").await.unwrap();
    assert_eq!(task.title, "Buy milk");

    mock.assert_async().await;
}

#[tokio::test]
async fn missing_token_sends_no_authorization() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/tasks")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let dispatcher = Dispatcher::new(ClientConfig::new(&server.url())).with_storage(MemoryStore::new());
    let tasks = TasksApi::new(dispatcher).list(&TaskFilter::default()).await.unwrap();
    assert!(tasks.is_empty());

    mock.assert_async().await;
}

// === facade requests ===

#[tokio::test]
async fn list_sends_filters_as_query() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/tasks")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("status".into(), "done".into()),
            Matcher::UrlEncoded("sort_by".into(), "priority".into()),
        ]))
        .with_status(200)
        .with_body(format!("[{TASK_JSON}]"))
        .create_async()
        .await;

    let filter = TaskFilter {
        status: Some("done".to_string()),
        sort_by: Some("priority".to_string()),
        ..TaskFilter::default()
    };
    let tasks = tasks_api(&server).list(&filter).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, "t-1");

    mock.assert_async().await;
}

#[tokio::test]
async fn create_posts_supplied_fields_only() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/tasks")
        .match_body(Matcher::Json(json!({"title": "Buy milk", "priority": "high"})))
        .with_status(201)
        .with_body(TASK_JSON)
        .create_async()
        .await;

    let task = tasks_api(&server)
        .create(&NewTask::new("Buy milk").priority("high"))
        .await
        .unwrap();
    assert_eq!(task.id, "t-1");

    mock.assert_async().await;
}

#[tokio::test]
async fn update_puts_partial_fields() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/tasks/t-1")
        .match_body(Matcher::Json(json!({"title": "Buy oat milk"})))
        .with_status(200)
        .with_body(r#"{"id":"t-1","title":"Buy oat milk","completed":false}"#)
        .create_async()
        .await;

    let update = TaskUpdate {
        title: Some("Buy oat milk".to_string()),
        ..TaskUpdate::default()
    };
    let task = tasks_api(&server).update("t-1", &update).await.unwrap();
    assert_eq!(task.title, "Buy oat milk");

    mock.assert_async().await;
}

#[tokio::test]
async fn toggle_completion_patches_complete_subresource() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PATCH", "/tasks/t-1/complete")
        .match_body(Matcher::Json(json!({"completed": true})))
        .with_status(200)
        .with_body(r#"{"id":"t-1","title":"Buy milk","completed":true}"#)
        .create_async()
        .await;

    let task = tasks_api(&server).toggle_completion("t-1", true).await.unwrap();
    assert!(task.completed);

    mock.assert_async().await;
}

#[tokio::test]
async fn delete_accepts_no_content() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/tasks/t-1")
        .with_status(204)
        .create_async()
        .await;

    let result = tasks_api(&server).delete("t-1").await.unwrap();
    assert_eq!(result, NoContent {});

    mock.assert_async().await;
}

// === response normalization ===

#[tokio::test]
async fn no_content_is_empty_object() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", "/tasks/t-1/archive").with_status(204).create_async().await;

    let dispatcher = Dispatcher::new(ClientConfig::new(&server.url()));
    let value: Value = dispatcher.request(ApiRequest::post("/tasks/t-1/archive")).await.unwrap();
    assert_eq!(value, json!({}));

    mock.assert_async().await;
}

#[tokio::test]
async fn not_found_detail_is_the_message() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/tasks/missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Task not found"}"#)
        .create_async()
        .await;

    let err = tasks_api(&server).get("missing").await.unwrap_err();
    assert_eq!(err.to_string(), "Task not found");
    assert_eq!(err.status(), Some(404));

    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_without_json_uses_reason_phrase() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/tasks")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let err = tasks_api(&server).list(&TaskFilter::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 500, .. }));
    assert_eq!(err.to_string(), "Internal Server Error");

    mock.assert_async().await;
}

#[tokio::test]
async fn invalid_json_on_success_is_decode_error() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/tasks/t-1")
        .with_status(200)
        .with_body("<html>")
        .create_async()
        .await;

    let err = tasks_api(&server).get("t-1").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));

    mock.assert_async().await;
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    init_tracing();
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let dispatcher = Dispatcher::new(ClientConfig::new(&format!("http://{addr}")));
    let err = dispatcher.request::<Value>(ApiRequest::get("/tasks")).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

// === concurrency ===

#[tokio::test]
async fn concurrent_gets_do_not_interfere() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/tasks/a")
        .with_status(200)
        .with_body(r#"{"id":"a","title":"first"}"#)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/tasks/b")
        .with_status(200)
        .with_body(r#"{"id":"b","title":"second"}"#)
        .create_async()
        .await;

    let api = tasks_api(&server);
    let other = api.clone();
    let spawned = tokio::spawn(async move { other.get("b").await });
    let (a, b) = tokio::join!(api.get("a"), spawned);

    let a = a.unwrap();
    let b = b.unwrap().unwrap();
    assert_eq!((a.id.as_str(), a.title.as_str()), ("a", "first"));
    assert_eq!((b.id.as_str(), b.title.as_str()), ("b", "second"));

    first.assert_async().await;
    second.assert_async().await;
}

// === custom transport ===

/// Records every request and answers with a canned response.
#[derive(Clone)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<HttpRequest>>>,
    reply: HttpResponse,
}

impl Transport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.sent.lock().unwrap().push(request);
        Ok(self.reply.clone())
    }
}

#[tokio::test]
async fn toggle_body_is_exactly_the_flag() {
    let transport = RecordingTransport {
        sent: Arc::new(Mutex::new(Vec::new())),
        reply: HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"id":"9","title":"t","completed":true}"#.to_string(),
        },
    };
    let config = ClientConfig::new("https://tasks.example.com");
    let api = TasksApi::new(Dispatcher::with_transport(config, transport.clone()));

    api.toggle_completion("9", true).await.unwrap();

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, HttpMethod::Patch);
    assert_eq!(sent[0].url, "https://tasks.example.com/api/tasks/9/complete");
    assert_eq!(sent[0].body.as_deref(), Some(r#"{"completed":true}"#));
}

#[tokio::test]
async fn remote_mode_never_doubles_prefix() {
    let transport = RecordingTransport {
        sent: Arc::new(Mutex::new(Vec::new())),
        reply: HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "[]".to_string(),
        },
    };
    let dispatcher = Dispatcher::with_transport(ClientConfig::new("https://tasks.example.com"), transport.clone());

    let _: Value = dispatcher.request(ApiRequest::get("/tasks")).await.unwrap();
    let _: Value = dispatcher.request(ApiRequest::get("/api/tasks")).await.unwrap();

    let sent = transport.sent.lock().unwrap();
    assert!(sent.iter().all(|r| r.url == "https://tasks.example.com/api/tasks"));
}
