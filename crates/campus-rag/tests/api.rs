//! HTTP surface tests driving the router in-process

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use campus_rag::{
    embeddings::Embedding,
    providers::{
        Caller, ChatPrompt, EmbeddingProvider, LlmProvider, SpeechProvider,
        SqliteConversationStore, SqliteVectorStore, StaticTokenAuthorizer,
    },
    server::state::Providers,
    AppState, Error, RagConfig, Result,
};

const DIMS: usize = 4;
const ADMIN: &str = "admin-token";
const STUDENT: &str = "student-token";
const BOUNDARY: &str = "campus-rag-test-boundary";

/// Letter-frequency embedder, enough to make search deterministic
struct LetterEmbedder;

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut values = vec![0.1f32; DIMS];
        for (i, c) in text.chars().filter(|c| c.is_alphabetic()).enumerate() {
            values[(c as usize + i) % DIMS] += 1.0;
        }
        Embedding::new(values, DIMS)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "letters"
    }
}

/// Echoes how much context it was given
struct CountingLlm;

#[async_trait]
impl LlmProvider for CountingLlm {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let sources = prompt.user.matches("\n\n[").count() + usize::from(prompt.user.contains("[1]"));
        Ok(format!("answered with {} sources", sources))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "counting"
    }

    fn model(&self) -> &str {
        "counting-1"
    }
}

struct SilentSpeech;

#[async_trait]
impl SpeechProvider for SilentSpeech {
    async fn synthesize(&self, text: &str, model: &str) -> Result<Bytes> {
        if text.trim().is_empty() {
            return Err(Error::invalid_input("text is required"));
        }
        if model != "facebook/mms-tts-eng" {
            return Err(Error::invalid_input("Invalid model"));
        }
        Ok(Bytes::from_static(b"RIFF\0\0\0\0WAVE"))
    }

    fn name(&self) -> &str {
        "silent"
    }
}

struct TestApp {
    router: Router,
    _dir: TempDir,
}

fn app() -> TestApp {
    app_with(RagConfig::default())
}

fn app_with(mut config: RagConfig) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    config.embeddings.dimensions = DIMS;

    let authorizer = StaticTokenAuthorizer::default()
        .with_token(ADMIN, Caller::new("staff-1", "Admin"))
        .with_token(STUDENT, Caller::new("student-1", "Student"));

    let providers = Providers {
        authorizer: Arc::new(authorizer),
        embedder: Arc::new(LetterEmbedder),
        store: Arc::new(SqliteVectorStore::open(dir.path().join("documents.db"), DIMS).unwrap()),
        llm: Arc::new(CountingLlm),
        conversations: Arc::new(
            SqliteConversationStore::open(dir.path().join("conversations.db")).unwrap(),
        ),
        speech: Arc::new(SilentSpeech),
    };

    TestApp {
        router: campus_rag::build_router(AppState::with_providers(config, providers)),
        _dir: dir,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_multipart(token: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    multipart_request(Some(token), parts)
}

/// `(name, filename, content)` parts
fn multipart_request(token: Option<&str>, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, filename, content) in parts {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        match filename {
            Some(filename) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                name, filename
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                name
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    let mut builder = Request::post("/api/documents").header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

const HANDBOOK: &str = "The hostel fee for shared rooms is ninety thousand rupees per year \
    and includes electricity and water. Mess charges are billed separately every semester.";

#[tokio::test]
async fn health_and_info() {
    let app = app();

    let (status, body) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"OK");

    let (status, ready) = app
        .json(Request::get("/ready").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ready["ready"], true);

    let (status, info) = app
        .json(Request::get("/api/info").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["name"], "campus-rag");
}

#[tokio::test]
async fn requests_without_valid_token_are_unauthorized() {
    let app = app();

    let (status, body) = app
        .json(post_json("/api/chat", None, json!({ "question": "hostel fee?" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    let (status, _) = app
        .json(post_json(
            "/api/chat",
            Some("not-a-token"),
            json!({ "question": "hostel fee?" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn students_cannot_upload() {
    let app = app();
    let (status, body) = app
        .json(post_multipart(STUDENT, &[("text", None, HANDBOOK)]))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
}

#[tokio::test]
async fn upload_without_admin_credential_is_forbidden() {
    let app = app();

    let (status, body) = app
        .json(multipart_request(None, &[("text", None, HANDBOOK)]))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, body) = app
        .json(multipart_request(Some("not-a-token"), &[("text", None, HANDBOOK)]))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    // Chat still distinguishes a missing credential
    let (status, _) = app
        .json(post_json("/api/chat", None, json!({ "question": "hostel fee?" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upload_size_is_checked_against_the_file() {
    let mut config = RagConfig::default();
    config.server.max_upload_size = 1024;
    let app = app_with(config);

    let at_limit: String = HANDBOOK.repeat(10).chars().take(1024).collect();
    let (status, body) = app
        .json(post_multipart(ADMIN, &[("file", Some("rules.txt"), &at_limit)]))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["chunksInserted"].as_u64().unwrap() >= 1);

    let oversized = HANDBOOK.repeat(12);
    assert!(oversized.len() > 1024);
    let (status, body) = app
        .json(post_multipart(ADMIN, &[("file", Some("big.txt"), &oversized)]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");
    assert!(body["error"].as_str().unwrap().contains("1024 byte limit"));
}

#[tokio::test]
async fn upload_then_grounded_chat() {
    let app = app();

    let (status, body) = app
        .json(post_multipart(ADMIN, &[("text", None, HANDBOOK)]))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["chunksInserted"], 1);
    assert_eq!(body["totalChunks"], 1);
    assert!(body.get("errors").is_none());

    let (status, body) = app
        .json(post_json(
            "/api/chat",
            Some(STUDENT),
            json!({ "question": "What is the hostel fee?" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["mode"], "grounded");
    assert_eq!(body["answer"], "answered with 1 sources");
    assert_eq!(body["sources"][0], HANDBOOK);
    assert_eq!(body["language"], "english");

    let conversation_id = body["conversationId"].as_str().unwrap().to_string();
    let (status, follow_up) = app
        .json(post_json(
            "/api/chat",
            Some(STUDENT),
            json!({ "question": "and the mess charges?", "conversationId": conversation_id }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(follow_up["conversationId"], conversation_id.as_str());
}

#[tokio::test]
async fn reupload_is_reported_as_duplicate() {
    let app = app();
    app.json(post_multipart(ADMIN, &[("file", Some("handbook.txt"), HANDBOOK)]))
        .await;

    let (status, body) = app
        .json(post_multipart(ADMIN, &[("file", Some("handbook.txt"), HANDBOOK)]))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chunksInserted"], 0);
    assert_eq!(body["chunksDuplicate"], 1);
}

#[tokio::test]
async fn upload_input_errors() {
    let app = app();

    let (status, body) = app
        .json(post_multipart(ADMIN, &[("file", Some("timetable.docx"), "PK")]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "unsupported_type");

    let (status, body) = app.json(post_multipart(ADMIN, &[("text", None, "  ")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let (status, body) = app
        .json(post_multipart(ADMIN, &[("text", None, "too short")]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Text produced zero usable chunks.");
}

#[tokio::test]
async fn chat_input_errors() {
    let app = app();

    let (status, body) = app
        .json(post_json("/api/chat", Some(STUDENT), json!({ "question": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "question is required");

    let (status, body) = app
        .json(post_json("/api/chat", Some(STUDENT), json!({ "conversationId": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_input");

    let (status, body) = app
        .json(post_json(
            "/api/chat",
            Some(STUDENT),
            json!({ "question": "hi", "conversationId": "no-such-conversation" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn open_domain_chat_has_no_sources() {
    let app = app();
    let (status, body) = app
        .json(post_json(
            "/api/chat",
            Some(STUDENT),
            json!({ "question": "Write a haiku about rain" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "open_domain");
    assert_eq!(body["sources"], json!([]));
}

#[tokio::test]
async fn embed_returns_configured_dimensions() {
    let app = app();
    let (status, body) = app
        .json(post_json("/api/embed", Some(STUDENT), json!({ "text": "library" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["embedding"].as_array().unwrap().len(), DIMS);

    let (status, _) = app
        .json(post_json("/api/embed", Some(STUDENT), json!({ "text": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tts_returns_wav() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/tts",
            Some(STUDENT),
            json!({ "text": "Welcome to campus", "model": "facebook/mms-tts-eng" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

    let (status, _) = app
        .json(post_json(
            "/api/tts",
            Some(STUDENT),
            json!({ "text": "hi", "model": "other/model" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
