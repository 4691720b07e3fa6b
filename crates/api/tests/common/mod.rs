use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use courier_api::auth::jwt::{generate_access_token, JwtConfig};
use courier_api::config::ServerConfig;
use courier_api::router::build_app_router;
use courier_api::state::AppState;
use courier_gateway::{
    FailureKind, MulticastOutcome, PushGateway, PushMessage, SendFailure, TokenOutcome,
    TopicChangeOutcome,
};

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// A call the stub gateway observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Multicast(Vec<String>),
    Topic(String),
}

/// Scriptable in-memory gateway: tokens named in `failures` fail with the
/// given classification, everything else succeeds. Records every send.
pub struct StubGateway {
    pub failures: HashMap<String, FailureKind>,
    pub calls: Mutex<Vec<GatewayCall>>,
}

impl StubGateway {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            failures: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn with_failures(
        failures: impl IntoIterator<Item = (&'static str, FailureKind)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            failures: failures
                .into_iter()
                .map(|(t, k)| (t.to_string(), k))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for StubGateway {
    fn is_initialized(&self) -> bool {
        true
    }

    async fn send_single(&self, token: &str, _: &PushMessage) -> Result<String, SendFailure> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::Multicast(vec![token.to_string()]));
        match self.failures.get(token) {
            Some(kind) => Err(SendFailure::new(*kind, "scripted failure")),
            None => Ok(format!("msg-{token}")),
        }
    }

    async fn send_multicast(&self, tokens: &[String], _: &PushMessage) -> MulticastOutcome {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::Multicast(tokens.to_vec()));
        let mut outcome = MulticastOutcome::default();
        for token in tokens {
            let result = match self.failures.get(token) {
                Some(kind) => Err(SendFailure::new(*kind, "scripted failure")),
                None => Ok(format!("msg-{token}")),
            };
            outcome.push(TokenOutcome {
                token: token.clone(),
                result,
            });
        }
        outcome
    }

    async fn send_to_topic(&self, topic: &str, _: &PushMessage) -> Result<String, SendFailure> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::Topic(topic.to_string()));
        Ok(format!("msg-topic-{topic}"))
    }

    async fn subscribe(&self, tokens: &[String], _: &str) -> TopicChangeOutcome {
        TopicChangeOutcome {
            success_count: tokens.len(),
            failure_count: 0,
        }
    }

    async fn unsubscribe(&self, tokens: &[String], _: &str) -> TopicChangeOutcome {
        TopicChangeOutcome {
            success_count: tokens.len(),
            failure_count: 0,
        }
    }
}

/// Build the full application router with the production middleware stack
/// over a stub gateway.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_gateway(pool, StubGateway::succeeding())
}

/// Same as [`build_test_app`] but with a caller-scripted gateway.
pub fn build_test_app_with_gateway(pool: PgPool, gateway: Arc<StubGateway>) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone(), gateway);
    build_app_router(state, &config)
}

/// Insert a user row and return `(user_id, bearer_token)`.
pub async fn create_user_with_token(pool: &PgPool, username: &str, role: &str) -> (i64, String) {
    let user_id: i64 =
        sqlx::query_scalar("INSERT INTO users (username, role) VALUES ($1, $2) RETURNING id")
            .bind(username)
            .bind(role)
            .fetch_one(pool)
            .await
            .unwrap();

    let token = generate_access_token(user_id, role, &test_config().jwt).unwrap();
    (user_id, token)
}

/// Send a GET request to the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a GET request with a bearer token.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a JSON request with the given method and bearer token.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body and bearer token.
pub async fn post_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send_json(app, "POST", uri, token, body).await
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
