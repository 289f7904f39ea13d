//! Common test utilities for integration tests
//!
//! Every test gets its own in-memory store and router, so tests are
//! independent and need no database. Requests go straight through the
//! router with `tower::Service::call`.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use taskmanager_api::app::{build_router, AppState};
use taskmanager_api::config::Config;
use taskmanager_shared::auth::token::{RandomTokenGenerator, TokenGenerator};
use taskmanager_shared::models::task::{NewTask, Task};
use taskmanager_shared::models::user::User;
use taskmanager_shared::query::TaskQuery;
use taskmanager_shared::store::{MemoryStore, TaskStore};
use tower::Service as _;

pub const V1: &str = "application/vnd.taskmanager.v1";
pub const V2: &str = "application/vnd.taskmanager.v2";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub app: Router,
    /// Default authenticated user
    pub user: User,
}

/// Status and parsed JSON body (`Null` when the body is empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestContext {
    /// Creates a context with random tokens and one registered user
    pub async fn new() -> Self {
        Self::with_generator(Arc::new(RandomTokenGenerator)).await
    }

    /// Creates a context whose tokens come from `generator`
    pub async fn with_generator(generator: Arc<dyn TokenGenerator>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_generator(store.clone(), generator, Config::default());
        let app = build_router(state.clone());

        let user = state
            .authority
            .create_user("test@example.com", "test_hash")
            .await
            .expect("default user");

        Self {
            store,
            state,
            app,
            user,
        }
    }

    /// Registers another user directly in the store
    pub async fn create_user(&self, email: &str) -> User {
        self.state
            .authority
            .create_user(email, "test_hash")
            .await
            .expect("user")
    }

    /// Creates a task directly in the store
    pub async fn create_task(&self, owner: &User, title: &str, description: Option<&str>) -> Task {
        self.store
            .create_task(
                owner.id,
                NewTask {
                    title: title.to_string(),
                    description: description.map(str::to_string),
                    done: false,
                    deadline: None,
                },
            )
            .await
            .expect("task")
    }

    /// Sends a request through the router
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        accept: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::ACCEPT, accept);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    /// Sends a request as the default user
    pub async fn send_as_user(
        &self,
        method: Method,
        uri: &str,
        accept: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let token = self.user.auth_token.clone();
        self.send(method, uri, accept, Some(&token), body).await
    }

    /// Number of tasks the user owns in the store
    pub async fn task_count(&self, owner: &User) -> usize {
        self.store
            .list_tasks(owner.id, &TaskQuery::all())
            .await
            .unwrap()
            .len()
    }
}

/// Replays a fixed list of tokens, then repeats the last one
pub struct ScriptedGenerator {
    tokens: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: Mutex::new(tokens.iter().map(|t| t.to_string()).collect()),
        }
    }
}

impl TokenGenerator for ScriptedGenerator {
    fn generate(&self, _length: usize) -> String {
        let mut tokens = self.tokens.lock().unwrap();
        if tokens.len() > 1 {
            tokens.pop_front().unwrap()
        } else {
            tokens.front().cloned().unwrap()
        }
    }
}
