//! In-process stand-in for the Pixabay search endpoint
//!
//! Serves one canned reply on `/api/` and records the query string of every
//! request.

#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub enum Reply {
    Json(Value),
    Status(u16, String),
    Delay(Duration, Value),
}

struct MockState {
    reply: Reply,
    requests: Mutex<Vec<HashMap<String, String>>>,
}

pub struct MockPixabay {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockPixabay {
    pub async fn start(reply: Reply) -> Self {
        let state = Arc::new(MockState {
            reply,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/", get(search))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn search(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.requests.lock().unwrap().push(params);

    match state.reply.clone() {
        Reply::Json(body) => Json(body).into_response(),
        Reply::Status(code, body) => {
            let status = StatusCode::from_u16(code).unwrap();
            (status, body).into_response()
        }
        Reply::Delay(delay, body) => {
            tokio::time::sleep(delay).await;
            Json(body).into_response()
        }
    }
}
