//! Minimal stand-in for a server's monitoring port: `/varz` and `/connz`
//! with counters that grow on every request.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use serde_json::json;

#[derive(Clone, Default)]
pub struct Mock {
    polls: Arc<AtomicI64>,
    pub fail: Arc<AtomicBool>,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl Mock {
    pub fn fail(&self, on: bool) {
        self.fail.store(on, Ordering::SeqCst);
    }

    pub fn last_query(&self) -> Option<String> {
        self.queries.lock().unwrap().last().cloned()
    }
}

async fn varz(State(m): State<Mock>) -> Response {
    if m.fail.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "maintenance\nretry later").into_response();
    }
    let n = m.polls.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({
        "server_id": "NDJWE4",
        "server_name": "mock-1",
        "version": "2.10.7",
        "uptime": "1h2m3s",
        "mem": 12 * 1024 * 1024,
        "cores": 4,
        "cpu": 2.5,
        "connections": 2,
        "slow_consumers": 0,
        "in_msgs": 1000 * n,
        "out_msgs": 2000 * n,
        "in_bytes": 64_000 * n,
        "out_bytes": 128_000 * n,
        "some_future_field": {"nested": true}
    }))
    .into_response()
}

async fn connz(State(m): State<Mock>, RawQuery(q): RawQuery) -> Response {
    let q = q.unwrap_or_default();
    m.queries.lock().unwrap().push(q.clone());
    let n = m.polls.load(Ordering::SeqCst);
    let mut conns = vec![json!({
        "cid": 1,
        "name": "orders",
        "ip": "127.0.0.1",
        "port": 50001,
        "start": "2024-03-01T10:00:00Z",
        "last_activity": "2024-03-01T10:05:00Z",
        "uptime": "1h",
        "idle": "0s",
        "pending_bytes": 0,
        "in_msgs": 10 * n,
        "out_msgs": 20 * n,
        "in_bytes": 1000 * n,
        "out_bytes": 2000 * n,
        "subscriptions": 3,
        "lang": "go",
        "version": "1.31.0",
        "subscriptions_list": if q.contains("subs=1") { json!(["orders.>", "_INBOX.x"]) } else { json!(null) }
    })];
    // the second client shows up from the second poll on
    if n >= 2 {
        conns.push(json!({
            "cid": 2,
            "ip": "127.0.0.1",
            "port": 50002,
            "start": "2024-03-01T10:10:00Z",
            "in_msgs": 500 * n,
            "subscriptions": 1,
            "lang": "rust"
        }));
    }
    Json(json!({
        "server_id": "NDJWE4",
        "num_connections": conns.len(),
        "total": conns.len(),
        "offset": 0,
        "limit": 1024,
        "connections": conns
    }))
    .into_response()
}

fn router(mock: &Mock) -> Router {
    Router::new()
        .route("/varz", get(varz))
        .route("/connz", get(connz))
        .with_state(mock.clone())
}

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Same endpoints behind TLS, with a certificate for 127.0.0.1 issued by
/// `fixtures/ca.pem`.
pub async fn spawn_tls_mock() -> (SocketAddr, Mock) {
    let mock = Mock::default();
    let app = router(&mock);
    let config = RustlsConfig::from_pem_file(fixture("server-cert.pem"), fixture("server-key.pem"))
        .await
        .unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum_server::from_tcp_rustls(listener, config)
            .serve(app.into_make_service())
            .await
            .unwrap();
    });
    (addr, mock)
}

pub async fn spawn_mock() -> (SocketAddr, Mock) {
    let mock = Mock::default();
    let app = router(&mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, mock)
}

/// A port nothing listens on.
pub fn closed_port() -> u16 {
    let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    l.local_addr().unwrap().port()
}
