use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use ogw_core::{AdapterResolver, HttpAdapterResolver, ResolveError};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

async fn adapter(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    match id.as_str() {
        "bare" => Ok(Json(json!({"channel": "sms", "provider": "cdac"}))),
        "wrapped" => Ok(Json(json!({
            "id": "api.adapter.read",
            "result": {"id": "wrapped", "channel": "WhatsApp", "provider": "gupshup", "config": {"phone": "91"}}
        }))),
        "broken" => Err(StatusCode::INTERNAL_SERVER_ERROR),
        "garbage" => Ok(Json(json!({"unexpected": true}))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

// Exercises HttpAdapterResolver against a local admin endpoint.
// Skips if binding to localhost is not permitted in the current environment.
#[tokio::test]
async fn http_resolver_maps_admin_responses() {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("skipping http_resolver_maps_admin_responses: {err}");
            return;
        }
    };
    let addr: SocketAddr = listener.local_addr().unwrap();
    let app = Router::new().route("/admin/adapter/{id}", get(adapter));
    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app.into_make_service()).await {
            eprintln!("adapter mock server error: {err}");
        }
    });

    let resolver =
        HttpAdapterResolver::new(format!("http://{addr}/"), Duration::from_secs(2)).unwrap();

    let bare = resolver.resolve("bare").await.unwrap();
    assert_eq!((bare.channel.as_str(), bare.provider.as_str()), ("sms", "cdac"));
    assert_eq!(bare.id.as_deref(), Some("bare"));

    let wrapped = resolver.resolve("wrapped").await.unwrap();
    assert!(wrapped.is_channel("whatsapp"));
    assert_eq!(wrapped.config["phone"], "91");

    assert!(matches!(
        resolver.resolve("missing").await,
        Err(ResolveError::NotFound(id)) if id == "missing"
    ));
    assert!(matches!(
        resolver.resolve("broken").await,
        Err(ResolveError::Unavailable(_))
    ));
    assert!(matches!(
        resolver.resolve("garbage").await,
        Err(ResolveError::Unavailable(_))
    ));

    server.abort();
}

#[tokio::test]
async fn unreachable_service_is_unavailable() {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("skipping unreachable_service_is_unavailable: {err}");
            return;
        }
    };
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let resolver =
        HttpAdapterResolver::new(format!("http://{addr}"), Duration::from_millis(500)).unwrap();
    assert!(matches!(
        resolver.resolve("a1").await,
        Err(ResolveError::Unavailable(_))
    ));
}
