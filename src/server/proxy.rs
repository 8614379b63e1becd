//! `GET /proxy?url=<URL>&ipv6=<IP>` — a thin HTTP adapter over `fetch()`.

use std::net::Ipv6Addr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio::sync::Notify;

use super::AppState;
use crate::dispatcher::JobOutcome;
use crate::engine::FetchOptions;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    url: String,
    ipv6: Option<String>,
}

pub async fn handler(State(state): State<AppState>, Query(query): Query<ProxyQuery>) -> Response {
    let ipv6 = match query.ipv6 {
        Some(raw) => match raw.parse::<Ipv6Addr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                return (StatusCode::BAD_REQUEST, "ipv6 query parameter is not a valid IPv6 address")
                    .into_response();
            }
        },
        None => None,
    };

    let opts = FetchOptions {
        ipv6,
        ..Default::default()
    };

    let started = Instant::now();
    let outcome = state
        .dispatcher
        .submit(query.url, opts, Arc::new(Notify::new()))
        .await;

    let duration_ms = started.elapsed().as_millis();

    match outcome {
        Err(err) => (StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), err.message)
            .into_response(),
        Ok(JobOutcome::Cancelled) => (StatusCode::SERVICE_UNAVAILABLE, "request cancelled").into_response(),
        Ok(JobOutcome::Completed(Err(err))) => {
            (StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::BAD_GATEWAY), err.message)
                .into_response()
        }
        Ok(JobOutcome::Completed(Ok(fetch_response))) => {
            let mut headers = HeaderMap::new();
            for (name, value) in fetch_response.headers.iter() {
                if let Ok(header_name) =
                    axum::http::HeaderName::from_bytes(format!("x-origin-{name}").as_bytes())
                {
                    headers.insert(header_name, value.clone());
                }
            }
            headers.insert(
                "x-status-code",
                fetch_response.status.to_string().parse::<axum::http::HeaderValue>().unwrap(),
            );
            headers.insert(
                "x-duration-ms",
                duration_ms.to_string().parse::<axum::http::HeaderValue>().unwrap(),
            );
            headers.insert(
                "x-browser-profile",
                fetch_response.persona.parse::<axum::http::HeaderValue>().unwrap(),
            );

            let status = StatusCode::from_u16(fetch_response.status).unwrap_or(StatusCode::OK);
            (status, headers, fetch_response.body).into_response()
        }
    }
}
