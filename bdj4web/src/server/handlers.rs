//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;

use crate::errors::WebError;
use crate::marquee::PublishRequest;
use crate::server::params::RequestParams;
use crate::server::state::ServerState;
use crate::tester::TestRequest;
use crate::upload::SupportUpload;
use crate::utils::version_info;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Parameters that turn a marquee request into a publish
const PUBLISH_PARAMS: [&str; 3] = ["content", "mqdata", "secret"];

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "bdj4web".to_string(),
        version: version.version,
    })
}

fn plain(body: impl Into<axum::body::Body>) -> Response {
    ([(CONTENT_TYPE, TEXT_PLAIN)], body.into()).into_response()
}

fn uncached(body: impl Into<axum::body::Body>) -> Response {
    (
        [
            (CONTENT_TYPE, TEXT_PLAIN),
            (CACHE_CONTROL, "no-store"),
            (EXPIRES, "0"),
        ],
        body.into(),
    )
        .into_response()
}

/// Mobile marquee: fetch the current text for a tag, or publish new text
pub async fn marquee_handler(
    State(state): State<Arc<ServerState>>,
    params: RequestParams,
) -> Response {
    let is_publish = PUBLISH_PARAMS.iter().any(|name| params.has(name));
    if !is_publish {
        let content = state.marquee.fetch(params.get("tag")).await;
        return uncached(content);
    }

    // older players send the text as "mqdata"
    let content = params.get("mqdata").or_else(|| params.get("content"));
    let status = state
        .marquee
        .publish(PublishRequest {
            tag: params.get("tag"),
            secret: params.get("secret"),
            key: params.get("key"),
            content: content.map(str::as_bytes),
        })
        .await;
    debug!("Marquee publish for {:?}: {}", params.get("tag"), status);
    uncached(status.code())
}

/// Support file upload from the desktop client
pub async fn support_handler(
    State(state): State<Arc<ServerState>>,
    params: RequestParams,
) -> Response {
    let status = state
        .uploads
        .receive(SupportUpload {
            key: params.get("key"),
            identifier: params.get("identifier").or_else(|| params.get("ident")),
            orig_name: params.get("origfn"),
            file: params.upload(),
        })
        .await;
    plain(status.to_string())
}

/// Connectivity test
pub async fn test_handler(
    State(state): State<Arc<ServerState>>,
    params: RequestParams,
) -> Response {
    let reply = state
        .tester
        .test(TestRequest {
            key: params.get("key"),
            orig_name: params.get("origfn"),
            file: params.upload(),
            testdata: params.get("testdata"),
            params: params.pairs(),
        })
        .await;
    plain(reply.to_string())
}

/// Install report
pub async fn report_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Html<String>, WebError> {
    let html = state.report.render().await?;
    Ok(Html(html))
}
