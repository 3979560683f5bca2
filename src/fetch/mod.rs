//! HTTP plumbing for outbound calls.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;
use serde::Serialize;

/// POSTs `body` as JSON to `url` through `client`.
///
/// The response is returned whatever its status; callers decide how to
/// treat non-success codes.
pub async fn post_json<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    body: &impl Serialize,
) -> Result<reqwest::Response> {
    let mut req = reqwest::Request::new(reqwest::Method::POST, url.parse()?);
    req.headers_mut().insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    *req.body_mut() = Some(serde_json::to_vec(body)?.into());

    // The URL may carry credentials added by an auth wrapper.
    Ok(client.execute(req).await.map_err(|e| e.without_url())?)
}
