use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use openidconnect::AsyncHttpClient;

use crate::{Error, Result};

/// Error type surfaced by [`OidcHttpClient`].
#[derive(Debug, thiserror::Error)]
pub enum OidcHttpError {
    #[error("{0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("{0}")]
    Http(#[from] http::Error),
}

/// Bridges a shared `reqwest` client to the `openidconnect`
/// `AsyncHttpClient` trait.
///
/// All protocol round trips (discovery, code exchange, key fetch) go
/// through this client, so the construction-time timeout bounds every one
/// of them.
#[derive(Clone)]
pub struct OidcHttpClient {
    inner: reqwest::Client,
}

impl OidcHttpClient {
    /// Redirect following stays off: token and discovery endpoints must
    /// answer directly, and following redirects could leak credentials.
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { inner })
    }
}

impl<'c> AsyncHttpClient<'c> for OidcHttpClient {
    type Error = OidcHttpError;
    type Future = Pin<
        Box<
            dyn Future<Output = std::result::Result<http::Response<Vec<u8>>, Self::Error>>
                + Send
                + 'c,
        >,
    >;

    fn call(&'c self, request: http::Request<Vec<u8>>) -> Self::Future {
        let client = self.inner.clone();
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let response = client
                .request(parts.method, parts.uri.to_string())
                .headers(parts.headers)
                .body(body)
                .send()
                .await?;

            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await?;

            let mut out = http::Response::builder()
                .status(status)
                .body(bytes.to_vec())?;
            *out.headers_mut() = headers;
            Ok(out)
        })
    }
}
