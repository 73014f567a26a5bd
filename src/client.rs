//! Catalog client: one round trip per call, translated into model types.
use crate::{
    model::{self, ModelError, SearchResultSet, StorefrontId},
    request::{Endpoint, RequestDescriptor},
};
use reqwest::header::HeaderValue;
use serde_json::Value;
use std::{future::Future, sync::Arc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Possible errors returned from the catalog client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected http status {0}")]
    Status(u16),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Connection failures and rejected requests.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status(_) | Self::InvalidHeader(_))
    }

    /// One-line summary suitable for showing to a user.
    pub fn notice(&self) -> String {
        match self {
            Self::Http(_) | Self::Status(_) | Self::InvalidHeader(_) => {
                format!("The catalog service could not be reached ({self}).")
            }
            Self::MalformedResponse(_) => {
                "The catalog service sent a response that could not be read.".to_owned()
            }
            Self::Model(err) => format!("The catalog service sent incomplete data ({err})."),
        }
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Executes request descriptors. Implementations make exactly one attempt.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> impl Future<Output = ClientResult<RawResponse>> + Send;
}

/// [`Transport`] backed by a shared `reqwest` connection pool.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: &RequestDescriptor) -> ClientResult<RawResponse> {
        let mut builder = self.http.request(request.method.clone(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(*name, HeaderValue::from_str(value)?);
        }
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            // The body of a rejected request is never decoded.
            return Ok(RawResponse {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Ok(RawResponse {
            status: status.as_u16(),
            body: response.text().await?,
        })
    }
}

/// Client for the catalog search and storefront endpoints.
///
/// Holds no mutable state, so calls may run concurrently. Ordering of
/// results between overlapping searches is left to the caller, see
/// [`crate::latest::LatestResults`].
#[derive(Debug, Clone)]
pub struct CatalogClient<T = HttpTransport> {
    endpoint: Endpoint,
    transport: T,
}

impl CatalogClient<HttpTransport> {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_transport(endpoint, HttpTransport::default())
    }
}

impl<T: Transport> CatalogClient<T> {
    pub const fn with_transport(endpoint: Endpoint, transport: T) -> Self {
        Self {
            endpoint,
            transport,
        }
    }

    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Search the catalog of a storefront for songs and albums.
    ///
    /// An empty term resolves to an empty result set without a request.
    /// Resources that fail to decode are reported in
    /// [`SearchResultSet::failures`] instead of failing the call.
    pub async fn search(
        &self,
        term: &str,
        country_code: &str,
        bearer_token: &str,
    ) -> ClientResult<SearchResultSet> {
        if term.is_empty() {
            debug!("Empty search term, skipping catalog request");
            return Ok(SearchResultSet::default());
        }

        let request = self
            .endpoint
            .search_request(term, country_code, bearer_token);
        let json = self.fetch_json(&request).await?;
        let results = model::decode_search_results(&json)?;
        if results.is_partial() {
            warn!(
                decoded = results.item_count(),
                failed = results.failures.len(),
                "Dropped catalog resources that failed to decode"
            );
        }
        Ok(results)
    }

    /// Resolve a region code to a storefront identifier.
    pub async fn lookup_storefront(
        &self,
        region_code: &str,
        bearer_token: &str,
    ) -> ClientResult<StorefrontId> {
        let request = self
            .endpoint
            .storefront_lookup_request(region_code, bearer_token);
        let json = self.fetch_json(&request).await?;
        Ok(model::decode_storefront(&json)?)
    }

    /// Storefront identifier of the account behind `user_token`.
    pub async fn lookup_user_storefront(
        &self,
        bearer_token: &str,
        user_token: &str,
    ) -> ClientResult<StorefrontId> {
        let request = self
            .endpoint
            .user_storefront_request(bearer_token, user_token);
        let json = self.fetch_json(&request).await?;
        Ok(model::decode_storefront(&json)?)
    }

    /// Convenience method to issue a request and parse the body as JSON.
    async fn fetch_json(&self, request: &RequestDescriptor) -> ClientResult<Value> {
        debug!(url = %request.url, "Catalog request started");
        let response = self
            .transport
            .execute(request)
            .await
            .inspect_err(|err| warn!(url = %request.url, "Catalog request failed: {err}"))?;
        if !response.is_success() {
            warn!(url = %request.url, status = response.status, "Catalog request rejected");
            return Err(ClientError::Status(response.status));
        }
        serde_json::from_str(&response.body).map_err(|err| {
            warn!(url = %request.url, "Catalog response is not JSON: {err}");
            err.into()
        })
    }
}

impl<T: Transport + 'static> CatalogClient<T> {
    /// Run [`Self::search`] on the runtime and hand the outcome to `callback`.
    pub fn search_with<F>(
        self: Arc<Self>,
        term: String,
        country_code: String,
        bearer_token: String,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(ClientResult<SearchResultSet>) + Send + 'static,
    {
        tokio::spawn(async move {
            let result = self.search(&term, &country_code, &bearer_token).await;
            callback(result);
        })
    }
}
