// Google Cloud credentials - bearer tokens for Firestore requests
use crate::application::reading_repository::StoreError;
use crate::infrastructure::config::FirestoreSettings;
use reqwest::RequestBuilder;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Tokens are refreshed this long before the server says they expire
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub enum Credentials {
    /// Fixed token from config
    Static(String),
    /// Service-account token from the GCE/App Engine/Cloud Run metadata server
    MetadataServer(MetadataTokenSource),
    /// No `Authorization` header at all
    Anonymous,
}

impl Credentials {
    pub fn from_settings(settings: &FirestoreSettings, client: reqwest::Client) -> Self {
        if let Some(token) = settings.access_token.as_deref().filter(|t| !t.is_empty()) {
            return Credentials::Static(token.to_string());
        }
        if settings.metadata_token_url.is_empty() {
            return Credentials::Anonymous;
        }
        Credentials::MetadataServer(MetadataTokenSource::new(
            client,
            settings.metadata_token_url.clone(),
        ))
    }

    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        match self {
            Credentials::Static(token) => Ok(request.bearer_auth(token)),
            Credentials::MetadataServer(source) => Ok(request.bearer_auth(source.token().await?)),
            Credentials::Anonymous => Ok(request),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Clone)]
pub struct MetadataTokenSource {
    client: reqwest::Client,
    url: String,
    cached: Arc<Mutex<Option<CachedToken>>>,
}

impl MetadataTokenSource {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self {
            client,
            url,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Current token, fetched again once the cached one nears expiry
    pub async fn token(&self) -> Result<String, StoreError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch().await?;
        let value = fresh.access_token.clone();
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(REFRESH_MARGIN);
        tracing::debug!("Fetched metadata server token valid for {}s", fresh.expires_in);
        *cached = Some(CachedToken {
            value: fresh.access_token,
            refresh_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    async fn fetch(&self) -> Result<TokenResponse, StoreError> {
        let response = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("metadata server: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body: format!("metadata server: {body}"),
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| StoreError::Malformed(format!("metadata token: {e}")))
    }
}
