// Firestore repository implementation (REST API)
use crate::application::reading_repository::{ReadingRepository, StoreError};
use crate::domain::reading::{Reading, StoredTime, LATEST_KEY};
use crate::infrastructure::config::FirestoreSettings;
use crate::infrastructure::gcp_auth::Credentials;
use anyhow::Context;
use async_trait::async_trait;
use futures::stream::BoxStream;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const PAGE_SIZE: u32 = 300;
const VALUE_FIELDS: [&str; 2] = ["value", "temperature"];
const TIME_FIELD: &str = "time";
/// Smallest Firestore timestamp; a range filter from here only matches timestamp values
const MIN_TIMESTAMP: &str = "0001-01-01T00:00:00Z";

#[derive(Debug, Clone)]
pub struct FirestoreRepository {
    client: reqwest::Client,
    base_url: String,
    /// `projects/{project}/databases/{database}/documents`
    documents_path: String,
    collection: String,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldValue {
    double_value: Option<f64>,
    /// int64 values are encoded as JSON strings
    integer_value: Option<String>,
    timestamp_value: Option<String>,
    string_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

impl Document {
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn into_reading(self) -> Option<Reading> {
        let value = VALUE_FIELDS
            .iter()
            .filter_map(|field| self.fields.get(*field))
            .find_map(FieldValue::as_f64)?;
        let time = self.fields.get(TIME_FIELD)?.as_stored_time()?;
        Some(Reading::new(self.id(), value, time))
    }
}

impl FieldValue {
    fn as_f64(&self) -> Option<f64> {
        self.double_value
            .or_else(|| self.integer_value.as_deref()?.parse::<i64>().ok().map(|v| v as f64))
    }

    fn as_stored_time(&self) -> Option<StoredTime> {
        if let Some(raw) = &self.timestamp_value {
            // Unparseable timestamps stay textual so the normalizer reports them
            return Some(match chrono::DateTime::parse_from_rfc3339(raw) {
                Ok(time) => StoredTime::Instant(time.with_timezone(&chrono::Utc)),
                Err(_) => StoredTime::Text(raw.clone()),
            });
        }
        self.string_value.clone().map(StoredTime::Text)
    }
}

fn decode(document: Document) -> Option<Reading> {
    let name = document.name.clone();
    let reading = document.into_reading();
    if reading.is_none() {
        tracing::warn!("Skipping Firestore document without value/time: {}", name);
    }
    reading
}

fn unavailable(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

impl FirestoreRepository {
    pub fn new(settings: &FirestoreSettings, collection: String) -> anyhow::Result<Self> {
        let project_id = settings
            .project_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .context("firestore.project_id must be set for the firestore backend")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build Firestore HTTP client")?;

        let credentials = Credentials::from_settings(settings, client.clone());

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            documents_path: format!(
                "projects/{}/databases/{}/documents",
                project_id, settings.database
            ),
            collection,
            credentials,
        })
    }

    fn documents_url(&self) -> String {
        format!("{}/{}", self.base_url, self.documents_path)
    }

    fn document_name(&self, id: &str) -> String {
        format!("{}/{}/{}", self.documents_path, self.collection, id)
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        self.credentials
            .authorize(request)
            .await?
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(unavailable)
    }

    async fn expect_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }

    /// One write that replaces a document's fields and stamps `time` server-side
    fn reading_write(&self, id: &str, value: f64, must_not_exist: bool) -> Value {
        let mut write = json!({
            "update": {
                "name": self.document_name(id),
                "fields": { "value": { "doubleValue": value } },
            },
            "updateTransforms": [
                { "fieldPath": TIME_FIELD, "setToServerValue": "REQUEST_TIME" }
            ],
        });
        if must_not_exist {
            write["currentDocument"] = json!({ "exists": false });
        }
        write
    }

    fn history_write(&self, value: f64) -> Value {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.reading_write(&id, value, true)
    }

    /// Writes in a single commit are applied atomically
    async fn commit(&self, writes: Vec<Value>) -> Result<(), StoreError> {
        let url = format!("{}:commit", self.documents_url());
        let response = self
            .dispatch(self.client.post(&url).json(&json!({ "writes": writes })))
            .await?;
        let _: Value = Self::expect_json(response).await?;
        Ok(())
    }

    async fn list_page(&self, page_token: Option<&str>) -> Result<ListDocumentsResponse, StoreError> {
        let mut url = format!(
            "{}/{}?pageSize={}",
            self.documents_url(),
            self.collection,
            PAGE_SIZE
        );
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }

        let response = self.dispatch(self.client.get(&url)).await?;
        Self::expect_json(response).await
    }

    /// Newest readings first. Firestore orders mixed types by type, so the
    /// range filter keeps string-valued `time` fields out of the ranking.
    fn recent_query(&self, limit: usize) -> Value {
        // One extra row in case the latest slot sorts into the window
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": TIME_FIELD },
                        "op": "GREATER_THAN_OR_EQUAL",
                        "value": { "timestampValue": MIN_TIMESTAMP },
                    }
                },
                "orderBy": [{ "field": { "fieldPath": TIME_FIELD }, "direction": "DESCENDING" }],
                "limit": limit + 1,
            }
        })
    }
}

#[async_trait]
impl ReadingRepository for FirestoreRepository {
    async fn get_latest(&self) -> Result<Option<Reading>, StoreError> {
        let url = format!("{}/{}/{}", self.documents_url(), self.collection, LATEST_KEY);
        let response = self.dispatch(self.client.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document: Document = Self::expect_json(response).await?;
        Ok(decode(document))
    }

    async fn set_latest(&self, value: f64) -> Result<(), StoreError> {
        self.commit(vec![self.reading_write(LATEST_KEY, value, false)])
            .await
    }

    async fn append(&self, value: f64) -> Result<(), StoreError> {
        self.commit(vec![self.history_write(value)]).await
    }

    fn stream_all(&self) -> BoxStream<'_, Result<Reading, StoreError>> {
        Box::pin(async_stream::stream! {
            let mut page_token: Option<String> = None;
            loop {
                let page = match self.list_page(page_token.as_deref()).await {
                    Ok(page) => page,
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                };

                tracing::debug!("Fetched {} documents from {}", page.documents.len(), self.collection);

                for document in page.documents {
                    if document.id() == LATEST_KEY {
                        continue;
                    }
                    if let Some(reading) = decode(document) {
                        yield Ok(reading);
                    }
                }

                match page.next_page_token {
                    Some(token) if !token.is_empty() => page_token = Some(token),
                    _ => break,
                }
            }
        })
    }

    async fn record(&self, value: f64) -> Result<(), StoreError> {
        let writes = vec![
            self.reading_write(LATEST_KEY, value, false),
            self.history_write(value),
        ];
        self.commit(writes).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Reading>, StoreError> {
        let url = format!("{}:runQuery", self.documents_url());
        let response = self
            .dispatch(self.client.post(&url).json(&self.recent_query(limit)))
            .await?;
        let items: Vec<RunQueryItem> = Self::expect_json(response).await?;

        let mut readings: Vec<Reading> = items
            .into_iter()
            .filter_map(|item| item.document)
            .filter_map(decode)
            .filter(|reading| !reading.is_latest_slot())
            .take(limit)
            .collect();
        readings.reverse();
        Ok(readings)
    }
}
