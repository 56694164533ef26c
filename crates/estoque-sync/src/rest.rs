//! # REST Gateway
//!
//! [`RemoteGateway`] implementation over the hosted REST data API
//! (PostgREST-style: one endpoint per table, `eq.`/`lte.` filters, `Prefer`
//! headers for upsert semantics).
//!
//! ## Connection Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    RestGateway Lifecycle                                │
//! │                                                                         │
//! │  new(config)        handle = None        is_available() == false       │
//! │       │                                                                 │
//! │       ▼ connect()                                                      │
//! │  build client ──► probe /rest/v1/ ──► install handle                   │
//! │       │                 │                                               │
//! │       │            transport error → handle stays None                 │
//! │       ▼                                                                 │
//! │  handle = Some       is_available() == true                            │
//! │       │                                                                 │
//! │       ▼ disconnect()                                                   │
//! │  handle = None       calls fail fast with Unavailable                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Array-Literal Quirk
//!
//! Some deployed schemas type `products.id` / `movements.prod_id` as array
//! columns. A scalar insert is then rejected with a "malformed array
//! literal" message. The write path classifies that response as
//! [`GatewayError::SchemaMismatch`] and retries exactly once with the quirk
//! column wrapped as a single-element array. Any other failure propagates
//! unchanged; nothing ever loops.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{Collection, Command, Query, RemoteGateway};

// =============================================================================
// Handle
// =============================================================================

/// An established connection: HTTP client + parsed endpoint + credentials.
///
/// Constructed on connect, dropped on disconnect - availability *is* the
/// presence of this value.
#[derive(Debug, Clone)]
struct Handle {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

// =============================================================================
// Rest Gateway
// =============================================================================

/// REST client for the hosted data API.
pub struct RestGateway {
    config: GatewayConfig,
    handle: RwLock<Option<Handle>>,
}

impl RestGateway {
    /// Creates a disconnected gateway. Call [`RemoteGateway::connect`] to
    /// establish the handle.
    pub fn new(config: GatewayConfig) -> Self {
        RestGateway {
            config,
            handle: RwLock::new(None),
        }
    }

    /// Clones the current handle, or fails fast.
    fn handle(&self) -> GatewayResult<Handle> {
        self.handle
            .read()
            .expect("gateway handle lock poisoned")
            .clone()
            .ok_or(GatewayError::Unavailable)
    }

    /// Table endpoint under `/rest/v1/`.
    fn endpoint(&self, handle: &Handle, collection: Collection) -> GatewayResult<Url> {
        Ok(handle.base.join(&format!("rest/v1/{}", collection.table()))?)
    }

    /// Attaches the API credentials to a request.
    fn authed(&self, handle: &Handle, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &handle.api_key)
            .bearer_auth(&handle.api_key)
    }

    /// Sends one insert/upsert body (PostgREST takes a JSON array of rows).
    async fn send_write(
        &self,
        handle: &Handle,
        collection: Collection,
        upsert: bool,
        row: &Value,
    ) -> GatewayResult<()> {
        let url = self.endpoint(handle, collection)?;
        let prefer = if upsert {
            "resolution=merge-duplicates,return=minimal"
        } else {
            "return=minimal"
        };
        let response = self
            .authed(handle, handle.http.post(url))
            .header("Prefer", prefer)
            .json(&serde_json::json!([row]))
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl RemoteGateway for RestGateway {
    fn is_available(&self) -> bool {
        self.handle
            .read()
            .expect("gateway handle lock poisoned")
            .is_some()
    }

    async fn connect(&self) -> GatewayResult<()> {
        if !self.config.is_configured() {
            return Err(GatewayError::InvalidEndpoint(
                "remote URL or API key not configured".into(),
            ));
        }

        let base = Url::parse(&self.config.url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout())
            .timeout(self.config.request_timeout())
            .build()?;

        let handle = Handle {
            http,
            base,
            api_key: self.config.api_key.clone(),
        };

        // Reaching the API root is the availability test. The root serves an
        // OpenAPI document; the body is irrelevant, only transport failures
        // keep the handle uninstalled.
        let probe = handle.base.join("rest/v1/")?;
        self.authed(&handle, handle.http.get(probe)).send().await?;

        *self.handle.write().expect("gateway handle lock poisoned") = Some(handle);
        info!(url = %self.config.url, "Connected to remote store");
        Ok(())
    }

    fn disconnect(&self) {
        *self.handle.write().expect("gateway handle lock poisoned") = None;
        info!("Disconnected from remote store");
    }

    async fn execute(&self, collection: Collection, command: Command) -> GatewayResult<()> {
        let handle = self.handle()?;
        debug!(collection = %collection, verb = command.verb(), "Executing remote command");

        match &command {
            Command::Insert(row) | Command::Upsert(row) => {
                let upsert = matches!(&command, Command::Upsert(_));
                match self.send_write(&handle, collection, upsert, row).await {
                    Err(GatewayError::SchemaMismatch(message)) => {
                        let Some(column) = collection.quirk_column() else {
                            return Err(GatewayError::SchemaMismatch(message));
                        };
                        warn!(
                            collection = %collection,
                            column,
                            "Scalar rejected by array-typed column, retrying wrapped"
                        );
                        let wrapped = wrap_quirk_column(row, column);
                        self.send_write(&handle, collection, upsert, &wrapped).await
                    }
                    other => other,
                }
            }

            Command::Update { id, fields } => {
                let url = self.endpoint(&handle, collection)?;
                let response = self
                    .authed(&handle, handle.http.patch(url))
                    .query(&[("id", format!("eq.{}", id))])
                    .json(fields)
                    .send()
                    .await?;
                check_status(response).await
            }

            Command::Delete { id } => {
                let url = self.endpoint(&handle, collection)?;
                let response = self
                    .authed(&handle, handle.http.delete(url))
                    .query(&[("id", format!("eq.{}", id))])
                    .send()
                    .await?;
                check_status(response).await
            }
        }
    }

    async fn query(&self, collection: Collection, query: Query) -> GatewayResult<Vec<Value>> {
        let handle = self.handle()?;
        let url = self.endpoint(&handle, collection)?;

        let direction = if query.descending { "desc" } else { "asc" };
        let mut params = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), format!("{}.{}", query.order_by, direction)),
        ];
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        let response = self
            .authed(&handle, handle.http.get(url))
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body));
        }

        let rows: Vec<Value> = response.json().await?;
        debug!(collection = %collection, count = rows.len(), "Remote query returned rows");
        Ok(rows)
    }

    async fn purge(&self, collection: Collection, ceiling: DateTime<Utc>) -> GatewayResult<()> {
        let handle = self.handle()?;
        let url = self.endpoint(&handle, collection)?;
        let response = self
            .authed(&handle, handle.http.delete(url))
            .query(&[(collection.date_column(), format!("lte.{}", ceiling.to_rfc3339()))])
            .send()
            .await?;
        check_status(response).await
    }
}

// =============================================================================
// Response Classification
// =============================================================================

/// Turns a non-success response into a typed error.
async fn check_status(response: reqwest::Response) -> GatewayResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_failure(status.as_u16(), &body))
}

/// Classifies an API failure. The scalar-vs-array schema quirk gets its own
/// variant so the retry decision stays typed; everything else is a plain
/// API error, surfaced to the caller unchanged.
fn classify_failure(status: u16, body: &str) -> GatewayError {
    let message = extract_message(body);
    if message.contains("malformed array literal") {
        GatewayError::SchemaMismatch(message)
    } else {
        GatewayError::Api { status, message }
    }
}

/// Pulls the `message` field out of a PostgREST error body, falling back to
/// the raw text.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Wraps the quirk column's value as a single-element array (null becomes
/// an empty array).
fn wrap_quirk_column(row: &Value, column: &str) -> Value {
    let mut wrapped = row.clone();
    if let Some(object) = wrapped.as_object_mut() {
        let current = object.get(column).cloned().unwrap_or(Value::Null);
        let array = match current {
            Value::Null => serde_json::json!([]),
            other => serde_json::json!([other]),
        };
        object.insert(column.to_string(), array);
    }
    wrapped
}

// =============================================================================
// Unit Tests
// =============================================================================
