use super::error::{FailureKind, Result, SheetsError, TransportFailure};
use super::transport::{
    AppendValuesRequest, AppendValuesResponse, BatchUpdateRequest, BatchUpdateResponse,
    ClearValuesRequest, ClearValuesResponse, GetValuesRequest, Spreadsheet, Transport,
    TransportResult, UpdateValuesRequest, UpdateValuesResponse, ValueRange,
};
use crate::config::ClientConfig;
use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Error envelope returned by the API on non-success statuses
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// HTTP/JSON transport for the Sheets v4 REST API
///
/// Every request carries the bearer token. One method call is one HTTP
/// request; there are no retries.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base: Url,
}

impl HttpTransport {
    /// Build a transport from an endpoint and bearer token
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let mut base = Url::parse(&config.endpoint).map_err(|e| {
            SheetsError::Config(format!("Invalid endpoint '{}': {}", config.endpoint, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(SheetsError::Config(format!(
                "Invalid endpoint '{}': not a base URL",
                config.endpoint
            )));
        }
        // Joined paths are appended after the last segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| SheetsError::Config(format!("Invalid token format: {}", e)))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SheetsError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpTransport { http, base })
    }

    /// Build a transport from the `SHEETS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::connect(&ClientConfig::from_env()?)
    }

    /// `{base}spreadsheets/{id}` followed by `segments`. The final segment may
    /// carry a `:verb` suffix.
    fn url(&self, workbook_id: &str, segments: &[&str]) -> TransportResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TransportFailure::new(FailureKind::Rejected, "endpoint is not a base URL"))?;
            path.pop_if_empty().push("spreadsheets").push(workbook_id);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn values_url(&self, workbook_id: &str, range: &str, verb: Option<&str>) -> TransportResult<Url> {
        let last = match verb {
            Some(verb) => format!("{}:{}", range, verb),
            None => range.to_string(),
        };
        self.url(workbook_id, &["values", last.as_str()])
    }

    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> TransportResult<R> {
        let response = request.send().await.map_err(|e| {
            TransportFailure::new(FailureKind::Network, format!("request failed: {}", e)).with_source(e)
        })?;

        let status = response.status();
        if status.is_success() {
            // Reading the body can still fail on the network; only what was
            // fully read is a decode problem
            let body = response.bytes().await.map_err(|e| {
                TransportFailure::new(FailureKind::Network, format!("could not read response: {}", e))
                    .with_source(e)
            })?;
            return serde_json::from_slice::<R>(&body).map_err(|e| {
                TransportFailure::decode(format!("could not decode response: {}", e)).with_source(e)
            });
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!("HTTP {} from {}", status.as_u16(), self.base);
        Err(classify_failure(status.as_u16(), &body))
    }
}

/// Turn a non-success status and body into a failure
///
/// The API reports a missing sheet as a 400 about an unparsable range, and a
/// missing sheet ID as a 400 about an unknown grid; both count as not-found.
pub(crate) fn classify_failure(status: u16, body: &str) -> TransportFailure {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));

    let kind = match status {
        404 => FailureKind::NotFound,
        400 if message.starts_with("Unable to parse range") || message.contains("No grid with id") => {
            FailureKind::NotFound
        }
        401 | 403 => FailureKind::Unauthorized,
        429 => FailureKind::RateLimited,
        _ => FailureKind::Rejected,
    };
    TransportFailure::new(kind, message).with_status(status)
}

impl Transport for HttpTransport {
    fn get_values<'a>(
        &'a self,
        workbook_id: &'a str,
        request: GetValuesRequest,
    ) -> BoxFuture<'a, TransportResult<ValueRange>> {
        Box::pin(async move {
            let url = self.values_url(workbook_id, &request.range, None)?;
            let builder = self
                .http
                .get(url)
                .query(&[("valueRenderOption", request.render.as_str())]);
            self.send(builder).await
        })
    }

    fn update_values<'a>(
        &'a self,
        workbook_id: &'a str,
        request: UpdateValuesRequest,
    ) -> BoxFuture<'a, TransportResult<UpdateValuesResponse>> {
        Box::pin(async move {
            let url = self.values_url(workbook_id, &request.range, None)?;
            let builder = self
                .http
                .put(url)
                .query(&[("valueInputOption", request.input.as_str())])
                .json(&request.body);
            self.send(builder).await
        })
    }

    fn append_values<'a>(
        &'a self,
        workbook_id: &'a str,
        request: AppendValuesRequest,
    ) -> BoxFuture<'a, TransportResult<AppendValuesResponse>> {
        Box::pin(async move {
            let url = self.values_url(workbook_id, &request.range, Some("append"))?;
            let builder = self
                .http
                .post(url)
                .query(&[
                    ("valueInputOption", request.input.as_str()),
                    ("insertDataOption", request.insert.as_str()),
                ])
                .json(&request.body);
            self.send(builder).await
        })
    }

    fn clear_values<'a>(
        &'a self,
        workbook_id: &'a str,
        request: ClearValuesRequest,
    ) -> BoxFuture<'a, TransportResult<ClearValuesResponse>> {
        Box::pin(async move {
            let url = self.values_url(workbook_id, &request.range, Some("clear"))?;
            let builder = self.http.post(url).json(&serde_json::json!({}));
            self.send(builder).await
        })
    }

    fn batch_update<'a>(
        &'a self,
        workbook_id: &'a str,
        request: BatchUpdateRequest,
    ) -> BoxFuture<'a, TransportResult<BatchUpdateResponse>> {
        Box::pin(async move {
            let url = self.url(&format!("{}:batchUpdate", workbook_id), &[])?;
            let builder = self.http.post(url).json(&request);
            self.send(builder).await
        })
    }

    fn get_spreadsheet<'a>(&'a self, workbook_id: &'a str) -> BoxFuture<'a, TransportResult<Spreadsheet>> {
        Box::pin(async move {
            let url = self.url(workbook_id, &[])?;
            let builder = self.http.get(url).query(&[("fields", "sheets.properties")]);
            self.send(builder).await
        })
    }
}
