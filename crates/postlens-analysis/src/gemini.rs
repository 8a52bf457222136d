//! Client for the hosted generative-language API: resumable file upload,
//! file status and deletion, and `generateContent`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::error::AnalysisError;
use crate::store::{FileState, FileStore, Generator, RemoteFile};

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    state: Option<String>,
}

impl From<FileResource> for RemoteFile {
    fn from(f: FileResource) -> Self {
        Self {
            state: f.state.as_deref().map_or(FileState::Processing, FileState::parse),
            name: f.name,
            uri: f.uri,
            mime_type: f.mime_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    /// Creates a client for `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Client pointed at `base_url` with a generous timeout (for testing
    /// with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`GeminiClient::new`].
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, AnalysisError> {
        Self::new(api_key, base_url, 120, "postlens/0.1 (social-analytics)")
    }

    fn key_param(&self) -> [(&'static str, &str); 1] {
        [("key", self.api_key.as_str())]
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, AnalysisError> {
        let response = request
            .send()
            .await
            .map_err(|e| AnalysisError::Http(e.without_url()))?;
        check_status(response).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, AnalysisError> {
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Http(e.without_url()))?;
        serde_json::from_str(&body).map_err(|e| AnalysisError::Json {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// Maps 503 to [`AnalysisError::Overloaded`] and other non-2xx statuses to
/// [`AnalysisError::Api`] with the error envelope's message when present.
async fn check_status(response: Response) -> Result<Response, AnalysisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or(body);
    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(AnalysisError::Overloaded(message));
    }
    Err(AnalysisError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl FileStore for GeminiClient {
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<RemoteFile, AnalysisError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AnalysisError::io(path, e))?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let start = self
            .send(
                self.client
                    .post(format!("{}/upload/v1beta/files", self.base_url))
                    .query(&self.key_param())
                    .header("X-Goog-Upload-Protocol", "resumable")
                    .header("X-Goog-Upload-Command", "start")
                    .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
                    .header("X-Goog-Upload-Header-Content-Type", mime_type)
                    .json(&serde_json::json!({"file": {"display_name": display_name}})),
            )
            .await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| AnalysisError::MissingUploadUrl {
                path: path.display().to_string(),
            })?;

        let finished = self
            .send(
                self.client
                    .post(upload_url)
                    .header("X-Goog-Upload-Offset", "0")
                    .header("X-Goog-Upload-Command", "upload, finalize")
                    .body(bytes),
            )
            .await?;
        let uploaded: UploadResponse = Self::read_json(finished, "file upload").await?;
        Ok(uploaded.file.into())
    }

    async fn status(&self, name: &str) -> Result<RemoteFile, AnalysisError> {
        let response = self
            .send(
                self.client
                    .get(format!("{}/v1beta/{name}", self.base_url))
                    .query(&self.key_param()),
            )
            .await?;
        let file: FileResource = Self::read_json(response, "file status").await?;
        Ok(file.into())
    }

    async fn delete(&self, name: &str) -> Result<(), AnalysisError> {
        self.send(
            self.client
                .delete(format!("{}/v1beta/{name}", self.base_url))
                .query(&self.key_param()),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        files: &[RemoteFile],
        prompt: &str,
    ) -> Result<String, AnalysisError> {
        let mut parts: Vec<serde_json::Value> = files
            .iter()
            .map(|f| {
                serde_json::json!({
                    "file_data": {"mime_type": f.mime_type, "file_uri": f.uri}
                })
            })
            .collect();
        parts.push(serde_json::json!({"text": prompt}));
        let body = serde_json::json!({"contents": [{"parts": parts}]});

        let response = self
            .send(
                self.client
                    .post(format!(
                        "{}/v1beta/models/{model}:generateContent",
                        self.base_url
                    ))
                    .query(&self.key_param())
                    .json(&body),
            )
            .await?;
        let parsed: GenerateResponse = Self::read_json(response, "generateContent").await?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        Ok(text.trim().to_owned())
    }
}
