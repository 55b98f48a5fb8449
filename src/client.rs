//! HTTP client for the ragline service.

use std::env;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header, multipart};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::ndjson;
use crate::observability::{CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::session::Session;
use crate::types::{
    ChatDelta, ChatRequest, ChatResponse, CompareRequest, ModelsResponse, NewUser, Token, User,
};

const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_SUMMARY_MODEL: &str = "mistral-small3.1:latest";

/// Client for the ragline authentication and RAG services.
///
/// The client is cheap to clone; clones share one HTTP connection pool and
/// one [`Session`], so a single sign-in serves concurrent requests. Each
/// streaming request owns its own transport resource and line buffer.
#[derive(Clone)]
pub struct Ragline {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    session: Arc<RwLock<Session>>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl std::fmt::Debug for Ragline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ragline")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Ragline {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the
    /// RAGLINE_BASE_URL environment variable; a local development default
    /// is used when neither is set.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with a custom timeout.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var("RAGLINE_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = normalize_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            session: Arc::new(RwLock::new(Session::new())),
            logger: None,
        })
    }

    /// Installs a logger that observes responses and streamed deltas.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Returns a snapshot of the current session state.
    pub fn session(&self) -> Session {
        self.session.read().expect("session lock poisoned").clone()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Headers common to every request. Leaves the content type unset so
    /// multipart requests keep their boundary header.
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(bearer) = self.session.read().expect("session lock poisoned").bearer() {
            if let Ok(value) = HeaderValue::from_str(&bearer) {
                headers.insert(header::AUTHORIZATION, value);
            }
        }
        headers
    }

    /// Create and return default headers for JSON API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = self.auth_headers();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    /// Map a reqwest transport failure to our error type.
    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        // The service reports errors as {"detail": "..."}.
        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<serde_json::Value>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|parsed| parsed.detail)
            .map(|detail| match detail {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            })
            .unwrap_or(error_body);

        match status_code {
            400 => Error::bad_request(message),
            401 => Error::authentication(message),
            403 => Error::permission(message),
            404 => Error::not_found(message),
            408 => Error::timeout(message, None),
            429 => Error::rate_limit(message, retry_after),
            500 => Error::internal_server(message, request_id),
            502..=504 => Error::service_unavailable(message, retry_after),
            _ => Error::api(status_code, message, request_id),
        }
    }

    /// Send a request builder and check the response status.
    async fn send_checked(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let response = request.send().await.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            self.transport_error(e)
        })?;
        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .send_checked(
                self.client
                    .post(self.endpoint(path)?)
                    .headers(self.default_headers())
                    .json(body),
            )
            .await?;
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    async fn post_multipart<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T> {
        let response = self
            .send_checked(
                self.client
                    .post(self.endpoint(path)?)
                    .headers(self.auth_headers())
                    .multipart(form),
            )
            .await?;
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let response = self
            .send_checked(
                self.client
                    .get(self.endpoint(path)?)
                    .headers(self.default_headers()),
            )
            .await?;
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    // ----- authentication -----

    /// Sign in with username and password, installing the returned token
    /// into the client's session.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Token> {
        // OAuth2 password form, not JSON.
        let response = self
            .send_checked(
                self.client
                    .post(self.endpoint("authentication/sign-in")?)
                    .form(&[("username", username), ("password", password)]),
            )
            .await?;
        let token = response.json::<Token>().await.map_err(|e| {
            Error::serialization(format!("failed to parse token: {}", e), Some(Box::new(e)))
        })?;
        self.session
            .write()
            .expect("session lock poisoned")
            .install(token.clone())?;
        Ok(token)
    }

    /// Create a new account.
    pub async fn sign_up(&self, new_user: &NewUser) -> Result<User> {
        self.post_json("authentication/sign-up", new_user).await
    }

    /// Fetch the authenticated user's account details.
    pub async fn me(&self) -> Result<User> {
        self.get_json("authentication/me").await
    }

    /// Change the authenticated user's password.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        #[derive(Serialize)]
        struct ChangePassword<'a> {
            #[serde(rename = "oldPassword")]
            old_password: &'a str,
            #[serde(rename = "newPassword")]
            new_password: &'a str,
        }
        let _: serde_json::Value = self
            .post_json(
                "authentication/change-password",
                &ChangePassword {
                    old_password,
                    new_password,
                },
            )
            .await?;
        Ok(())
    }

    /// Exchange the current token for a fresh one and install it.
    pub async fn refresh(&self) -> Result<Token> {
        let token: Token = self
            .post_json("authentication/refresh", &serde_json::json!({}))
            .await?;
        self.session
            .write()
            .expect("session lock poisoned")
            .install(token.clone())?;
        Ok(token)
    }

    /// Log out server-side and expire the local session.
    pub async fn logout(&self) -> Result<()> {
        let result: Result<serde_json::Value> =
            self.post_json("authentication/logout", &serde_json::json!({})).await;
        self.session.write().expect("session lock poisoned").expire();
        result.map(|_| ())
    }

    // ----- RAG -----

    /// List the models available for chat and comparison.
    pub async fn models(&self) -> Result<Vec<String>> {
        let response: ModelsResponse = self.get_json("rag/models").await?;
        Ok(response.models)
    }

    /// Submit a chat query and get the complete, non-streaming reply.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        require_collection(&request.collection_name)?;
        let response: ChatResponse = self.post_json("rag/chat", request).await?;
        if let Some(logger) = &self.logger {
            logger.log_response(&response);
        }
        Ok(response)
    }

    /// Submit a chat query and stream the reply as [`ChatDelta`]s.
    ///
    /// The sequence is lazy, single-pass, and forward-only; consuming it
    /// twice requires a new request. Dropping it mid-stream releases the
    /// transport.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<impl Stream<Item = Result<ChatDelta>> + Send> {
        require_collection(&request.collection_name)?;
        self.stream_ndjson("rag/chat/stream", request).await
    }

    /// Compare two documents and get the complete, non-streaming reply.
    pub async fn compare(&self, request: &CompareRequest) -> Result<ChatResponse> {
        require_collection(&request.collection_name)?;
        let response: ChatResponse = self.post_json("rag/compare", request).await?;
        if let Some(logger) = &self.logger {
            logger.log_response(&response);
        }
        Ok(response)
    }

    /// Compare two documents and stream the reply as [`ChatDelta`]s.
    ///
    /// Same record and delta contract as [`chat_stream`](Self::chat_stream);
    /// only the endpoint and payload differ.
    pub async fn compare_stream(
        &self,
        request: &CompareRequest,
    ) -> Result<impl Stream<Item = Result<ChatDelta>> + Send> {
        require_collection(&request.collection_name)?;
        self.stream_ndjson("rag/compare/stream", request).await
    }

    /// Submit a chat query grounded in an uploaded document instead of a
    /// stored collection. The file travels as a multipart form field.
    pub async fn chat_with_file(
        &self,
        query: &str,
        file_name: &str,
        file: Vec<u8>,
        model: Option<&str>,
    ) -> Result<ChatResponse> {
        let mut form = multipart::Form::new().text("query", query.to_string()).part(
            "file",
            multipart::Part::bytes(file).file_name(file_name.to_string()),
        );
        if let Some(model) = model {
            form = form.text("model", model.to_string());
        }
        let response: ChatResponse = self.post_multipart("rag/chat-with-file", form).await?;
        if let Some(logger) = &self.logger {
            logger.log_response(&response);
        }
        Ok(response)
    }

    /// Upload a document for server-side ingestion. The reply is the
    /// service's status payload, passed through as opaque JSON.
    pub async fn upload_file(
        &self,
        file_name: &str,
        file: Vec<u8>,
    ) -> Result<serde_json::Value> {
        let form = multipart::Form::new().part(
            "file",
            multipart::Part::bytes(file).file_name(file_name.to_string()),
        );
        self.post_multipart("rag/upload", form).await
    }

    /// Summarize a block of text.
    pub async fn summary(&self, text: &str, model: Option<&str>) -> Result<ChatResponse> {
        #[derive(Serialize)]
        struct SummaryRequest<'a> {
            text: &'a str,
            model: &'a str,
        }
        self.post_json(
            "rag/summary",
            &SummaryRequest {
                text,
                model: model.unwrap_or(DEFAULT_SUMMARY_MODEL),
            },
        )
        .await
    }

    /// Shared streaming request routine for chat and comparison.
    async fn stream_ndjson<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<impl Stream<Item = Result<ChatDelta>> + Send> {
        let mut headers = self.default_headers();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/x-ndjson"),
        );

        let response = self
            .send_checked(
                self.client
                    .post(self.endpoint(path)?)
                    .headers(headers)
                    .json(body),
            )
            .await?;

        let body = response.bytes_stream();
        let logger = self.logger.clone();
        Ok(ndjson::chat_deltas(body).inspect(move |item| {
            if let (Some(logger), Ok(delta)) = (&logger, item) {
                logger.log_delta(delta);
            }
        }))
    }
}

/// Rejects chat and comparison requests without a selected collection
/// before any request is issued.
fn require_collection(collection_name: &str) -> Result<()> {
    if collection_name.trim().is_empty() {
        Err(Error::validation(
            "no collection selected",
            Some("collection_name".to_string()),
        ))
    } else {
        Ok(())
    }
}

/// Parses the base URL and guarantees a trailing slash so relative joins
/// keep the full path.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let mut base_url = base_url.to_string();
    if !base_url.ends_with('/') {
        base_url.push('/');
    }
    let url = Url::parse(&base_url)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(
            format!("base URL cannot be a base: {base_url}"),
            None,
        ));
    }
    Ok(url)
}
