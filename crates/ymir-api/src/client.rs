// Printer host HTTP client
//
// Wraps `reqwest::Client` with endpoint URL construction and the API key
// header. Every call takes a caller-supplied timeout and returns an
// `HttpOutcome`; there is no retry and no state beyond the immutable
// endpoint URLs.

use std::future::Future;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{debug, trace};
use url::Url;

use crate::auth::api_key_headers;
use crate::error::Error;
use crate::models::ConnectCommand;
use crate::outcome::{HttpOutcome, TransportFailure};
use crate::transport::TransportConfig;

const STATUS_PATH: &str = "api/printer";
const JOB_PATH: &str = "api/job";
const FILES_PATH: &str = "api/files/local";

// ── Seam used by the core ────────────────────────────────────────────

/// The printer host operations the monitor depends on.
///
/// [`DeviceClient`] is the production implementation; the core's state
/// machines are generic over this trait so they can be driven by a
/// scripted device.
pub trait DeviceApi: Send + Sync {
    /// `GET /api/printer`
    fn fetch_status(&self, timeout: Duration) -> impl Future<Output = HttpOutcome> + Send;

    /// `GET /api/job`
    fn fetch_job(&self, timeout: Duration) -> impl Future<Output = HttpOutcome> + Send;

    /// `GET /api/files/local`, or one folder below it.
    fn fetch_files(&self, timeout: Duration) -> impl Future<Output = HttpOutcome> + Send;

    /// `POST /api/printer` with `{"command":"connect"}`
    fn send_connect_command(&self, timeout: Duration)
    -> impl Future<Output = HttpOutcome> + Send;
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one printer host.
///
/// Authenticates every request with the `X-Api-Key` header, installed once
/// as a default header on the underlying client.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    status_url: Url,
    job_url: Url,
    files_url: Url,
}

impl DeviceClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, API key and transport config.
    pub fn from_api_key(
        base_url: &Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let headers = api_key_headers(api_key)?;
        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &Url, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            http,
            status_url: base_url.join(STATUS_PATH)?,
            job_url: base_url.join(JOB_PATH)?,
            files_url: base_url.join(FILES_PATH)?,
            base_url,
        })
    }

    /// Scope the file listing to one folder of the host's local storage.
    ///
    /// An empty folder (after trimming `/`) keeps the full listing.
    pub fn with_files_folder(mut self, folder: &str) -> Result<Self, Error> {
        let folder = folder.trim_matches('/');
        if !folder.is_empty() {
            self.files_url = self.base_url.join(&format!("{FILES_PATH}/{folder}"))?;
        }
        Ok(self)
    }

    /// The normalized printer base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get(&self, url: &Url, timeout: Duration) -> HttpOutcome {
        debug!("GET {url}");
        let result = self.http.get(url.clone()).timeout(timeout).send().await;
        into_outcome(result).await
    }

    async fn post_command(
        &self,
        url: &Url,
        body: &ConnectCommand,
        timeout: Duration,
    ) -> HttpOutcome {
        debug!("POST {url}");
        let result = self
            .http
            .post(url.clone())
            .json(body)
            .timeout(timeout)
            .send()
            .await;
        into_outcome(result).await
    }
}

impl DeviceApi for DeviceClient {
    async fn fetch_status(&self, timeout: Duration) -> HttpOutcome {
        self.get(&self.status_url, timeout).await
    }

    async fn fetch_job(&self, timeout: Duration) -> HttpOutcome {
        self.get(&self.job_url, timeout).await
    }

    async fn fetch_files(&self, timeout: Duration) -> HttpOutcome {
        self.get(&self.files_url, timeout).await
    }

    async fn send_connect_command(&self, timeout: Duration) -> HttpOutcome {
        self.post_command(&self.status_url, &ConnectCommand::connect(), timeout)
            .await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Ensure the base path ends with `/` so relative joins append rather
/// than replace the last path segment (`http://host/octoprint` + `api/job`).
fn normalize_base_url(raw: &Url) -> Result<Url, Error> {
    match raw.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::UnsupportedScheme {
                scheme: other.to_owned(),
            });
        }
    }

    let mut url = raw.clone();
    url.set_query(None);
    url.set_fragment(None);
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

/// Collapse a send result into an `HttpOutcome`. Non-2xx bodies are dropped.
async fn into_outcome(result: Result<reqwest::Response, reqwest::Error>) -> HttpOutcome {
    let resp = match result {
        Ok(resp) => resp,
        Err(e) => return HttpOutcome::TransportError(TransportFailure::from_reqwest(&e)),
    };

    let status = resp.status();
    trace!(status = status.as_u16(), "response received");

    if !status.is_success() {
        return HttpOutcome::HttpError {
            status: status.as_u16(),
        };
    }

    match resp.text().await {
        Ok(body) => HttpOutcome::Ok {
            status: status.as_u16(),
            body,
        },
        Err(e) => HttpOutcome::TransportError(TransportFailure::from_reqwest(&e)),
    }
}
