//! Cookie-based session against the booking API.
//!
//! Authentication is a three-step handshake:
//! 1. GET `sessions` checks for a live session (403 means there is none)
//! 2. POST `sessions` with group name, username and password sets the session cookie
//! 3. GET `sessions` again must answer 200 to confirm the cookie took

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ClientConfig, Credentials};
use crate::error::{LisError, LisResult};
use crate::schedule::types::{SessionInfo, SessionList, SessionRequest};

const SESSIONS_PATH: &str = "sessions";

/// An API session owning its HTTP client and cookie store.
///
/// `user_id` is non-zero exactly when the session is authenticated.
pub struct Session {
    endpoint: Url,
    credentials: Credentials,
    client: Client,
    user_id: u64,
    group_id: u64,
}

impl Session {
    /// Creates an unauthenticated session with the default client configuration.
    pub fn connect(endpoint: Url, credentials: Credentials) -> LisResult<Self> {
        Self::connect_with_config(endpoint, credentials, &ClientConfig::default())
    }

    /// Creates an unauthenticated session, building the HTTP client once.
    pub fn connect_with_config(
        endpoint: Url,
        credentials: Credentials,
        config: &ClientConfig,
    ) -> LisResult<Self> {
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(LisError::Config {
                message: format!("endpoint must be http(s), got '{}'", endpoint),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .cookie_store(true)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LisError::Transport {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            endpoint: with_trailing_slash(endpoint),
            credentials,
            client,
            user_id: 0,
            group_id: 0,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn group_id(&self) -> u64 {
        self.group_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id != 0
    }

    /// Runs the check/login/confirm handshake.
    ///
    /// On any failure the identity is reset, so `user_id()` is zero afterwards.
    pub async fn authenticate(&mut self) -> LisResult<()> {
        let result = self.handshake().await;
        if let Err(e) = &result {
            self.user_id = 0;
            self.group_id = 0;
            warn!(username = %self.credentials.username, error = %e, "Authentication failed");
        }
        result
    }

    async fn handshake(&mut self) -> LisResult<()> {
        let check = self.authorized_get(SESSIONS_PATH).await?;
        match check.status() {
            StatusCode::OK => {
                let list: SessionList = read_json(check, "sessions").await?;
                let info = list.sessions.into_iter().next().ok_or_else(|| {
                    LisError::Authentication {
                        message: "session check returned no session".to_string(),
                    }
                })?;
                self.adopt(&info);
                info!(
                    user_id = self.user_id,
                    group_id = self.group_id,
                    "Reusing live session"
                );
                return Ok(());
            }
            StatusCode::FORBIDDEN => {
                debug!(username = %self.credentials.username, "No live session, submitting credentials");
            }
            status => {
                return Err(LisError::Authentication {
                    message: format!("unexpected status {} from session check", status),
                });
            }
        }

        let request = SessionRequest {
            groupname: &self.credentials.groupname,
            username: &self.credentials.username,
            password: &self.credentials.password,
        };
        let response = self.authorized_post(SESSIONS_PATH, &request).await?;
        if response.status() != StatusCode::OK {
            return Err(LisError::Authentication {
                message: format!("wrong credentials for {}", self.credentials.username),
            });
        }

        for cookie in response.cookies() {
            debug!(
                cookie = %cookie.name(),
                fingerprint = %cookie_fingerprint(cookie.value()),
                "Received session cookie"
            );
        }

        let info: SessionInfo = read_json(response, "session").await?;
        self.adopt(&info);

        let confirm = self.authorized_get(SESSIONS_PATH).await?;
        if confirm.status() != StatusCode::OK {
            return Err(LisError::Authentication {
                message: format!("session not confirmed, check returned {}", confirm.status()),
            });
        }

        info!(
            user_id = self.user_id,
            group_id = self.group_id,
            "Authenticated"
        );
        Ok(())
    }

    fn adopt(&mut self, info: &SessionInfo) {
        self.user_id = info.user_id;
        self.group_id = info.group_id;
    }

    /// Resolves `path` relative to the endpoint.
    pub fn url(&self, path: &str) -> LisResult<Url> {
        Ok(self.endpoint.join(path.trim_start_matches('/'))?)
    }

    /// GET `endpoint/path` with the session cookie.
    pub async fn authorized_get(&self, path: &str) -> LisResult<Response> {
        let url = self.url(path)?;
        debug!(url = %url, "GET");
        Ok(self.client.get(url).send().await?)
    }

    /// POST a JSON body to `endpoint/path` with the session cookie.
    pub async fn authorized_post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> LisResult<Response> {
        let url = self.url(path)?;
        debug!(url = %url, "POST");
        Ok(self.client.post(url).json(body).send().await?)
    }

    /// GET and decode a JSON body, failing on any non-2xx status.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> LisResult<T> {
        let response = self.authorized_get(path).await?;
        let response = check_status(response, path)?;
        read_json(response, path).await
    }

    /// POST and decode a JSON body, failing on any non-2xx status.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> LisResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.authorized_post(path, body).await?;
        let response = check_status(response, path)?;
        read_json(response, path).await
    }
}

fn with_trailing_slash(mut endpoint: Url) -> Url {
    if !endpoint.path().ends_with('/') {
        let path = format!("{}/", endpoint.path());
        endpoint.set_path(&path);
    }
    endpoint
}

fn check_status(response: Response, path: &str) -> LisResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!(path = %path, status = %status, "Request rejected");
        Err(LisError::UnexpectedStatus {
            path: path.to_string(),
            status: status.as_u16(),
        })
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, resource: &str) -> LisResult<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| LisError::deserialization(resource, e))
}

/// Short hash of a cookie value, safe to put in logs.
pub fn cookie_fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(&digest[..6])
}
