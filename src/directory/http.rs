//! HTTP client for the driver location service.
//!
//! # Responsibilities
//! - Authenticate (login for a bearer token, or a static token)
//! - Query nearby drivers for the matching engine
//! - Upload location batches for the import tool
//!
//! # Design Decisions
//! - One absolute deadline covers login and lookup together
//! - Any non-2xx status is a failure; the body is not inspected
//! - A JSON `null` body (empty result from the service) is an empty list

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Instant;
use url::Url;

use crate::config::DirectoryConfig;
use crate::directory::wire::{
    DriverLocationRecord, LoginRequest, LoginResponse, NearbyRequest,
};
use crate::directory::{DirectoryError, LocationDirectory};
use crate::geo::Coordinate;
use crate::matching::Candidate;
use crate::resilience::timeouts;

const LOGIN_PATH: &str = "api/v1/auth/login";
const NEARBY_PATH: &str = "api/v1/locations/nearby";
const BATCH_PATH: &str = "api/v1/locations/batch";

/// How requests to the directory are authorized.
#[derive(Clone, Default)]
pub enum DirectoryAuth {
    #[default]
    None,
    /// Static bearer token.
    Token(String),
    /// Log in before each exchange and use the returned token.
    Credentials { username: String, password: String },
}

impl std::fmt::Debug for DirectoryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryAuth::None => write!(f, "None"),
            DirectoryAuth::Token(_) => write!(f, "Token(***)"),
            DirectoryAuth::Credentials { username, .. } => {
                write!(f, "Credentials {{ username: {:?} }}", username)
            }
        }
    }
}

impl DirectoryAuth {
    /// Credentials win over a static token when both are configured.
    pub fn from_config(config: &DirectoryConfig) -> Self {
        match (&config.username, &config.password, &config.api_token) {
            (Some(username), Some(password), _) => DirectoryAuth::Credentials {
                username: username.clone(),
                password: password.clone(),
            },
            (_, _, Some(token)) => DirectoryAuth::Token(token.clone()),
            _ => DirectoryAuth::None,
        }
    }
}

/// Location Directory reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLocationDirectory {
    client: Client,
    base_url: Url,
    auth: DirectoryAuth,
}

impl HttpLocationDirectory {
    pub fn new(mut base_url: Url, auth: DirectoryAuth) -> Result<Self, DirectoryError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(concat!("ride-matcher/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    pub fn from_config(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| DirectoryError::Endpoint(format!("{}: {}", config.base_url, e)))?;
        Self::new(base_url, DirectoryAuth::from_config(config))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        deadline: Instant,
    ) -> Result<String, DirectoryError> {
        let request = self
            .client
            .post(self.endpoint(LOGIN_PATH)?)
            .json(&LoginRequest { username, password });
        let response = send(request, deadline).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Auth(format!("login returned {}", status)));
        }
        let body: LoginResponse = response.json().await?;
        Ok(body.token)
    }

    /// Store a batch of driver locations.
    pub async fn save_locations(
        &self,
        batch: &[Candidate],
        deadline: Instant,
    ) -> Result<(), DirectoryError> {
        let records: Vec<DriverLocationRecord> = batch.iter().map(DriverLocationRecord::from).collect();
        let request = self.authorize(self.client.post(self.endpoint(BATCH_PATH)?), deadline).await?;
        let response = send(request.json(&records), deadline).await?;
        check_status(&response)?;
        tracing::debug!(count = records.len(), "Location batch stored");
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url, DirectoryError> {
        self.base_url
            .join(path)
            .map_err(|e| DirectoryError::Endpoint(e.to_string()))
    }

    async fn authorize(
        &self,
        request: RequestBuilder,
        deadline: Instant,
    ) -> Result<RequestBuilder, DirectoryError> {
        match &self.auth {
            DirectoryAuth::None => Ok(request),
            DirectoryAuth::Token(token) => Ok(request.bearer_auth(token)),
            DirectoryAuth::Credentials { username, password } => {
                let token = self.login(username, password, deadline).await?;
                Ok(request.bearer_auth(token))
            }
        }
    }
}

#[async_trait]
impl LocationDirectory for HttpLocationDirectory {
    async fn find_candidates(
        &self,
        origin: Coordinate,
        radius_km: f64,
        deadline: Instant,
    ) -> Result<Vec<Candidate>, DirectoryError> {
        let request = self.authorize(self.client.post(self.endpoint(NEARBY_PATH)?), deadline).await?;
        let response = send(request.json(&NearbyRequest::new(origin, radius_km)), deadline).await?;
        check_status(&response)?;

        let records: Option<Vec<DriverLocationRecord>> = decode(response).await?;
        records
            .unwrap_or_default()
            .into_iter()
            .map(Candidate::try_from)
            .collect()
    }
}

async fn send(request: RequestBuilder, deadline: Instant) -> Result<Response, DirectoryError> {
    let left = timeouts::remaining(deadline).ok_or(DirectoryError::Timeout)?;
    Ok(request.timeout(left).send().await?)
}

fn check_status(response: &Response) -> Result<(), DirectoryError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(DirectoryError::Status(status.as_u16()))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, DirectoryError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| DirectoryError::Decode(e.to_string()))
}
