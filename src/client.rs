//! HTTP client for the onboarding backend.
//!
//! One `BackendClient` serves as the wizard's [`ConfigStore`], [`AuthService`]
//! and [`ProfileService`], and as the layout editor's store.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{LayoutError, ServiceError};
use crate::fields::FieldId;
use crate::layout::{BucketId, ConfigStore, StepConfiguration};
use crate::profile::{Credentials, CredentialsPayload, ProfileUpdate, Progress, UserSummary};
use crate::services::{AuthService, LoginOutcome, ProfileService, RegisterOutcome};

const CONFIG_PATH: &str = "/api/admin/config";
const LOGIN_PATH: &str = "/api/onboarding/login";
const REGISTER_PATH: &str = "/api/onboarding/register";
const UPDATE_PATH: &str = "/api/onboarding/update";
const DATA_PATH: &str = "/api/data";

pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SaveBucketBody<'a> {
    page: u8,
    components: &'a [FieldId],
}

impl BackendClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Request {
                endpoint: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/api/onboarding/step/{email}` with the email as one encoded segment.
    fn step_url(&self, email: &str) -> Result<Url, ServiceError> {
        let invalid = |reason: String| ServiceError::Request {
            endpoint: self.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(["api", "onboarding", "step", email]);
        Ok(url)
    }

    fn request_error(endpoint: &str, e: reqwest::Error) -> ServiceError {
        ServiceError::Request {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
    }

    fn invalid_response(endpoint: &str, e: reqwest::Error) -> ServiceError {
        ServiceError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl ConfigStore for BackendClient {
    async fn load(&self) -> Result<StepConfiguration, LayoutError> {
        let resp = self
            .client
            .get(self.url(CONFIG_PATH))
            .send()
            .await
            .map_err(|e| LayoutError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(LayoutError::Unavailable(format!(
                "{CONFIG_PATH} returned {}",
                resp.status()
            )));
        }

        resp.json::<StepConfiguration>()
            .await
            .map_err(|e| LayoutError::Unavailable(format!("malformed configuration: {e}")))
    }

    async fn save(&self, bucket: BucketId, fields: &[FieldId]) -> Result<(), LayoutError> {
        let body = SaveBucketBody {
            page: bucket.number(),
            components: fields,
        };
        let resp = self
            .client
            .post(self.url(CONFIG_PATH))
            .json(&body)
            .send()
            .await
            .map_err(|e| LayoutError::SaveFailed {
                bucket,
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(LayoutError::SaveFailed {
                bucket,
                reason: format!("{CONFIG_PATH} returned {}", resp.status()),
            });
        }
        debug!(%bucket, "Step configuration saved");
        Ok(())
    }
}

#[async_trait]
impl AuthService for BackendClient {
    async fn login(&self, credentials: &Credentials) -> LoginOutcome {
        let resp = match self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&CredentialsPayload::from(credentials))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Login request failed");
                return LoginOutcome::Failed(e.to_string());
            }
        };

        match resp.status() {
            StatusCode::NOT_FOUND => LoginOutcome::NotRegistered,
            StatusCode::UNAUTHORIZED => LoginOutcome::WrongCredential,
            s if s.is_success() => match resp.json::<Progress>().await {
                Ok(progress) => LoginOutcome::Authenticated(progress),
                Err(e) => LoginOutcome::Failed(format!("malformed login response: {e}")),
            },
            s => LoginOutcome::Failed(format!("{LOGIN_PATH} returned {s}")),
        }
    }

    async fn register(&self, credentials: &Credentials) -> RegisterOutcome {
        let resp = match self
            .client
            .post(self.url(REGISTER_PATH))
            .json(&CredentialsPayload::from(credentials))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Registration request failed");
                return RegisterOutcome::Failed(e.to_string());
            }
        };

        if resp.status().is_success() {
            RegisterOutcome::Created
        } else {
            RegisterOutcome::Failed(format!("{REGISTER_PATH} returned {}", resp.status()))
        }
    }
}

#[async_trait]
impl ProfileService for BackendClient {
    async fn save(&self, update: &ProfileUpdate) -> Result<(), ServiceError> {
        let resp = self
            .client
            .post(self.url(UPDATE_PATH))
            .json(update)
            .send()
            .await
            .map_err(|e| Self::request_error(UPDATE_PATH, e))?;

        if !resp.status().is_success() {
            return Err(ServiceError::Status {
                endpoint: UPDATE_PATH.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn progress(&self, email: &str) -> Result<Option<Progress>, ServiceError> {
        let url = self.step_url(email)?;
        let endpoint = url.path().to_string();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::request_error(&endpoint, e))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => resp
                .json::<Progress>()
                .await
                .map(Some)
                .map_err(|e| Self::invalid_response(&endpoint, e)),
            s => Err(ServiceError::Status {
                endpoint,
                status: s.as_u16(),
            }),
        }
    }

    async fn list(&self) -> Result<Vec<UserSummary>, ServiceError> {
        let resp = self
            .client
            .get(self.url(DATA_PATH))
            .send()
            .await
            .map_err(|e| Self::request_error(DATA_PATH, e))?;

        if !resp.status().is_success() {
            return Err(ServiceError::Status {
                endpoint: DATA_PATH.to_string(),
                status: resp.status().as_u16(),
            });
        }
        resp.json()
            .await
            .map_err(|e| Self::invalid_response(DATA_PATH, e))
    }
}
