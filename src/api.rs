use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{
    blocking::{Client, Response},
    StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    config::BoardConfig,
    job::{decode_listing, Company, JobRecord},
};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),
    #[error("cannot build a request URL from {0}")]
    InvalidEndpoint(Url),
    #[error("job not found: {0}")]
    NotFound(String),
}

/// An access token as granted by the token endpoint.
#[derive(Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Single-slot bearer token cache shared by every request to the API.
///
/// A refresh holds the lock, so concurrent callers wait for one token
/// request instead of each issuing their own.
#[derive(Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Seconds shaved off each grant so a token is never used right at expiry.
    pub const EXPIRY_MARGIN_SECS: i64 = 60;

    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token if it is still valid at `now`, otherwise
    /// stores and returns a fresh grant from `refresh`.
    pub fn get_or_refresh<E>(
        &self,
        now: DateTime<Utc>,
        refresh: impl FnOnce() -> Result<TokenGrant, E>,
    ) -> Result<String, E> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = slot.as_ref() {
            if now < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        let grant = refresh()?;
        let lifetime = (grant.expires_in - Self::EXPIRY_MARGIN_SECS).max(0);
        let expires_at = TimeDelta::try_seconds(lifetime)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(now);
        log::debug!("Refreshed bearer token, valid until {}", expires_at);

        *slot = Some(CachedToken {
            token: grant.access_token.clone(),
            expires_at,
        });
        Ok(grant.access_token)
    }

    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// OAuth2 client credentials for the recruiting API.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub const CLIENT_ID_VAR: &str = "CLIENT_ID";
    pub const CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";

    pub fn from_env() -> Result<Self, FetchError> {
        let var = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or(FetchError::MissingCredential(name))
        };
        Ok(Self {
            client_id: var(Self::CLIENT_ID_VAR)?,
            client_secret: var(Self::CLIENT_SECRET_VAR)?,
        })
    }
}

/// Blocking client for the upstream recruiting API.
pub struct RecruitingApi {
    http: Client,
    config: BoardConfig,
    credentials: Credentials,
    tokens: Arc<TokenCache>,
}

impl RecruitingApi {
    pub fn new(
        config: BoardConfig,
        credentials: Credentials,
        tokens: Arc<TokenCache>,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config,
            credentials,
            tokens,
        })
    }

    pub fn fetch_jobs(&self) -> Result<Vec<JobRecord>, FetchError> {
        let body = self.get_json(&self.config.jobs_url)?;
        let jobs = decode_listing(&body, JobRecord::from_json);
        log::info!("Fetched {} jobs", jobs.len());
        Ok(jobs)
    }

    pub fn fetch_job(&self, id: &str) -> Result<JobRecord, FetchError> {
        let mut url = self.config.job_detail_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidEndpoint(self.config.job_detail_url.clone()))?
            .pop_if_empty()
            .push(id);

        let body = self.get_json(&url)?;
        job_from_detail(&body).ok_or_else(|| FetchError::NotFound(id.to_string()))
    }

    pub fn fetch_companies(&self) -> Result<Vec<Company>, FetchError> {
        let body = self.get_json(&self.config.companies_url)?;
        let companies = decode_listing(&body, Company::from_json);
        log::info!("Fetched {} companies", companies.len());
        Ok(companies)
    }

    fn bearer_token(&self) -> Result<String, FetchError> {
        self.tokens
            .get_or_refresh(Utc::now(), || self.request_token())
    }

    fn request_token(&self) -> Result<TokenGrant, FetchError> {
        log::debug!("Requesting bearer token from {}", self.config.token_url);
        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()?;
        Ok(check_status(response)?.json()?)
    }

    fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        let token = self.bearer_token()?;
        log::debug!("GET {}", url);
        let response = self.http.get(url.clone()).bearer_auth(token).send()?;
        let body = check_status(response)?.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Some deployments wrap the record in `result` or `data`, others return it bare.
fn job_from_detail(body: &Value) -> Option<JobRecord> {
    ["result", "data"]
        .into_iter()
        .filter_map(|key| body.get(key))
        .chain([body])
        .find_map(JobRecord::from_json)
}

fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(FetchError::Status {
        status,
        message: error_message(&body),
    })
}

/// Pulls `message` out of an upstream error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::TimeZone as _;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn grant(token: &str, expires_in: i64) -> Result<TokenGrant, FetchError> {
        Ok(TokenGrant {
            access_token: token.into(),
            expires_in,
        })
    }

    #[test]
    fn token_cached_until_margin() {
        let cache = TokenCache::new();
        let refreshes = Cell::new(0);
        let refresh = |token: &'static str| {
            refreshes.set(refreshes.get() + 1);
            grant(token, 3600)
        };

        assert_eq!(cache.get_or_refresh(at(0), || refresh("first")).unwrap(), "first");
        assert_eq!(cache.get_or_refresh(at(3539), || refresh("second")).unwrap(), "first");
        assert_eq!(refreshes.get(), 1);

        // 3600s grant minus the 60s margin.
        assert_eq!(cache.get_or_refresh(at(3540), || refresh("second")).unwrap(), "second");
        assert_eq!(refreshes.get(), 2);
    }

    #[test]
    fn failed_refresh_keeps_nothing() {
        let cache = TokenCache::new();
        let result = cache.get_or_refresh(at(0), || Err(FetchError::MissingCredential("CLIENT_ID")));
        assert!(matches!(result, Err(FetchError::MissingCredential(_))));
        assert_eq!(cache.get_or_refresh(at(1), || grant("ok", 3600)).unwrap(), "ok");
    }

    #[test]
    fn short_or_absurd_lifetimes() {
        let cache = TokenCache::new();
        assert_eq!(cache.get_or_refresh(at(0), || grant("short", 30)).unwrap(), "short");
        // Expired immediately, so the next call refreshes.
        assert_eq!(cache.get_or_refresh(at(0), || grant("next", i64::MAX)).unwrap(), "next");
        assert_eq!(cache.get_or_refresh(at(1), || grant("unused", 10)).unwrap(), "unused");
    }

    #[test]
    fn clear_forces_refresh() {
        let cache = TokenCache::new();
        cache.get_or_refresh(at(0), || grant("a", 3600)).unwrap();
        cache.clear();
        assert_eq!(cache.get_or_refresh(at(1), || grant("b", 3600)).unwrap(), "b");
    }

    #[test]
    fn token_grant_from_json() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"token_type":"Bearer","expires_in":3600,"access_token":"abc"}"#,
        )
        .unwrap();
        assert_eq!(grant.access_token, "abc");
        assert_eq!(grant.expires_in, 3600);
    }

    #[test]
    fn detail_shapes() {
        use serde_json::json;

        for body in [
            json!({ "result": { "id": 7, "title": "Wrapped" } }),
            json!({ "data": { "id": 7, "title": "Wrapped" } }),
            json!({ "id": 7, "title": "Wrapped" }),
        ] {
            let job = job_from_detail(&body).unwrap();
            assert_eq!(job.id, "7", "{}", body);
            assert_eq!(job.title.as_deref(), Some("Wrapped"), "{}", body);
        }
        assert_eq!(job_from_detail(&json!({ "message": "not found" })), None);
        assert_eq!(job_from_detail(&json!({ "result": null })), None);
    }

    #[test]
    fn error_messages() {
        assert_eq!(error_message(r#"{"message":"Unauthenticated."}"#), "Unauthenticated.");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"error":"x"}"#), r#"{"error":"x"}"#);
    }
}
