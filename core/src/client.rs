//! Stateless HTTP request builder and response parser for the hospital API.
//!
//! # Design
//! `ApiClient` holds only a `base_url`. Each resource operation is a `build_*`
//! method producing an `HttpRequest`; every response goes through `parse` (an
//! envelope carrying `T`) or `parse_empty` (status only). Executing the
//! round-trip is `Api`'s job, so everything here is deterministic.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Route families on the backend, relative to the base URL.
pub mod routes {
    pub const PATIENTS: &str = "/benh-nhan";
    pub const APPOINTMENTS: &str = "/pdk-kham";
    pub const STAFF: &str = "/users";
    pub const DEPARTMENTS: &str = "/khoa";
    pub const PRESCRIPTIONS: &str = "/don-thuoc";
    pub const TRANSFER_REQUESTS: &str = "/chuyen-vien/yeu-cau";
    pub const TRANSFER_RECORDS: &str = "/chuyen-vien/phieu";
    pub const SCHEDULES: &str = "/lich-lam-viec";
    pub const SHIFT_CHANGES: &str = "/lich-lam-viec/doi-ca";
    pub const LEAVE_REQUESTS: &str = "/lich-lam-viec/nghi-phep";
    pub const DASHBOARD_STATS: &str = "/dashboard/stats";

    /// `PATCH {route}/{id}/trang-thai`
    pub const VERB_STATUS: &str = "trang-thai";
    /// `PUT {route}/{id}/duyet`
    pub const VERB_APPROVE: &str = "duyet";
    /// `PUT {route}/{id}/thanh-toan`
    pub const VERB_PAYMENT: &str = "thanh-toan";
}

/// Query parameters for `search` routes.
///
/// Empty values are dropped silently, so optional filters can be passed
/// straight from form state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        if !value.is_empty() {
            self.pairs.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn param_opt(self, key: &str, value: Option<impl AsRef<str>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// URL-encoded query string without the leading `?`.
    pub fn to_query(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

/// Key identifying one read in the shared query cache: route plus query.
pub fn cache_key(route: &str, params: &SearchParams) -> String {
    if params.is_empty() {
        route.to_string()
    } else {
        format!("{route}?{}", params.to_query())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Synchronous, stateless request builder for the hospital API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    pub fn build_get(&self, endpoint: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.url(endpoint),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get_all(&self, route: &str) -> HttpRequest {
        self.build_get(route)
    }

    pub fn build_search(&self, route: &str, params: &SearchParams) -> HttpRequest {
        let endpoint = if params.is_empty() {
            format!("{route}/search")
        } else {
            format!("{route}/search?{}", params.to_query())
        };
        self.build_get(&endpoint)
    }

    pub fn build_get_by_id(&self, route: &str, id: &str) -> HttpRequest {
        self.build_get(&format!("{route}/{id}"))
    }

    pub fn build_create<B: Serialize>(&self, route: &str, body: &B) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Post, route, body)
    }

    pub fn build_update<B: Serialize>(
        &self,
        route: &str,
        id: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Put, &format!("{route}/{id}"), body)
    }

    pub fn build_delete(&self, route: &str, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.url(&format!("{route}/{id}")),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Bespoke verb on a single record, e.g. `PUT /don-thuoc/{id}/thanh-toan`.
    pub fn build_action<B: Serialize>(
        &self,
        method: HttpMethod,
        route: &str,
        id: &str,
        verb: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, ApiError> {
        let endpoint = format!("{route}/{id}/{verb}");
        match body {
            Some(body) => self.build_json(method, &endpoint, body),
            None => Ok(HttpRequest {
                method,
                path: self.url(&endpoint),
                headers: Vec::new(),
                body: None,
            }),
        }
    }

    fn build_json<B: Serialize>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: self.url(endpoint),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn parse<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<Envelope<T>, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Status-only parse for routes whose success body carries nothing useful.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Ok(());
        }
        match serde_json::from_str::<Envelope<serde_json::Value>>(&response.body) {
            Ok(Envelope::Wrapped {
                success: false,
                message,
                ..
            }) => Err(ApiError::Rejected(
                message.unwrap_or_else(|| "request was not successful".to_string()),
            )),
            _ => Ok(()),
        }
    }
}

/// Map non-2xx responses to `ApiError`, preferring the backend's `message`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));
    if response.status == 404 {
        return Err(ApiError::NotFound(message));
    }
    Err(ApiError::Http {
        status: response.status,
        message,
    })
}
