//! Reqwest-backed client for the hosted data API and identity provider.
//!
//! This adapter owns transport details only: URL and header conventions,
//! timeout and HTTP error mapping, and JSON decoding into domain types.
//! Row-level security is enforced by the backend; every request carries the
//! caller's access token when the scope has one, and the anonymous API key
//! otherwise.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::dto::{
    AuthErrorDto, PasswordChangeDto, PasswordGrantDto, RecoverRequestDto, RestErrorDto,
    SessionDto, SignUpDto, SignUpRequestDto, UserDto,
};
use super::params::{filter_params, parse_content_range_total, query_params};
use crate::domain::ports::{
    AuthProvider, AuthSession, BackendClient, BackendClientFactory, BackendError, Record,
    RequestScope, SignUpOutcome,
};
use crate::domain::query::TableQuery;
use crate::domain::{AuthProviderError, AuthenticatedUser};

const API_KEY_HEADER: &str = "apikey";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";
const COUNT_EXACT: &str = "count=exact";
const TRANSPORT_FAILURE_CODE: &str = "request_failed";
const UNEXPECTED_FAILURE_CODE: &str = "unexpected_failure";

/// Base URLs and key of one hosted backend project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgrestEndpoints {
    /// Data API root, e.g. `https://project.example/rest/v1`.
    pub rest_url: Url,
    /// Identity provider root, e.g. `https://project.example/auth/v1`.
    pub auth_url: Url,
    /// Public (anonymous) API key.
    pub api_key: String,
}

struct Endpoints {
    rest: String,
    auth: String,
    api_key: String,
}

impl From<PostgrestEndpoints> for Endpoints {
    fn from(value: PostgrestEndpoints) -> Self {
        Self {
            rest: value.rest_url.as_str().trim_end_matches('/').to_owned(),
            auth: value.auth_url.as_str().trim_end_matches('/').to_owned(),
            api_key: value.api_key,
        }
    }
}

/// Hands out [`PostgrestClient`]s sharing one connection pool.
#[derive(Clone)]
pub struct PostgrestClientFactory {
    http: Client,
    endpoints: Arc<Endpoints>,
}

impl PostgrestClientFactory {
    /// Build a factory whose clients time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoints: PostgrestEndpoints, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoints: Arc::new(endpoints.into()),
        })
    }
}

impl BackendClientFactory for PostgrestClientFactory {
    fn acquire(&self, scope: &RequestScope) -> Result<Box<dyn BackendClient>, BackendError> {
        Ok(Box::new(PostgrestClient {
            http: self.http.clone(),
            endpoints: Arc::clone(&self.endpoints),
            access_token: scope.access_token().map(str::to_owned),
        }))
    }
}

/// Backend client bound to one caller.
pub struct PostgrestClient {
    http: Client,
    endpoints: Arc<Endpoints>,
    access_token: Option<String>,
}

impl PostgrestClient {
    fn bearer(&self) -> &str {
        self.access_token
            .as_deref()
            .unwrap_or(self.endpoints.api_key.as_str())
    }

    fn rest(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.endpoints.rest, table);
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, self.endpoints.api_key.as_str())
            .bearer_auth(self.bearer())
    }

    fn auth(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.endpoints.auth, path);
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, self.endpoints.api_key.as_str())
            .bearer_auth(self.bearer())
    }

    fn require_token(&self) -> Result<(), AuthProviderError> {
        match self.access_token {
            Some(_) => Ok(()),
            None => Err(AuthProviderError::new(
                "no_authorization",
                "this operation requires a signed-in session",
            )
            .with_status(StatusCode::UNAUTHORIZED.as_u16())),
        }
    }
}

#[async_trait]
impl BackendClient for PostgrestClient {
    async fn select(&self, query: &TableQuery) -> Result<Vec<Record>, BackendError> {
        let response = self
            .rest(Method::GET, query.table())
            .query(&query_params(query))
            .send()
            .await
            .map_err(map_rest_transport_error)?;
        let body = read_rest_body(response).await?;
        decode_rest(&body)
    }

    async fn select_single(&self, query: &TableQuery) -> Result<Record, BackendError> {
        let response = self
            .rest(Method::GET, query.table())
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .query(&query_params(query))
            .send()
            .await
            .map_err(map_rest_transport_error)?;
        let body = read_rest_body(response).await?;
        decode_rest(&body)
    }

    async fn count(&self, query: &TableQuery) -> Result<u64, BackendError> {
        let mut params = filter_params(query);
        params.push(("select".to_owned(), "*".to_owned()));
        params.push(("limit".to_owned(), "0".to_owned()));
        let response = self
            .rest(Method::GET, query.table())
            .header("Prefer", COUNT_EXACT)
            .query(&params)
            .send()
            .await
            .map_err(map_rest_transport_error)?;
        let content_range = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        read_rest_body(response).await?;
        content_range
            .as_deref()
            .and_then(parse_content_range_total)
            .ok_or_else(|| BackendError::decode("count response carried no Content-Range total"))
    }

    async fn insert(&self, table: &str, row: Record) -> Result<Record, BackendError> {
        let response = self
            .rest(Method::POST, table)
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row)
            .send()
            .await
            .map_err(map_rest_transport_error)?;
        let body = read_rest_body(response).await?;
        decode_rest(&body)
    }

    async fn update(&self, query: &TableQuery, patch: Record) -> Result<Record, BackendError> {
        let response = self
            .rest(Method::PATCH, query.table())
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&filter_params(query))
            .json(&patch)
            .send()
            .await
            .map_err(map_rest_transport_error)?;
        let body = read_rest_body(response).await?;
        decode_rest(&body)
    }

    async fn delete(&self, query: &TableQuery) -> Result<(), BackendError> {
        let response = self
            .rest(Method::DELETE, query.table())
            .query(&filter_params(query))
            .send()
            .await
            .map_err(map_rest_transport_error)?;
        read_rest_body(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for PostgrestClient {
    async fn get_user(&self) -> Result<Option<AuthenticatedUser>, AuthProviderError> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        let response = self
            .auth(Method::GET, "user")
            .send()
            .await
            .map_err(map_auth_transport_error)?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        let user: UserDto = read_auth_json(response).await?;
        user.into_domain().map(Some).map_err(auth_decode_error)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthProviderError> {
        let response = self
            .auth(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&PasswordGrantDto { email, password })
            .send()
            .await
            .map_err(map_auth_transport_error)?;
        let session: SessionDto = read_auth_json(response).await?;
        session.into_domain().map_err(auth_decode_error)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthProviderError> {
        let mut data = Map::new();
        if let Some(name) = name {
            data.insert("name".to_owned(), Value::from(name));
        }
        let response = self
            .auth(Method::POST, "signup")
            .json(&SignUpRequestDto {
                email,
                password,
                data,
            })
            .send()
            .await
            .map_err(map_auth_transport_error)?;
        match read_auth_json::<SignUpDto>(response).await? {
            SignUpDto::Session(session) => session
                .into_domain()
                .map(SignUpOutcome::SignedIn)
                .map_err(auth_decode_error),
            SignUpDto::User(user) => user
                .into_domain()
                .map(|user| SignUpOutcome::ConfirmationRequired { user })
                .map_err(auth_decode_error),
        }
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), AuthProviderError> {
        let mut request = self.auth(Method::POST, "recover");
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        let response = request
            .json(&RecoverRequestDto { email })
            .send()
            .await
            .map_err(map_auth_transport_error)?;
        read_auth_body(response).await?;
        Ok(())
    }

    async fn update_password(
        &self,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthProviderError> {
        self.require_token()?;
        let response = self
            .auth(Method::PUT, "user")
            .json(&PasswordChangeDto { password })
            .send()
            .await
            .map_err(map_auth_transport_error)?;
        let user: UserDto = read_auth_json(response).await?;
        user.into_domain().map_err(auth_decode_error)
    }

    async fn sign_out(&self) -> Result<(), AuthProviderError> {
        if self.access_token.is_none() {
            return Ok(());
        }
        let response = self
            .auth(Method::POST, "logout")
            .send()
            .await
            .map_err(map_auth_transport_error)?;
        read_auth_body(response).await?;
        Ok(())
    }
}

async fn read_rest_body(response: Response) -> Result<Vec<u8>, BackendError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_rest_transport_error)?;
    if !status.is_success() {
        return Err(map_rest_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

fn decode_rest<T: DeserializeOwned>(body: &[u8]) -> Result<T, BackendError> {
    serde_json::from_slice(body)
        .map_err(|error| BackendError::decode(format!("invalid data API payload: {error}")))
}

async fn read_auth_body(response: Response) -> Result<Vec<u8>, AuthProviderError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_auth_transport_error)?;
    if !status.is_success() {
        return Err(map_auth_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

async fn read_auth_json<T: DeserializeOwned>(response: Response) -> Result<T, AuthProviderError> {
    let body = read_auth_body(response).await?;
    serde_json::from_slice(&body)
        .map_err(|error| auth_decode_error(format!("invalid identity payload: {error}")))
}

fn auth_decode_error(message: String) -> AuthProviderError {
    AuthProviderError::new(UNEXPECTED_FAILURE_CODE, message)
}

fn map_rest_transport_error(error: reqwest::Error) -> BackendError {
    BackendError::transport(error.to_string())
}

fn map_auth_transport_error(error: reqwest::Error) -> AuthProviderError {
    AuthProviderError::new(TRANSPORT_FAILURE_CODE, error.to_string())
}

/// Map a failed data-API response: structured bodies become
/// [`BackendError::Database`], anything else a transport failure.
fn map_rest_status_error(status: StatusCode, body: &[u8]) -> BackendError {
    match serde_json::from_slice::<RestErrorDto>(body)
        .ok()
        .and_then(RestErrorDto::into_domain)
    {
        Some(error) => BackendError::Database(error),
        None => BackendError::transport(status_message(status, body)),
    }
}

fn map_auth_status_error(status: StatusCode, body: &[u8]) -> AuthProviderError {
    serde_json::from_slice::<AuthErrorDto>(body)
        .map(|dto| dto.into_domain(status.as_u16()))
        .unwrap_or_else(|_| {
            AuthProviderError::new(UNEXPECTED_FAILURE_CODE, status_message(status, body))
                .with_status(status.as_u16())
        })
}

fn status_message(status: StatusCode, body: &[u8]) -> String {
    let body_preview = body_preview(body);
    if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
