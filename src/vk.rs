use crate::client::{create_http_client, Config, DEFAULT_API_VERSION};
use crate::error::{Result, VkError};
use crate::params::{merge_params, validate_params, ParamValue, Params, ACCESS_TOKEN_PARAM};
use crate::query::encode_query;
use crate::request::{method_path, FileSource, RequestIntent};
use crate::response::{decode_api, decode_oauth, Response, ResponseFormat};
use crate::signer::{append_signature, SIG_PARAM};
use crate::token::TokenResponse;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Instant;
use url::Url;

const REDACTED: &str = "<redacted>";
const SECRET_PARAMS: [&str; 4] = [ACCESS_TOKEN_PARAM, SIG_PARAM, "client_secret", "password"];

/// Client for the VK API.
///
/// Holds the application credentials, the optional access token and the
/// default parameters applied to every method call. Every call is a single
/// blocking exchange; nothing is cached or retried.
///
/// The access token is the only state that changes after construction.
/// Updating it takes `&mut self`, so a client shared between threads must
/// be wrapped in a lock by the caller.
#[derive(Clone)]
pub struct VkClient {
    /// HTTP client
    pub client: Client,
    /// Endpoint configuration
    pub config: Config,
    client_id: String,
    secret: Option<String>,
    access_token: Option<String>,
    default_params: Params,
    format: ResponseFormat,
}

impl VkClient {
    /// Create a client for the given application id with default endpoints
    pub fn new(client_id: impl Into<String>) -> Result<Self> {
        Self::with_config(client_id, Config::default())
    }

    /// Create a client with custom endpoints and timeouts
    pub fn with_config(client_id: impl Into<String>, config: Config) -> Result<Self> {
        Ok(VkClient {
            client: create_http_client(&config)?,
            config,
            client_id: client_id.into(),
            secret: None,
            access_token: None,
            default_params: Params::new(),
            format: ResponseFormat::Json,
        })
    }

    /// Use a caller-provided HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Set the application secret. When set, method calls are signed.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret: String = secret.into();
        self.secret = Some(secret).filter(|s| !s.is_empty());
        self
    }

    /// Set the access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.set_access_token(token);
        self
    }

    /// Set parameters applied to every method call unless overridden
    pub fn with_default_params(mut self, params: Params) -> Self {
        self.default_params = params;
        self
    }

    /// Set the response format
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    /// Application ID sent to the OAuth endpoint
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Token added to every method call, if one is set
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Replace the access token; an empty token clears it
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        let token: String = token.into();
        self.access_token = Some(token).filter(|t| !t.is_empty());
    }

    /// Parameters applied under every call's own parameters
    pub fn default_params(&self) -> &Params {
        &self.default_params
    }

    /// Format requested from API methods
    pub fn response_format(&self) -> ResponseFormat {
        self.format
    }

    /// Change the format used by subsequent calls
    pub fn set_response_format(&mut self, format: ResponseFormat) -> &mut Self {
        self.format = format;
        self
    }

    /// Request JSON responses (the default)
    pub fn set_json_format(&mut self) -> &mut Self {
        self.set_response_format(ResponseFormat::Json)
    }

    /// Request XML responses, see [`VkClient::call`] for decoding them
    pub fn set_xml_format(&mut self) -> &mut Self {
        self.set_response_format(ResponseFormat::Xml)
    }

    /// Whether API methods are called in JSON mode
    pub fn is_json_response(&self) -> bool {
        self.format == ResponseFormat::Json
    }

    /// API version from the `v` default parameter, or the library default
    pub fn api_version(&self) -> String {
        self.default_params
            .get("v")
            .map(ParamValue::to_string)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string())
    }

    /// Full URL for a method call: merged parameters, then the signature
    /// over the unsigned path when a secret is configured.
    /// Fails on a parameter value with no wire form.
    pub fn method_url(&self, method: &str, params: &Params) -> Result<String> {
        let merged = merge_params(self.access_token(), &self.default_params, params);
        validate_params(&merged)?;
        let path = method_path(method, self.format, &merged);

        Ok(match self.secret {
            Some(ref secret) => self.config.api_endpoint(&append_signature(&path, secret)),
            None => self.config.api_endpoint(&path),
        })
    }

    /// Call an API method with GET and return the decoded body.
    ///
    /// In XML mode the generic map mirrors the element tree as quick-xml
    /// sees it: attributes get an `@` prefix and text content sits under
    /// `$text`. Use [`VkClient::apply`] with a typed target to get plain
    /// values out of XML responses.
    pub fn call(&self, method: &str, params: &Params) -> Result<Response> {
        self.apply(method, params)
    }

    /// Call an API method with GET and decode the body into `T`
    ///
    /// # Arguments
    /// * `method` - API method name, e.g. `users.get`
    /// * `params` - Call parameters, overriding the client defaults
    pub fn apply<T>(&self, method: &str, params: &Params) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.method_url(method, params)?;
        self.send_api(RequestIntent::get(url))
    }

    /// Call an API method with a multipart POST carrying `post_fields`
    pub fn call_post(&self, method: &str, params: &Params, post_fields: &Params) -> Result<Response> {
        let url = self.method_url(method, params)?;
        self.send_api(RequestIntent::form(url, post_fields.clone()))
    }

    /// Call an API method with a multipart POST carrying a file
    pub fn call_with_file(
        &self,
        method: &str,
        file: FileSource,
        params: &Params,
        post_fields: &Params,
    ) -> Result<Response> {
        self.apply_with_file(method, file, params, post_fields)
    }

    /// Same as [`VkClient::call_with_file`], decoding the body into `T`
    pub fn apply_with_file<T>(
        &self,
        method: &str,
        file: FileSource,
        params: &Params,
        post_fields: &Params,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.method_url(method, params)?;
        self.send_api(RequestIntent::upload(url, file, post_fields.clone()))
    }

    /// GET a prebuilt URL, without parameter merging or signing
    pub fn raw_get(&self, url: &str) -> Result<Response> {
        self.send_api(RequestIntent::get(url))
    }

    /// POST a file to a prebuilt URL such as an upload server address
    pub fn raw_post_file(&self, url: &str, file: FileSource, fields: &Params) -> Result<Response> {
        self.send_api(RequestIntent::upload(url, file, fields.clone()))
    }

    /// Obtain an application token with the client-credentials grant and
    /// store it on the client. On failure the previous token is kept.
    pub fn acquire_client_token(&mut self) -> Result<TokenResponse> {
        let mut params = Params::new();
        params.insert("grant_type".to_string(), "client_credentials".into());
        params.insert("client_id".to_string(), self.client_id.as_str().into());
        if let Some(ref secret) = self.secret {
            params.insert("client_secret".to_string(), secret.into());
        }
        params.insert("v".to_string(), self.api_version().into());

        let url = self.config.oauth_endpoint("access_token", &encode_query(&params));
        let token: TokenResponse = self.send_oauth(RequestIntent::get(url))?;

        tracing::debug!(client_id = %self.client_id, expires_in = token.expires_in, "client token acquired");
        self.access_token = Some(token.access_token.clone()).filter(|t| !t.is_empty());
        Ok(token)
    }

    /// Obtain a user token with the resource-owner password grant.
    /// The client's stored token is not changed.
    pub fn acquire_password_token(
        &self,
        username: &str,
        password: &str,
        scope: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse> {
        let mut params = Params::new();
        params.insert("grant_type".to_string(), "password".into());
        params.insert("client_id".to_string(), self.client_id.as_str().into());
        if let Some(ref secret) = self.secret {
            params.insert("client_secret".to_string(), secret.into());
        }
        params.insert("username".to_string(), username.into());
        params.insert("password".to_string(), password.into());
        params.insert("scope".to_string(), scope.into());
        params.insert("test_redirect_uri".to_string(), redirect_uri.into());
        params.insert("v".to_string(), self.api_version().into());

        let url = self.config.oauth_endpoint("token", &encode_query(&params));
        self.send_oauth(RequestIntent::get(url))
    }

    /// URL of the authorization dialog for the implicit or code flow
    pub fn authorize_url(&self, redirect_uri: &str, scope: &str, response_type: &str) -> String {
        let mut params = Params::new();
        params.insert("client_id".to_string(), self.client_id.as_str().into());
        params.insert("redirect_uri".to_string(), redirect_uri.into());
        params.insert("scope".to_string(), scope.into());
        params.insert("response_type".to_string(), response_type.into());
        params.insert("v".to_string(), self.api_version().into());

        self.config.oauth_endpoint("authorize", &encode_query(&params))
    }

    fn send_api<T>(&self, intent: RequestIntent) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let format = self.format;
        let (status, body) = self.execute(intent)?;
        http_fallback(status, &body, decode_api(&body, format))
    }

    fn send_oauth<T>(&self, intent: RequestIntent) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let (status, body) = self.execute(intent)?;
        http_fallback(status, &body, decode_oauth(&body))
    }

    /// Send one request and read the whole body
    fn execute(&self, intent: RequestIntent) -> Result<(StatusCode, Vec<u8>)> {
        let method = intent.method();
        let target = redact_url(&intent.url);
        let request = intent.build(&self.client)?;

        tracing::debug!(method, url = %target, "sending request");
        let start = Instant::now();
        let response = request.send()?;
        let status = response.status();
        let body = response.bytes()?.to_vec();

        tracing::debug!(
            method,
            url = %target,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed = ?start.elapsed(),
            "received response"
        );
        Ok((status, body))
    }
}

impl std::fmt::Debug for VkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VkClient")
            .field("config", &self.config)
            .field("client_id", &self.client_id)
            .field("secret", &self.secret.as_ref().map(|_| REDACTED))
            .field("access_token", &self.access_token.as_ref().map(|_| REDACTED))
            .field("default_params", &self.default_params)
            .field("format", &self.format)
            .finish()
    }
}

/// A failed status is reported as an HTTP error unless the body carried an
/// error envelope, which is more specific.
fn http_fallback<T>(status: StatusCode, body: &[u8], decoded: Result<T>) -> Result<T> {
    if !(status.is_client_error() || status.is_server_error()) {
        return decoded;
    }
    match decoded {
        Err(e @ (VkError::Api { .. } | VkError::Auth { .. })) => Err(e),
        _ => Err(VkError::Http {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        }),
    }
}

/// Hide credentials in a URL before it is logged
fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if SECRET_PARAMS.contains(&k.as_ref()) {
                REDACTED.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}
