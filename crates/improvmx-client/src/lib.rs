// # ImprovMX API Client
//
// reqwest implementation of `ImprovMxApi` against the ImprovMX REST API v3.
//
// ## Behavior
//
// - ✅ One HTTP request per facade call
// - ✅ HTTP timeout from `ClientConfig` (default 30 seconds)
// - ✅ Status codes mapped onto the core error taxonomy (401/403, 404, 409, 429, 5xx)
// - ✅ Field errors from the response envelope surfaced verbatim
// - ❌ NO retry logic (errors go straight back to the lifecycle)
// - ❌ NO backoff or rate limiting
// - ❌ NO caching between calls
//
// ## Security Requirements
//
// - API key NEVER appears in logs or `Debug` output
// - Client construction fails fast if the key is empty
//
// ## API Reference
//
// - Authentication: HTTP Basic, user `api`, password = API key
// - List/add domains: GET/POST `/domains/`
// - Domain: GET/PUT/DELETE `/domains/:domain`
// - Check: GET `/domains/:domain/check`
// - Aliases: GET/POST `/domains/:domain/aliases/`
// - Alias: PUT/DELETE `/domains/:domain/aliases/:alias`

use async_trait::async_trait;
use improvmx_core::config::ClientConfig;
use improvmx_core::model::{Alias, Check, Domain, DomainQuery};
use improvmx_core::traits::ImprovMxApi;
use improvmx_core::{Error, Result};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

mod wire;

use wire::{
    AliasEnvelope, AliasPayload, AliasesEnvelope, CheckEnvelope, DomainEnvelope,
    DomainUpdatePayload, DomainsEnvelope, ErrorBody, ForwardPayload, StatusEnvelope,
};

/// Basic-auth user name expected by the API
const AUTH_USER: &str = "api";

/// Maximum response body length written to trace logs
const MAX_LOGGED_BODY: usize = 2048;

/// HTTP client for the ImprovMX API
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot: each trait method issues exactly one request.
/// Decisions about what to call, and in which order, belong to the lifecycle
/// in `improvmx-core`.
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
#[derive(Clone)]
pub struct ImprovMxClient {
    config: ClientConfig,
    http: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for ImprovMxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImprovMxClient")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.config.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}

impl ImprovMxClient {
    /// Create a client from a validated configuration
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the configuration is invalid
    /// - `Error::Transport` if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!("ImprovMX client targeting {}", config.base_url);
        Ok(Self { config, http })
    }

    /// Create a client from `IMPROVMX_API_KEY` and `IMPROVMX_BASE_URL`
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// The API base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Send one request and decode the success envelope
    async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        tracing::debug!("{} {}", method, path);

        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .basic_auth(AUTH_USER, Some(&self.config.api_key))
            .header("Accept", "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::transport(format!("{} {} timed out: {}", method, path, e))
            } else {
                Error::transport(format!("{} {} failed: {}", method, path, e))
            }
        })?;

        let status = response.status();
        let mut text = response.text().await.map_err(|e| {
            Error::transport(format!("Failed to read response body of {} {}: {}", method, path, e))
        })?;
        if text.trim().is_empty() {
            text = "{}".to_string();
        }

        tracing::debug!("{} {} -> {}", method, path, status.as_u16());
        tracing::trace!("Response body: {}", truncate_for_log(&text));

        if !status.is_success() {
            let err = map_status(status, path, &text);
            tracing::warn!("{} {} failed: {}", method, path, err);
            return Err(err);
        }

        // Some endpoints answer 200 with `success: false`
        if let Ok(envelope) = serde_json::from_str::<StatusEnvelope>(&text)
            && !envelope.success
        {
            let messages = error_messages(&text);
            return Err(Error::validation(if messages.is_empty() {
                format!("{} {} was rejected", method, path)
            } else {
                messages
            }));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to decode response of {} {}: {}", method, path, e);
            Error::transport(format!("Failed to decode response of {} {}: {}", method, path, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.call::<T, ()>(Method::GET, path, query, None).await
    }

    async fn send<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call(method, path, &[], Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.call::<StatusEnvelope, ()>(Method::DELETE, path, &[], None)
            .await
            .map(|_| ())
    }
}

/// Map a non-2xx response onto the core error taxonomy
fn map_status(status: StatusCode, path: &str, body: &str) -> Error {
    let messages = error_messages(body);
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API key or insufficient permissions (HTTP {})",
            status.as_u16()
        )),
        404 => Error::not_found(if messages.is_empty() {
            path.to_string()
        } else {
            format!("{}: {}", path, messages)
        }),
        409 => Error::duplicate(messages),
        400 if messages.to_lowercase().contains("already") => Error::duplicate(messages),
        400 | 422 => Error::validation(messages),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded (HTTP 429): {}",
            messages
        )),
        500..=599 => Error::transport(format!(
            "ImprovMX server error (HTTP {}): {}",
            status.as_u16(),
            messages
        )),
        code => Error::transport(format!("Unexpected HTTP {} for {}: {}", code, path, messages)),
    }
}

/// Field errors of an error envelope as `field: msg; msg` text
///
/// Falls back to the raw body when it is not an envelope.
fn error_messages(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let mut parts: Vec<String> = parsed
                .errors
                .iter()
                .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
                .collect();
            parts.extend(parsed.error);
            parts.join(", ")
        }
        Err(_) => truncate_for_log(body).to_string(),
    }
}

fn truncate_for_log(text: &str) -> &str {
    if text.len() <= MAX_LOGGED_BODY {
        return text;
    }
    let mut end = MAX_LOGGED_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Path of one alias; the local-part is a single encoded segment
fn alias_path(domain: &str, local_part: &str) -> String {
    format!(
        "/domains/{}/aliases/{}",
        domain,
        urlencoding::encode(local_part)
    )
}

#[async_trait]
impl ImprovMxApi for ImprovMxClient {
    async fn list_domains(&self, query: &DomainQuery) -> Result<Vec<Domain>> {
        let mut params = Vec::new();
        if let Some(q) = query.q.as_ref().filter(|q| !q.is_empty()) {
            params.push(("q", q.clone()));
        }
        if let Some(active) = query.is_active {
            params.push(("is_active", active.to_string()));
        }

        let envelope: DomainsEnvelope = self.get("/domains/", &params).await?;
        Ok(envelope.domains)
    }

    async fn add_domain(&self, domain: &Domain) -> Result<Domain> {
        tracing::info!("Adding domain {}", domain.domain);
        let envelope: DomainEnvelope = self.send(Method::POST, "/domains/", domain).await?;
        Ok(envelope.domain)
    }

    async fn get_domain(&self, name: &str) -> Result<Domain> {
        let envelope: DomainEnvelope = self.get(&format!("/domains/{}", name), &[]).await?;
        Ok(envelope.domain)
    }

    async fn update_domain(&self, domain: &Domain) -> Result<Domain> {
        tracing::info!("Updating domain {}", domain.domain);
        let envelope: DomainEnvelope = self
            .send(
                Method::PUT,
                &format!("/domains/{}", domain.domain),
                &DomainUpdatePayload::from(domain),
            )
            .await?;
        Ok(envelope.domain)
    }

    async fn delete_domain(&self, name: &str) -> Result<()> {
        tracing::info!("Deleting domain {}", name);
        self.delete(&format!("/domains/{}", name)).await
    }

    async fn check_domain(&self, name: &str) -> Result<Check> {
        let envelope: CheckEnvelope = self
            .get(&format!("/domains/{}/check", name), &[])
            .await?;
        Ok(envelope.records)
    }

    async fn list_aliases(&self, domain: &str) -> Result<Vec<Alias>> {
        let envelope: AliasesEnvelope = self
            .get(&format!("/domains/{}/aliases/", domain), &[])
            .await?;
        Ok(envelope.aliases)
    }

    async fn create_alias(&self, domain: &str, alias: &Alias) -> Result<Alias> {
        tracing::info!("Creating alias {}@{}", alias.alias, domain);
        let envelope: AliasEnvelope = self
            .send(
                Method::POST,
                &format!("/domains/{}/aliases/", domain),
                &AliasPayload::from(alias),
            )
            .await?;
        Ok(envelope.alias)
    }

    async fn update_alias(&self, domain: &str, alias: &Alias) -> Result<Alias> {
        tracing::info!("Updating alias {}@{}", alias.alias, domain);
        let envelope: AliasEnvelope = self
            .send(
                Method::PUT,
                &alias_path(domain, &alias.alias),
                &ForwardPayload::from(alias),
            )
            .await?;
        Ok(envelope.alias)
    }

    async fn delete_alias(&self, domain: &str, alias: &Alias) -> Result<()> {
        tracing::info!("Deleting alias {}@{}", alias.alias, domain);
        self.delete(&alias_path(domain, &alias.alias)).await
    }

    fn api_name(&self) -> &'static str {
        "improvmx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let client = ImprovMxClient::new(ClientConfig::new("sk_secret_12345")).unwrap();

        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("sk_secret_12345"));
        assert!(debug_str.contains("ImprovMxClient"));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let err = ImprovMxClient::new(ClientConfig::new("")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_api_name() {
        let client = ImprovMxClient::new(ClientConfig::new("key")).unwrap();
        assert_eq!(client.api_name(), "improvmx");
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"success": false, "errors": {"domain": ["Invalid domain"]}}"#;

        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "/domains/", body),
            Error::Authentication(_)
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, "/domains/", body),
            Error::Authentication(_)
        ));
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, "/domains/x.com", ""),
            Error::NotFound(_)
        ));
        assert!(matches!(
            map_status(StatusCode::CONFLICT, "/domains/", body),
            Error::Duplicate(_)
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "/domains/", ""),
            Error::RateLimited(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "/domains/", ""),
            Error::Transport(_)
        ));
    }

    #[test]
    fn test_bad_request_mentioning_existing_entity_is_duplicate() {
        let body = r#"{"success": false, "errors": {"alias": ["This alias already exists"]}}"#;
        assert!(matches!(
            map_status(StatusCode::BAD_REQUEST, "/domains/x.com/aliases/", body),
            Error::Duplicate(_)
        ));
    }

    #[test]
    fn test_validation_errors_are_verbatim() {
        let body = r#"{"success": false, "errors": {"forward": ["Invalid email address"]}}"#;
        match map_status(StatusCode::BAD_REQUEST, "/domains/x.com/aliases/", body) {
            Error::ValidationFailed(msg) => assert_eq!(msg, "forward: Invalid email address"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_messages_fall_back_to_body() {
        assert_eq!(error_messages("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_alias_path_encodes_local_part() {
        assert_eq!(
            alias_path("example.com", "sales"),
            "/domains/example.com/aliases/sales"
        );
        assert_eq!(
            alias_path("example.com", "a#b?c/d"),
            "/domains/example.com/aliases/a%23b%3Fc%2Fd"
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(MAX_LOGGED_BODY);
        let truncated = truncate_for_log(&text);
        assert!(truncated.len() <= MAX_LOGGED_BODY);
        assert!(text.starts_with(truncated));
    }
}
