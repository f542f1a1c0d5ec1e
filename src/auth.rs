//! Microsoft identity platform authentication for Graph.
//!
//! Two flows are supported:
//! - client credentials (service principal), when both a tenant ID and a client
//!   secret are configured;
//! - device code (interactive), otherwise. A token obtained this way is cached in
//!   memory and silently renewed with its refresh token before falling back to a
//!   new device code prompt.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, Result};
use crate::models::{DeviceCodeResponse, OAuthErrorResponse, TokenResponse};

/// Microsoft identity platform host.
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Public client used when no client ID is configured (Microsoft Graph Command Line Tools).
pub const DEFAULT_CLIENT_ID: &str = "14d82eec-204b-4c2f-b7e8-296a70dab67e";

/// Scope for app-only tokens.
const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Delegated scopes for the interactive flow.
const DELEGATED_SCOPES: &str = "https://graph.microsoft.com/Sites.Read.All \
                                https://graph.microsoft.com/Files.Read.All offline_access";

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Optional credentials supplied on the command line or environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// The authentication flow chosen for a set of credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFlow {
    ClientCredentials {
        tenant_id: String,
        client_secret: String,
    },
    DeviceCode,
}

impl AuthFlow {
    /// Service principal auth needs both a tenant and a secret; anything less is interactive.
    pub fn select(credentials: &Credentials) -> Self {
        match (&credentials.tenant_id, &credentials.client_secret) {
            (Some(tenant_id), Some(client_secret))
                if !tenant_id.is_empty() && !client_secret.is_empty() =>
            {
                AuthFlow::ClientCredentials {
                    tenant_id: tenant_id.clone(),
                    client_secret: client_secret.clone(),
                }
            }
            _ => AuthFlow::DeviceCode,
        }
    }
}

/// Cached access token with expiration.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        // 60 second buffer before expiration
        self.expires_at > Instant::now() + Duration::from_secs(60)
    }
}

/// Authenticator for Microsoft Graph.
#[derive(Clone)]
pub struct Authenticator {
    flow: AuthFlow,
    client_id: String,
    authority_host: String,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl Authenticator {
    /// Create an authenticator, choosing the flow from the supplied credentials.
    pub fn new(credentials: &Credentials) -> Self {
        let client_id = credentials
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());

        Self {
            flow: AuthFlow::select(credentials),
            client_id,
            authority_host: AUTHORITY_HOST.to_string(),
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Point token requests at a different identity host.
    pub fn with_authority_host(mut self, authority_host: &str) -> Self {
        self.authority_host = authority_host.trim_end_matches('/').to_string();
        self
    }

    pub fn flow(&self) -> &AuthFlow {
        &self.flow
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get a valid access token, acquiring or renewing one if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.is_fresh() {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let new_token = self.acquire_token().await.map_err(|e| match e {
            ExtractError::Authentication(_) => e,
            other => ExtractError::Authentication(other.to_string()),
        })?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(new_token.clone());
        }

        info!("Authentication successful");
        Ok(new_token.access_token)
    }

    async fn acquire_token(&self) -> Result<CachedToken> {
        match &self.flow {
            AuthFlow::ClientCredentials {
                tenant_id,
                client_secret,
            } => {
                info!("Using service principal authentication");
                self.client_credentials_token(tenant_id, client_secret).await
            }
            AuthFlow::DeviceCode => {
                info!("Using interactive device flow authentication");
                let refresh_token = self
                    .cached_token
                    .read()
                    .await
                    .as_ref()
                    .and_then(|token| token.refresh_token.clone());

                if let Some(refresh_token) = refresh_token {
                    debug!("Found existing account, trying silent authentication");
                    match self.refresh_silently(&refresh_token).await {
                        Ok(token) => return Ok(token),
                        Err(e) => debug!("Silent authentication failed: {}", e),
                    }
                }

                self.device_code_flow().await
            }
        }
    }

    fn token_url(&self, tenant: &str) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority_host, tenant)
    }

    async fn client_credentials_token(
        &self,
        tenant_id: &str,
        client_secret: &str,
    ) -> Result<CachedToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", client_secret),
            ("grant_type", "client_credentials"),
            ("scope", GRAPH_DEFAULT_SCOPE),
        ];

        let (status, body) = self.post_form(&self.token_url(tenant_id), &params).await?;
        parse_token_response(status, &body)
    }

    async fn refresh_silently(&self, refresh_token: &str) -> Result<CachedToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("scope", DELEGATED_SCOPES),
        ];

        let (status, body) = self.post_form(&self.token_url("common"), &params).await?;
        parse_token_response(status, &body)
    }

    /// Run the device code flow: show the code to the user and poll until the
    /// provider reports success or failure.
    async fn device_code_flow(&self) -> Result<CachedToken> {
        info!("Starting device code flow");

        let url = format!("{}/common/oauth2/v2.0/devicecode", self.authority_host);
        let params = [
            ("client_id", self.client_id.as_str()),
            ("scope", DELEGATED_SCOPES),
        ];

        let (status, body) = self.post_form(&url, &params).await?;
        if status != StatusCode::OK {
            return Err(ExtractError::Authentication(format!(
                "Failed to create device flow: {}",
                describe_error(status, &body)
            )));
        }
        let device: DeviceCodeResponse = serde_json::from_str(&body)?;

        println!();
        println!("Please visit: {}", device.verification_uri);
        println!("And enter this code: {}", device.user_code);
        println!();
        info!("Waiting for user authentication...");

        let deadline = instant_after(device.expires_in)?;
        let mut interval = Duration::from_secs(device.interval);
        let token_url = self.token_url("common");

        loop {
            if Instant::now() >= deadline {
                return Err(ExtractError::Authentication(
                    "Device code expired before sign-in completed".to_string(),
                ));
            }

            tokio::time::sleep(interval).await;

            let params = [
                ("client_id", self.client_id.as_str()),
                ("grant_type", DEVICE_CODE_GRANT),
                ("device_code", device.device_code.as_str()),
            ];
            let (status, body) = self.post_form(&token_url, &params).await?;

            if status == StatusCode::OK {
                return parse_token_response(status, &body);
            }

            match serde_json::from_str::<OAuthErrorResponse>(&body) {
                Ok(err) if err.error == "authorization_pending" => continue,
                Ok(err) if err.error == "slow_down" => {
                    interval += Duration::from_secs(5);
                    warn!("Identity provider asked to slow down, polling every {:?}", interval);
                }
                _ => {
                    return Err(ExtractError::Authentication(describe_error(status, &body)));
                }
            }
        }
    }

    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> Result<(StatusCode, String)> {
        debug!("POST {}", url);
        let response = self.client.post(url).form(params).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }
}

/// Turn a token endpoint reply into a cached token, or the provider's error.
fn parse_token_response(status: StatusCode, body: &str) -> Result<CachedToken> {
    if status != StatusCode::OK {
        return Err(ExtractError::Authentication(describe_error(status, body)));
    }

    let token: TokenResponse = serde_json::from_str(body)?;
    let access_token = token.access_token.ok_or_else(|| {
        ExtractError::Authentication("No access_token in token response".to_string())
    })?;

    let expires_in = token.expires_in.unwrap_or(3600);
    debug!("Parsed token, expires in {}s", expires_in);

    Ok(CachedToken {
        access_token,
        refresh_token: token.refresh_token,
        expires_at: instant_after(expires_in)?,
    })
}

/// `now + secs`, or an authentication error when the provider's lifetime
/// does not fit in an `Instant`.
fn instant_after(secs: u64) -> Result<Instant> {
    Instant::now()
        .checked_add(Duration::from_secs(secs))
        .ok_or_else(|| {
            ExtractError::Authentication(format!("Token lifetime out of range: {}s", secs))
        })
}

fn describe_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(err) => err.describe(),
        Err(_) if body.is_empty() => format!("Status {}", status),
        Err(_) => format!("Status {}: {}", status, body),
    }
}
