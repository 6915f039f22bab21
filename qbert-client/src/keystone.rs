//! Keystone identity client: token acquisition and project lookup
//!
//! [`Keystone`] exchanges a [`Credentials`] set for a project-scoped token,
//! which is then handed to [`Qbert`](crate::Qbert).
//! Tokens are never renewed; call [`Keystone::authenticate`] again when one expires.
use http::StatusCode;
use qbert_core::identity::{projects_request, AuthRequest, ProjectList, SUBJECT_TOKEN_HEADER};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    error::{AuthError, ConfigError},
    Client, Config, Error, Result,
};

/// What Keystone needs to issue a token
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Host of the management plane, e.g. `du.example.com`
    pub du_fqdn: String,
    /// User name, usually an email address
    pub username: String,
    /// Password of `username`
    pub password: SecretString,
    /// Name of the project the token is scoped to
    pub project_name: String,
    /// One-time passcode for accounts with a second factor
    pub mfa_token: Option<SecretString>,
}

impl Credentials {
    /// Password credentials for `project_name` on `du_fqdn`
    pub fn new(
        du_fqdn: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<SecretString>,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            du_fqdn: du_fqdn.into(),
            username: username.into(),
            password: password.into(),
            project_name: project_name.into(),
            mfa_token: None,
        }
    }

    /// Also present a TOTP passcode
    #[must_use]
    pub fn with_mfa_token(mut self, passcode: impl Into<SecretString>) -> Self {
        self.mfa_token = Some(passcode.into());
        self
    }

    /// Keystone v3 root on the management plane
    pub fn keystone_url(&self) -> String {
        format!("https://{}/keystone/v3", self.du_fqdn)
    }

    fn auth_request(&self) -> AuthRequest<'_> {
        let request = AuthRequest::password(
            &self.username,
            self.password.expose_secret(),
            &self.project_name,
        );
        match &self.mfa_token {
            Some(passcode) => request.with_totp(passcode.expose_secret()),
            None => request,
        }
    }
}

/// A minimal Keystone v3 client
///
/// Holds at most one token, set by [`Keystone::authenticate`].
#[derive(Clone)]
pub struct Keystone {
    client: Client,
    credentials: Credentials,
    token: Option<SecretString>,
}

impl Keystone {
    /// Create a client for `https://{du_fqdn}/keystone/v3` with default settings
    ///
    /// Must be called within a tokio runtime.
    pub fn new(credentials: Credentials) -> Result<Self> {
        let config = Config::from_url(&credentials.keystone_url())?;
        Self::with_config(credentials, config)
    }

    /// Create a client using the transport settings of `config`
    ///
    /// The API url of `config` is replaced by the Keystone root of `credentials`,
    /// and any token it carries is dropped.
    pub fn with_config(credentials: Credentials, config: Config) -> Result<Self> {
        let config = identity_config(&credentials, config)?;
        Ok(Self::from_client(Client::try_from(config)?, credentials))
    }

    /// Use an existing [`Client`] rooted at the Keystone v3 url
    pub fn from_client(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            token: None,
        }
    }

    /// The credentials this client authenticates with
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Request a project-scoped token and remember it
    ///
    /// The token comes from the `X-Subject-Token` response header.
    pub async fn authenticate(&mut self) -> Result<SecretString> {
        tracing::debug!(
            "Requesting token for {} in project {} on {}",
            self.credentials.username,
            self.credentials.project_name,
            self.credentials.du_fqdn
        );
        let request = self
            .credentials
            .auth_request()
            .to_request()
            .map_err(Error::BuildRequest)?;
        let response = self.client.request_response(request).await.map_err(|err| match err {
            Error::Api(e) => match StatusCode::from_u16(e.status) {
                Ok(status) if !status.is_success() => Error::Auth(AuthError::Rejected {
                    status,
                    message: Some(e.message),
                }),
                _ => Error::Api(e),
            },
            Error::UnexpectedStatus { status, .. } => {
                Error::Auth(AuthError::Rejected { status, message: None })
            }
            other => other,
        })?;

        let token = response
            .headers
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::from(v.to_string()))
            .ok_or(Error::Auth(AuthError::MissingSubjectToken))?;
        tracing::debug!("Got token for {}", self.credentials.username);
        self.token = Some(token.clone());
        Ok(token)
    }

    /// The token from the last successful [`Keystone::authenticate`]
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Id of the project called `name`, if the token can see one
    pub async fn resolve_project_id(&self, name: &str) -> Result<Option<String>> {
        let token = self.token.as_ref().ok_or(Error::Auth(AuthError::NotAuthenticated))?;
        tracing::debug!("Looking up project {}", name);
        let request = projects_request(token.expose_secret()).map_err(Error::BuildRequest)?;
        let projects: ProjectList = self.client.request(request).await?;
        Ok(projects.find_id(name).map(str::to_string))
    }
}

// Token requests must not present a token of their own
fn identity_config(credentials: &Credentials, config: Config) -> Result<Config> {
    let url = credentials.keystone_url();
    let api_url = url.parse::<http::Uri>().map_err(|source| {
        Error::Config(ConfigError::InvalidUri {
            url: url.clone(),
            source,
        })
    })?;
    Ok(Config {
        api_url,
        auth_token: None,
        ..config
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn keystone_url_is_derived_from_fqdn() {
        let credentials = Credentials::new("du.example.com", "admin", "pw", "service");
        assert_eq!(credentials.keystone_url(), "https://du.example.com/keystone/v3");
    }

    #[test]
    fn mfa_token_adds_totp() {
        let credentials =
            Credentials::new("du.example.com", "admin", "pw", "service").with_mfa_token("123456");
        let body = serde_json::to_value(credentials.auth_request()).unwrap();
        assert_json_eq!(body["auth"]["identity"]["methods"], json!(["password", "totp"]));
        assert_json_eq!(
            body["auth"]["identity"]["totp"]["user"],
            json!({"name": "admin", "domain": {"id": "default"}, "passcode": "123456"})
        );
    }

    #[test]
    fn identity_config_drops_token() {
        let credentials = Credentials::new("du.example.com", "admin", "pw", "service");
        let mut config = Config::from_url("https://du.example.com/qbert/v4/p1")
            .unwrap()
            .with_token("stale")
            .unwrap();
        config.max_retries = 2;

        let config = identity_config(&credentials, config).unwrap();
        assert_eq!(config.api_url, "https://du.example.com/keystone/v3");
        assert!(config.auth_token.is_none());
        assert_eq!(config.max_retries, 2);

        let headers = crate::client::ConfigExt::extra_headers_layer(&config).unwrap();
        assert!(headers.headers.iter().all(|(name, _)| name != "x-auth-token"));
    }

    #[test]
    fn secrets_stay_out_of_debug() {
        let credentials =
            Credentials::new("du.example.com", "admin", "hunter2", "service").with_mfa_token("654321");
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("654321"));
    }
}
