use std::sync::Arc;

use http::{
    header::{HeaderName, CONTENT_TYPE},
    HeaderValue,
};
use hyper_util::client::legacy::connect::HttpConnector;
use qbert_core::identity::AUTH_TOKEN_HEADER;
use secrecy::ExposeSecret;
use tower::retry::RetryLayer;

use super::{
    middleware::{BaseUriLayer, ExtraHeadersLayer},
    retry::RetryPolicy,
    tls,
};
use crate::{error::ConfigError, Config, Error, Result};

/// Extensions to [`Config`](crate::Config) for custom [`Client`](crate::Client).
///
/// See [`Client::new`](crate::Client::new) for an example.
///
/// This trait is sealed and cannot be implemented.
pub trait ConfigExt: private::Sealed {
    /// Layer to set the base URI of requests to the configured API root.
    fn base_uri_layer(&self) -> BaseUriLayer;

    /// Layer to add `Content-Type` and, when a token is configured, `X-Auth-Token`.
    fn extra_headers_layer(&self) -> Result<ExtraHeadersLayer>;

    /// Layer retrying 502, 503 and 504 responses with the configured backoff.
    fn retry_layer(&self) -> Result<RetryLayer<RetryPolicy>>;

    /// Create [`hyper_rustls::HttpsConnector`] based on config.
    ///
    /// # Example
    ///
    /// ```rust
    /// # async fn doc() -> Result<(), Box<dyn std::error::Error>> {
    /// # use qbert_client::{client::{Body, ConfigExt}, Config};
    /// # use hyper_util::rt::TokioExecutor;
    /// let config = Config::from_url("https://du.example.com/qbert/v4/p1")?;
    /// let https = config.rustls_https_connector()?;
    /// let hyper_client: hyper_util::client::legacy::Client<_, Body> = hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build(https);
    /// # Ok(())
    /// # }
    /// ```
    fn rustls_https_connector(&self) -> Result<hyper_rustls::HttpsConnector<HttpConnector>>;

    /// Create [`hyper_rustls::HttpsConnector`] based on config and `connector`.
    fn rustls_https_connector_with_connector<H>(
        &self,
        connector: H,
    ) -> Result<hyper_rustls::HttpsConnector<H>>;

    /// Create [`rustls::ClientConfig`] based on config.
    fn rustls_client_config(&self) -> Result<rustls::ClientConfig>;
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Config {}
}

impl ConfigExt for Config {
    fn base_uri_layer(&self) -> BaseUriLayer {
        BaseUriLayer::new(self.api_url.clone())
    }

    fn extra_headers_layer(&self) -> Result<ExtraHeadersLayer> {
        let mut headers = vec![(CONTENT_TYPE, HeaderValue::from_static("application/json"))];
        if let Some(token) = &self.auth_token {
            let mut value = HeaderValue::from_str(token.expose_secret())
                .map_err(|e| Error::Config(ConfigError::InvalidHeaderValue(e)))?;
            value.set_sensitive(true);
            headers.push((HeaderName::from_static(AUTH_TOKEN_HEADER), value));
        }
        Ok(ExtraHeadersLayer {
            headers: Arc::new(headers),
        })
    }

    fn retry_layer(&self) -> Result<RetryLayer<RetryPolicy>> {
        let policy = RetryPolicy::from_config(self).map_err(|e| Error::Config(ConfigError::InvalidBackoff(e)))?;
        Ok(RetryLayer::new(policy))
    }

    fn rustls_client_config(&self) -> Result<rustls::ClientConfig> {
        tls::rustls_tls::rustls_client_config(self.accept_invalid_certs)
            .map_err(|e| Error::Config(ConfigError::Tls(e)))
    }

    fn rustls_https_connector(&self) -> Result<hyper_rustls::HttpsConnector<HttpConnector>> {
        let mut connector = HttpConnector::new();
        connector.enforce_http(false);
        self.rustls_https_connector_with_connector(connector)
    }

    fn rustls_https_connector_with_connector<H>(
        &self,
        connector: H,
    ) -> Result<hyper_rustls::HttpsConnector<H>> {
        let rustls_config = self.rustls_client_config()?;
        Ok(hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(rustls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector))
    }
}
