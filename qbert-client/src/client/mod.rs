//! A basic API client for interacting with Keystone and Qbert
//!
//! The [`Client`] sends [`http::Request`]s through a tower stack that sets
//! the API root, adds the default headers, traces and retries gateway errors.
//! It decodes the response and turns error documents into [`Error::Api`].
//!
//! Most users will reach for [`Qbert`](crate::Qbert) or
//! [`Keystone`](crate::keystone::Keystone) instead, which build on this client.
use futures::future::BoxFuture;
use http::{self, header::CONTENT_TYPE, HeaderMap, Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::{self, Value};
use tower::{buffer::Buffer, util::BoxService, BoxError, Layer, Service, ServiceExt};
use tower_http::map_response_body::MapResponseBodyLayer;

use crate::{error::ErrorResponse, Config, Error, Result};

mod body;
mod builder;
mod config_ext;
pub mod middleware;
pub mod retry;
mod tls;

pub use body::Body;
pub use builder::{ClientBuilder, DynBody, GenericService};
pub use config_ext::ConfigExt;

/// Client for connecting with a Keystone or Qbert API root.
///
/// The easiest way to instantiate the client is with an existing [`Config`]
/// using [`Client::try_from`].
#[derive(Clone)]
pub struct Client {
    // - `Buffer` for cheap clone
    // - `BoxFuture` for dynamic response future type
    inner: Buffer<Request<Body>, BoxFuture<'static, Result<Response<Body>, BoxError>>>,
}

/// Decoded response from [`Client::request_response`]
#[derive(Debug, Clone)]
pub struct JsonResponse {
    /// Final status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Decoded body, see [`Client::request_json`]
    pub body: Value,
}

impl Client {
    /// Create a [`Client`] using a custom `Service` stack.
    ///
    /// [`ConfigExt`](crate::client::ConfigExt) provides extensions for
    /// building a custom stack.
    ///
    /// To create with the default stack with a [`Config`], use
    /// [`Client::try_from`].
    ///
    /// # Example
    ///
    /// ```rust
    /// # async fn doc() -> Result<(), Box<dyn std::error::Error>> {
    /// use qbert_client::{client::{Body, ConfigExt}, Client, Config};
    /// use hyper_util::rt::TokioExecutor;
    /// use tower::ServiceBuilder;
    ///
    /// let config = Config::from_url("https://du.example.com/qbert/v4/p1")?.with_token("token")?;
    /// let https = config.rustls_https_connector()?;
    /// let service = ServiceBuilder::new()
    ///     .layer(config.base_uri_layer())
    ///     .layer(config.extra_headers_layer()?)
    ///     .service(hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build::<_, Body>(https));
    /// let client = Client::new(service);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if not called within the context of a [tokio] runtime.
    pub fn new<S, B>(service: S) -> Self
    where
        S: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: http_body::Body<Data = bytes::Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        // Transform response body to `crate::client::Body` and use type erased error to avoid type parameters.
        let service = MapResponseBodyLayer::new(Body::wrap_body)
            .layer(service)
            .map_err(|e| e.into());
        Self {
            inner: Buffer::new(BoxService::new(service), 1024),
        }
    }

    /// Perform a raw HTTP request against the API and return the raw response back.
    ///
    /// No status handling is done here.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        let mut svc = self.inner.clone();
        let res = svc
            .ready()
            .await
            .map_err(Error::Service)?
            .call(request)
            .await
            .map_err(|err| {
                // Error decorating request
                err.downcast::<Error>()
                    .map(|e| *e)
                    // Error requesting or from another middleware
                    .unwrap_or_else(Error::Service)
            })?;
        Ok(res)
    }

    /// Perform a raw HTTP request against the API and deserialize the response
    /// as JSON to some known type.
    pub async fn request<T>(&self, request: Request<Vec<u8>>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let text = self.request_text(request).await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!("{}, {:?}", text, e);
            Error::SerdeError(e)
        })
    }

    /// Perform a raw HTTP request against the API and get back the response
    /// as a string
    pub async fn request_text(&self, request: Request<Vec<u8>>) -> Result<String> {
        let (status, headers, text) = self.request_raw(request).await?;
        handle_api_errors(&text, status, &headers)?;
        Ok(text)
    }

    /// Perform a raw HTTP request against the API and get back the decoded body.
    ///
    /// A JSON content type is parsed as JSON, an empty body is [`Value::Null`]
    /// and anything else comes back as [`Value::String`].
    pub async fn request_json(&self, request: Request<Vec<u8>>) -> Result<Value> {
        Ok(self.request_response(request).await?.body)
    }

    /// Like [`Client::request_json`] but keeps the status and headers.
    pub async fn request_response(&self, request: Request<Vec<u8>>) -> Result<JsonResponse> {
        let (status, headers, text) = self.request_raw(request).await?;
        handle_api_errors(&text, status, &headers)?;
        let body = decode_body(text, &headers)?;
        Ok(JsonResponse { status, headers, body })
    }

    async fn request_raw(&self, request: Request<Vec<u8>>) -> Result<(StatusCode, HeaderMap, String)> {
        let res = self.send(request.map(Body::from)).await?;
        let (parts, body) = res.into_parts();
        tracing::trace!("Status = {:?}", parts.status);
        let body_bytes = body.collect().await?.to_bytes();
        let text = String::from_utf8(body_bytes.to_vec()).map_err(Error::FromUtf8)?;
        Ok((parts.status, parts.headers, text))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

fn decode_body(text: String, headers: &HeaderMap) -> Result<Value> {
    if text.is_empty() {
        Ok(Value::Null)
    } else if is_json(headers) {
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!("{}, {:?}", text, e);
            Error::SerdeError(e)
        })
    } else {
        Ok(Value::String(text))
    }
}

/// Qbert and Keystone returned error handling
///
/// A JSON document with a top-level `error` field is an [`Error::Api`]
/// whatever the status. Any other non-2xx is [`Error::UnexpectedStatus`].
fn handle_api_errors(text: &str, s: StatusCode, headers: &HeaderMap) -> Result<()> {
    if is_json(headers) {
        if let Ok(doc) = serde_json::from_str::<Value>(text) {
            if let Some(errdata) = ErrorResponse::from_body(&doc, s.as_u16()) {
                tracing::debug!("Unsuccessful: {:?}", errdata);
                return Err(Error::Api(errdata));
            }
        }
    }
    if s.is_success() {
        Ok(())
    } else {
        tracing::debug!("Unsuccessful status {}: {}", s, text);
        Err(Error::UnexpectedStatus {
            status: s,
            body: text.to_string(),
        })
    }
}

impl TryFrom<Config> for Client {
    type Error = Error;

    /// Builds a default [`Client`] from a [`Config`], see [`ClientBuilder`] if more customization is required
    fn try_from(config: Config) -> Result<Self> {
        Ok(ClientBuilder::try_from(config)?.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::pin_mut;
    use http::{Request, Response};
    use serde_json::json;
    use tower_test::mock;

    fn json_response(status: u16, body: &Value) -> Response<Body> {
        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_mock() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let (request, send) = handle.next_request().await.expect("service not called");
            assert_eq!(request.method(), http::Method::GET);
            assert_eq!(request.uri().to_string(), "/clusters");
            send.send_response(json_response(200, &json!([{"uuid": "c1", "name": "a"}])));
        });

        let client = Client::new(mock_service);
        let clusters = client
            .request_json(Request::get("/clusters").body(vec![]).unwrap())
            .await
            .unwrap();
        assert_eq!(clusters, json!([{"uuid": "c1", "name": "a"}]));
        spawned.await.unwrap();
    }

    #[tokio::test]
    async fn error_document_wins_over_status() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let (_, send) = handle.next_request().await.expect("service not called");
            send.send_response(json_response(200, &json!({"error": {"message": "bad node"}})));
        });

        let client = Client::new(mock_service);
        let err = client
            .request_json(Request::get("/nodes").body(vec![]).unwrap())
            .await
            .unwrap_err();
        match err {
            Error::Api(e) => {
                assert_eq!(e.message, "bad node");
                assert_eq!(e.status, 200);
            }
            other => panic!("unexpected error {other:?}"),
        }
        spawned.await.unwrap();
    }

    #[test]
    fn non_json_failures_are_unexpected_status() {
        let headers = HeaderMap::new();
        let err = handle_api_errors("upstream down", StatusCode::BAD_GATEWAY, &headers).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedStatus { status, ref body } if status == StatusCode::BAD_GATEWAY && body == "upstream down"
        ));
    }

    #[test]
    fn json_failures_without_error_field() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        let err = handle_api_errors("{\"code\":404}", StatusCode::NOT_FOUND, &headers).unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus { .. }));
        assert!(handle_api_errors("{\"code\":1}", StatusCode::OK, &headers).is_ok());
    }

    #[test]
    fn body_decoding() {
        let mut json = HeaderMap::new();
        json.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert_eq!(decode_body(String::new(), &json).unwrap(), Value::Null);
        assert_eq!(decode_body("{\"a\":1}".into(), &json).unwrap(), json!({"a": 1}));
        assert_eq!(
            decode_body("apiVersion: v1".into(), &HeaderMap::new()).unwrap(),
            Value::String("apiVersion: v1".into())
        );
        assert!(matches!(
            decode_body("not json".into(), &json),
            Err(Error::SerdeError(_))
        ));
    }

    #[tokio::test]
    async fn service_errors_are_mapped() {
        let (mock_service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let (_, send) = handle.next_request().await.expect("service not called");
            send.send_error(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"));
        });

        let client = Client::new(mock_service);
        let err = client
            .request_text(Request::get("/clusters").body(vec![]).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Service(_)));
        spawned.await.unwrap();
    }
}
