//! Set base URI of requests.
use http::{uri, Request};
use tower::{Layer, Service};

/// Layer that applies [`BaseUri`] which makes all requests relative to the URI.
///
/// Path in the base URI is preseved, so `/clusters` sent through a layer for
/// `https://du.example.com/qbert/v4/p1` goes to `https://du.example.com/qbert/v4/p1/clusters`.
#[derive(Debug, Clone)]
pub struct BaseUriLayer {
    base_uri: http::Uri,
}

impl BaseUriLayer {
    /// Set base URI of requests.
    pub fn new(base_uri: http::Uri) -> Self {
        Self { base_uri }
    }
}

impl<S> Layer<S> for BaseUriLayer {
    type Service = BaseUri<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BaseUri {
            base_uri: self.base_uri.clone(),
            inner,
        }
    }
}

/// Middleware that sets base URI so that all requests are relative to it.
#[derive(Debug, Clone)]
pub struct BaseUri<S> {
    base_uri: http::Uri,
    inner: S,
}

impl<S, ReqBody> Service<Request<ReqBody>> for BaseUri<S>
where
    S: Service<Request<ReqBody>>,
{
    type Error = S::Error;
    type Future = S::Future;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let (mut parts, body) = req.into_parts();
        let req_pandq = parts.uri.path_and_query();
        parts.uri = set_base_uri(&self.base_uri, req_pandq);
        self.inner.call(Request::from_parts(parts, body))
    }
}

// Join base URI and Path+Query, preserving any path in the base.
fn set_base_uri(base_uri: &http::Uri, req_pandq: Option<&uri::PathAndQuery>) -> http::Uri {
    let mut builder = uri::Builder::new();
    if let Some(scheme) = base_uri.scheme() {
        builder = builder.scheme(scheme.as_str());
    }
    if let Some(authority) = base_uri.authority() {
        builder = builder.authority(authority.as_str());
    }

    builder = match (base_uri.path_and_query(), req_pandq) {
        // `PathAndQuery` always starts with a slash.
        (Some(base), Some(req)) => {
            builder.path_and_query(format!("{}{}", base.path().trim_end_matches('/'), req))
        }
        (Some(base), None) => builder.path_and_query(base.as_str()),
        (None, Some(req)) => builder.path_and_query(req.as_str()),
        (None, None) => builder,
    };

    // Joining a valid Uri and valid PathAndQuery should result in a valid Uri.
    builder.build().expect("Valid Uri")
}

#[cfg(test)]
mod tests {
    #[test]
    fn host_only() {
        let base_uri = http::Uri::from_static("https://du.example.com");
        let path = http::Uri::from_static("/nodes");
        assert_eq!(
            super::set_base_uri(&base_uri, path.path_and_query()),
            "https://du.example.com/nodes"
        );
    }

    #[test]
    fn qbert_project_root() {
        let base_uri = http::Uri::from_static("https://du.example.com/qbert/v4/p1");
        let path = http::Uri::from_static("/cloudProviders/cp1/region/us-east-1");
        assert_eq!(
            super::set_base_uri(&base_uri, path.path_and_query()),
            "https://du.example.com/qbert/v4/p1/cloudProviders/cp1/region/us-east-1"
        );
    }

    #[test]
    fn keystone_query_is_kept() {
        let base_uri = http::Uri::from_static("https://du.example.com/keystone/v3");
        let path = http::Uri::from_static("/auth/tokens?nocatalog");
        assert_eq!(
            super::set_base_uri(&base_uri, path.path_and_query()),
            "https://du.example.com/keystone/v3/auth/tokens?nocatalog"
        );
    }
}
