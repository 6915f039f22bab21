//! Request builder type for arbitrary Qbert resource collections
use serde::Serialize;

use crate::{Error, Result};

/// Body sent with mutations that carry no payload of their own.
const EMPTY_OBJECT: &[u8] = b"{}";

/// A Qbert request builder
///
/// Takes a base path (e.g. `/clusters`) and supplies constructors for common operations.
/// All operations return `http::Request` objects with a path relative to the API root.
#[derive(Debug, Clone)]
pub struct Request {
    /// The path component of a url
    pub url_path: String,
}

impl Request {
    /// New request with a resource's url path
    pub fn new<S: Into<String>>(url_path: S) -> Self {
        Self {
            url_path: url_path.into(),
        }
    }
}

// -------------------------------------------------------

/// Convenience methods for the collection conventions Qbert follows
impl Request {
    /// List a collection
    pub fn list(&self) -> Result<http::Request<Vec<u8>>> {
        let req = http::Request::get(&self.url_path);
        req.body(vec![]).map_err(Error::HttpError)
    }

    /// Get a single instance
    pub fn get(&self, id: &str) -> Result<http::Request<Vec<u8>>> {
        let target = format!("{}/{}", self.url_path, id);
        let req = http::Request::get(target);
        req.body(vec![]).map_err(Error::HttpError)
    }

    /// Get a path below a single instance, e.g. `region/us-east-1`
    pub fn get_subresource(&self, id: &str, subresource: &str) -> Result<http::Request<Vec<u8>>> {
        let target = format!("{}/{}/{}", self.url_path, id, subresource);
        let req = http::Request::get(target);
        req.body(vec![]).map_err(Error::HttpError)
    }

    /// Create an instance of a resource
    pub fn create(&self, data: Vec<u8>) -> Result<http::Request<Vec<u8>>> {
        let req = http::Request::post(&self.url_path);
        req.body(data).map_err(Error::HttpError)
    }

    /// POST to the collection itself without a payload
    pub fn trigger(&self) -> Result<http::Request<Vec<u8>>> {
        self.create(EMPTY_OBJECT.to_vec())
    }

    /// Replace (update) an instance of a resource
    pub fn replace(&self, id: &str, data: Vec<u8>) -> Result<http::Request<Vec<u8>>> {
        let target = format!("{}/{}", self.url_path, id);
        let req = http::Request::put(target);
        req.body(data).map_err(Error::HttpError)
    }

    /// Delete an instance of a resource
    pub fn delete(&self, id: &str) -> Result<http::Request<Vec<u8>>> {
        let target = format!("{}/{}", self.url_path, id);
        let req = http::Request::delete(target);
        req.body(EMPTY_OBJECT.to_vec()).map_err(Error::HttpError)
    }

    /// POST to a path below a single instance, e.g. `attach`
    pub fn post_subresource(&self, id: &str, subresource: &str, data: Vec<u8>) -> Result<http::Request<Vec<u8>>> {
        let target = format!("{}/{}/{}", self.url_path, id, subresource);
        let req = http::Request::post(target);
        req.body(data).map_err(Error::HttpError)
    }
}

/// Serialize a request payload as JSON
pub fn to_body<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(data).map_err(Error::SerdeError)
}

#[cfg(test)]
mod test {
    use super::{to_body, Request};
    use http::Method;
    use serde_json::json;

    #[test]
    fn list_path() {
        let req = Request::new("/clusters").list().unwrap();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri(), "/clusters");
        assert!(req.body().is_empty());
    }

    #[test]
    fn get_region_info() {
        let req = Request::new("/cloudProviders")
            .get_subresource("cp-1", "region/us-west-2")
            .unwrap();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri(), "/cloudProviders/cp-1/region/us-west-2");
    }

    #[test]
    fn replace_carries_body() {
        let body = to_body(&json!({"cluster_uuid": null})).unwrap();
        let req = Request::new("/nodes").replace("n-1", body).unwrap();
        assert_eq!(req.method(), Method::PUT);
        assert_eq!(req.uri(), "/nodes/n-1");
        assert_eq!(req.body(), br#"{"cluster_uuid":null}"#);
    }

    #[test]
    fn delete_sends_empty_object() {
        let req = Request::new("/clusters").delete("c-1").unwrap();
        assert_eq!(req.method(), Method::DELETE);
        assert_eq!(req.uri(), "/clusters/c-1");
        assert_eq!(req.body(), b"{}");
    }

    #[test]
    fn subresource_post() {
        let body = to_body(&json!({"batchUpgradePercent": 100})).unwrap();
        let req = Request::new("/clusters").post_subresource("c-1", "upgrade", body).unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri(), "/clusters/c-1/upgrade");
    }

    #[test]
    fn trigger_posts_to_collection() {
        let req = Request::new("/omniupgrade").trigger().unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri(), "/omniupgrade");
        assert_eq!(req.body(), b"{}");
    }

    #[test]
    fn invalid_id_fails_to_build() {
        assert!(Request::new("/clusters").get("has space").is_err());
    }
}
