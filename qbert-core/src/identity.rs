//! Keystone v3 identity payloads
//!
//! Only the narrow slice of the identity API the Qbert tooling needs:
//! a project-scoped password (optionally password + TOTP) token request,
//! and the project listing used to resolve a project name to its id.
//!
//! Paths are relative to the identity root, i.e. `https://{du_fqdn}/keystone/v3`.
use http::{header::HeaderValue, Method};
use serde::{Deserialize, Serialize};

use crate::{request::to_body, Error, Result};

/// Domain every user and project is scoped to
pub const DEFAULT_DOMAIN: &str = "default";

/// Response header carrying a freshly issued token
pub const SUBJECT_TOKEN_HEADER: &str = "x-subject-token";

/// Request header presenting a token
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

const TOKENS_PATH: &str = "/auth/tokens?nocatalog";
const PROJECTS_PATH: &str = "/projects";

/// Body of `POST /auth/tokens`
///
/// Borrows the credentials, password included, so it has no `Debug` implementation.
#[derive(Serialize, Clone)]
pub struct AuthRequest<'a> {
    /// The `auth` envelope
    pub auth: Auth<'a>,
}

/// Identity and scope of a token request
#[derive(Serialize, Clone)]
pub struct Auth<'a> {
    /// Methods and their credentials
    pub identity: Identity<'a>,
    /// What the issued token is scoped to
    pub scope: Scope<'a>,
}

/// Authentication methods
#[derive(Serialize, Clone)]
pub struct Identity<'a> {
    /// Method names, `password` first
    pub methods: Vec<&'static str>,
    /// Password method credentials
    pub password: PasswordMethod<'a>,
    /// One-time passcode method credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp: Option<TotpMethod<'a>>,
}

/// The `password` method
#[derive(Serialize, Clone)]
pub struct PasswordMethod<'a> {
    /// User and password
    pub user: PasswordUser<'a>,
}

/// A user authenticating with a password
#[derive(Serialize, Clone)]
pub struct PasswordUser<'a> {
    /// User name
    pub name: &'a str,
    /// User domain
    pub domain: Domain<'a>,
    /// The password
    pub password: &'a str,
}

/// The `totp` method
#[derive(Serialize, Clone)]
pub struct TotpMethod<'a> {
    /// User and passcode
    pub user: TotpUser<'a>,
}

/// A user authenticating with a one-time passcode
#[derive(Serialize, Clone)]
pub struct TotpUser<'a> {
    /// User name
    pub name: &'a str,
    /// User domain
    pub domain: Domain<'a>,
    /// The current passcode
    pub passcode: &'a str,
}

/// Token scope
#[derive(Serialize, Clone)]
pub struct Scope<'a> {
    /// Project the token is scoped to
    pub project: ProjectScope<'a>,
}

/// A project referenced by name within a domain
#[derive(Serialize, Clone)]
pub struct ProjectScope<'a> {
    /// Project name
    pub name: &'a str,
    /// Project domain
    pub domain: Domain<'a>,
}

/// A domain referenced by id
#[derive(Serialize, Clone, Copy)]
pub struct Domain<'a> {
    /// Domain id
    pub id: &'a str,
}

impl Default for Domain<'_> {
    fn default() -> Self {
        Domain { id: DEFAULT_DOMAIN }
    }
}

impl<'a> AuthRequest<'a> {
    /// Password authentication scoped to `project_name` in the default domain
    pub fn password(username: &'a str, password: &'a str, project_name: &'a str) -> Self {
        AuthRequest {
            auth: Auth {
                identity: Identity {
                    methods: vec!["password"],
                    password: PasswordMethod {
                        user: PasswordUser {
                            name: username,
                            domain: Domain::default(),
                            password,
                        },
                    },
                    totp: None,
                },
                scope: Scope {
                    project: ProjectScope {
                        name: project_name,
                        domain: Domain::default(),
                    },
                },
            },
        }
    }

    /// Add a one-time passcode as a second factor
    pub fn with_totp(mut self, passcode: &'a str) -> Self {
        let identity = &mut self.auth.identity;
        if identity.totp.is_none() {
            identity.methods.push("totp");
        }
        identity.totp = Some(TotpMethod {
            user: TotpUser {
                name: identity.password.user.name,
                domain: Domain::default(),
                passcode,
            },
        });
        self
    }

    /// Build the `POST /auth/tokens?nocatalog` request
    pub fn to_request(&self) -> Result<http::Request<Vec<u8>>> {
        let body = to_body(self)?;
        http::Request::builder()
            .method(Method::POST)
            .uri(TOKENS_PATH)
            .body(body)
            .map_err(Error::HttpError)
    }
}

/// Build the `GET /projects` request presenting `token`
pub fn projects_request(token: &str) -> Result<http::Request<Vec<u8>>> {
    let mut value = HeaderValue::from_str(token).map_err(|e| Error::HttpError(e.into()))?;
    value.set_sensitive(true);
    let mut req = http::Request::get(PROJECTS_PATH)
        .body(vec![])
        .map_err(Error::HttpError)?;
    req.headers_mut().insert(AUTH_TOKEN_HEADER, value);
    Ok(req)
}

/// A project visible to the current token
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Project id
    pub id: String,
    /// Project name
    pub name: String,
}

/// Response of `GET /projects`
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectList {
    /// Visible projects
    pub projects: Vec<Project>,
}

impl ProjectList {
    /// Id of the first project called `name`
    pub fn find_id(&self, name: &str) -> Option<&str> {
        self.projects.iter().find(|p| p.name == name).map(|p| p.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn password_request_body() {
        let req = AuthRequest::password("admin@example.com", "hunter2", "service");
        assert_json_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "auth": {
                    "identity": {
                        "methods": ["password"],
                        "password": {
                            "user": {
                                "name": "admin@example.com",
                                "domain": {"id": "default"},
                                "password": "hunter2"
                            }
                        }
                    },
                    "scope": {
                        "project": {
                            "name": "service",
                            "domain": {"id": "default"}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn totp_adds_second_method() {
        let req = AuthRequest::password("admin", "pw", "service").with_totp("123456");
        let value = serde_json::to_value(&req).unwrap();
        assert_json_eq!(value["auth"]["identity"]["methods"], json!(["password", "totp"]));
        assert_json_eq!(
            value["auth"]["identity"]["totp"],
            json!({
                "user": {
                    "name": "admin",
                    "domain": {"id": "default"},
                    "passcode": "123456"
                }
            })
        );

        // a second passcode replaces the first instead of repeating the method
        let again = req.with_totp("654321");
        assert_eq!(again.auth.identity.methods, vec!["password", "totp"]);
    }

    #[test]
    fn token_request_path() {
        let req = AuthRequest::password("u", "p", "proj").to_request().unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri(), "/auth/tokens?nocatalog");
    }

    #[test]
    fn projects_request_presents_token() {
        let req = projects_request("tok").unwrap();
        assert_eq!(req.uri(), "/projects");
        let header = req.headers().get(AUTH_TOKEN_HEADER).unwrap();
        assert_eq!(header, "tok");
        assert!(header.is_sensitive());
        assert!(projects_request("bad\ntoken").is_err());
    }

    #[test]
    fn find_project_id() {
        let list: ProjectList = serde_json::from_value(json!({
            "projects": [
                {"id": "p1", "name": "service", "enabled": true},
                {"id": "p2", "name": "tenant"}
            ],
            "links": {}
        }))
        .unwrap();
        assert_eq!(list.find_id("tenant"), Some("p2"));
        assert_eq!(list.find_id("missing"), None);
    }
}
