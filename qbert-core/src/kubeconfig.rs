//! Credential embedding for kubeconfigs served by Qbert
//!
//! `GET /kubeconfig/{cluster}` returns a kubeconfig whose user token is the
//! literal [`TOKEN_PLACEHOLDER`]. Callers replace it either with a Keystone bearer
//! token, or with a base64 blob of `{"username":..,"password":..}` that the
//! cluster's authenticator exchanges for a token on every request.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

/// Marker Qbert puts where the user token belongs
pub const TOKEN_PLACEHOLDER: &str = "__INSERT_BEARER_TOKEN_HERE__";

/// What to embed in place of [`TOKEN_PLACEHOLDER`]
#[derive(Clone, Copy)]
pub enum KubeconfigCredential<'a> {
    /// A Keystone bearer token
    Bearer(&'a str),
    /// Username and password, embedded as a base64 encoded JSON document
    Basic {
        /// Keystone user name
        username: &'a str,
        /// Keystone password
        password: &'a str,
    },
}

// Field order is part of the encoded blob.
#[derive(Serialize)]
struct BasicBlob<'a> {
    username: &'a str,
    password: &'a str,
}

impl<'a> KubeconfigCredential<'a> {
    /// Pick the credential to embed.
    ///
    /// Username and password are only used when both are given;
    /// otherwise the bearer token is embedded.
    pub fn from_parts(token: &'a str, username: Option<&'a str>, password: Option<&'a str>) -> Self {
        match (username, password) {
            (Some(username), Some(password)) => KubeconfigCredential::Basic { username, password },
            _ => KubeconfigCredential::Bearer(token),
        }
    }

    /// The string that replaces the placeholder
    pub fn to_token(&self) -> String {
        match self {
            KubeconfigCredential::Bearer(token) => (*token).to_string(),
            KubeconfigCredential::Basic { username, password } => {
                let blob = BasicBlob {
                    username: *username,
                    password: *password,
                };
                // serializing two string fields cannot fail
                let json = serde_json::to_vec(&blob).unwrap_or_default();
                STANDARD.encode(json)
            }
        }
    }
}

impl std::fmt::Debug for KubeconfigCredential<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KubeconfigCredential::Bearer(_) => f.write_str("Bearer(..)"),
            KubeconfigCredential::Basic { username, .. } => {
                f.debug_struct("Basic").field("username", username).finish_non_exhaustive()
            }
        }
    }
}

/// Replace every placeholder in `kubeconfig` with `credential`
pub fn embed(kubeconfig: &str, credential: &KubeconfigCredential<'_>) -> String {
    kubeconfig.replace(TOKEN_PLACEHOLDER, &credential.to_token())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r#"apiVersion: v1
clusters:
- cluster:
    server: https://10.0.0.1:443
  name: prod
users:
- name: admin@example.com
  user:
    token: __INSERT_BEARER_TOKEN_HERE__
"#;

    #[test]
    fn bearer_is_default() {
        let cred = KubeconfigCredential::from_parts("tok", None, None);
        let out = embed(KUBECONFIG, &cred);
        assert!(out.contains("    token: tok\n"));
        assert!(!out.contains(TOKEN_PLACEHOLDER));
    }

    #[test]
    fn half_basic_falls_back_to_bearer() {
        let only_user = KubeconfigCredential::from_parts("tok", Some("u"), None);
        let only_pass = KubeconfigCredential::from_parts("tok", None, Some("p"));
        assert_eq!(only_user.to_token(), "tok");
        assert_eq!(only_pass.to_token(), "tok");
    }

    #[test]
    fn basic_blob_encoding() {
        let cred = KubeconfigCredential::from_parts("tok", Some("admin@example.com"), Some("s3cret"));
        let expected = STANDARD.encode(r#"{"username":"admin@example.com","password":"s3cret"}"#);
        assert_eq!(cred.to_token(), expected);

        let out = embed(KUBECONFIG, &cred);
        assert!(out.contains(&format!("    token: {expected}\n")));
    }

    #[test]
    fn debug_hides_secrets() {
        let cred = KubeconfigCredential::from_parts("tok", Some("admin"), Some("s3cret"));
        let dbg = format!("{cred:?}");
        assert!(dbg.contains("admin"));
        assert!(!dbg.contains("s3cret"));
        assert_eq!(format!("{:?}", KubeconfigCredential::Bearer("tok")), "Bearer(..)");
    }

    #[test]
    fn documents_without_placeholder_are_untouched() {
        let cred = KubeconfigCredential::Bearer("tok");
        assert_eq!(embed("kind: Config\n", &cred), "kind: Config\n");
    }
}
