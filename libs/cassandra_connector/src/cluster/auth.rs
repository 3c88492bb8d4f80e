use serde_json::{Map, Value};
use std::fmt;

use crate::common::{ConnectorError, ConnectorResult};

/// Username Astra expects when authenticating with an application token
pub const TOKEN_USERNAME: &str = "token";

/// Authentication strategies understood by the driver layer
#[derive(Clone, PartialEq, Eq)]
pub enum AuthProvider {
    PlainText { username: String, password: String },
}

type AuthFactory = fn(&Map<String, Value>) -> ConnectorResult<AuthProvider>;

/// Provider keys, matched case-insensitively against the last segment of a
/// dotted name, so `cassandra.auth.PlainTextAuthProvider` resolves too.
const AUTH_PROVIDERS: &[(&str, AuthFactory)] = &[
    ("PlainTextAuthProvider", plain_text_from_args),
    ("PlainText", plain_text_from_args),
    ("plain_text", plain_text_from_args),
];

impl AuthProvider {
    pub fn plain_text(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthProvider::PlainText {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Astra token authentication
    pub fn token(token: impl Into<String>) -> Self {
        Self::plain_text(TOKEN_USERNAME, token)
    }

    /// Instantiate the provider registered under `name` with `args`
    pub fn resolve(name: &str, args: &Map<String, Value>) -> ConnectorResult<Self> {
        let key = name.rsplit('.').next().unwrap_or(name).trim();

        let (_, factory) = AUTH_PROVIDERS
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(key))
            .ok_or_else(|| {
                ConnectorError::Configuration(format!(
                    "unknown auth provider '{}', expected one of: {}",
                    name,
                    AUTH_PROVIDERS
                        .iter()
                        .map(|(registered, _)| *registered)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;

        factory(args)
    }
}

fn plain_text_from_args(args: &Map<String, Value>) -> ConnectorResult<AuthProvider> {
    if let Some(unexpected) = args
        .keys()
        .find(|key| !matches!(key.as_str(), "username" | "password"))
    {
        return Err(ConnectorError::Configuration(format!(
            "unexpected argument '{}' for PlainTextAuthProvider",
            unexpected
        )));
    }

    Ok(AuthProvider::plain_text(
        string_arg(args, "username")?,
        string_arg(args, "password")?,
    ))
}

fn string_arg<'a>(args: &'a Map<String, Value>, name: &str) -> ConnectorResult<&'a str> {
    match args.get(name) {
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(ConnectorError::Configuration(format!(
            "auth provider argument '{}' must be a string",
            name
        ))),
        None => Err(ConnectorError::Configuration(format!(
            "auth provider argument '{}' is required",
            name
        ))),
    }
}

impl fmt::Debug for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthProvider::PlainText { username, .. } => f
                .debug_struct("PlainText")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_resolve_plain_text_variants() {
        let credentials = args(json!({"username": "cassandra", "password": "secret"}));
        let expected = AuthProvider::plain_text("cassandra", "secret");

        for name in [
            "PlainTextAuthProvider",
            "cassandra.auth.PlainTextAuthProvider",
            "plaintext",
            "plain_text",
        ] {
            assert_eq!(AuthProvider::resolve(name, &credentials).unwrap(), expected, "{}", name);
        }
    }

    #[test]
    fn test_resolve_unknown_provider() {
        let err = AuthProvider::resolve("cassandra.auth.SaslAuthProvider", &Map::new()).unwrap_err();
        assert!(matches!(err, ConnectorError::Configuration(_)));
        assert!(err.to_string().contains("PlainTextAuthProvider"));
    }

    #[test]
    fn test_plain_text_requires_string_args() {
        let missing = AuthProvider::resolve("PlainText", &args(json!({"username": "u"})));
        assert!(missing.unwrap_err().to_string().contains("password"));

        let wrong_type = AuthProvider::resolve(
            "PlainText",
            &args(json!({"username": "u", "password": 42})),
        );
        assert!(wrong_type.unwrap_err().to_string().contains("must be a string"));
    }

    #[test]
    fn test_plain_text_rejects_unknown_args() {
        let err = AuthProvider::resolve(
            "PlainText",
            &args(json!({"username": "u", "password": "p", "realm": "x"})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("realm"));
    }

    #[test]
    fn test_token_provider() {
        assert_eq!(
            AuthProvider::token("AstraCS:abc"),
            AuthProvider::plain_text("token", "AstraCS:abc")
        );
        assert!(!format!("{:?}", AuthProvider::token("AstraCS:abc")).contains("AstraCS"));
    }
}
