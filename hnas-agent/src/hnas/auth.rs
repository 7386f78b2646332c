//! Credentials applied to every HNAS request.

use crate::config::API_KEY_USERNAME;
use reqwest::RequestBuilder;
use std::fmt;

pub const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// Secret sent in the `X-Api-Key` header
    ApiKey(String),
    /// HTTP basic authentication
    Basic { username: String, password: String },
}

impl Auth {
    /// The username `apikey` selects API-key authentication; any other
    /// username is used for basic auth.
    pub fn from_credentials(username: &str, secret: &str) -> Self {
        if username == API_KEY_USERNAME {
            Auth::ApiKey(secret.to_string())
        } else {
            Auth::Basic {
                username: username.to_string(),
                password: secret.to_string(),
            }
        }
    }

    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::ApiKey(key) => request.header(API_KEY_HEADER, key),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::ApiKey(_) => f.write_str("ApiKey(***)"),
            Auth::Basic { username, .. } => write!(f, "Basic({}:***)", username),
        }
    }
}
