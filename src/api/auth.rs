//! Purpose: Email/password auth flows against `auth/v1`.
//! Exports: `Session`, `User`, `SignUp`, and `RestClient` auth methods.
//! Role: Auth service; reads tokens with the legacy accessor, the user with a full decode.
//! Invariants: A session always has a non-empty access token.
#![allow(clippy::result_large_err)]

use super::remote::{ApiResult, Payload, RestClient};
use crate::core::decode::decode;
use crate::core::encode::encode_map;
use crate::core::error::{Error, ErrorKind};
use crate::core::legacy::extract_property;
use crate::core::value::{Map, Value};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl User {
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id")?.as_text()?.to_string();
        Some(Self {
            id,
            email: value.get("email").and_then(Value::as_text).map(str::to_string),
            role: value.get("role").and_then(Value::as_text).map(str::to_string),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub user: Option<User>,
}

impl Session {
    /// Reads a token response body. `None` when no access token is present.
    pub fn from_body(body: &str) -> Option<Self> {
        let access_token = extract_property(body, "access_token").filter(|t| !t.is_empty())?;
        let user = decode(body)
            .ok()
            .and_then(|value| value.get("user").and_then(User::from_value));
        Some(Self {
            access_token,
            refresh_token: extract_property(body, "refresh_token")
                .filter(|token| token != "null")
                .unwrap_or_default(),
            token_type: extract_property(body, "token_type").unwrap_or_else(|| "bearer".to_string()),
            expires_in: extract_property(body, "expires_in").and_then(|raw| raw.parse().ok()),
            user,
        })
    }
}

/// Sign-up either logs the user in right away or waits for email confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignUp {
    Session(Session),
    PendingConfirmation(User),
}

impl RestClient {
    pub fn sign_up(&self, email: &str, password: &str) -> ApiResult<SignUp> {
        let url = self.endpoint(&["auth", "v1", "signup"])?;
        let body = credentials_body(email, password)?;
        let text = self.call_text("POST", &url, &[], Payload::Json(body))?;
        if let Some(session) = Session::from_body(&text) {
            return Ok(SignUp::Session(session));
        }
        let value = decode(&text)?;
        let user = value
            .get("user")
            .and_then(User::from_value)
            .or_else(|| User::from_value(&value))
            .ok_or_else(|| missing_field("user"))?;
        Ok(SignUp::PendingConfirmation(user))
    }

    pub fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<Session> {
        let body = credentials_body(email, password)?;
        self.token_grant("password", body)
    }

    pub fn refresh_session(&self, refresh_token: &str) -> ApiResult<Session> {
        let body = encode_map(&Map::new().with("refresh_token", refresh_token))?;
        self.token_grant("refresh_token", body)
    }

    pub fn sign_out(&self, access_token: &str) -> ApiResult<()> {
        let url = self.endpoint(&["auth", "v1", "logout"])?;
        let bearer = format!("Bearer {access_token}");
        self.call_text("POST", &url, &[("Authorization", bearer.as_str())], Payload::Empty)?;
        Ok(())
    }

    pub fn get_user(&self, access_token: &str) -> ApiResult<User> {
        let url = self.endpoint(&["auth", "v1", "user"])?;
        let bearer = format!("Bearer {access_token}");
        let value = self.call_value("GET", &url, &[("Authorization", bearer.as_str())], Payload::Empty)?;
        User::from_value(&value).ok_or_else(|| missing_field("id"))
    }

    fn token_grant(&self, grant_type: &str, body: String) -> ApiResult<Session> {
        let mut url = self.endpoint(&["auth", "v1", "token"])?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        let text = self.call_text("POST", &url, &[], Payload::Json(body))?;
        Session::from_body(&text).ok_or_else(|| missing_field("access_token"))
    }
}

fn credentials_body(email: &str, password: &str) -> ApiResult<String> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("email and password are required"));
    }
    let body = encode_map(&Map::new().with("email", email).with("password", password))?;
    Ok(body)
}

fn missing_field(field: &str) -> Error {
    Error::new(ErrorKind::Decode).with_message(format!("auth response is missing `{field}`"))
}
