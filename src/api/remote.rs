//! Purpose: Blocking HTTP transport for a PostgREST-style backend-as-a-service project.
//! Exports: `RestClient`.
//! Role: Shared plumbing for the auth, database and storage services (headers, URLs, errors).
//! Invariants: Every request carries `apikey` and a bearer token (session token, else the key).
//! Invariants: Non-success responses become `Error` values built from the backend's error envelope.
//! Invariants: Response bodies are decoded with `core::decode`; nothing is retried here.
#![allow(clippy::result_large_err)]

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use url::Url;

use super::config::ClientConfig;
use crate::core::decode::decode;
use crate::core::envelope::ErrorEnvelope;
use crate::core::error::{Error, ErrorKind};
use crate::core::query::QueryParams;
use crate::core::value::Value;

pub(crate) type ApiResult<T> = Result<T, Error>;

#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    config: ClientConfig,
    agent: ureq::Agent,
}

pub(crate) enum Payload<'a> {
    Empty,
    Json(String),
    Bytes {
        data: &'a [u8],
        content_type: &'a str,
    },
}

impl RestClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let agent = agent_builder(&config).build();
        Ok(Self {
            inner: Arc::new(RestClientInner { config, agent }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Uses `token` as the bearer for later requests (e.g. after sign-in).
    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        let config = self.inner.config.clone().with_access_token(token);
        self.with_parts(config, None)
    }

    pub fn with_tls_ca_file(self, path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let cert_bytes = std::fs::read(path).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("failed to read TLS CA file {}", path.display()))
                .with_source(err)
        })?;
        let mut cert_reader = Cursor::new(cert_bytes);
        let certs = rustls_pemfile::certs(&mut cert_reader)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("failed to parse TLS CA file {}", path.display()))
                    .with_source(err)
            })?;
        if certs.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("TLS CA file {} contains no certificates", path.display())));
        }

        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        let mut root_store = rustls::RootCertStore::empty();
        let (added, _) = root_store.add_parsable_certificates(certs);
        if added == 0 {
            return Err(Error::new(ErrorKind::Usage).with_message(format!(
                "TLS CA file {} contains no parsable certificates",
                path.display()
            )));
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();
        let agent = agent_builder(&self.inner.config)
            .tls_config(Arc::new(tls_config))
            .build();
        let config = self.inner.config.clone();
        Ok(self.with_parts(config, Some(agent)))
    }

    fn with_parts(mut self, config: ClientConfig, agent: Option<ureq::Agent>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.config = config;
            if let Some(agent) = agent {
                inner.agent = agent;
            }
        } else {
            let agent = agent.unwrap_or_else(|| self.inner.agent.clone());
            self.inner = Arc::new(RestClientInner { config, agent });
        }
        self
    }

    /// `<project url>/<segments...>`; segments are percent-encoded individually.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        build_url(self.inner.config.url(), segments)
    }

    /// `endpoint` plus the URL-bound query pairs (everything but `prefer`).
    pub(crate) fn endpoint_with_query(
        &self,
        segments: &[&str],
        params: &QueryParams,
    ) -> ApiResult<Url> {
        let mut url = self.endpoint(segments)?;
        append_query(&mut url, params.url_pairs());
        Ok(url)
    }

    pub(crate) fn call(
        &self,
        method: &str,
        url: &Url,
        headers: &[(&str, &str)],
        payload: Payload<'_>,
    ) -> ApiResult<ureq::Response> {
        tracing::debug!(method, path = url.path(), "sending request");
        let mut request = self
            .inner
            .agent
            .request_url(method, url)
            .set("apikey", self.inner.config.api_key());
        let overrides_auth = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("authorization"));
        if !overrides_auth {
            let bearer = self
                .inner
                .config
                .access_token()
                .unwrap_or(self.inner.config.api_key());
            request = request.set("Authorization", &format!("Bearer {bearer}"));
        }
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let response = match payload {
            Payload::Empty => request.call(),
            Payload::Json(body) => request
                .set("Content-Type", "application/json")
                .send_string(&body),
            Payload::Bytes { data, content_type } => {
                request.set("Content-Type", content_type).send_bytes(data)
            }
        };

        match response {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_source(err)),
        }
    }

    pub(crate) fn call_text(
        &self,
        method: &str,
        url: &Url,
        headers: &[(&str, &str)],
        payload: Payload<'_>,
    ) -> ApiResult<String> {
        let response = self.call(method, url, headers, payload)?;
        read_text(response)
    }

    /// Decoded body; an empty body (204, `return=minimal`) is `Value::Null`.
    pub(crate) fn call_value(
        &self,
        method: &str,
        url: &Url,
        headers: &[(&str, &str)],
        payload: Payload<'_>,
    ) -> ApiResult<Value> {
        let body = self.call_text(method, url, headers, payload)?;
        decode_body(&body)
    }

    pub(crate) fn call_bytes(&self, method: &str, url: &Url) -> ApiResult<Vec<u8>> {
        let response = self.call(method, url, &[], Payload::Empty)?;
        let mut out = Vec::new();
        response.into_reader().read_to_end(&mut out).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read response body")
                .with_source(err)
        })?;
        Ok(out)
    }
}

fn agent_builder(config: &ClientConfig) -> ureq::AgentBuilder {
    let builder = ureq::AgentBuilder::new();
    match config.timeout() {
        Some(timeout) => builder.timeout(timeout),
        None => builder,
    }
}

pub(crate) fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("project url cannot be a base"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn append_query<'a>(url: &mut Url, pairs: impl Iterator<Item = (&'a str, &'a str)>) {
    let mut pairs = pairs.peekable();
    if pairs.peek().is_none() {
        return;
    }
    let mut query = url.query_pairs_mut();
    for (name, value) in pairs {
        query.append_pair(name, value);
    }
}

pub(crate) fn decode_body(body: &str) -> ApiResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    decode(body).map_err(|err| Error::from(err).with_hint("The response body is not valid JSON."))
}

fn read_text(response: ureq::Response) -> ApiResult<String> {
    response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    let err = error_from_body(status, &body);
    tracing::warn!(status, message = err.message().unwrap_or(""), "request rejected");
    err
}

pub(crate) fn error_from_body(status: u16, body: &str) -> Error {
    let envelope = ErrorEnvelope::parse(body);
    let message = if envelope.is_empty() && body.trim().is_empty() {
        format!("remote error status {status}")
    } else {
        envelope.diagnostic(body)
    };
    let mut err = Error::new(error_kind_from_status(status))
        .with_status(status)
        .with_message(message);
    if let Some(code) = envelope.code {
        err = err.with_code(code);
    }
    if let Some(hint) = envelope.hint.or(envelope.details) {
        err = err.with_hint(hint);
    }
    err
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 422 => ErrorKind::Usage,
        401 | 403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        500..=599 => ErrorKind::Remote,
        _ => ErrorKind::Io,
    }
}
