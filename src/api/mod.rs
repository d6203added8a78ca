//! Purpose: Define the public Rust API boundary for talking to a project.
//! Exports: `RestClient`, `ClientConfig`, auth/storage records, and the codec types callers need.
//! Role: Additive-only surface used by the CLI and calling services.
//! Invariants: Transport plumbing (`Payload`, raw calls) stays private to this module.
//! Invariants: Every service method goes through the shared `RestClient` transport.

mod auth;
mod config;
mod database;
mod remote;
mod storage;

pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::query::{Filter, QueryParams, QuerySpec};
pub use crate::core::value::{Map, Number, Value};
pub use auth::{Session, SignUp, User};
pub use config::{
    ClientConfig, ENV_ACCESS_TOKEN, ENV_API_KEY, ENV_SCHEMA, ENV_TIMEOUT_MS, ENV_URL,
};
pub use remote::RestClient;
pub use storage::StorageObject;
