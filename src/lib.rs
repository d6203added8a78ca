//! Purpose: Shared library crate used by the `basalt` CLI, tests and calling services.
//! Exports: `core` (value model, codec, query builder, errors) and `api` (REST client).
//! Role: One codec + query-builder implementation injected into every service.
//! Invariants: `core` is pure and synchronous; it performs no I/O and never logs.
//! Invariants: Network access, configuration and logging live in `api` and the binary.
pub mod api;
pub mod core;
