//! # Task Manager Shared Library
//!
//! Domain types, persistence and authentication used by the task manager
//! API server.
//!
//! ## Module Organization
//!
//! - `models`: users and tasks, with their PostgreSQL queries
//! - `query`: the task filter/sort mini-language
//! - `store`: storage traits with PostgreSQL and in-memory implementations
//! - `auth`: password hashing, token issuance and request authentication
//! - `accessor`: owner-scoped task operations
//! - `validation`: rendering validation errors for clients
//! - `db`: connection pool and migrations

pub mod accessor;
pub mod auth;
pub mod db;
pub mod models;
pub mod query;
pub mod store;
pub mod validation;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
