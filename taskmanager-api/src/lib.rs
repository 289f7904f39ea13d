//! # Task Manager API Server Library
//!
//! HTTP layer of the task manager: routing, authentication, version
//! negotiation and response rendering.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers and API version negotiation
//! - `presenter`: v1 and v2 response shapes
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod presenter;
pub mod routes;
