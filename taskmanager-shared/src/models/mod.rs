/// Database models for the task manager
///
/// # Models
///
/// - `user`: User accounts, password hashes and auth tokens
/// - `task`: Tasks owned by users, plus payload validation
///
/// Handlers never call these directly; they go through the store traits in
/// [`crate::store`], which wrap these queries for PostgreSQL.

pub mod task;
pub mod user;
