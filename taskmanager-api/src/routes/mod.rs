/// API route handlers
///
/// Organized by resource:
///
/// - `health`: health check
/// - `tasks`: task CRUD for the authenticated user
/// - `users`: registration and account self-service
/// - `sessions`: login and logout

pub mod health;
pub mod sessions;
pub mod tasks;
pub mod users;
