/// Middleware modules for the API server
///
/// - `security`: security response headers
/// - `version`: `Accept`-header API version negotiation

pub mod security;
pub mod version;
