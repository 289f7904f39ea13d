/// API version negotiation
///
/// Clients pick a wire format with a vendor media type in the `Accept`
/// header:
///
/// ```text
/// Accept: application/vnd.taskmanager.v1   -> flat JSON
/// Accept: application/vnd.taskmanager.v2   -> JSON:API documents
/// ```
///
/// Anything else, including a missing header, selects v2.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;

const V1_MEDIA_TYPE: &str = "application/vnd.taskmanager.v1";
const V2_MEDIA_TYPE: &str = "application/vnd.taskmanager.v2";

/// Negotiated response format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    V1,
    #[default]
    V2,
}

impl ApiVersion {
    /// Picks the version named in the `Accept` header
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let accepts = headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(|v| v.split(';').next().unwrap_or_default().trim());

        for media_type in accepts {
            if media_type.eq_ignore_ascii_case(V1_MEDIA_TYPE) {
                return ApiVersion::V1;
            }
            if media_type.eq_ignore_ascii_case(V2_MEDIA_TYPE) {
                return ApiVersion::V2;
            }
        }

        ApiVersion::default()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ApiVersion
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ApiVersion::from_headers(&parts.headers))
    }
}
