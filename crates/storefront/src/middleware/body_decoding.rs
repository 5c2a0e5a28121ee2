//! Body decoding stage.
//!
//! Buffers JSON and URL-encoded bodies up to the configured limit, decodes
//! them together with the `Cookie` header, and stores the result as a
//! [`RequestContext`] in the request extensions. The buffered bytes are put
//! back so handlers can still use axum's own extractors. Other content types
//! are streamed through untouched.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Method, header::CONTENT_TYPE, request::Parts},
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::body::{self, BodyError, Cookies, DecodedBody, MediaType};
use crate::error::AppError;
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

/// Per-request view shared by every downstream handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: DecodedBody,
    pub cookies: Cookies,
    pub request_id: Option<RequestId>,
}

/// Decode the request body and cookies into a [`RequestContext`].
///
/// # Errors
///
/// Fails with `AppError::MalformedBody` when the body does not parse for its
/// declared content type, and `AppError::PayloadTooLarge` past the limit.
pub async fn body_decoding_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let media_type = MediaType::from_content_type(
        parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
    );

    let (decoded, body) = if media_type.is_decoded() {
        let bytes = read_limited(body, state.config().body_limit).await?;
        let decoded = body::decode(media_type, &bytes)?;
        (decoded, Body::from(bytes))
    } else {
        (DecodedBody::Unparsed, body)
    };

    let context = RequestContext {
        method: parts.method.clone(),
        path: parts.uri.path().to_owned(),
        headers: parts.headers.clone(),
        body: decoded,
        cookies: Cookies::from_headers(&parts.headers),
        request_id: parts.extensions.get::<RequestId>().cloned(),
    };

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

async fn read_limited(body: Body, limit: usize) -> Result<Bytes, AppError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(AppError::PayloadTooLarge { limit })
        }
        Err(err) => Err(BodyError::Read(err.to_string()).into()),
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            tracing::warn!("RequestContext missing - body decoding stage is not installed");
            AppError::Internal("request context unavailable".to_string())
        })
    }
}
