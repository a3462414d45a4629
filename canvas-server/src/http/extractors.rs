//! Connection guard middleware and the extractor that reads its result

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use super::error::ApiError;
use super::server::AppState;
use crate::connection::StoreHandle;

/// Store handle placed in request extensions by [`require_connection`]
#[derive(Clone)]
pub struct ConnectedStore(pub StoreHandle);

/// Acquire the store connection before the route runs.
///
/// On failure the request is answered with a 500 and the handler is never
/// invoked.
pub async fn require_connection(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let store = state.connections.acquire().await?;
    req.extensions_mut().insert(ConnectedStore(store));
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for ConnectedStore
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ConnectedStore>()
            .cloned()
            .ok_or_else(|| ApiError::Internal {
                message: "route reached without the connection guard".into(),
            })
    }
}
