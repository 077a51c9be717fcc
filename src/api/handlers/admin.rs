use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use std::sync::Arc;

use super::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::rating::EntityKind;

pub async fn admin_reconcile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    authorize(&headers, state.config.server.admin_token.as_deref())?;

    tokio::task::spawn_blocking(move || {
        log::info!("Admin triggered reconciliation started");
        for kind in EntityKind::ALL {
            if let Err(e) = state.aggregator.reconcile(kind) {
                log::error!("Reconciliation failed for {}: {}", kind, e);
                return;
            }
        }
        log::info!("Admin triggered reconciliation completed successfully");
    });

    Ok((StatusCode::ACCEPTED, "Reconciliation triggered"))
}

fn authorize(headers: &HeaderMap, token: Option<&str>) -> ApiResult<()> {
    let token = token.ok_or(ApiError::Unauthorized)?;
    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match provided {
        Some(p) if p == token => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authorize() {
        assert!(authorize(&headers("Bearer abc"), Some("abc")).is_ok());
        assert!(authorize(&headers("Bearer abd"), Some("abc")).is_err());
        assert!(authorize(&headers("abc"), Some("abc")).is_err());
        assert!(authorize(&HeaderMap::new(), Some("abc")).is_err());
        assert!(authorize(&headers("Bearer abc"), None).is_err());
    }
}
