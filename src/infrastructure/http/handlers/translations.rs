//! 翻译端点

use axum::extract::State;
use axum::Json;

use crate::infrastructure::http::dto::{TranslationRequestBody, TranslationResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn translate(
    State(state): State<AppState>,
    Json(body): Json<TranslationRequestBody>,
) -> Result<Json<TranslationResponse>, ApiError> {
    let cache = state.translator.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Translation service is not configured".to_string())
    })?;

    let translation = cache
        .translate(
            &body.text,
            body.target_language,
            body.source_language,
            &body.context_keys,
        )
        .await?;
    Ok(Json(translation.into()))
}
