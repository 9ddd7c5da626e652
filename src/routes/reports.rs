use axum::{Json, extract::State};
use serde::Deserialize;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::pipeline::fetch_report;
use crate::pipeline::orchestrator::ReportRequest;

#[derive(Debug, Deserialize)]
pub struct CreateReportBody {
    pub company: String,
}

pub async fn create_report(
    State(state): State<AppState>,
    Json(body): Json<CreateReportBody>,
) -> AppResult<Json<serde_json::Value>> {
    let company = body.company.trim();
    if company.is_empty() {
        return Err(AppError::Validation("company must not be empty".into()));
    }

    let request = ReportRequest {
        company: company.to_string(),
    };

    let generated = fetch_report(&state.config, &state.llm_client, &request).await?;

    Ok(Json(serde_json::to_value(generated).unwrap()))
}
