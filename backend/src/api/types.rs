//! REST API types.
//!
//! Successful clean/merge calls answer with the workbook itself; everything
//! else is JSON.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::{PipelineError, ServerError};
use crate::transform::pipeline::ReportSummary;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// `/split` answer: category name to download URL.
pub type SplitLinks = BTreeMap<String, String>;

/// Summary headers attached to workbook downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeaders {
    pub data_rows: usize,
    pub groups: usize,
    pub grand_total: String,
}

impl From<&ReportSummary> for ReportHeaders {
    fn from(summary: &ReportSummary) -> Self {
        Self {
            data_rows: summary.data_rows,
            groups: summary.groups,
            grand_total: format!("{:.2}", summary.grand_total),
        }
    }
}

/// Workbook download response.
pub fn xlsx_attachment(filename: &str, bytes: Vec<u8>, summary: &ReportSummary) -> Response {
    let headers = ReportHeaders::from(summary);
    (
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename={}", filename)),
        ],
        [
            ("x-report-rows", headers.data_rows.to_string()),
            ("x-report-groups", headers.groups.to_string()),
            ("x-report-total", headers.grand_total),
        ],
        bytes,
    )
        .into_response()
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Export(_)) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status(), Json(error_response(&self.to_string()))).into_response()
    }
}
