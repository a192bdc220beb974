//! Error catalog for the user_records module.
//!
//! Codes are stable API: clients match on `code`, never on `detail`.

use modkit::api::problem::{Problem, ProblemResponse};
use modkit_errors::{err_def, ErrDef};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    user_records_user_not_found_v1,
    user_records_screenshot_not_found_v1,
    user_records_asset_invalid_format_v1,
    user_records_validation_v1,
    user_records_push_not_configured_v1,
    user_records_storage_failure_v1,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        ErrorCode::user_records_user_not_found_v1,
        ErrorCode::user_records_screenshot_not_found_v1,
        ErrorCode::user_records_asset_invalid_format_v1,
        ErrorCode::user_records_validation_v1,
        ErrorCode::user_records_push_not_configured_v1,
        ErrorCode::user_records_storage_failure_v1,
    ];

    pub const fn def(&self) -> ErrDef {
        match self {
            ErrorCode::user_records_user_not_found_v1 => {
                err_def!(404, "User Not Found", "user_records.user.not_found.v1")
            }
            ErrorCode::user_records_screenshot_not_found_v1 => {
                err_def!(404, "Screenshot Not Found", "user_records.screenshot.not_found.v1")
            }
            ErrorCode::user_records_asset_invalid_format_v1 => {
                err_def!(415, "Invalid Screenshot", "user_records.asset.invalid_format.v1")
            }
            ErrorCode::user_records_validation_v1 => {
                err_def!(400, "Validation Failed", "user_records.validation.v1")
            }
            ErrorCode::user_records_push_not_configured_v1 => {
                err_def!(404, "Push Not Configured", "user_records.push.not_configured.v1")
            }
            ErrorCode::user_records_storage_failure_v1 => {
                err_def!(500, "Storage Failure", "user_records.storage.failure.v1")
            }
        }
    }

    pub fn status(&self) -> u16 {
        self.def().status
    }

    pub fn code(&self) -> &'static str {
        self.def().code
    }

    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        self.def().to_problem(detail)
    }

    pub fn to_response(
        &self,
        detail: impl Into<String>,
        instance: &str,
        trace_id: Option<String>,
    ) -> ProblemResponse {
        self.def().to_response(detail, instance, trace_id)
    }
}
