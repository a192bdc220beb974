use modkit::api::problem::ProblemResponse;
use tracing::error;

use crate::domain::error::DomainError;
use crate::errors::ErrorCode;

fn current_trace_id() -> Option<String> {
    tracing::Span::current()
        .id()
        .map(|id| id.into_u64().to_string())
}

/// Build a catalog problem bound to the request path.
pub fn from_parts(code: ErrorCode, detail: impl Into<String>, instance: &str) -> ProblemResponse {
    code.to_response(detail, instance, current_trace_id())
}

/// Validation problem with a JSON pointer to the offending field.
pub fn validation(field: &str, detail: impl Into<String>, instance: &str) -> ProblemResponse {
    let detail = detail.into();
    let pointer = format!("/{}", field.replace('.', "/"));
    let problem = ErrorCode::user_records_validation_v1
        .to_problem(detail.clone())
        .with_instance(instance)
        .with_trace_id(current_trace_id())
        .with_field_error(pointer, detail);
    ProblemResponse(problem)
}

/// Map a domain error to an RFC 9457 response.
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { user_id } => from_parts(
            ErrorCode::user_records_user_not_found_v1,
            format!("User '{user_id}' not found"),
            instance,
        ),
        DomainError::ScreenshotNotFound { user_id } => from_parts(
            ErrorCode::user_records_screenshot_not_found_v1,
            format!("No screenshot stored for user '{user_id}'"),
            instance,
        ),
        DomainError::InvalidAssetFormat { reason } => from_parts(
            ErrorCode::user_records_asset_invalid_format_v1,
            reason.clone(),
            instance,
        ),
        DomainError::Validation { field, message } => {
            validation(field, format!("{field}: {message}"), instance)
        }
        DomainError::Storage { message } => {
            // Details stay in the log; clients get a generic message.
            error!(error = %message, "storage failure");
            from_parts(
                ErrorCode::user_records_storage_failure_v1,
                "An internal storage error occurred",
                instance,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let resp = map_domain_error(&DomainError::user_not_found("Jordan"), "/user/Jordan");
        assert_eq!(resp.0.status, 404);
        assert_eq!(resp.0.code, "user_records.user.not_found.v1");
        assert_eq!(resp.0.instance, "/user/Jordan");
    }

    #[test]
    fn validation_carries_pointer() {
        let resp = map_domain_error(
            &DomainError::validation("subscription.endpoint", "invalid URL"),
            "/push/subscribe/Jordan",
        );
        assert_eq!(resp.0.status, 400);
        let errors = resp.0.errors.unwrap();
        assert_eq!(errors[0].pointer, "/subscription/endpoint");
    }

    #[test]
    fn storage_detail_is_not_leaked() {
        let resp = map_domain_error(
            &DomainError::storage("disk I/O error at /var/lib/sensus"),
            "/data_peek/Jordan",
        );
        assert_eq!(resp.0.status, 500);
        assert!(!resp.0.detail.contains("/var/lib"));
    }
}
