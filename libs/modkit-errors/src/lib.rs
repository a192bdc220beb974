//! Catalog-driven Problem building.
//!
//! A module declares its error catalog as a table of [`ErrDef`]s; REST adapters
//! turn a definition plus a detail message into an RFC 9457 problem.
use http::StatusCode;
use modkit::api::problem::{Problem, ProblemResponse};

/// Prefix of every catalog problem `type`; the code is appended.
pub const ERROR_TYPE_BASE: &str = "https://errors.sensus-app.com/";

/// One catalog entry. Build with [`err_def!`] so the type URL is derived from the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        Problem::new(self.status_code(), self.title, detail)
            .with_code(self.code)
            .with_type(self.type_url)
    }

    /// Problem bound to the request path and the caller's trace id.
    pub fn to_response(
        &self,
        detail: impl Into<String>,
        instance: &str,
        trace_id: Option<String>,
    ) -> ProblemResponse {
        ProblemResponse(
            self.to_problem(detail)
                .with_instance(instance)
                .with_trace_id(trace_id),
        )
    }
}

#[macro_export]
macro_rules! err_def {
    ($status:expr, $title:expr, $code:literal) => {
        $crate::ErrDef {
            status: $status,
            title: $title,
            code: $code,
            type_url: concat!("https://errors.sensus-app.com/", $code),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: ErrDef = err_def!(404, "Not Found", "test.thing.not_found.v1");

    #[test]
    fn type_url_is_base_plus_code() {
        assert_eq!(MISSING.type_url, format!("{ERROR_TYPE_BASE}{}", MISSING.code));
    }

    #[test]
    fn problem_carries_catalog_fields() {
        let problem = MISSING.to_problem("Resource missing");
        assert_eq!(problem.status, 404);
        assert_eq!(problem.title, "Not Found");
        assert_eq!(problem.detail, "Resource missing");
        assert_eq!(problem.code, "test.thing.not_found.v1");
    }

    #[test]
    fn response_binds_instance_and_trace() {
        let resp = MISSING.to_response("gone", "/user/Jordan", Some("7".into()));
        assert_eq!(resp.0.instance, "/user/Jordan");
        assert_eq!(resp.0.trace_id.as_deref(), Some("7"));

        let resp = MISSING.to_response("gone", "/user/Jordan", None);
        assert!(resp.0.trace_id.is_none());
    }

    #[test]
    fn out_of_range_status_falls_back_to_500() {
        let odd = ErrDef { status: 42, ..MISSING };
        assert_eq!(odd.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
