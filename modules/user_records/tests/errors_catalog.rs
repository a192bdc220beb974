use std::collections::HashSet;

use user_records::errors::ErrorCode;

#[test]
fn codes_are_unique_and_versioned() {
    let mut seen = HashSet::new();
    for ec in ErrorCode::ALL {
        let code = ec.code();
        assert!(seen.insert(code), "duplicate code {code}");
        assert!(code.starts_with("user_records."), "{code}");
        assert!(code.ends_with(".v1"), "{code}");
    }
}

#[test]
fn type_url_is_derived_from_code() {
    for ec in ErrorCode::ALL {
        let def = ec.def();
        assert!(def.type_url.ends_with(def.code));
        assert!(def.type_url.starts_with(modkit_errors::ERROR_TYPE_BASE));
    }
}

#[test]
fn statuses_match_semantics() {
    assert_eq!(ErrorCode::user_records_user_not_found_v1.status(), 404);
    assert_eq!(ErrorCode::user_records_screenshot_not_found_v1.status(), 404);
    assert_eq!(ErrorCode::user_records_asset_invalid_format_v1.status(), 415);
    assert_eq!(ErrorCode::user_records_validation_v1.status(), 400);
    assert_eq!(ErrorCode::user_records_storage_failure_v1.status(), 500);
}

#[test]
fn problem_carries_catalog_fields() {
    let p = ErrorCode::user_records_validation_v1.to_problem("user_id: must not be empty");
    assert_eq!(p.status, 400);
    assert_eq!(p.title, "Validation Failed");
    assert_eq!(p.code, "user_records.validation.v1");
    assert_eq!(p.detail, "user_id: must not be empty");
}
