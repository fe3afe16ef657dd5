/// Unit tests for DiError, ErrorCode and DiResult
use blueprint_di::{DiError, DiResult, ErrorCode, ServiceName};
use std::error::Error;

#[test]
fn test_error_display_service_not_found() {
    let error = DiError::ServiceNotFound(ServiceName::from("mailer"));
    assert_eq!(error.to_string(), "Service \"mailer\" does not exist");
    assert_eq!(error.code(), ErrorCode::ServiceNotFound);
}

#[test]
fn test_error_display_ambiguous() {
    let error = DiError::AmbiguousService {
        names: vec!["a".into(), "b".into()],
        lookup: "by service predicate".into(),
    };
    assert_eq!(
        error.to_string(),
        "Multiple services found (a, b) with following lookup: by service predicate"
    );
}

#[test]
fn test_error_display_circular() {
    let error = DiError::CircularDependency {
        path: vec!["ServiceA".into(), "ServiceB".into(), "ServiceA".into()],
    };
    assert_eq!(error.to_string(), "Circular dependency found: ServiceA -> ServiceB -> ServiceA");
    assert_eq!(error.circular_path().unwrap().len(), 3);
    assert!(DiError::ConfigProviderNotAttached.circular_path().is_none());
}

#[test]
fn test_error_display_config() {
    let missing = DiError::MissingConfigValue { path: "db.url".into() };
    assert_eq!(
        missing.to_string(),
        "Config at path \"db.url\" is not defined and default value is not provided"
    );
    assert!(DiError::ConfigProviderNotAttached
        .to_string()
        .starts_with("Config provider not attached"));
}

#[test]
fn test_error_codes_are_stable() {
    let cases = [
        (ErrorCode::ServiceNotFound, "SERVICE_NOT_FOUND", 1),
        (ErrorCode::AmbiguousService, "AMBIGUOUS_SERVICE", 2),
        (ErrorCode::NoMatchingService, "NO_MATCHING_SERVICE", 3),
        (ErrorCode::CircularDependencyDetected, "CIRCULAR_DEPENDENCY_DETECTED", 4),
        (ErrorCode::IncompleteDefinition, "INCOMPLETE_DEFINITION", 5),
        (ErrorCode::MissingConfigValue, "MISSING_CONFIG_VALUE", 9),
        (ErrorCode::AlreadyDefined, "ALREADY_DEFINED", 10),
        (ErrorCode::ConfigProviderNotAttached, "CONFIG_PROVIDER_NOT_ATTACHED", 13),
        (ErrorCode::OwnerCannotBeChanged, "OWNER_CANNOT_BE_CHANGED", 14),
        (ErrorCode::DefinitionWithoutContainer, "DEFINITION_WITHOUT_CONTAINER", 15),
    ];

    for (code, name, number) in cases {
        assert_eq!(code.as_str(), name);
        assert_eq!(code.to_string(), name);
        assert_eq!(code.number(), number);
    }
}

#[test]
fn test_construction_error_keeps_source() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
    let error = DiError::construction(io);

    assert_eq!(error.code(), ErrorCode::ConstructionFailed);
    assert_eq!(error.to_string(), "Failed to construct service: config.toml missing");
    assert!(error.source().is_some());

    let plain = DiError::message("boom");
    assert!(plain.source().is_none());
}

#[test]
fn test_error_clone_preserves_display() {
    let error = DiError::AlreadyDefined(ServiceName::from("dup"));
    let cloned = error.clone();
    assert_eq!(error.to_string(), cloned.to_string());
    assert_eq!(cloned.code(), ErrorCode::AlreadyDefined);
}

#[test]
fn test_di_result_with_question_mark() {
    fn inner(fail: bool) -> DiResult<u8> {
        if fail {
            Err(DiError::ConfigProviderNotAttached)
        } else {
            Ok(1)
        }
    }

    fn outer(fail: bool) -> DiResult<u8> {
        Ok(inner(fail)? + 1)
    }

    assert_eq!(outer(false).unwrap(), 2);
    assert_eq!(outer(true).unwrap_err().code(), ErrorCode::ConfigProviderNotAttached);
}
