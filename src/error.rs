//! Error types for the dependency resolution engine.

use std::fmt;
use std::sync::Arc;

use crate::key::ServiceName;

/// Stable, machine-checkable identifier for every [`DiError`] variant.
///
/// The string form (`SERVICE_NOT_FOUND`, ...) and the numeric form never change
/// between releases, so callers can match on them across process boundaries.
///
/// # Examples
///
/// ```rust
/// use blueprint_di::{DiError, ErrorCode, ServiceName};
///
/// let error = DiError::ServiceNotFound(ServiceName::from("mailer"));
/// assert_eq!(error.code(), ErrorCode::ServiceNotFound);
/// assert_eq!(error.code().as_str(), "SERVICE_NOT_FOUND");
/// assert_eq!(error.code().number(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ServiceNotFound,
    AmbiguousService,
    NoMatchingService,
    CircularDependencyDetected,
    IncompleteDefinition,
    TypeMismatch,
    InvalidAnnotation,
    MissingConfigValue,
    AlreadyDefined,
    ReservedType,
    InvalidConfigRequest,
    ConfigProviderNotAttached,
    OwnerCannotBeChanged,
    DefinitionWithoutContainer,
    ConstructionFailed,
}

impl ErrorCode {
    /// Upper snake case name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ServiceNotFound => "SERVICE_NOT_FOUND",
            ErrorCode::AmbiguousService => "AMBIGUOUS_SERVICE",
            ErrorCode::NoMatchingService => "NO_MATCHING_SERVICE",
            ErrorCode::CircularDependencyDetected => "CIRCULAR_DEPENDENCY_DETECTED",
            ErrorCode::IncompleteDefinition => "INCOMPLETE_DEFINITION",
            ErrorCode::TypeMismatch => "TYPE_MISMATCH",
            ErrorCode::InvalidAnnotation => "INVALID_ANNOTATION",
            ErrorCode::MissingConfigValue => "MISSING_CONFIG_VALUE",
            ErrorCode::AlreadyDefined => "ALREADY_DEFINED",
            ErrorCode::ReservedType => "RESERVED_TYPE",
            ErrorCode::InvalidConfigRequest => "INVALID_CONFIG_REQUEST",
            ErrorCode::ConfigProviderNotAttached => "CONFIG_PROVIDER_NOT_ATTACHED",
            ErrorCode::OwnerCannotBeChanged => "OWNER_CANNOT_BE_CHANGED",
            ErrorCode::DefinitionWithoutContainer => "DEFINITION_WITHOUT_CONTAINER",
            ErrorCode::ConstructionFailed => "CONSTRUCTION_FAILED",
        }
    }

    /// Numeric form of the code.
    pub fn number(&self) -> u16 {
        match self {
            ErrorCode::ServiceNotFound => 1,
            ErrorCode::AmbiguousService => 2,
            ErrorCode::NoMatchingService => 3,
            ErrorCode::CircularDependencyDetected => 4,
            ErrorCode::IncompleteDefinition => 5,
            ErrorCode::TypeMismatch => 6,
            ErrorCode::InvalidAnnotation => 7,
            ErrorCode::MissingConfigValue => 9,
            ErrorCode::AlreadyDefined => 10,
            ErrorCode::ReservedType => 11,
            ErrorCode::InvalidConfigRequest => 12,
            ErrorCode::ConfigProviderNotAttached => 13,
            ErrorCode::OwnerCannotBeChanged => 14,
            ErrorCode::DefinitionWithoutContainer => 15,
            ErrorCode::ConstructionFailed => 16,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dependency resolution errors
///
/// Every variant carries a human readable description and maps to a stable
/// [`ErrorCode`]. Errors are `Clone` because a single construction failure is
/// delivered to every caller awaiting the same shared future.
///
/// # Examples
///
/// ```rust
/// use blueprint_di::DiError;
///
/// let circular = DiError::CircularDependency {
///     path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
/// };
/// assert_eq!(circular.to_string(), "Circular dependency found: A -> B -> A");
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// Name absent in the whole scope chain
    #[error("Service \"{0}\" does not exist")]
    ServiceNotFound(ServiceName),
    /// A "one" reference matched more than one definition
    #[error("Multiple services found ({}) with following lookup: {lookup}", .names.join(", "))]
    AmbiguousService { names: Vec<String>, lookup: String },
    /// A "one" reference matched nothing
    #[error("No matching service for following lookup: {lookup}")]
    NoMatchingService { lookup: String },
    /// Cycle in the declared dependency graph (includes path)
    #[error("Circular dependency found: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },
    /// No construction strategy was set
    #[error("Missing factory for service definition \"{0}\". Define it as constructor, factory or value")]
    IncompleteDefinition(ServiceName),
    /// Downcast of a type-erased value failed
    #[error("Type mismatch: expected {expected} ({context})")]
    TypeMismatch { expected: &'static str, context: String },
    /// Annotation record is malformed
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),
    /// Config value absent and no default supplied
    #[error("Config at path \"{path}\" is not defined and default value is not provided")]
    MissingConfigValue { path: String },
    /// Duplicate name inside a single container
    #[error("Service \"{0}\" already defined")]
    AlreadyDefined(ServiceName),
    /// TypeRef requested for a universal type
    #[error("Type \"{0}\" is reserved and cannot be used as a type reference")]
    ReservedType(&'static str),
    /// Config request is malformed
    #[error("Invalid config request: {0}")]
    InvalidConfigRequest(String),
    /// No config provider anywhere in the scope chain
    #[error("Config provider not attached to container. You need to use config middleware first.")]
    ConfigProviderNotAttached,
    /// Definition already belongs to another container
    #[error("Owner of definition \"{0}\" cannot be changed. Make sure you are not using same definition in multiple containers")]
    OwnerCannotBeChanged(ServiceName),
    /// Alias invoked while the aliased definition has no live owner
    #[error("Cannot create service \"{0}\" due to lack of assigned container")]
    DefinitionWithoutContainer(ServiceName),
    /// A construction strategy failed
    #[error("Failed to construct service: {message}")]
    Construction {
        message: String,
        #[source]
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },
}

impl DiError {
    /// Stable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DiError::ServiceNotFound(_) => ErrorCode::ServiceNotFound,
            DiError::AmbiguousService { .. } => ErrorCode::AmbiguousService,
            DiError::NoMatchingService { .. } => ErrorCode::NoMatchingService,
            DiError::CircularDependency { .. } => ErrorCode::CircularDependencyDetected,
            DiError::IncompleteDefinition(_) => ErrorCode::IncompleteDefinition,
            DiError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            DiError::InvalidAnnotation(_) => ErrorCode::InvalidAnnotation,
            DiError::MissingConfigValue { .. } => ErrorCode::MissingConfigValue,
            DiError::AlreadyDefined(_) => ErrorCode::AlreadyDefined,
            DiError::ReservedType(_) => ErrorCode::ReservedType,
            DiError::InvalidConfigRequest(_) => ErrorCode::InvalidConfigRequest,
            DiError::ConfigProviderNotAttached => ErrorCode::ConfigProviderNotAttached,
            DiError::OwnerCannotBeChanged(_) => ErrorCode::OwnerCannotBeChanged,
            DiError::DefinitionWithoutContainer(_) => ErrorCode::DefinitionWithoutContainer,
            DiError::Construction { .. } => ErrorCode::ConstructionFailed,
        }
    }

    /// Wraps an arbitrary error raised by a factory or constructor.
    ///
    /// ```rust
    /// use blueprint_di::{DiError, ErrorCode};
    ///
    /// let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
    /// let error = DiError::construction(io);
    /// assert_eq!(error.code(), ErrorCode::ConstructionFailed);
    /// assert!(error.to_string().contains("socket closed"));
    /// ```
    pub fn construction<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DiError::Construction {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    /// Construction failure described only by a message.
    pub fn message(message: impl Into<String>) -> Self {
        DiError::Construction { message: message.into(), source: None }
    }

    /// Dependency path of a circular dependency error.
    pub fn circular_path(&self) -> Option<&[String]> {
        match self {
            DiError::CircularDependency { path } => Some(path),
            _ => None,
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
