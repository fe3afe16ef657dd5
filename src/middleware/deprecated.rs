//! Deprecation notices for services.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::annotation::{Annotation, AnnotationKind};
use crate::definition::Definition;
use crate::error::DiResult;
use crate::middleware::{Middleware, Next};
use crate::registration::AnyArc;

/// Payload of the `deprecated` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationNote(pub String);

/// Annotation kind marking deprecated services.
pub const DEPRECATED: AnnotationKind<DeprecationNote> = AnnotationKind::new("deprecated");

/// Marks a service as deprecated with an explanatory `note`.
pub fn deprecated(note: impl Into<String>) -> Annotation {
    DEPRECATED.create(DeprecationNote(note.into()))
}

type Reporter = Arc<dyn Fn(&str) + Send + Sync>;

/// Reports deprecated services when a container constructs them.
///
/// The message reads `Service <name> is deprecated: <notes>`, notes joined
/// with `", "`. By default it is emitted with `tracing::warn!`.
#[derive(Clone, Default)]
pub struct DeprecatedMiddleware {
    reporter: Option<Reporter>,
}

impl DeprecatedMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends messages to `reporter` instead of `tracing`.
    pub fn with_reporter<F>(reporter: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self { reporter: Some(Arc::new(reporter)) }
    }

    fn report(&self, message: &str) {
        match &self.reporter {
            Some(reporter) => reporter(message),
            None => tracing::warn!("{}", message),
        }
    }
}

#[async_trait]
impl Middleware for DeprecatedMiddleware {
    async fn handle(&self, definition: Definition, next: Next) -> DiResult<AnyArc> {
        let notes: Vec<String> = definition
            .annotations()
            .iter()
            .filter_map(|annotation| DEPRECATED.payload_of(annotation))
            .map(|note| note.0.clone())
            .collect();
        if !notes.is_empty() {
            self.report(&format!("Service {} is deprecated: {}", definition.name(), notes.join(", ")));
        }
        next.run(definition).await
    }
}

impl fmt::Debug for DeprecatedMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeprecatedMiddleware")
            .field("custom_reporter", &self.reporter.is_some())
            .finish()
    }
}
