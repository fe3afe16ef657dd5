//! Search strategies over a container's definitions.

use std::fmt;
use std::sync::Arc;

use crate::annotation::{Annotation, AnnotationPredicate};
use crate::container::Container;
use crate::definition::Definition;
use crate::key::ServiceName;
use crate::type_ref::TypeRef;

/// Predicate over a definition.
pub type DefinitionPredicate = Arc<dyn Fn(&Definition) -> bool + Send + Sync>;

/// Strategy for finding definitions in a container and its ancestors.
///
/// ```rust
/// use blueprint_di::{Container, Definition, Lookup};
///
/// let container = Container::new();
/// container.register_definition(Definition::new("db").use_value(1u8)).unwrap();
/// container.register_definition(Definition::new("cache").use_value(2u8).annotate("fast")).unwrap();
///
/// assert_eq!(Lookup::by_name("db").find(&container).len(), 1);
/// assert_eq!(Lookup::by_annotation(|a| a.is("fast")).find(&container).len(), 1);
/// assert!(Lookup::by_name("queue").find(&container).is_empty());
/// assert_eq!(Lookup::by_name("db").to_string(), "by service name: db");
/// ```
#[derive(Clone)]
pub enum Lookup {
    ByName(ServiceName),
    ByPredicate(DefinitionPredicate),
    ByAnnotation(AnnotationPredicate),
    ByType(TypeRef),
}

impl Lookup {
    pub fn by_name(name: impl Into<ServiceName>) -> Self {
        Lookup::ByName(name.into())
    }

    pub fn by_predicate<P>(predicate: P) -> Self
    where
        P: Fn(&Definition) -> bool + Send + Sync + 'static,
    {
        Lookup::ByPredicate(Arc::new(predicate))
    }

    pub fn by_annotation<P>(predicate: P) -> Self
    where
        P: Fn(&Annotation) -> bool + Send + Sync + 'static,
    {
        Lookup::ByAnnotation(Arc::new(predicate))
    }

    pub fn by_type(type_ref: TypeRef) -> Self {
        Lookup::ByType(type_ref)
    }

    /// Matching definitions, local ones first.
    pub fn find(&self, container: &Container) -> Vec<Definition> {
        match self {
            Lookup::ByName(name) => container.find_by_name(name.as_str()).into_iter().collect(),
            Lookup::ByPredicate(predicate) => container.find_by_predicate(|definition| predicate(definition)),
            Lookup::ByAnnotation(predicate) => container.find_by_annotation(|annotation| predicate(annotation)),
            Lookup::ByType(type_ref) => container.find_by_predicate(|definition| type_ref.matches_definition(definition)),
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::ByName(name) => write!(f, "by service name: {}", name),
            Lookup::ByPredicate(_) => f.write_str("by service predicate"),
            Lookup::ByAnnotation(_) => f.write_str("by annotation predicate"),
            Lookup::ByType(type_ref) => write!(f, "by type: {}", type_ref),
        }
    }
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lookup({})", self)
    }
}
