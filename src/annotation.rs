//! Annotation records attached to definitions.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{DiError, DiResult};

/// Predicate over a single annotation record.
pub type AnnotationPredicate = Arc<dyn Fn(&Annotation) -> bool + Send + Sync>;

/// Metadata record attached to a definition: a name tag plus an optional
/// typed payload.
///
/// Predicates match on the name; payloads are read back with
/// [`payload`](Self::payload).
///
/// # Examples
///
/// ```rust
/// use blueprint_di::Annotation;
///
/// let route = Annotation::with_payload("route", "/users".to_string());
/// assert_eq!(route.name(), "route");
/// assert_eq!(route.payload::<String>().map(String::as_str), Some("/users"));
/// assert!(route.payload::<u32>().is_none());
///
/// assert!(Annotation::try_new("").is_err());
/// ```
#[derive(Clone)]
pub struct Annotation {
    name: Arc<str>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl Annotation {
    /// Annotation without payload.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn new(name: impl AsRef<str>) -> Self {
        match Self::try_new(name) {
            Ok(annotation) => annotation,
            Err(error) => panic!("{}", error),
        }
    }

    /// Fallible form of [`new`](Self::new).
    pub fn try_new(name: impl AsRef<str>) -> DiResult<Self> {
        let name = name.as_ref();
        if name.trim().is_empty() {
            return Err(DiError::InvalidAnnotation(
                "annotation name has to be a non-empty string".to_string(),
            ));
        }
        Ok(Annotation { name: Arc::from(name), payload: None })
    }

    /// Annotation carrying `payload`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn with_payload<T: Send + Sync + 'static>(name: impl AsRef<str>, payload: T) -> Self {
        let mut annotation = Self::new(name);
        annotation.payload = Some(Arc::new(payload));
        annotation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is(&self, name: &str) -> bool {
        &*self.name == name
    }

    /// Payload downcast to `T`, if present and of that type.
    pub fn payload<T: 'static>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && match (&self.payload, &other.payload) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotation")
            .field("name", &self.name)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

impl From<&str> for Annotation {
    fn from(name: &str) -> Self {
        Annotation::new(name)
    }
}

impl From<String> for Annotation {
    fn from(name: String) -> Self {
        Annotation::new(name)
    }
}

/// Predicate matching annotations named `name`.
pub fn named(name: impl Into<String>) -> impl Fn(&Annotation) -> bool + Send + Sync + Clone + 'static {
    let name = name.into();
    move |annotation: &Annotation| annotation.is(&name)
}

/// Typed factory for one kind of annotation.
///
/// Pairs an annotation name with the payload type it carries, so producers and
/// consumers (usually a middleware) agree on both.
///
/// ```rust
/// use blueprint_di::AnnotationKind;
///
/// const ROUTE: AnnotationKind<String> = AnnotationKind::new("route");
///
/// let annotation = ROUTE.create("/health".to_string());
/// assert!((ROUTE.predicate())(&annotation));
/// assert_eq!(ROUTE.payload_of(&annotation).map(String::as_str), Some("/health"));
/// ```
pub struct AnnotationKind<T> {
    name: &'static str,
    _payload: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> AnnotationKind<T> {
    pub const fn new(name: &'static str) -> Self {
        AnnotationKind { name, _payload: PhantomData }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn create(&self, payload: T) -> Annotation {
        Annotation::with_payload(self.name, payload)
    }

    pub fn predicate(&self) -> impl Fn(&Annotation) -> bool + Send + Sync + Clone + 'static {
        let name = self.name;
        move |annotation: &Annotation| annotation.is(name) && annotation.payload::<T>().is_some()
    }

    /// Like [`predicate`](Self::predicate), additionally testing the payload.
    pub fn and_predicate<P>(&self, extra: P) -> impl Fn(&Annotation) -> bool + Send + Sync + Clone + 'static
    where
        P: Fn(&T) -> bool + Send + Sync + Clone + 'static,
    {
        let name = self.name;
        move |annotation: &Annotation| {
            annotation.is(name) && annotation.payload::<T>().map(|p| extra(p)).unwrap_or(false)
        }
    }

    pub fn payload_of<'a>(&self, annotation: &'a Annotation) -> Option<&'a T> {
        if annotation.is(self.name) {
            annotation.payload::<T>()
        } else {
            None
        }
    }
}

impl<T> Clone for AnnotationKind<T> {
    fn clone(&self) -> Self {
        AnnotationKind { name: self.name, _payload: PhantomData }
    }
}

impl<T> Copy for AnnotationKind<T> {}

impl<T> fmt::Debug for AnnotationKind<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnnotationKind").field(&self.name).finish()
    }
}
