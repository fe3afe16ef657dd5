//! Type references used to mark and look up definitions by produced type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::definition::{Definition, ErasedFactory};
use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::registration::{AnyArc, ServiceFuture};

/// Types that would match everything and are therefore refused.
fn reserved_keys() -> [TypeKey; 7] {
    [
        TypeKey::of::<dyn Any>(),
        TypeKey::of::<dyn Any + Send>(),
        TypeKey::of::<dyn Any + Send + Sync>(),
        TypeKey::of::<AnyArc>(),
        TypeKey::of::<()>(),
        TypeKey::of::<ErasedFactory>(),
        TypeKey::of::<ServiceFuture>(),
    ]
}

/// Identity of a produced type plus the supertypes it declares.
///
/// "Is a subtype of" is an explicit declaration: a `TypeRef` for
/// `PostgresPool` that declares `dyn Pool` as a supertype is matched by a
/// `TypeRef` for `dyn Pool`.
/// Declarations are flat; a grand-parent must be declared directly.
///
/// # Examples
///
/// ```rust
/// use blueprint_di::TypeRef;
///
/// trait Pool: Send + Sync {}
/// struct PostgresPool;
/// struct Cache;
///
/// let pool = TypeRef::new::<dyn Pool>().unwrap();
/// let postgres = TypeRef::new::<PostgresPool>().unwrap().extends::<dyn Pool>();
/// let cache = TypeRef::new::<Cache>().unwrap();
///
/// assert!(pool.matches(&postgres));
/// assert!(postgres.matches(&postgres));
/// assert!(!pool.matches(&cache));
/// assert!(!postgres.matches(&pool));
///
/// assert!(TypeRef::new::<()>().is_err());
/// ```
#[derive(Clone)]
pub struct TypeRef {
    target: TypeKey,
    supertypes: Arc<[TypeKey]>,
}

impl TypeRef {
    /// Reference to `T`, refused for reserved universal types.
    pub fn new<T: ?Sized + 'static>() -> DiResult<Self> {
        Self::from_key(TypeKey::of::<T>())
    }

    /// Reference to `T`, or `None` when `T` is reserved.
    pub fn try_of<T: ?Sized + 'static>() -> Option<Self> {
        Self::new::<T>().ok()
    }

    /// Reference to an already computed key.
    pub fn from_key(key: TypeKey) -> DiResult<Self> {
        if !Self::is_allowed(&key) {
            return Err(DiError::ReservedType(key.name()));
        }
        Ok(TypeRef {
            target: key,
            supertypes: Arc::from(Vec::new()),
        })
    }

    /// Whether a `TypeRef` may be built for `key`.
    pub fn is_allowed(key: &TypeKey) -> bool {
        !reserved_keys().contains(key)
    }

    /// Declares `U` as a supertype of the referenced type.
    pub fn extends<U: ?Sized + 'static>(self) -> Self {
        self.with_supertype(TypeKey::of::<U>())
    }

    /// Declares `key` as a supertype of the referenced type.
    pub fn with_supertype(self, key: TypeKey) -> Self {
        if key == self.target || self.supertypes.contains(&key) {
            return self;
        }
        let mut supertypes = self.supertypes.to_vec();
        supertypes.push(key);
        TypeRef {
            target: self.target,
            supertypes: Arc::from(supertypes),
        }
    }

    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn supertypes(&self) -> &[TypeKey] {
        &self.supertypes
    }

    /// True if `other` is the same type or declares this type as a supertype.
    pub fn matches(&self, other: &TypeRef) -> bool {
        other.target == self.target || other.supertypes.contains(&self.target)
    }

    /// True if `definition` carries a type marker this reference matches.
    pub fn matches_definition(&self, definition: &Definition) -> bool {
        definition
            .type_ref()
            .map(|marker| self.matches(&marker))
            .unwrap_or(false)
    }

    /// Definition predicate form of [`matches_definition`](Self::matches_definition).
    pub fn predicate(&self) -> impl Fn(&Definition) -> bool + Send + Sync + Clone + 'static {
        let type_ref = self.clone();
        move |definition: &Definition| type_ref.matches_definition(definition)
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target && self.supertypes == other.supertypes
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance of type \"{}\"", self.target.short_name())
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRef")
            .field("target", &self.target)
            .field("supertypes", &self.supertypes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    struct Foo;
    struct Bar;
    struct Gamma;

    #[test]
    fn test_reserved_types_refused() {
        for result in [
            TypeRef::new::<dyn Any>(),
            TypeRef::new::<dyn Any + Send + Sync>(),
            TypeRef::new::<AnyArc>(),
            TypeRef::new::<()>(),
            TypeRef::new::<ServiceFuture>(),
        ] {
            let error = result.unwrap_err();
            assert_eq!(error.code(), ErrorCode::ReservedType);
        }
    }

    #[test]
    fn test_matches_declared_subtype_only() {
        let foo = TypeRef::new::<Foo>().unwrap();
        let bar = TypeRef::new::<Bar>().unwrap().extends::<Foo>();
        let gamma = TypeRef::new::<Gamma>().unwrap();

        assert!(foo.matches(&foo));
        assert!(foo.matches(&bar));
        assert!(!foo.matches(&gamma));
        assert!(!bar.matches(&foo));
    }

    #[test]
    fn test_duplicate_supertype_is_ignored() {
        let bar = TypeRef::new::<Bar>().unwrap().extends::<Foo>().extends::<Foo>().extends::<Bar>();
        assert_eq!(bar.supertypes().len(), 1);
    }

    #[test]
    fn test_display() {
        let foo = TypeRef::new::<Foo>().unwrap();
        assert_eq!(foo.to_string(), "instance of type \"Foo\"");
    }
}
