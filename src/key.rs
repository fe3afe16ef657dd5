//! Service names and type keys.

use std::any::TypeId;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;

const GENERATED_NAME_LENGTH: usize = 20;

/// Name under which a definition is registered in a container.
///
/// Names are unique per container, not globally: a child container may
/// register a definition under a name its parent already uses, shadowing the
/// parent's definition inside the child's scope.
///
/// # Examples
///
/// ```rust
/// use blueprint_di::ServiceName;
///
/// let name = ServiceName::from("database");
/// assert_eq!(name.as_str(), "database");
///
/// let generated = ServiceName::generate(Some("Mailer"));
/// assert!(generated.as_str().starts_with("Mailer_"));
/// assert_ne!(generated, ServiceName::generate(Some("Mailer")));
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServiceName(Arc<str>);

impl ServiceName {
    /// Creates a name from any string.
    pub fn new(name: impl AsRef<str>) -> Self {
        ServiceName(Arc::from(name.as_ref()))
    }

    /// Generates a random, practically unique name, optionally prefixed.
    pub fn generate(prefix: Option<&str>) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_NAME_LENGTH)
            .map(char::from)
            .collect();
        match prefix {
            Some(prefix) if !prefix.is_empty() => ServiceName::new(format!("{}_{}", prefix, suffix)),
            _ => ServiceName::new(suffix),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Hash for ServiceName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with `str`'s hash for `Borrow<str>` lookups.
        self.as_str().hash(state)
    }
}

impl Borrow<str> for ServiceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceName {
    fn from(name: &str) -> Self {
        ServiceName::new(name)
    }
}

impl From<String> for ServiceName {
    fn from(name: String) -> Self {
        ServiceName(Arc::from(name))
    }
}

impl From<&String> for ServiceName {
    fn from(name: &String) -> Self {
        ServiceName::new(name)
    }
}

impl From<&ServiceName> for ServiceName {
    fn from(name: &ServiceName) -> Self {
        name.clone()
    }
}

impl PartialEq<str> for ServiceName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ServiceName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Identity of a Rust type, with its name kept for diagnostics.
///
/// Equality and hashing only look at the `TypeId`; the name is carried along
/// for error messages and `Display`.
///
/// ```rust
/// use blueprint_di::TypeKey;
///
/// let key = TypeKey::of::<String>();
/// assert_eq!(key, TypeKey::of::<String>());
/// assert_ne!(key, TypeKey::of::<u32>());
/// assert_eq!(key.short_name(), "String");
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T`; works for unsized types such as `dyn Trait`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full `std::any::type_name` of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without module path or generic arguments.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

impl PartialEq for TypeKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics.rsplit("::").next().unwrap_or(without_generics)
}
