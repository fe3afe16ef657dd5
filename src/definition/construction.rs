//! Construction strategies and the argument bundle they receive.

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::registration::AnyArc;

/// Type-erased construction callable.
pub(crate) type ErasedFactory =
    Arc<dyn Fn(Container, Args) -> BoxFuture<'static, DiResult<AnyArc>> + Send + Sync>;

/// Types that can be built by a "constructor call" from resolved arguments.
///
/// This is the constructor-based strategy: registering
/// `definition.use_constructor::<T>()` calls `T::construct(args)` and also
/// marks the definition with a [`TypeRef`](crate::TypeRef) for `T` plus every
/// key returned by [`supertypes`](Self::supertypes).
///
/// # Examples
///
/// ```rust
/// use blueprint_di::{Args, Construct, DiResult, TypeKey};
///
/// trait Repository: Send + Sync {}
///
/// struct UserRepository {
///     table: String,
/// }
///
/// impl Repository for UserRepository {}
///
/// impl Construct for UserRepository {
///     fn construct(args: Args) -> DiResult<Self> {
///         Ok(UserRepository { table: args.get::<String>(0)?.to_string() })
///     }
///
///     fn supertypes() -> Vec<TypeKey> {
///         vec![TypeKey::of::<dyn Repository>()]
///     }
/// }
/// ```
pub trait Construct: Sized + Send + Sync + 'static {
    /// Builds the service from its resolved arguments.
    fn construct(args: Args) -> DiResult<Self>;

    /// Supertypes declared for type-based lookups.
    fn supertypes() -> Vec<TypeKey> {
        Vec::new()
    }
}

/// Which construction strategy a definition uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionKind {
    Constructor,
    Factory,
    Constant,
}

#[derive(Clone)]
pub(crate) enum Construction {
    Constructor(ErasedFactory),
    Factory(ErasedFactory),
    Constant(AnyArc),
}

impl Construction {
    pub(crate) fn kind(&self) -> ConstructionKind {
        match self {
            Construction::Constructor(_) => ConstructionKind::Constructor,
            Construction::Factory(_) => ConstructionKind::Factory,
            Construction::Constant(_) => ConstructionKind::Constant,
        }
    }

    /// Runs the strategy; synchronous strategies come back as settled futures.
    pub(crate) fn invoke(&self, container: Container, args: Args) -> BoxFuture<'static, DiResult<AnyArc>> {
        match self {
            Construction::Constructor(factory) | Construction::Factory(factory) => factory(container, args),
            Construction::Constant(value) => future::ready(Ok(value.clone())).boxed(),
        }
    }
}

/// Resolved arguments handed to a construction strategy, in declaration order.
///
/// Values are type-erased; typed access downcasts and fails with
/// `TYPE_MISMATCH` when the argument is missing or of another type.
///
/// ```rust
/// use blueprint_di::Args;
/// use std::sync::Arc;
///
/// let args = Args::new(vec![Arc::new(8080u16), Arc::new("localhost".to_string())]);
/// assert_eq!(*args.get::<u16>(0).unwrap(), 8080);
/// assert_eq!(args.get::<String>(1).unwrap().as_str(), "localhost");
/// assert!(args.get::<u32>(0).is_err());
/// assert!(args.get::<u16>(5).is_err());
/// ```
#[derive(Clone, Default)]
pub struct Args {
    values: Vec<AnyArc>,
}

impl Args {
    pub fn new(values: Vec<AnyArc>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Untyped argument at `index`.
    pub fn raw(&self, index: usize) -> Option<&AnyArc> {
        self.values.get(index)
    }

    /// Argument at `index` downcast to `T`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let value = self.values.get(index).ok_or_else(|| DiError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            context: format!("argument {} is missing", index),
        })?;
        downcast_value::<T>(value.clone(), || format!("argument {}", index))
    }

    /// Argument at `index` produced by a multi reference, each item downcast to `T`.
    pub fn get_all<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Vec<Arc<T>>> {
        let items = self.get::<Vec<AnyArc>>(index)?;
        items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                downcast_value::<T>(item.clone(), || format!("argument {} item {}", index, position))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnyArc> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<AnyArc> {
        self.values
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args").field("len", &self.values.len()).finish()
    }
}

pub(crate) fn downcast_value<T: Send + Sync + 'static>(
    value: AnyArc,
    context: impl FnOnce() -> String,
) -> DiResult<Arc<T>> {
    value.downcast::<T>().map_err(|_| DiError::TypeMismatch {
        expected: std::any::type_name::<T>(),
        context: context(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_get_all_downcasts_each_item() {
        let items: Vec<AnyArc> = vec![Arc::new(1u8), Arc::new(2u8)];
        let args = Args::new(vec![Arc::new(items)]);

        let values = args.get_all::<u8>(0).unwrap();
        assert_eq!(values.iter().map(|v| **v).collect::<Vec<_>>(), vec![1, 2]);

        let error = args.get_all::<u16>(0).unwrap_err();
        assert_eq!(error.code(), ErrorCode::TypeMismatch);
        assert!(error.to_string().contains("item 0"));
    }
}
