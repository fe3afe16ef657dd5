//! Definition arguments: literal values and container-resolved arguments.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};

use crate::container::Container;
use crate::definition::Definition;
use crate::error::DiResult;
use crate::registration::AnyArc;

mod config_request;
mod reference;
mod resolve;
mod transform;

pub use config_request::ConfigRequestArg;
pub use reference::{Cardinality, Reference, ReferenceBuilder};
pub use resolve::{Resolved, ResolveArg, Shape};
pub use transform::TransformArg;

/// Argument whose value comes from a container at resolution time.
///
/// Implementations resolve a value against a scope and, separately, report
/// which definitions they depend on without constructing anything. The second
/// operation feeds the circular dependency check, so it must stay free of side
/// effects.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use blueprint_di::{AnyArc, Container, ContainerArg, Definition, DiResult};
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct Now;
///
/// #[async_trait]
/// impl ContainerArg for Now {
///     async fn resolve(&self, _scope: &Container) -> DiResult<AnyArc> {
///         Ok(Arc::new(std::time::SystemTime::now()))
///     }
///
///     fn dependents(&self, _scope: &Container) -> DiResult<Vec<Definition>> {
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait ContainerArg: fmt::Debug + Send + Sync {
    /// Produces the argument value within `scope`.
    async fn resolve(&self, scope: &Container) -> DiResult<AnyArc>;

    /// Definitions this argument depends on, found without resolving them.
    fn dependents(&self, scope: &Container) -> DiResult<Vec<Definition>>;
}

/// One entry of a definition's argument list.
#[derive(Clone)]
pub enum Arg {
    /// Passed to the construction strategy untouched.
    Value(AnyArc),
    /// Resolved against the container first.
    Container(Arc<dyn ContainerArg>),
}

impl Arg {
    /// Literal argument.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Arg::Value(Arc::new(value))
    }

    /// Container-resolved argument from any [`ContainerArg`] implementation.
    pub fn container<A: ContainerArg + 'static>(arg: A) -> Self {
        Arg::Container(Arc::new(arg))
    }

    pub fn as_container_arg(&self) -> Option<&Arc<dyn ContainerArg>> {
        match self {
            Arg::Container(arg) => Some(arg),
            Arg::Value(_) => None,
        }
    }

    pub fn resolve<'a>(&'a self, scope: &'a Container) -> BoxFuture<'a, DiResult<AnyArc>> {
        match self {
            Arg::Value(value) => future::ready(Ok(value.clone())).boxed(),
            Arg::Container(arg) => arg.resolve(scope),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(_) => f.write_str("Value(..)"),
            Arg::Container(arg) => f.debug_tuple("Container").field(arg).finish(),
        }
    }
}

impl From<Arc<dyn ContainerArg>> for Arg {
    fn from(arg: Arc<dyn ContainerArg>) -> Self {
        Arg::Container(arg)
    }
}

impl From<Reference> for Arg {
    fn from(reference: Reference) -> Self {
        Arg::container(reference)
    }
}

impl From<ConfigRequestArg> for Arg {
    fn from(request: ConfigRequestArg) -> Self {
        Arg::container(request)
    }
}

impl From<ResolveArg> for Arg {
    fn from(resolve: ResolveArg) -> Self {
        Arg::container(resolve)
    }
}

impl From<TransformArg> for Arg {
    fn from(transform: TransformArg) -> Self {
        Arg::container(transform)
    }
}
