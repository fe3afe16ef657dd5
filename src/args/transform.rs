use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::args::ContainerArg;
use crate::container::Container;
use crate::definition::{downcast_value, Definition};
use crate::error::DiResult;
use crate::registration::AnyArc;

type TransformFn = Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>;

/// Container argument that maps another argument's resolved value.
///
/// Dependents are the inner argument's dependents, unchanged.
///
/// ```rust
/// use blueprint_di::{Reference, TransformArg};
///
/// let upper = TransformArg::map(Reference::one().name("greeting"), |greeting: std::sync::Arc<String>| {
///     Ok(greeting.to_uppercase())
/// });
/// # let _ = upper;
/// ```
#[derive(Clone)]
pub struct TransformArg {
    inner: Arc<dyn ContainerArg>,
    transform: TransformFn,
}

impl TransformArg {
    /// Wraps `inner` with an untyped mapping.
    pub fn new<A, F>(inner: A, transform: F) -> Self
    where
        A: ContainerArg + 'static,
        F: Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Self::from_shared(Arc::new(inner), transform)
    }

    pub fn from_shared<F>(inner: Arc<dyn ContainerArg>, transform: F) -> Self
    where
        F: Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        TransformArg { inner, transform: Arc::new(transform) }
    }

    /// Wraps `inner`, downcasting its value to `T` before mapping it to `U`.
    pub fn map<A, T, U, F>(inner: A, transform: F) -> Self
    where
        A: ContainerArg + 'static,
        T: Send + Sync + 'static,
        U: Send + Sync + 'static,
        F: Fn(Arc<T>) -> DiResult<U> + Send + Sync + 'static,
    {
        Self::new(inner, move |value| {
            let typed = downcast_value::<T>(value, || "transformed argument".to_string())?;
            transform(typed).map(|mapped| Arc::new(mapped) as AnyArc)
        })
    }

    pub fn inner(&self) -> &Arc<dyn ContainerArg> {
        &self.inner
    }
}

#[async_trait]
impl ContainerArg for TransformArg {
    async fn resolve(&self, scope: &Container) -> DiResult<AnyArc> {
        let value = self.inner.resolve(scope).await?;
        (self.transform)(value)
    }

    fn dependents(&self, scope: &Container) -> DiResult<Vec<Definition>> {
        self.inner.dependents(scope)
    }
}

impl fmt::Debug for TransformArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformArg").field("inner", &self.inner).finish()
    }
}
