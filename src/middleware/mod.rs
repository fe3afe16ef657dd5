//! Interception pipeline wrapping definition construction.
//!
//! Every construction performed by a container runs through the container's
//! own middlewares in registration order. A middleware may continue the chain
//! (optionally handing a different definition to the remaining stages), change
//! the value produced by later stages, or return its own value without calling
//! [`Next::run`] at all. The final stage resolves the definition's arguments
//! concurrently and invokes its construction strategy.
//!
//! Middlewares are not inherited: a child container only runs its own list.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{try_join_all, BoxFuture, FutureExt};

use crate::container::Container;
use crate::definition::{Args, Definition};
use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

pub mod activation;
pub mod config;
pub mod deprecated;

pub use activation::{on_activation, on_activation_async, on_activation_of, ActivationHook, ActivationMiddleware};
pub use config::{config_middleware, ConfigMiddleware};
pub use deprecated::{deprecated, DeprecatedMiddleware, DeprecationNote, DEPRECATED};

/// One stage of the construction pipeline.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use blueprint_di::{AnyArc, Definition, DiResult, Middleware, Next};
///
/// struct Trace;
///
/// #[async_trait]
/// impl Middleware for Trace {
///     async fn handle(&self, definition: Definition, next: Next) -> DiResult<AnyArc> {
///         tracing::debug!(service = %definition.name(), "constructing");
///         next.run(definition).await
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, definition: Definition, next: Next) -> DiResult<AnyArc>;

    /// Called once when the middleware is added to `container`.
    fn on_attach(&self, container: &Container) {
        let _ = container;
    }
}

/// Continuation of the pipeline after the current middleware.
pub struct Next {
    container: Container,
    chain: Arc<[Arc<dyn Middleware>]>,
    index: usize,
}

impl Next {
    pub(crate) fn new(container: Container, chain: Arc<[Arc<dyn Middleware>]>) -> Self {
        Next { container, chain, index: 0 }
    }

    /// Container performing the construction.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Runs the remaining stages for `definition`.
    pub fn run(self, definition: Definition) -> BoxFuture<'static, DiResult<AnyArc>> {
        match self.chain.get(self.index).cloned() {
            Some(middleware) => {
                let next = Next {
                    container: self.container,
                    chain: self.chain,
                    index: self.index + 1,
                };
                async move { middleware.handle(definition, next).await }.boxed()
            }
            None => construct(self.container, definition),
        }
    }
}

/// Terminal stage: resolve arguments, then invoke the construction strategy.
fn construct(container: Container, definition: Definition) -> BoxFuture<'static, DiResult<AnyArc>> {
    async move {
        let construction = definition
            .construction()
            .ok_or_else(|| DiError::IncompleteDefinition(definition.name().clone()))?;
        let args = definition.args();
        let values = try_join_all(args.iter().map(|arg| arg.resolve(&container))).await?;
        construction.invoke(container.clone(), Args::new(values)).await
    }
    .boxed()
}

/// Middleware backed by a closure, see [`middleware_fn`].
pub struct FnMiddleware<F> {
    handler: F,
}

/// Adapts a closure into a [`Middleware`].
///
/// ```rust
/// use blueprint_di::{middleware_fn, Container};
///
/// let container = Container::new();
/// container.add_middleware(middleware_fn(|definition, next| async move {
///     println!("constructing {}", definition.name());
///     next.run(definition).await
/// }));
/// ```
pub fn middleware_fn<F, Fut>(handler: F) -> FnMiddleware<F>
where
    F: Fn(Definition, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DiResult<AnyArc>> + Send + 'static,
{
    FnMiddleware { handler }
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Definition, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DiResult<AnyArc>> + Send + 'static,
{
    async fn handle(&self, definition: Definition, next: Next) -> DiResult<AnyArc> {
        (self.handler)(definition, next).await
    }
}
