//! Post-construction hooks declared through annotations.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};

use crate::annotation::{Annotation, AnnotationKind};
use crate::container::Container;
use crate::definition::{downcast_value, Definition};
use crate::error::DiResult;
use crate::middleware::{Middleware, Next};
use crate::registration::AnyArc;

type HookFn = Arc<dyn Fn(AnyArc, Container) -> BoxFuture<'static, DiResult<AnyArc>> + Send + Sync>;

/// Hook run on a freshly constructed service; its result replaces the service.
#[derive(Clone)]
pub struct ActivationHook {
    hook: HookFn,
}

impl ActivationHook {
    fn run(&self, service: AnyArc, container: Container) -> BoxFuture<'static, DiResult<AnyArc>> {
        (self.hook)(service, container)
    }
}

impl fmt::Debug for ActivationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActivationHook")
    }
}

const ON_ACTIVATION: AnnotationKind<ActivationHook> = AnnotationKind::new("on_activation");

/// Annotation registering a synchronous activation hook.
///
/// The hook receives the service and the container that constructed it.
pub fn on_activation<F>(hook: F) -> Annotation
where
    F: Fn(AnyArc, &Container) -> DiResult<AnyArc> + Send + Sync + 'static,
{
    let hook: HookFn = Arc::new(move |service: AnyArc, container: Container| {
        future::ready(hook(service, &container)).boxed()
    });
    ON_ACTIVATION.create(ActivationHook { hook })
}

/// Annotation registering an asynchronous activation hook.
pub fn on_activation_async<F, Fut>(hook: F) -> Annotation
where
    F: Fn(AnyArc, Container) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DiResult<AnyArc>> + Send + 'static,
{
    let hook: HookFn = Arc::new(move |service: AnyArc, container: Container| hook(service, container).boxed());
    ON_ACTIVATION.create(ActivationHook { hook })
}

/// Annotation registering a typed hook mapping a `T` service to a `U` service.
///
/// ```rust
/// use blueprint_di::{on_activation_of, Definition};
///
/// let greeting = Definition::new("greeting")
///     .use_value("hello".to_string())
///     .annotate(on_activation_of(|value: std::sync::Arc<String>| Ok(value.to_uppercase())));
/// # let _ = greeting;
/// ```
pub fn on_activation_of<T, U, F>(hook: F) -> Annotation
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Fn(Arc<T>) -> DiResult<U> + Send + Sync + 'static,
{
    on_activation(move |service, _container| {
        let typed = downcast_value::<T>(service, || "activation hook".to_string())?;
        hook(typed).map(|mapped| Arc::new(mapped) as AnyArc)
    })
}

/// Runs every activation hook of a definition, in annotation order, after the
/// remaining stages produced the service.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivationMiddleware;

impl ActivationMiddleware {
    pub fn new() -> Self {
        ActivationMiddleware
    }
}

#[async_trait]
impl Middleware for ActivationMiddleware {
    async fn handle(&self, definition: Definition, next: Next) -> DiResult<AnyArc> {
        let hooks: Vec<ActivationHook> = definition
            .annotations()
            .iter()
            .filter_map(|annotation| ON_ACTIVATION.payload_of(annotation).cloned())
            .collect();

        let container = next.container().clone();
        let mut service = next.run(definition).await?;
        for hook in hooks {
            service = hook.run(service, container.clone()).await?;
        }
        Ok(service)
    }
}
