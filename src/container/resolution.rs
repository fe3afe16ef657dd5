use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{self, try_join_all, BoxFuture, Either, FutureExt};
use futures_timer::Delay;

use crate::annotation::Annotation;
use crate::container::Container;
use crate::definition::{downcast_value, Definition};
use crate::error::{DiError, DiResult};
use crate::internal::assert_no_circular_dependencies;
use crate::key::ServiceName;
use crate::middleware::{Middleware, Next};
use crate::registration::{AnyArc, ServiceFuture};

/// What [`Container::get`] resolves: a name or a definition handle.
#[derive(Debug, Clone)]
pub enum ServiceTarget {
    Name(ServiceName),
    Definition(Definition),
}

impl fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceTarget::Name(name) => write!(f, "service \"{}\"", name),
            ServiceTarget::Definition(definition) => write!(f, "service \"{}\"", definition.name()),
        }
    }
}

impl From<&str> for ServiceTarget {
    fn from(name: &str) -> Self {
        ServiceTarget::Name(ServiceName::from(name))
    }
}

impl From<String> for ServiceTarget {
    fn from(name: String) -> Self {
        ServiceTarget::Name(ServiceName::from(name))
    }
}

impl From<ServiceName> for ServiceTarget {
    fn from(name: ServiceName) -> Self {
        ServiceTarget::Name(name)
    }
}

impl From<&ServiceName> for ServiceTarget {
    fn from(name: &ServiceName) -> Self {
        ServiceTarget::Name(name.clone())
    }
}

impl From<Definition> for ServiceTarget {
    fn from(definition: Definition) -> Self {
        ServiceTarget::Definition(definition)
    }
}

impl From<&Definition> for ServiceTarget {
    fn from(definition: &Definition) -> Self {
        ServiceTarget::Definition(definition.clone())
    }
}

fn settled_error(error: DiError) -> ServiceFuture {
    future::ready(Err(error)).boxed().shared()
}

impl Container {
    /// Shared future of the service described by `target`.
    ///
    /// Every failure, including an unknown name or a circular dependency, is
    /// delivered through the returned future. The first call for a definition
    /// owned by this container creates its cache entry; later and concurrent
    /// calls receive clones of the same future, so the construction strategy
    /// runs at most once. Definitions owned by an ancestor are resolved (and
    /// cached) by that ancestor.
    ///
    /// Validation failures (missing construction strategy, circular
    /// dependencies, unresolvable references) are not cached.
    pub fn get(&self, target: impl Into<ServiceTarget>) -> ServiceFuture {
        let definition = match target.into() {
            ServiceTarget::Definition(definition) => definition,
            ServiceTarget::Name(name) => match self.find_by_name(name.as_str()) {
                Some(definition) => definition,
                None => return settled_error(DiError::ServiceNotFound(name)),
            },
        };

        let cached = self.inner().cache.lock().get(&definition.id()).cloned();
        if let Some(cached) = cached {
            return cached;
        }

        if !self.owns(&definition) {
            if let Some(parent) = self.parent().filter(|parent| parent.owned_in_chain(&definition)) {
                return parent.get(definition);
            }
        }

        if !definition.has_construction() {
            return settled_error(DiError::IncompleteDefinition(definition.name().clone()));
        }
        if let Err(error) = assert_no_circular_dependencies(self, &definition) {
            tracing::debug!(service = %definition.name(), code = error.code().as_str(), "definition rejected");
            return settled_error(error);
        }

        let mut cache = self.inner().cache.lock();
        cache
            .entry(definition.id())
            .or_insert_with(|| {
                definition.freeze();
                self.construction_future(definition.clone())
            })
            .clone()
    }

    /// Typed form of [`get`](Self::get).
    pub fn resolve<T: Send + Sync + 'static>(
        &self,
        target: impl Into<ServiceTarget>,
    ) -> impl Future<Output = DiResult<Arc<T>>> + Send + 'static {
        let target = target.into();
        let label = target.to_string();
        let pending = self.get(target);
        async move {
            let value = pending.await?;
            downcast_value::<T>(value, || label)
        }
    }

    /// Resolves every definition matching `predicate`, in lookup order.
    pub fn get_by_predicate<P>(&self, predicate: P) -> BoxFuture<'static, DiResult<Vec<AnyArc>>>
    where
        P: Fn(&Definition) -> bool,
    {
        let pending: Vec<ServiceFuture> = self
            .find_by_predicate(predicate)
            .iter()
            .map(|definition| self.get(definition))
            .collect();
        try_join_all(pending).boxed()
    }

    /// Resolves every definition holding an annotation matching `predicate`.
    pub fn get_by_annotation<P>(&self, predicate: P) -> BoxFuture<'static, DiResult<Vec<AnyArc>>>
    where
        P: Fn(&Annotation) -> bool,
    {
        let pending: Vec<ServiceFuture> = self
            .find_by_annotation(predicate)
            .iter()
            .map(|definition| self.get(definition))
            .collect();
        try_join_all(pending).boxed()
    }

    /// Like [`get_by_annotation`](Self::get_by_annotation), pairing each
    /// service with the annotation that matched.
    pub fn get_by_annotation_with<P>(&self, predicate: P) -> BoxFuture<'static, DiResult<Vec<(AnyArc, Annotation)>>>
    where
        P: Fn(&Annotation) -> bool,
    {
        let (pending, annotations): (Vec<ServiceFuture>, Vec<Annotation>) = self
            .find_by_annotation_with(predicate)
            .into_iter()
            .map(|(definition, annotation)| (self.get(&definition), annotation))
            .unzip();
        async move {
            let services = try_join_all(pending).await?;
            Ok(services.into_iter().zip(annotations).collect())
        }
        .boxed()
    }

    /// Cache entry for a definition owned by this container.
    ///
    /// The future holds the container weakly until it is first polled.
    fn construction_future(&self, definition: Definition) -> ServiceFuture {
        let container = self.downgrade();
        let created = Instant::now();
        let threshold = self.slow_log_threshold();
        async move {
            let container = container
                .upgrade()
                .ok_or_else(|| DiError::DefinitionWithoutContainer(definition.name().clone()))?;
            container.construct(definition, created, threshold).await
        }
        .boxed()
        .shared()
    }

    async fn construct(self, definition: Definition, created: Instant, threshold: Option<Duration>) -> DiResult<AnyArc> {
        let observers = self.inner().observers.read().clone();
        if observers.has_observers() {
            observers.resolving(&definition);
        }
        tracing::debug!(service = %definition.name(), "constructing service");

        let chain: Arc<[Arc<dyn Middleware>]> = self.inner().middlewares.read().iter().cloned().collect();
        let running = Next::new(self.clone(), chain).run(definition.clone());
        let result = match threshold {
            None => running.await,
            Some(threshold) => {
                // The timer only reports; the construction keeps running either way
                let timer = Delay::new(threshold.saturating_sub(created.elapsed()));
                match future::select(running, timer).await {
                    Either::Left((result, _)) => result,
                    Either::Right(((), running)) => {
                        let elapsed = created.elapsed();
                        tracing::warn!(
                            service = %definition.name(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            "Service \"{}\" took a long time to create ({:?})",
                            definition.name(),
                            elapsed
                        );
                        observers.slow_construction(&definition, elapsed);
                        running.await
                    }
                }
            }
        };

        let elapsed = created.elapsed();
        if observers.has_observers() {
            match &result {
                Ok(_) => observers.resolved(&definition, elapsed),
                Err(error) => observers.failed(&definition, error, elapsed),
            }
        }
        result
    }
}
