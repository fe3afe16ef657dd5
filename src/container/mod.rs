//! Resolution scopes.
//!
//! A [`Container`] owns a registry of definitions, a cache of construction
//! futures keyed by definition identity, an ordered middleware list and an
//! optional parent. Registration and lookups live here; resolution lives in
//! the `resolution` submodule.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::annotation::Annotation;
use crate::config::ConfigProvider;
use crate::definition::{AliasOptions, Args, Construct, Definition, DefinitionId};
use crate::error::{DiError, DiResult};
use crate::key::{short_type_name, ServiceName};
use crate::middleware::Middleware;
use crate::observer::{Observers, ResolutionObserver};
use crate::registration::{Registry, ServiceFuture};

mod resolution;

pub use resolution::ServiceTarget;

/// Scope holding definitions and the services built from them.
///
/// `Container` is a cheap handle; clones share the same scope. A child scope
/// created with [`child`](Self::child) sees its parent's definitions, may
/// shadow them with its own, and delegates resolution of definitions it does
/// not own to the ancestor that owns them. Services are therefore cached in
/// the container that owns their definition.
///
/// # Examples
///
/// ```rust
/// use blueprint_di::{Arg, Container, Definition, Reference};
///
/// # async fn run() -> blueprint_di::DiResult<()> {
/// let container = Container::new();
/// container.register_definition(Definition::new("host").use_value("db.local".to_string()))?;
/// container.register_definition(
///     Definition::new("url")
///         .use_factory(|_container, args| Ok(format!("postgres://{}", args.get::<String>(0)?)))
///         .with_args([Arg::from(Reference::one().name("host"))]),
/// )?;
///
/// let url = container.resolve::<String>("url").await?;
/// assert_eq!(url.as_str(), "postgres://db.local");
/// # Ok(())
/// # }
/// # futures::executor::block_on(run()).unwrap();
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    parent: Option<Container>,
    registry: RwLock<Registry>,
    cache: Mutex<HashMap<DefinitionId, ServiceFuture>>,
    middlewares: RwLock<Vec<Arc<dyn Middleware>>>,
    config_provider: RwLock<Option<Arc<dyn ConfigProvider>>>,
    slow_log_threshold: RwLock<Option<Duration>>,
    observers: RwLock<Observers>,
}

/// Non-owning handle to a [`Container`].
#[derive(Clone)]
pub struct WeakContainer {
    inner: Weak<ContainerInner>,
}

impl WeakContainer {
    pub fn upgrade(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }

    pub fn ptr_eq(&self, other: &WeakContainer) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for WeakContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakContainer").field("alive", &(self.inner.strong_count() > 0)).finish()
    }
}

impl Container {
    /// Creates a root container.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a container whose parent is `parent`.
    pub fn with_parent(parent: &Container) -> Self {
        Self::build(Some(parent.clone()))
    }

    /// Creates a child scope of this container.
    pub fn child(&self) -> Self {
        Self::with_parent(self)
    }

    fn build(parent: Option<Container>) -> Self {
        Container {
            inner: Arc::new(ContainerInner {
                parent,
                registry: RwLock::new(Registry::new()),
                cache: Mutex::new(HashMap::new()),
                middlewares: RwLock::new(Vec::new()),
                config_provider: RwLock::new(None),
                slow_log_threshold: RwLock::new(None),
                observers: RwLock::new(Observers::new()),
            }),
        }
    }

    #[inline]
    fn inner(&self) -> &ContainerInner {
        &self.inner
    }

    pub fn parent(&self) -> Option<&Container> {
        self.inner().parent.as_ref()
    }

    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer { inner: Arc::downgrade(&self.inner) }
    }

    // ----- Registration -----

    /// Registers `definition` and makes this container its owner.
    ///
    /// Fails with `ALREADY_DEFINED` if this container already holds a
    /// definition with the same name (names of ancestors may be shadowed), and
    /// with `OWNER_CANNOT_BE_CHANGED` if another container owns `definition`.
    pub fn register_definition(&self, definition: Definition) -> DiResult<&Self> {
        let mut registry = self.inner().registry.write();
        if registry.contains_name(definition.name().as_str()) {
            return Err(DiError::AlreadyDefined(definition.name().clone()));
        }
        definition.set_owner(self)?;
        tracing::debug!(service = %definition.name(), "registering definition");
        registry.insert(definition)?;
        Ok(self)
    }

    /// Creates, registers and returns an empty definition named `name`.
    ///
    /// The returned handle shares state with the registered definition, so it
    /// can be configured afterwards.
    pub fn definition(&self, name: impl Into<ServiceName>) -> DiResult<Definition> {
        let definition = Definition::new(name);
        self.register_definition(definition.clone())?;
        Ok(definition)
    }

    /// Registers a constructor-based definition with a generated name.
    pub fn definition_with_constructor<T: Construct>(&self) -> DiResult<Definition> {
        self.named_definition_with_constructor::<T>(generated_name::<T>())
    }

    pub fn named_definition_with_constructor<T: Construct>(&self, name: impl Into<ServiceName>) -> DiResult<Definition> {
        Ok(self.definition(name)?.use_constructor::<T>())
    }

    /// Registers a factory-based definition with a name generated from `T`.
    pub fn definition_with_factory<T, F>(&self, factory: F) -> DiResult<Definition>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container, Args) -> DiResult<T> + Send + Sync + 'static,
    {
        self.named_definition_with_factory(generated_name::<T>(), factory)
    }

    pub fn named_definition_with_factory<T, F>(&self, name: impl Into<ServiceName>, factory: F) -> DiResult<Definition>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container, Args) -> DiResult<T> + Send + Sync + 'static,
    {
        Ok(self.definition(name)?.use_factory(factory))
    }

    /// Registers a constant definition with a name generated from `T`.
    pub fn definition_with_value<T: Send + Sync + 'static>(&self, value: T) -> DiResult<Definition> {
        self.named_definition_with_value(generated_name::<T>(), value)
    }

    pub fn named_definition_with_value<T: Send + Sync + 'static>(
        &self,
        name: impl Into<ServiceName>,
        value: T,
    ) -> DiResult<Definition> {
        Ok(self.definition(name)?.use_value(value))
    }

    /// Registers an alias of `definition` in this container.
    pub fn alias(&self, definition: &Definition, options: AliasOptions) -> DiResult<Definition> {
        let alias = definition.create_alias(options);
        self.register_definition(alias.clone())?;
        Ok(alias)
    }

    // ----- Lookups -----

    /// Definition named `name` here or in the nearest ancestor holding one.
    pub fn find_by_name(&self, name: &str) -> Option<Definition> {
        let local = self.inner().registry.read().get(name).cloned();
        match local {
            Some(definition) => Some(definition),
            None => self.parent()?.find_by_name(name),
        }
    }

    /// Definitions satisfying `predicate`: local ones in registration order,
    /// then the parent's.
    pub fn find_by_predicate<P>(&self, predicate: P) -> Vec<Definition>
    where
        P: Fn(&Definition) -> bool,
    {
        let mut found = Vec::new();
        self.collect_matching(&predicate, &mut found);
        found
    }

    fn collect_matching(&self, predicate: &dyn Fn(&Definition) -> bool, into: &mut Vec<Definition>) {
        into.extend(self.inner().registry.read().iter().filter(|d| predicate(d)).cloned());
        if let Some(parent) = self.parent() {
            parent.collect_matching(predicate, into);
        }
    }

    /// Definitions holding at least one annotation satisfying `predicate`.
    pub fn find_by_annotation<P>(&self, predicate: P) -> Vec<Definition>
    where
        P: Fn(&Annotation) -> bool,
    {
        self.find_by_predicate(|definition| definition.any_annotation(&predicate))
    }

    /// Like [`find_by_annotation`](Self::find_by_annotation), paired with the
    /// first matching annotation of each definition.
    pub fn find_by_annotation_with<P>(&self, predicate: P) -> Vec<(Definition, Annotation)>
    where
        P: Fn(&Annotation) -> bool,
    {
        self.find_by_annotation(&predicate)
            .into_iter()
            .filter_map(|definition| {
                let annotation = definition.annotations().into_iter().find(|a| predicate(a))?;
                Some((definition, annotation))
            })
            .collect()
    }

    /// Definitions registered in this container, in registration order.
    pub fn definitions(&self) -> Vec<Definition> {
        self.inner().registry.read().iter().cloned().collect()
    }

    /// Whether `definition` itself is registered here.
    pub fn owns(&self, definition: &Definition) -> bool {
        self.inner().registry.read().contains(definition)
    }

    fn owned_in_chain(&self, definition: &Definition) -> bool {
        self.owns(definition) || self.parent().map(|p| p.owned_in_chain(definition)).unwrap_or(false)
    }

    /// The container that builds `definition` when `get` is called here: the
    /// nearest owner in the chain, or this container for a foreign definition.
    pub(crate) fn resolving_scope(&self, definition: &Definition) -> &Container {
        let mut scope = self;
        while !scope.owns(definition) {
            match scope.parent().filter(|parent| parent.owned_in_chain(definition)) {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        scope
    }

    /// Whether this container holds a cache entry for `definition`.
    pub fn is_cached(&self, definition: &Definition) -> bool {
        self.inner().cache.lock().contains_key(&definition.id())
    }

    // ----- Middlewares, config, observability -----

    /// Appends a middleware; it runs after those added before it.
    pub fn add_middleware<M: Middleware + 'static>(&self, middleware: M) -> &Self {
        self.add_shared_middleware(Arc::new(middleware))
    }

    pub fn add_shared_middleware(&self, middleware: Arc<dyn Middleware>) -> &Self {
        middleware.on_attach(self);
        self.inner().middlewares.write().push(middleware);
        self
    }

    /// Middlewares of this container only.
    pub fn middlewares(&self) -> Vec<Arc<dyn Middleware>> {
        self.inner().middlewares.read().clone()
    }

    /// Attaches `provider` unless one is already attached here.
    ///
    /// Returns `false` when an earlier provider was kept.
    pub fn attach_config_provider(&self, provider: Arc<dyn ConfigProvider>) -> bool {
        let mut slot = self.inner().config_provider.write();
        if slot.is_some() {
            tracing::debug!("config provider already attached, keeping the first one");
            return false;
        }
        *slot = Some(provider);
        true
    }

    /// Provider attached here or to the nearest ancestor.
    pub fn config_provider(&self) -> Option<Arc<dyn ConfigProvider>> {
        let local = self.inner().config_provider.read().clone();
        local.or_else(|| self.parent()?.config_provider())
    }

    /// Constructions settling after `threshold` emit a warning; `None` or zero
    /// disables the signal.
    pub fn set_slow_log_threshold(&self, threshold: Option<Duration>) -> &Self {
        *self.inner().slow_log_threshold.write() = threshold.filter(|t| !t.is_zero());
        self
    }

    pub fn slow_log_threshold(&self) -> Option<Duration> {
        *self.inner().slow_log_threshold.read()
    }

    /// Adds an observer of constructions performed by this container.
    pub fn add_observer(&self, observer: Arc<dyn ResolutionObserver>) -> &Self {
        self.inner().observers.write().add(observer);
        self
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        for definition in self.definitions() {
            s.push_str(&format!(
                "  {}: {:?} cached={} locked={}\n",
                definition.name(),
                definition.construction_kind(),
                self.is_cached(&definition),
                definition.is_locked()
            ));
        }
        s.push_str(&format!("Middlewares: {}\n", self.inner().middlewares.read().len()));
        s.push_str(&format!("Has parent: {}\n", self.parent().is_some()));
        s
    }
}

fn generated_name<T: ?Sized + 'static>() -> ServiceName {
    ServiceName::generate(Some(short_type_name(std::any::type_name::<T>())))
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Container {}

impl Hash for Container {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.inner().registry.read().len())
            .field("cached", &self.inner().cache.lock().len())
            .field("middlewares", &self.inner().middlewares.read().len())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}
