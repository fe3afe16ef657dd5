//! Service definitions: named blueprints describing how to build one service.

use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::annotation::{Annotation, AnnotationPredicate};
use crate::args::Arg;
use crate::container::{Container, WeakContainer};
use crate::error::{DiError, DiResult};
use crate::key::{ServiceName, TypeKey};
use crate::registration::AnyArc;
use crate::type_ref::TypeRef;

mod construction;

pub use construction::{Args, Construct, ConstructionKind};
pub(crate) use construction::{downcast_value, Construction, ErasedFactory};

static NEXT_DEFINITION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a definition, used as the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefinitionId(u64);

impl DefinitionId {
    fn next() -> Self {
        DefinitionId(NEXT_DEFINITION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Blueprint for one named service.
///
/// A `Definition` is a cheap, clonable handle; clones refer to the same
/// blueprint and compare equal. It is configured through consuming builder
/// methods and becomes immutable ("locked") once a container starts resolving
/// it.
///
/// # Panics
///
/// Every builder method panics when called on a locked definition. Use
/// [`is_locked`](Self::is_locked) to check beforehand, or
/// [`modify`](Self::modify) to derive a changed copy.
///
/// # Examples
///
/// ```rust
/// use blueprint_di::{Arg, Definition, Reference};
///
/// let definition = Definition::new("mailer")
///     .use_factory(|_container, args| {
///         let host = args.get::<String>(0)?;
///         Ok(format!("smtp://{}", host))
///     })
///     .with_args([Arg::value("mail.local".to_string())])
///     .annotate("transport");
///
/// assert_eq!(definition.name().as_str(), "mailer");
/// assert!(definition.has_annotation("transport"));
/// assert!(!definition.is_locked());
///
/// let locked = definition.lock();
/// assert!(locked.is_locked());
/// ```
#[derive(Clone)]
pub struct Definition {
    inner: Arc<DefinitionInner>,
}

struct DefinitionInner {
    id: DefinitionId,
    name: ServiceName,
    state: RwLock<DefinitionState>,
    owner: OnceCell<WeakContainer>,
}

#[derive(Clone, Default)]
struct DefinitionState {
    construction: Option<Construction>,
    args: Vec<Arg>,
    annotations: Vec<Annotation>,
    type_ref: Option<TypeRef>,
    locked: bool,
}

impl Definition {
    /// Creates an unregistered definition named `name`.
    pub fn new(name: impl Into<ServiceName>) -> Self {
        Self::from_state(name.into(), DefinitionState::default())
    }

    /// Creates an unregistered definition with a generated name.
    pub fn unnamed() -> Self {
        Self::new(ServiceName::generate(None))
    }

    fn from_state(name: ServiceName, state: DefinitionState) -> Self {
        Definition {
            inner: Arc::new(DefinitionInner {
                id: DefinitionId::next(),
                name,
                state: RwLock::new(state),
                owner: OnceCell::new(),
            }),
        }
    }

    fn update(self, f: impl FnOnce(&mut DefinitionState)) -> Self {
        {
            let mut state = self.inner.state.write();
            if state.locked {
                panic!("Definition \"{}\" is locked and cannot be modified", self.inner.name);
            }
            f(&mut state);
        }
        self
    }

    // ----- Construction strategies -----

    /// Builds the service through `T::construct`, marking the definition with
    /// `T`'s type reference.
    pub fn use_constructor<T: Construct>(self) -> Self {
        let factory: ErasedFactory = Arc::new(|_container: Container, args: Args| {
            future::ready(T::construct(args).map(|service| Arc::new(service) as AnyArc)).boxed()
        });
        let type_ref = TypeRef::from_key(TypeKey::of::<T>())
            .ok()
            .map(|type_ref| T::supertypes().into_iter().fold(type_ref, TypeRef::with_supertype));
        self.update(|state| {
            state.construction = Some(Construction::Constructor(factory));
            state.type_ref = type_ref;
        })
    }

    /// Alias for [`use_constructor`](Self::use_constructor).
    pub fn use_class<T: Construct>(self) -> Self {
        self.use_constructor::<T>()
    }

    /// Builds the service with a synchronous factory.
    ///
    /// The factory receives the resolving container and the resolved
    /// arguments; its result is wrapped in an `Arc`.
    pub fn use_factory<T, F>(self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container, Args) -> DiResult<T> + Send + Sync + 'static,
    {
        let erased: ErasedFactory = Arc::new(move |container: Container, args: Args| {
            future::ready(factory(&container, args).map(|service| Arc::new(service) as AnyArc)).boxed()
        });
        self.update(|state| state.construction = Some(Construction::Factory(erased)))
    }

    /// Builds the service with an asynchronous factory.
    pub fn use_async_factory<T, F, Fut>(self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Container, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        let erased: ErasedFactory = Arc::new(move |container: Container, args: Args| {
            let pending = factory(container, args);
            async move { pending.await.map(|service| Arc::new(service) as AnyArc) }.boxed()
        });
        self.update(|state| state.construction = Some(Construction::Factory(erased)))
    }

    /// Builds the service with a factory that already produces type-erased values.
    pub fn use_erased_factory<F>(self, factory: F) -> Self
    where
        F: Fn(Container, Args) -> BoxFuture<'static, DiResult<AnyArc>> + Send + Sync + 'static,
    {
        let erased: ErasedFactory = Arc::new(factory);
        self.update(|state| state.construction = Some(Construction::Factory(erased)))
    }

    /// Uses a constant value, inferring its type reference unless the type is reserved.
    pub fn use_value<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.use_shared_value(Arc::new(value))
    }

    /// Uses an already shared constant value.
    pub fn use_shared_value<T: Send + Sync + 'static>(self, value: Arc<T>) -> Self {
        let type_ref = TypeRef::try_of::<T>();
        self.update(|state| {
            state.construction = Some(Construction::Constant(value as AnyArc));
            state.type_ref = type_ref;
        })
    }

    // ----- Configuration -----

    /// Replaces the argument list.
    pub fn with_args<I>(self, args: I) -> Self
    where
        I: IntoIterator<Item = Arg>,
    {
        let args: Vec<Arg> = args.into_iter().collect();
        self.update(|state| state.args = args)
    }

    /// Appends an annotation.
    pub fn annotate(self, annotation: impl Into<Annotation>) -> Self {
        let annotation = annotation.into();
        self.update(|state| state.annotations.push(annotation))
    }

    /// Appends several annotations, keeping their order.
    pub fn annotate_all<I>(self, annotations: I) -> Self
    where
        I: IntoIterator<Item = Annotation>,
    {
        self.update(|state| state.annotations.extend(annotations))
    }

    /// Sets the type marker explicitly.
    pub fn mark_type(self, type_ref: TypeRef) -> Self {
        self.update(|state| state.type_ref = Some(type_ref))
    }

    /// Freezes the definition together with its arguments and annotations.
    pub fn lock(self) -> Self {
        self.freeze();
        self
    }

    pub(crate) fn freeze(&self) {
        self.inner.state.write().locked = true;
    }

    /// New, independently locked definition with the patched fields replaced.
    ///
    /// Unspecified fields (and the construction strategy and type marker) are
    /// copied. The copy has its own identity and no owner.
    pub fn modify(&self, patch: DefinitionPatch) -> Definition {
        let mut state = self.inner.state.read().clone();
        if let Some(args) = patch.args {
            state.args = args;
        }
        if let Some(annotations) = patch.annotations {
            state.annotations = annotations;
        }
        state.locked = true;
        let name = patch.name.unwrap_or_else(|| self.inner.name.clone());
        Self::from_state(name, state)
    }

    /// New definition whose construction defers to this definition's owner.
    ///
    /// Resolving the alias resolves this definition in the container that
    /// owns it, sharing its cached instance. Resolution fails with
    /// `DEFINITION_WITHOUT_CONTAINER` when this definition has no live owner
    /// at that moment.
    pub fn create_alias(&self, options: AliasOptions) -> Definition {
        let original = self.clone();
        let name = options.name.unwrap_or_else(|| self.inner.name.clone());
        let state = self.inner.state.read();
        let annotations: Vec<Annotation> = match options.annotations {
            AliasAnnotations::None => Vec::new(),
            AliasAnnotations::All => state.annotations.clone(),
            AliasAnnotations::Matching(predicate) => state
                .annotations
                .iter()
                .filter(|annotation| predicate(annotation))
                .cloned()
                .collect(),
        };
        let type_ref = if options.with_type { state.type_ref.clone() } else { None };
        drop(state);

        let alias = Definition::new(name)
            .use_erased_factory(move |_container, _args| {
                let original = original.clone();
                async move {
                    match original.owner() {
                        Some(owner) => owner.get(&original).await,
                        None => Err(DiError::DefinitionWithoutContainer(original.name().clone())),
                    }
                }
                .boxed()
            })
            .annotate_all(annotations);
        match type_ref {
            Some(type_ref) => alias.mark_type(type_ref),
            None => alias,
        }
    }

    /// Stamps the owning container; a second, different owner is refused.
    pub fn set_owner(&self, container: &Container) -> DiResult<()> {
        let candidate = container.downgrade();
        let current = self.inner.owner.get_or_init(|| candidate.clone());
        if current.ptr_eq(&candidate) {
            Ok(())
        } else {
            Err(DiError::OwnerCannotBeChanged(self.inner.name.clone()))
        }
    }

    // ----- Accessors -----

    pub fn id(&self) -> DefinitionId {
        self.inner.id
    }

    pub fn name(&self) -> &ServiceName {
        &self.inner.name
    }

    /// Owning container, if one was set and is still alive.
    pub fn owner(&self) -> Option<Container> {
        self.inner.owner.get()?.upgrade()
    }

    pub fn has_owner(&self) -> bool {
        self.inner.owner.get().is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.inner.state.read().locked
    }

    pub fn args(&self) -> Vec<Arg> {
        self.inner.state.read().args.clone()
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.inner.state.read().annotations.clone()
    }

    /// First annotation named `name`.
    pub fn annotation(&self, name: &str) -> Option<Annotation> {
        self.inner
            .state
            .read()
            .annotations
            .iter()
            .find(|annotation| annotation.is(name))
            .cloned()
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.inner.state.read().annotations.iter().any(|annotation| annotation.is(name))
    }

    /// True if any annotation satisfies `predicate`.
    pub fn any_annotation(&self, predicate: impl Fn(&Annotation) -> bool) -> bool {
        self.inner.state.read().annotations.iter().any(|annotation| predicate(annotation))
    }

    pub fn type_ref(&self) -> Option<TypeRef> {
        self.inner.state.read().type_ref.clone()
    }

    pub fn has_construction(&self) -> bool {
        self.inner.state.read().construction.is_some()
    }

    pub fn construction_kind(&self) -> Option<ConstructionKind> {
        self.inner.state.read().construction.as_ref().map(Construction::kind)
    }

    pub(crate) fn construction(&self) -> Option<Construction> {
        self.inner.state.read().construction.clone()
    }
}

impl PartialEq for Definition {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Definition {}

impl Hash for Definition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Definition")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("construction", &state.construction.as_ref().map(Construction::kind))
            .field("args", &state.args.len())
            .field("annotations", &state.annotations)
            .field("type_ref", &state.type_ref)
            .field("locked", &state.locked)
            .finish()
    }
}

/// Fields replaced by [`Definition::modify`].
#[derive(Clone, Default)]
pub struct DefinitionPatch {
    name: Option<ServiceName>,
    args: Option<Vec<Arg>>,
    annotations: Option<Vec<Annotation>>,
}

impl DefinitionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<ServiceName>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn args<I: IntoIterator<Item = Arg>>(mut self, args: I) -> Self {
        self.args = Some(args.into_iter().collect());
        self
    }

    pub fn annotations<I: IntoIterator<Item = Annotation>>(mut self, annotations: I) -> Self {
        self.annotations = Some(annotations.into_iter().collect());
        self
    }
}

/// Which annotations an alias carries over from the aliased definition.
#[derive(Clone, Default)]
pub enum AliasAnnotations {
    #[default]
    None,
    All,
    Matching(AnnotationPredicate),
}

/// Options for [`Definition::create_alias`].
#[derive(Clone, Default)]
pub struct AliasOptions {
    name: Option<ServiceName>,
    annotations: AliasAnnotations,
    with_type: bool,
}

impl AliasOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the alias; defaults to the aliased definition's name.
    pub fn name(mut self, name: impl Into<ServiceName>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Carry over all annotations (`true`) or none (`false`).
    pub fn with_annotations(mut self, all: bool) -> Self {
        self.annotations = if all { AliasAnnotations::All } else { AliasAnnotations::None };
        self
    }

    /// Carry over the annotations satisfying `predicate`.
    pub fn with_annotations_matching<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Annotation) -> bool + Send + Sync + 'static,
    {
        self.annotations = AliasAnnotations::Matching(Arc::new(predicate));
        self
    }

    /// Carry over the type marker.
    pub fn with_type(mut self, with_type: bool) -> Self {
        self.with_type = with_type;
        self
    }
}
