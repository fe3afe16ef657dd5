//! # blueprint-di
//!
//! Async, scope-aware dependency resolution over named service blueprints.
//!
//! ## Features
//!
//! - **Named definitions**: constructor, factory (sync or async) and constant strategies
//! - **Declared dependencies**: references by name, predicate, annotation or type
//! - **Single-flight construction**: each definition is built at most once per owning container
//! - **Static cycle detection**: circular dependencies fail with the full path before anything is built
//! - **Hierarchical scopes**: child containers shadow and delegate to their parents
//! - **Middleware pipeline**: intercept, substitute or short-circuit construction
//!
//! ## Quick Start
//!
//! ```rust
//! use blueprint_di::{Arg, Container, Definition, Reference};
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: std::sync::Arc<Database>,
//! }
//!
//! # async fn run() -> blueprint_di::DiResult<()> {
//! let container = Container::new();
//! container.register_definition(
//!     Definition::new("database").use_value(Database { url: "postgres://localhost".to_string() }),
//! )?;
//! container.register_definition(
//!     Definition::new("users")
//!         .use_factory(|_container, args| Ok(UserService { db: args.get::<Database>(0)? }))
//!         .with_args([Arg::from(Reference::one().name("database"))]),
//! )?;
//!
//! let users = container.resolve::<UserService>("users").await?;
//! assert_eq!(users.db.url, "postgres://localhost");
//! # Ok(())
//! # }
//! # futures::executor::block_on(run()).unwrap();
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use blueprint_di::{Container, Definition};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! # async fn run() -> blueprint_di::DiResult<()> {
//! let built = Arc::new(AtomicUsize::new(0));
//! let counter = built.clone();
//!
//! let root = Container::new();
//! root.register_definition(Definition::new("clock").use_factory(move |_container, _args| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(42u64)
//! }))?;
//!
//! let first = root.child();
//! let second = root.child();
//! first.get("clock").await?;
//! second.get("clock").await?;
//!
//! // Cached once, in the container owning the definition
//! assert_eq!(built.load(Ordering::SeqCst), 1);
//! # Ok(())
//! # }
//! # futures::executor::block_on(run()).unwrap();
//! ```

pub mod annotation;
pub mod args;
pub mod config;
pub mod container;
pub mod definition;
pub mod error;
pub mod key;
pub mod lookup;
pub mod middleware;
pub mod observer;
pub mod standard;
pub mod type_ref;

// Internal modules
mod internal;
mod registration;

pub use annotation::{named, Annotation, AnnotationKind, AnnotationPredicate};
pub use args::{
    Arg, Cardinality, ConfigRequestArg, ContainerArg, Reference, ReferenceBuilder, ResolveArg, Resolved, Shape,
    TransformArg,
};
pub use config::{ConfigProvider, EnvironmentConfigProvider, LayeredConfigProvider, ObjectConfigProvider};
pub use container::{Container, ServiceTarget, WeakContainer};
pub use definition::{
    AliasAnnotations, AliasOptions, Args, Construct, ConstructionKind, Definition, DefinitionId, DefinitionPatch,
};
pub use error::{DiError, DiResult, ErrorCode};
pub use key::{ServiceName, TypeKey};
pub use lookup::{DefinitionPredicate, Lookup};
pub use middleware::{
    config_middleware, deprecated, middleware_fn, on_activation, on_activation_async, on_activation_of,
    ActivationMiddleware, ConfigMiddleware, DeprecatedMiddleware, FnMiddleware, Middleware, Next,
};
pub use observer::{MetricsObserver, ResolutionObserver, TracingObserver};
pub use registration::{AnyArc, ServiceFuture};
pub use standard::{create_standard, StandardOptions};
pub use type_ref::TypeRef;
