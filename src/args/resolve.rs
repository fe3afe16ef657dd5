use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{try_join_all, BoxFuture, FutureExt};

use crate::args::{Arg, ContainerArg};
use crate::container::Container;
use crate::definition::{downcast_value, Definition};
use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

/// Tree of literal values and container arguments.
#[derive(Clone)]
pub enum Shape {
    Value(AnyArc),
    Arg(Arc<dyn ContainerArg>),
    List(Vec<Shape>),
    Map(BTreeMap<String, Shape>),
}

impl Shape {
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Shape::Value(Arc::new(value))
    }

    pub fn arg(arg: impl Into<Arg>) -> Self {
        match arg.into() {
            Arg::Value(value) => Shape::Value(value),
            Arg::Container(arg) => Shape::Arg(arg),
        }
    }

    pub fn list<I: IntoIterator<Item = Shape>>(items: I) -> Self {
        Shape::List(items.into_iter().collect())
    }

    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Shape)>,
    {
        Shape::Map(entries.into_iter().map(|(key, shape)| (key.into(), shape)).collect())
    }

    fn collect_dependents(&self, scope: &Container, into: &mut Vec<Definition>) -> DiResult<()> {
        match self {
            Shape::Value(_) => Ok(()),
            Shape::Arg(arg) => {
                into.extend(arg.dependents(scope)?);
                Ok(())
            }
            Shape::List(items) => items.iter().try_for_each(|item| item.collect_dependents(scope, into)),
            Shape::Map(entries) => entries.values().try_for_each(|item| item.collect_dependents(scope, into)),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Value(_) => f.write_str("Value(..)"),
            Shape::Arg(arg) => f.debug_tuple("Arg").field(arg).finish(),
            Shape::List(items) => f.debug_list().entries(items).finish(),
            Shape::Map(entries) => f.debug_map().entries(entries).finish(),
        }
    }
}

/// A [`Shape`] with every container argument replaced by its value.
#[derive(Clone)]
pub enum Resolved {
    Value(AnyArc),
    List(Vec<Resolved>),
    Map(BTreeMap<String, Resolved>),
}

impl Resolved {
    /// Leaf value downcast to `T`.
    pub fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        match self {
            Resolved::Value(value) => downcast_value::<T>(value.clone(), || "resolved leaf".to_string()),
            _ => Err(DiError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                context: "resolved node is not a leaf".to_string(),
            }),
        }
    }

    pub fn as_list(&self) -> Option<&[Resolved]> {
        match self {
            Resolved::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Resolved>> {
        match self {
            Resolved::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Map entry named `key`.
    pub fn field(&self, key: &str) -> Option<&Resolved> {
        self.as_map()?.get(key)
    }

    /// List item at `index`.
    pub fn item(&self, index: usize) -> Option<&Resolved> {
        self.as_list()?.get(index)
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Value(_) => f.write_str("Value(..)"),
            Resolved::List(items) => f.debug_list().entries(items).finish(),
            Resolved::Map(entries) => f.debug_map().entries(entries).finish(),
        }
    }
}

#[derive(Clone)]
enum ShapeSource {
    Fixed(Shape),
    Lazy(Arc<dyn Fn() -> Shape + Send + Sync>),
}

/// Container argument that resolves every container argument nested in a
/// [`Shape`], rebuilding the structure as a [`Resolved`] tree.
///
/// Siblings are resolved concurrently. The shape can also be produced lazily;
/// the producer runs on every resolution and every dependency walk.
///
/// ```rust
/// use blueprint_di::{Reference, ResolveArg, Shape};
///
/// let settings = ResolveArg::new(Shape::map([
///     ("name", Shape::value("api")),
///     ("database", Shape::arg(Reference::one().name("database"))),
///     ("plugins", Shape::list([Shape::arg(Reference::one().name("auth"))])),
/// ]));
/// # let _ = settings;
/// ```
#[derive(Clone)]
pub struct ResolveArg {
    source: ShapeSource,
}

impl ResolveArg {
    pub fn new(shape: Shape) -> Self {
        ResolveArg { source: ShapeSource::Fixed(shape) }
    }

    pub fn lazy<F>(producer: F) -> Self
    where
        F: Fn() -> Shape + Send + Sync + 'static,
    {
        ResolveArg { source: ShapeSource::Lazy(Arc::new(producer)) }
    }

    fn shape(&self) -> Shape {
        match &self.source {
            ShapeSource::Fixed(shape) => shape.clone(),
            ShapeSource::Lazy(producer) => producer(),
        }
    }
}

fn resolve_shape<'a>(shape: &'a Shape, scope: &'a Container) -> BoxFuture<'a, DiResult<Resolved>> {
    async move {
        match shape {
            Shape::Value(value) => Ok(Resolved::Value(value.clone())),
            Shape::Arg(arg) => arg.resolve(scope).await.map(Resolved::Value),
            Shape::List(items) => {
                let resolved = try_join_all(items.iter().map(|item| resolve_shape(item, scope))).await?;
                Ok(Resolved::List(resolved))
            }
            Shape::Map(entries) => {
                let resolved = try_join_all(entries.values().map(|item| resolve_shape(item, scope))).await?;
                Ok(Resolved::Map(entries.keys().cloned().zip(resolved).collect()))
            }
        }
    }
    .boxed()
}

#[async_trait]
impl ContainerArg for ResolveArg {
    async fn resolve(&self, scope: &Container) -> DiResult<AnyArc> {
        let shape = self.shape();
        let resolved = resolve_shape(&shape, scope).await?;
        Ok(Arc::new(resolved))
    }

    fn dependents(&self, scope: &Container) -> DiResult<Vec<Definition>> {
        let mut dependents = Vec::new();
        self.shape().collect_dependents(scope, &mut dependents)?;
        Ok(dependents)
    }
}

impl fmt::Debug for ResolveArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ShapeSource::Fixed(shape) => f.debug_tuple("ResolveArg").field(shape).finish(),
            ShapeSource::Lazy(_) => f.write_str("ResolveArg(<lazy>)"),
        }
    }
}
