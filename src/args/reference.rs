use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::annotation::Annotation;
use crate::args::ContainerArg;
use crate::container::Container;
use crate::definition::Definition;
use crate::error::{DiError, DiResult};
use crate::key::ServiceName;
use crate::lookup::Lookup;
use crate::registration::AnyArc;
use crate::type_ref::TypeRef;

/// How many matches a reference expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one definition must match.
    One,
    /// Any number of definitions, resolved to `Vec<AnyArc>` in match order.
    Multi,
}

/// Container argument pointing at other definitions.
///
/// A `One` reference fails with `NO_MATCHING_SERVICE` when nothing matches and
/// with `AMBIGUOUS_SERVICE` when more than one definition does. A `Multi`
/// reference resolves every match concurrently; read it with
/// [`Args::get_all`](crate::Args::get_all).
///
/// ```rust
/// use blueprint_di::{Arg, Definition, Reference};
///
/// let handlers = Reference::multi().annotation(|a| a.is("handler"));
/// let database = Reference::one().name("database");
///
/// let router = Definition::new("router")
///     .use_factory(|_container, args| Ok(args.get_all::<String>(1)?.len()))
///     .with_args([Arg::from(database), Arg::from(handlers)]);
/// # let _ = router;
/// ```
#[derive(Clone)]
pub struct Reference {
    cardinality: Cardinality,
    lookup: Lookup,
}

impl Reference {
    pub fn new(cardinality: Cardinality, lookup: Lookup) -> Self {
        Reference { cardinality, lookup }
    }

    /// Builder for a reference expecting exactly one match.
    pub fn one() -> ReferenceBuilder {
        ReferenceBuilder { cardinality: Cardinality::One }
    }

    /// Builder for a reference accepting any number of matches.
    pub fn multi() -> ReferenceBuilder {
        ReferenceBuilder { cardinality: Cardinality::Multi }
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    fn single(&self, scope: &Container) -> DiResult<Definition> {
        let mut matches = self.lookup.find(scope);
        match matches.len() {
            0 => Err(DiError::NoMatchingService { lookup: self.lookup.to_string() }),
            1 => Ok(matches.remove(0)),
            _ => Err(DiError::AmbiguousService {
                names: matches.iter().map(|definition| definition.name().to_string()).collect(),
                lookup: self.lookup.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ContainerArg for Reference {
    async fn resolve(&self, scope: &Container) -> DiResult<AnyArc> {
        match self.cardinality {
            Cardinality::One => {
                let definition = self.single(scope)?;
                scope.get(&definition).await
            }
            Cardinality::Multi => {
                let pending = self.lookup.find(scope).into_iter().map(|definition| scope.get(&definition));
                let values = join_all(pending)
                    .await
                    .into_iter()
                    .collect::<DiResult<Vec<AnyArc>>>()?;
                Ok(Arc::new(values))
            }
        }
    }

    fn dependents(&self, scope: &Container) -> DiResult<Vec<Definition>> {
        match self.cardinality {
            Cardinality::One => self.single(scope).map(|definition| vec![definition]),
            Cardinality::Multi => Ok(self.lookup.find(scope)),
        }
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("cardinality", &self.cardinality)
            .field("lookup", &self.lookup)
            .finish()
    }
}

/// Picks the lookup strategy of a [`Reference`].
#[derive(Debug, Clone, Copy)]
pub struct ReferenceBuilder {
    cardinality: Cardinality,
}

impl ReferenceBuilder {
    pub fn name(self, name: impl Into<ServiceName>) -> Reference {
        Reference::new(self.cardinality, Lookup::by_name(name))
    }

    pub fn predicate<P>(self, predicate: P) -> Reference
    where
        P: Fn(&Definition) -> bool + Send + Sync + 'static,
    {
        Reference::new(self.cardinality, Lookup::by_predicate(predicate))
    }

    pub fn annotation<P>(self, predicate: P) -> Reference
    where
        P: Fn(&Annotation) -> bool + Send + Sync + 'static,
    {
        Reference::new(self.cardinality, Lookup::by_annotation(predicate))
    }

    pub fn of_type(self, type_ref: TypeRef) -> Reference {
        Reference::new(self.cardinality, Lookup::by_type(type_ref))
    }

    pub fn lookup(self, lookup: Lookup) -> Reference {
        Reference::new(self.cardinality, lookup)
    }
}
