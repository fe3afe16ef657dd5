//! Definition registry storage and shared value types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};

use crate::definition::Definition;
use crate::error::{DiError, DiResult};
use crate::key::ServiceName;

/// Type-erased service value
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Memoized, lazily settled construction result.
///
/// Every clone of a `ServiceFuture` observes the same outcome; the underlying
/// construction runs once no matter how many clones are awaited.
pub type ServiceFuture = Shared<BoxFuture<'static, DiResult<AnyArc>>>;

/// Insertion-ordered, name-unique set of definitions owned by one container.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Definition>,
    index: HashMap<ServiceName, usize>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds a definition, refusing duplicate names
    pub(crate) fn insert(&mut self, definition: Definition) -> DiResult<()> {
        if self.index.contains_key(definition.name().as_str()) {
            return Err(DiError::AlreadyDefined(definition.name().clone()));
        }
        self.index.insert(definition.name().clone(), self.entries.len());
        self.entries.push(definition);
        Ok(())
    }

    /// Checks a name without inserting
    pub(crate) fn contains_name(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<&Definition> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    /// Identity check: the exact definition, not just its name
    #[inline]
    pub(crate) fn contains(&self, definition: &Definition) -> bool {
        self.get(definition.name().as_str())
            .map(|registered| registered == definition)
            .unwrap_or(false)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
