//! Circular dependency detection over declared arguments.
//!
//! The walk is structural: it asks every container argument for the
//! definitions it depends on and never runs a construction strategy.
//! Dependencies a factory pulls from the container on its own are invisible
//! here.

use std::collections::HashSet;

use crate::container::Container;
use crate::definition::{Definition, DefinitionId};
use crate::error::{DiError, DiResult};

/// Fails with `CIRCULAR_DEPENDENCY_DETECTED` if `definition` can reach itself
/// (or any definition on the way) through its declared arguments.
///
/// Each dependency is expanded in the scope that would build it: a definition
/// owned by an ancestor looks up its own arguments from that ancestor, the
/// same way [`Container::get`] delegates construction.
///
/// Lookup failures of container arguments (`NO_MATCHING_SERVICE`,
/// `AMBIGUOUS_SERVICE`) surface here as well.
pub(crate) fn assert_no_circular_dependencies(container: &Container, definition: &Definition) -> DiResult<()> {
    let scope = container.resolving_scope(definition).clone();
    let mut walk = Walk {
        path: vec![(definition.clone(), scope.clone())],
        explored: HashSet::new(),
    };
    walk.visit(definition, &scope)
}

struct Walk {
    /// Definitions being expanded, each with the scope that builds it.
    path: Vec<(Definition, Container)>,
    /// Subgraphs already found acyclic.
    explored: HashSet<(DefinitionId, Container)>,
}

impl Walk {
    fn visit(&mut self, definition: &Definition, scope: &Container) -> DiResult<()> {
        for arg in definition.args() {
            let Some(arg) = arg.as_container_arg() else {
                continue;
            };
            for dependency in arg.dependents(scope)? {
                let owner = scope.resolving_scope(&dependency).clone();
                if self.path.iter().any(|(d, s)| *d == dependency && *s == owner) {
                    let mut names: Vec<String> = self.path.iter().map(|(d, _)| d.name().to_string()).collect();
                    names.push(dependency.name().to_string());
                    return Err(DiError::CircularDependency { path: names });
                }
                let key = (dependency.id(), owner);
                if self.explored.contains(&key) {
                    continue;
                }
                self.path.push((dependency.clone(), key.1.clone()));
                self.visit(&dependency, &key.1)?;
                self.path.pop();
                self.explored.insert(key);
            }
        }
        Ok(())
    }
}
