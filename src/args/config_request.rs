use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::args::{ContainerArg, TransformArg};
use crate::container::Container;
use crate::definition::{downcast_value, Definition};
use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

/// Container argument reading a value from the attached config provider.
///
/// The provider is looked up on the resolving container and then on its
/// ancestors. The resolved value is a [`serde_json::Value`]; use
/// [`typed`](Self::typed) to deserialize it instead.
///
/// ```rust
/// use blueprint_di::ConfigRequestArg;
///
/// let port = ConfigRequestArg::new("server.port").unwrap().with_default(8080);
/// assert_eq!(port.path(), "server.port");
/// assert!(ConfigRequestArg::new("  ").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigRequestArg {
    path: String,
    default: Option<Value>,
}

impl ConfigRequestArg {
    /// Request for the dot-delimited `path`; blank paths are refused.
    pub fn new(path: impl Into<String>) -> DiResult<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(DiError::InvalidConfigRequest(
                "config path has to be a non-empty string".to_string(),
            ));
        }
        Ok(ConfigRequestArg { path, default: None })
    }

    /// Value used when the path is absent.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Deserializes the resolved value into `T`.
    pub fn typed<T>(self) -> TransformArg
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let path = self.path.clone();
        TransformArg::new(self, move |value| {
            let value = downcast_value::<Value>(value, || format!("config at path \"{}\"", path))?;
            serde_json::from_value::<T>(Value::clone(&value))
                .map(|typed| Arc::new(typed) as AnyArc)
                .map_err(|error| DiError::TypeMismatch {
                    expected: std::any::type_name::<T>(),
                    context: format!("config at path \"{}\": {}", path, error),
                })
        })
    }
}

#[async_trait]
impl ContainerArg for ConfigRequestArg {
    async fn resolve(&self, scope: &Container) -> DiResult<AnyArc> {
        let provider = scope.config_provider().ok_or(DiError::ConfigProviderNotAttached)?;
        let value = provider.get(&self.path, self.default.as_ref())?;
        Ok(Arc::new(value))
    }

    fn dependents(&self, _scope: &Container) -> DiResult<Vec<Definition>> {
        Ok(Vec::new())
    }
}
