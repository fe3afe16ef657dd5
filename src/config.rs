//! Config providers consumed by [`ConfigRequestArg`](crate::ConfigRequestArg).
//!
//! A provider answers a dot-delimited path with a [`serde_json::Value`]. Three
//! implementations ship with the crate: [`ObjectConfigProvider`] over an
//! in-memory JSON document, [`EnvironmentConfigProvider`] over process
//! environment variables and [`LayeredConfigProvider`] combining several
//! sources in priority order. Closures with the right signature are providers
//! too.

use std::env;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{DiError, DiResult};

/// Source of configuration values.
///
/// `get` returns the value at `path`, `default` when the path is absent, or
/// fails with `MISSING_CONFIG_VALUE` when both are missing.
pub trait ConfigProvider: Send + Sync {
    /// Raw lookup; `None` means the path is absent.
    fn lookup(&self, path: &str) -> Option<Value>;

    fn get(&self, path: &str, default: Option<&Value>) -> DiResult<Value> {
        match self.lookup(path) {
            Some(value) => Ok(value),
            None => default.cloned().ok_or_else(|| DiError::MissingConfigValue { path: path.to_string() }),
        }
    }
}

impl<F> ConfigProvider for F
where
    F: Fn(&str) -> Option<Value> + Send + Sync,
{
    fn lookup(&self, path: &str) -> Option<Value> {
        self(path)
    }
}

/// Provider over an in-memory JSON document.
///
/// Path segments index object keys, or array positions when the segment is a
/// number. A present `null` counts as a value.
///
/// ```rust
/// use blueprint_di::{ConfigProvider, ObjectConfigProvider};
/// use serde_json::json;
///
/// let provider = ObjectConfigProvider::new(json!({
///     "server": { "port": 8080, "hosts": ["a", "b"] },
///     "debug": null,
/// }));
///
/// assert_eq!(provider.get("server.port", None).unwrap(), json!(8080));
/// assert_eq!(provider.get("server.hosts.1", None).unwrap(), json!("b"));
/// assert_eq!(provider.get("debug", Some(&json!(true))).unwrap(), json!(null));
/// assert_eq!(provider.get("missing", Some(&json!("d"))).unwrap(), json!("d"));
/// assert!(provider.get("missing", None).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ObjectConfigProvider {
    root: Arc<Value>,
}

impl ObjectConfigProvider {
    pub fn new(root: Value) -> Self {
        Self { root: Arc::new(root) }
    }

    /// Parses `json` as the document.
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json)
            .map(Self::new)
            .map_err(|error| DiError::InvalidConfigRequest(format!("config document is not valid JSON: {}", error)))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

impl ConfigProvider for ObjectConfigProvider {
    fn lookup(&self, path: &str) -> Option<Value> {
        path.split('.')
            .try_fold(&*self.root, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
                _ => None,
            })
            .cloned()
    }
}

/// Provider reading environment variables.
///
/// `server.port` with prefix `app` reads `APP_SERVER_PORT`. Values that parse
/// as JSON scalars (numbers, booleans) are returned as such, anything else as
/// a string.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentConfigProvider {
    prefix: Option<String>,
}

impl EnvironmentConfigProvider {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()) }
    }

    /// Variable name consulted for `path`.
    pub fn variable_name(&self, path: &str) -> String {
        let key = path.replace('.', "_").to_uppercase();
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key),
            None => key,
        }
    }
}

impl ConfigProvider for EnvironmentConfigProvider {
    fn lookup(&self, path: &str) -> Option<Value> {
        let raw = env::var(self.variable_name(path)).ok()?;
        let parsed = if let Ok(integer) = raw.parse::<i64>() {
            Value::from(integer)
        } else if let Ok(float) = raw.parse::<f64>() {
            Value::from(float)
        } else if let Ok(boolean) = raw.parse::<bool>() {
            Value::from(boolean)
        } else {
            Value::String(raw)
        };
        Some(parsed)
    }
}

/// Provider asking several sources in priority order; the first hit wins.
#[derive(Clone, Default)]
pub struct LayeredConfigProvider {
    sources: Vec<Arc<dyn ConfigProvider>>,
}

impl LayeredConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source with lower priority than those already added.
    pub fn with_source(mut self, source: impl ConfigProvider + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn add_source(&mut self, source: Arc<dyn ConfigProvider>) {
        self.sources.push(source);
    }
}

impl ConfigProvider for LayeredConfigProvider {
    fn lookup(&self, path: &str) -> Option<Value> {
        self.sources.iter().find_map(|source| source.lookup(path))
    }
}

impl fmt::Debug for LayeredConfigProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredConfigProvider")
            .field("sources", &format!("{} sources", self.sources.len()))
            .finish()
    }
}
