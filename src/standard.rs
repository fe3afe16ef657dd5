//! Preconfigured containers.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::{ConfigProvider, ObjectConfigProvider};
use crate::container::Container;
use crate::middleware::{ActivationMiddleware, ConfigMiddleware, DeprecatedMiddleware};

/// Options for [`create_standard`].
#[derive(Clone, Default)]
pub struct StandardOptions {
    parent: Option<Container>,
    config: Option<Value>,
    config_provider: Option<Arc<dyn ConfigProvider>>,
    deprecation_reporter: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl StandardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent(mut self, parent: &Container) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// JSON document served to config requests.
    pub fn config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Custom provider; takes precedence over [`config`](Self::config).
    pub fn config_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.config_provider = Some(provider);
        self
    }

    /// Receives deprecation messages instead of `tracing::warn!`.
    pub fn deprecation_reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.deprecation_reporter = Some(Arc::new(reporter));
        self
    }
}

impl fmt::Debug for StandardOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardOptions")
            .field("parent", &self.parent.is_some())
            .field("config", &self.config)
            .field("config_provider", &self.config_provider.is_some())
            .field("deprecation_reporter", &self.deprecation_reporter.is_some())
            .finish()
    }
}

/// Creates a container with the activation, config and deprecation
/// middlewares registered, in that order.
///
/// Without a config document the provider serves an empty object.
///
/// ```rust
/// use blueprint_di::{create_standard, Arg, ConfigRequestArg, Definition, StandardOptions};
/// use serde_json::json;
///
/// # async fn run() -> blueprint_di::DiResult<()> {
/// let container = create_standard(StandardOptions::new().config(json!({ "db": { "port": 5432 } })));
/// container.register_definition(
///     Definition::new("port")
///         .use_factory(|_container, args| Ok(args.get::<u16>(0)?.to_string()))
///         .with_args([Arg::from(ConfigRequestArg::new("db.port")?.typed::<u16>())]),
/// )?;
/// assert_eq!(container.resolve::<String>("port").await?.as_str(), "5432");
/// # Ok(())
/// # }
/// # futures::executor::block_on(run()).unwrap();
/// ```
pub fn create_standard(options: StandardOptions) -> Container {
    let container = match &options.parent {
        Some(parent) => parent.child(),
        None => Container::new(),
    };

    let provider = options.config_provider.unwrap_or_else(|| {
        let document = options.config.unwrap_or_else(|| Value::Object(Default::default()));
        Arc::new(ObjectConfigProvider::new(document)) as Arc<dyn ConfigProvider>
    });
    let deprecated = match options.deprecation_reporter {
        Some(reporter) => DeprecatedMiddleware::with_reporter(move |message: &str| reporter(message)),
        None => DeprecatedMiddleware::new(),
    };

    container
        .add_middleware(ActivationMiddleware::new())
        .add_middleware(ConfigMiddleware::from_shared(provider))
        .add_middleware(deprecated);
    container
}
