//! Attaches a config provider to the container it is added to.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ConfigProvider;
use crate::container::Container;
use crate::definition::Definition;
use crate::error::DiResult;
use crate::middleware::{Middleware, Next};
use crate::registration::AnyArc;

/// Pass-through stage whose only effect is attaching its provider.
///
/// ```rust
/// use blueprint_di::{config_middleware, Container, ObjectConfigProvider};
/// use serde_json::json;
///
/// let container = Container::new();
/// container.add_middleware(config_middleware(ObjectConfigProvider::new(json!({ "port": 80 }))));
/// assert!(container.config_provider().is_some());
/// ```
#[derive(Clone)]
pub struct ConfigMiddleware {
    provider: Arc<dyn ConfigProvider>,
}

impl ConfigMiddleware {
    pub fn from_shared(provider: Arc<dyn ConfigProvider>) -> Self {
        Self { provider }
    }
}

pub fn config_middleware(provider: impl ConfigProvider + 'static) -> ConfigMiddleware {
    ConfigMiddleware::from_shared(Arc::new(provider))
}

#[async_trait]
impl Middleware for ConfigMiddleware {
    async fn handle(&self, definition: Definition, next: Next) -> DiResult<AnyArc> {
        next.run(definition).await
    }

    fn on_attach(&self, container: &Container) {
        container.attach_config_provider(self.provider.clone());
    }
}
