use async_trait::async_trait;
use blueprint_di::{
    create_standard, deprecated, middleware_fn, on_activation, on_activation_async, on_activation_of, ActivationMiddleware,
    AnyArc, Arg, ConfigRequestArg, Container, Definition, DeprecatedMiddleware, DiError, DiResult, Middleware, Next,
    StandardOptions,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Records its label before and after the rest of the chain.
struct Recorder {
    label: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Middleware for Recorder {
    async fn handle(&self, definition: Definition, next: Next) -> DiResult<AnyArc> {
        self.log.lock().push(format!("{} before {}", self.label, definition.name()));
        let result = next.run(definition).await;
        self.log.lock().push(format!("{} after", self.label));
        result
    }
}

#[tokio::test]
async fn test_middlewares_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let container = Container::new();
    container
        .add_middleware(Recorder { label: "outer", log: log.clone() })
        .add_middleware(Recorder { label: "inner", log: log.clone() });
    container.named_definition_with_value("svc", 1u8).unwrap();

    container.get("svc").await.unwrap();
    container.get("svc").await.unwrap();

    assert_eq!(
        *log.lock(),
        vec!["outer before svc", "inner before svc", "inner after", "outer after"]
    );
    assert_eq!(container.middlewares().len(), 2);
}

#[tokio::test]
async fn test_middleware_substitutes_definition() {
    let container = Container::new();
    let replacement = Definition::new("replacement").use_value("mocked".to_string());
    container.add_middleware(middleware_fn(move |definition: Definition, next: Next| {
        let replacement = replacement.clone();
        async move {
            if definition.has_annotation("mock") {
                next.run(replacement).await
            } else {
                next.run(definition).await
            }
        }
    }));
    container
        .register_definition(Definition::new("real").use_value("real".to_string()).annotate("mock"))
        .unwrap();
    container
        .register_definition(Definition::new("other").use_value("other".to_string()))
        .unwrap();

    assert_eq!(container.resolve::<String>("real").await.unwrap().as_str(), "mocked");
    assert_eq!(container.resolve::<String>("other").await.unwrap().as_str(), "other");
}

#[tokio::test]
async fn test_middleware_short_circuits() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let container = Container::new();
    container.add_middleware(middleware_fn(|_definition: Definition, _next: Next| async {
        Ok(Arc::new(99u32) as AnyArc)
    }));
    container
        .named_definition_with_factory("svc", move |_container, _args| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(1u32)
        })
        .unwrap();

    assert_eq!(*container.resolve::<u32>("svc").await.unwrap(), 99);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_middleware_error_fails_resolution() {
    let container = Container::new();
    container.add_middleware(middleware_fn(|definition: Definition, _next: Next| async move {
        Err::<AnyArc, _>(DiError::message(format!("{} blocked", definition.name())))
    }));
    container.named_definition_with_value("svc", 1u8).unwrap();

    let error = container.get("svc").await.unwrap_err();
    assert_eq!(error.to_string(), "Failed to construct service: svc blocked");
}

#[tokio::test]
async fn test_middlewares_are_not_inherited() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let parent = Container::new();
    parent.add_middleware(Recorder { label: "parent", log: log.clone() });

    let child = parent.child();
    child.named_definition_with_value("local", 1u8).unwrap();
    child.get("local").await.unwrap();
    assert!(log.lock().is_empty());
    assert!(child.middlewares().is_empty());

    parent.named_definition_with_value("shared", 2u8).unwrap();
    child.get("shared").await.unwrap();
    assert_eq!(log.lock().first().map(String::as_str), Some("parent before shared"));
}

#[tokio::test]
async fn test_activation_hooks_apply_in_order() {
    let container = Container::new();
    container.add_middleware(ActivationMiddleware::new());
    container
        .register_definition(
            Definition::new("greeting")
                .use_value("hello".to_string())
                .annotate(on_activation_of(|value: Arc<String>| Ok(value.to_uppercase())))
                .annotate(on_activation_of(|value: Arc<String>| Ok(format!("{}!", value))))
                .annotate(on_activation_async(|service: AnyArc, _container: Container| async move {
                    let value = service.downcast::<String>().map_err(|_| DiError::message("not a string"))?;
                    Ok(Arc::new(format!("<{}>", value)) as AnyArc)
                })),
        )
        .unwrap();

    let greeting = container.resolve::<String>("greeting").await.unwrap();
    assert_eq!(greeting.as_str(), "<HELLO!>");
}

#[tokio::test]
async fn test_activation_hook_sees_container() {
    let container = Container::new();
    container.add_middleware(ActivationMiddleware::new());
    container.named_definition_with_value("suffix", "-ok".to_string()).unwrap();
    container
        .register_definition(Definition::new("svc").use_value("base".to_string()).annotate(on_activation(
            |service: AnyArc, container: &Container| {
                let base = service.downcast::<String>().map_err(|_| DiError::message("not a string"))?;
                let has_suffix = container.find_by_name("suffix").is_some();
                Ok(Arc::new(format!("{}{}", base, if has_suffix { "-ok" } else { "" })) as AnyArc)
            },
        )))
        .unwrap();

    assert_eq!(container.resolve::<String>("svc").await.unwrap().as_str(), "base-ok");
}

#[tokio::test]
async fn test_activation_hooks_ignored_without_middleware() {
    let container = Container::new();
    container
        .register_definition(
            Definition::new("svc")
                .use_value(1u8)
                .annotate(on_activation_of(|value: Arc<u8>| Ok(*value + 1))),
        )
        .unwrap();
    assert_eq!(*container.resolve::<u8>("svc").await.unwrap(), 1);
}

#[tokio::test]
async fn test_deprecated_services_are_reported() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    let container = Container::new();
    container.add_middleware(DeprecatedMiddleware::with_reporter(move |message: &str| {
        sink.lock().push(message.to_string())
    }));
    container
        .register_definition(
            Definition::new("legacy")
                .use_value(1u8)
                .annotate(deprecated("use modern"))
                .annotate(deprecated("removed in 2.0")),
        )
        .unwrap();
    container.named_definition_with_value("modern", 2u8).unwrap();

    container.get("legacy").await.unwrap();
    container.get("legacy").await.unwrap();
    container.get("modern").await.unwrap();

    assert_eq!(
        *messages.lock(),
        vec!["Service legacy is deprecated: use modern, removed in 2.0".to_string()]
    );
}

#[tokio::test]
async fn test_create_standard() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    let parent = Container::new();
    let container = create_standard(
        StandardOptions::new()
            .parent(&parent)
            .config(json!({ "app": { "name": "shop" } }))
            .deprecation_reporter(move |message| sink.lock().push(message.to_string())),
    );

    assert_eq!(container.parent(), Some(&parent));
    assert_eq!(container.middlewares().len(), 3);
    assert!(container.config_provider().is_some());

    container
        .register_definition(
            Definition::new("title")
                .use_factory(|_container, args| Ok(args.get::<String>(0)?.to_string()))
                .with_args([Arg::from(ConfigRequestArg::new("app.name").unwrap().typed::<String>())])
                .annotate(on_activation_of(|title: Arc<String>| Ok(title.to_uppercase())))
                .annotate(deprecated("use banner")),
        )
        .unwrap();

    assert_eq!(container.resolve::<String>("title").await.unwrap().as_str(), "SHOP");
    assert_eq!(messages.lock().len(), 1);
}

#[tokio::test]
async fn test_create_standard_without_config() {
    let container = create_standard(StandardOptions::new());
    container
        .register_definition(
            Definition::new("port")
                .use_factory(|_container, args| Ok(*args.get::<u64>(0)?))
                .with_args([Arg::from(ConfigRequestArg::new("port").unwrap().with_default(8080).typed::<u64>())]),
        )
        .unwrap();

    assert!(container.parent().is_none());
    assert_eq!(*container.resolve::<u64>("port").await.unwrap(), 8080);
}
