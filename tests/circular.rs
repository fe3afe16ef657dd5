use blueprint_di::{Arg, Container, Definition, ErrorCode, Reference, ResolveArg, Shape, TransformArg};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Registers `name` as a counting factory depending on `deps` by name.
fn register(container: &Container, name: &str, deps: &[&str], calls: &Arc<AtomicUsize>) {
    let counter = calls.clone();
    let args: Vec<Arg> = deps.iter().map(|dep| Arg::from(Reference::one().name(*dep))).collect();
    container
        .register_definition(
            Definition::new(name)
                .use_factory(move |_container, _args| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .with_args(args),
        )
        .unwrap();
}

#[tokio::test]
async fn test_two_level_circular() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    register(&container, "A", &["B"], &calls);
    register(&container, "B", &["A"], &calls);

    let error = container.get("A").await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::CircularDependencyDetected);
    assert_eq!(error.circular_path().unwrap(), ["A", "B", "A"]);
    assert_eq!(error.to_string(), "Circular dependency found: A -> B -> A");
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no factory may run");
}

#[tokio::test]
async fn test_self_circular_dependency() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    register(&container, "self", &["self"], &calls);

    let error = container.get("self").await.unwrap_err();
    assert_eq!(error.circular_path().unwrap(), ["self", "self"]);
}

#[tokio::test]
async fn test_three_level_circular() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    register(&container, "A", &["B"], &calls);
    register(&container, "B", &["C"], &calls);
    register(&container, "C", &["A"], &calls);

    let error = container.get("B").await.unwrap_err();
    assert_eq!(error.circular_path().unwrap(), ["B", "C", "A", "B"]);
}

#[tokio::test]
async fn test_rejection_is_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    register(&container, "A", &["B"], &calls);
    register(&container, "B", &["A"], &calls);

    let a = container.find_by_name("A").unwrap();
    container.get(&a).await.unwrap_err();
    assert!(!container.is_cached(&a));
    assert!(!a.is_locked());
}

#[tokio::test]
async fn test_non_circular_graph_resolves() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    register(&container, "top", &["left", "right"], &calls);
    register(&container, "left", &["bottom"], &calls);
    register(&container, "right", &["bottom"], &calls);
    register(&container, "bottom", &[], &calls);

    container.get("top").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4, "shared dependency built once");
}

#[tokio::test]
async fn test_cycle_through_nested_args() {
    let container = Container::new();
    container
        .register_definition(
            Definition::new("A")
                .use_value(1u8)
                .with_args([Arg::from(ResolveArg::new(Shape::map([(
                    "inner",
                    Shape::list([Shape::arg(Reference::one().name("B"))]),
                )])))]),
        )
        .unwrap();
    container
        .register_definition(
            Definition::new("B")
                .use_value(2u8)
                .with_args([Arg::from(TransformArg::new(Reference::one().name("A"), Ok))]),
        )
        .unwrap();

    let error = container.get("A").await.unwrap_err();
    assert_eq!(error.circular_path().unwrap(), ["A", "B", "A"]);
}

#[tokio::test]
async fn test_missing_reference_fails_before_construction() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    register(&container, "A", &["ghost"], &calls);

    let error = container.get("A").await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::NoMatchingService);
    assert_eq!(error.to_string(), "No matching service for following lookup: by service name: ghost");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
