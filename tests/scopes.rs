use blueprint_di::{Arg, Container, Definition, ErrorCode, Reference};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting_definition(name: &str, calls: &Arc<AtomicUsize>) -> Definition {
    let counter = calls.clone();
    Definition::new(name).use_factory(move |_container, _args| Ok(counter.fetch_add(1, Ordering::SeqCst)))
}

#[tokio::test]
async fn test_parent_definition_cached_in_parent() {
    let calls = Arc::new(AtomicUsize::new(0));
    let parent = Container::new();
    let definition = counting_definition("X", &calls);
    parent.register_definition(definition.clone()).unwrap();

    let first = parent.child();
    let second = parent.child();
    let a = first.resolve::<usize>("X").await.unwrap();
    let b = second.resolve::<usize>("X").await.unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(parent.is_cached(&definition));
    assert!(!first.is_cached(&definition));
    assert!(!second.is_cached(&definition));
}

#[tokio::test]
async fn test_grandchild_delegates_to_owner() {
    let calls = Arc::new(AtomicUsize::new(0));
    let root = Container::new();
    let definition = counting_definition("X", &calls);
    root.register_definition(definition.clone()).unwrap();

    let middle = root.child();
    let leaf = middle.child();
    leaf.get("X").await.unwrap();
    middle.get("X").await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(root.is_cached(&definition));
    assert!(!middle.is_cached(&definition));
    assert!(!leaf.is_cached(&definition));
}

#[tokio::test]
async fn test_child_shadows_parent() {
    let parent = Container::new();
    parent
        .register_definition(Definition::new("env").use_value("parent".to_string()))
        .unwrap();

    let child = parent.child();
    child
        .register_definition(Definition::new("env").use_value("child".to_string()))
        .unwrap();

    assert_eq!(child.resolve::<String>("env").await.unwrap().as_str(), "child");
    assert_eq!(parent.resolve::<String>("env").await.unwrap().as_str(), "parent");
    assert_eq!(child.find_by_predicate(|d| d.name() == "env").len(), 2);
}

#[tokio::test]
async fn test_parent_reference_resolves_in_parent_scope() {
    let parent = Container::new();
    parent
        .register_definition(Definition::new("env").use_value("parent".to_string()))
        .unwrap();
    parent
        .register_definition(
            Definition::new("label")
                .use_factory(|_container, args| Ok(format!("env={}", args.get::<String>(0)?)))
                .with_args([Arg::from(Reference::one().name("env"))]),
        )
        .unwrap();

    let child = parent.child();
    child
        .register_definition(Definition::new("env").use_value("child".to_string()))
        .unwrap();

    // Owned by the parent, so built there against the parent's "env"
    let label = child.resolve::<String>("label").await.unwrap();
    assert_eq!(label.as_str(), "env=parent");
}

#[tokio::test]
async fn test_child_definition_depends_on_parent() {
    let parent = Container::new();
    parent.named_definition_with_value("base", 10u32).unwrap();

    let child = parent.child();
    child
        .register_definition(
            Definition::new("derived")
                .use_factory(|_container, args| Ok(*args.get::<u32>(0)? * 2))
                .with_args([Arg::from(Reference::one().name("base"))]),
        )
        .unwrap();

    assert_eq!(*child.resolve::<u32>("derived").await.unwrap(), 20);
    assert_eq!(parent.get("derived").await.unwrap_err().code(), ErrorCode::ServiceNotFound);
}

#[tokio::test]
async fn test_lookups_list_local_first() {
    let parent = Container::new();
    parent
        .register_definition(Definition::new("p").use_value(1u8).annotate("tag"))
        .unwrap();
    let child = parent.child();
    child
        .register_definition(Definition::new("c").use_value(2u8).annotate("tag"))
        .unwrap();

    let names: Vec<String> = child
        .find_by_annotation(|a| a.is("tag"))
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    assert_eq!(names, vec!["c", "p"]);

    let values = child.get_by_annotation(|a| a.is("tag")).await.unwrap();
    let values: Vec<u8> = values.into_iter().map(|v| *v.downcast::<u8>().unwrap()).collect();
    assert_eq!(values, vec![2, 1]);
}

#[test]
fn test_same_name_in_sibling_scopes() {
    let parent = Container::new();
    let left = parent.child();
    let right = parent.child();

    left.register_definition(Definition::new("svc").use_value(1u8)).unwrap();
    right.register_definition(Definition::new("svc").use_value(2u8)).unwrap();
    assert!(parent.find_by_name("svc").is_none());
    assert_eq!(left.parent(), Some(&parent));
}

#[tokio::test]
async fn test_shadowed_name_is_not_a_cycle_for_parent_definitions() {
    let parent = Container::new();
    parent.named_definition_with_value("B", "parent-b".to_string()).unwrap();
    parent
        .register_definition(
            Definition::new("A")
                .use_factory(|_container, args| Ok(format!("A({})", args.get::<String>(0)?)))
                .with_args([Arg::from(Reference::one().name("B"))]),
        )
        .unwrap();

    let child = parent.child();
    child
        .register_definition(
            Definition::new("C")
                .use_factory(|_container, args| Ok(format!("C({})", args.get::<String>(0)?)))
                .with_args([Arg::from(Reference::one().name("A"))]),
        )
        .unwrap();
    // Child "B" depends on "C", but the parent's "A" never sees it
    child
        .register_definition(
            Definition::new("B")
                .use_factory(|_container, args| Ok(format!("B({})", args.get::<String>(0)?)))
                .with_args([Arg::from(Reference::one().name("C"))]),
        )
        .unwrap();

    assert_eq!(child.resolve::<String>("C").await.unwrap().as_str(), "C(A(parent-b))");
    assert_eq!(child.resolve::<String>("B").await.unwrap().as_str(), "B(C(A(parent-b)))");
}

#[tokio::test]
async fn test_cycle_within_child_scope_still_detected() {
    let parent = Container::new();
    parent.named_definition_with_value("B", "parent-b".to_string()).unwrap();

    let child = parent.child();
    child
        .register_definition(
            Definition::new("B")
                .use_value("child-b".to_string())
                .with_args([Arg::from(Reference::one().name("C"))]),
        )
        .unwrap();
    child
        .register_definition(
            Definition::new("C")
                .use_value("c".to_string())
                .with_args([Arg::from(Reference::one().name("B"))]),
        )
        .unwrap();

    let error = child.get("C").await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::CircularDependencyDetected);
    assert_eq!(error.circular_path().unwrap(), ["C", "B", "C"]);
    assert_eq!(parent.resolve::<String>("B").await.unwrap().as_str(), "parent-b");
}
