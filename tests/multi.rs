use blueprint_di::{
    Annotation, AnnotationKind, AnyArc, Arg, Container, Definition, ErrorCode, Lookup, Reference, TypeRef,
};

const ROUTE: AnnotationKind<String> = AnnotationKind::new("route");

fn as_strings(values: Vec<AnyArc>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.downcast::<String>().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_get_by_annotation_in_registration_order() {
    let container = Container::new();
    container
        .register_definition(Definition::new("A").use_value("a".to_string()).annotate("tag"))
        .unwrap();
    container
        .register_definition(Definition::new("B").use_value("b".to_string()).annotate("tag"))
        .unwrap();
    container
        .register_definition(Definition::new("C").use_value("c".to_string()))
        .unwrap();

    let values = container.get_by_annotation(|a| a.is("tag")).await.unwrap();
    assert_eq!(as_strings(values), vec!["a", "b"]);
}

#[tokio::test]
async fn test_get_by_annotation_with_payloads() {
    let container = Container::new();
    container
        .register_definition(Definition::new("users").use_value("users handler".to_string()).annotate(ROUTE.create("/users".into())))
        .unwrap();
    container
        .register_definition(Definition::new("health").use_value("health handler".to_string()).annotate(ROUTE.create("/health".into())))
        .unwrap();

    let pairs = container.get_by_annotation_with(ROUTE.predicate()).await.unwrap();
    let routes: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(service, annotation)| {
            (
                ROUTE.payload_of(&annotation).unwrap().clone(),
                service.downcast::<String>().unwrap().to_string(),
            )
        })
        .collect();

    assert_eq!(
        routes,
        vec![
            ("/users".to_string(), "users handler".to_string()),
            ("/health".to_string(), "health handler".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_get_by_predicate() {
    let container = Container::new();
    for name in ["job.send", "job.clean", "http"] {
        container
            .register_definition(Definition::new(name).use_value(name.to_string()))
            .unwrap();
    }

    let jobs = container
        .get_by_predicate(|d| d.name().as_str().starts_with("job."))
        .await
        .unwrap();
    assert_eq!(as_strings(jobs), vec!["job.send", "job.clean"]);
}

#[tokio::test]
async fn test_multi_reference_argument() {
    let container = Container::new();
    for name in ["first", "second"] {
        container
            .register_definition(Definition::new(name).use_value(name.to_string()).annotate("plugin"))
            .unwrap();
    }
    container
        .register_definition(
            Definition::new("registry")
                .use_factory(|_container, args| {
                    let plugins = args.get_all::<String>(0)?;
                    Ok(plugins.iter().map(|p| p.to_string()).collect::<Vec<_>>().join("+"))
                })
                .with_args([Arg::from(Reference::multi().annotation(|a| a.is("plugin")))]),
        )
        .unwrap();

    let registry = container.resolve::<String>("registry").await.unwrap();
    assert_eq!(registry.as_str(), "first+second");
}

#[tokio::test]
async fn test_empty_multi_reference() {
    let container = Container::new();
    container
        .register_definition(
            Definition::new("count")
                .use_factory(|_container, args| Ok(args.get_all::<String>(0)?.len()))
                .with_args([Arg::from(Reference::multi().name("nobody"))]),
        )
        .unwrap();

    assert_eq!(*container.resolve::<usize>("count").await.unwrap(), 0);
}

#[tokio::test]
async fn test_one_reference_ambiguous_and_missing() {
    let container = Container::new();
    for name in ["x", "y", "z"] {
        container
            .register_definition(Definition::new(name).use_value(1u8).annotate("same"))
            .unwrap();
    }
    container
        .register_definition(
            Definition::new("ambiguous")
                .use_value(0u8)
                .with_args([Arg::from(Reference::one().annotation(|a| a.is("same")))]),
        )
        .unwrap();
    container
        .register_definition(
            Definition::new("lonely")
                .use_value(0u8)
                .with_args([Arg::from(Reference::one().annotation(|a| a.is("nothing")))]),
        )
        .unwrap();

    let error = container.get("ambiguous").await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::AmbiguousService);
    match &error {
        blueprint_di::DiError::AmbiguousService { names, lookup } => {
            assert_eq!(names, &["x", "y", "z"]);
            assert_eq!(lookup, "by annotation predicate");
        }
        other => panic!("unexpected error {:?}", other),
    }

    let error = container.get("lonely").await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::NoMatchingService);
}

#[tokio::test]
async fn test_reference_by_type() {
    trait Transport: Send + Sync {}
    struct Smtp;

    let container = Container::new();
    container
        .register_definition(
            Definition::new("smtp")
                .use_value(Smtp)
                .mark_type(TypeRef::new::<Smtp>().unwrap().extends::<dyn Transport>()),
        )
        .unwrap();
    container
        .register_definition(Definition::new("unrelated").use_value(5u32))
        .unwrap();

    let lookup = Lookup::by_type(TypeRef::new::<dyn Transport>().unwrap());
    let found = lookup.find(&container);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name().as_str(), "smtp");
    assert!(lookup.to_string().starts_with("by type: instance of type"));

    container
        .register_definition(
            Definition::new("mailer")
                .use_factory(|_container, args| {
                    args.get::<Smtp>(0)?;
                    Ok("mailer")
                })
                .with_args([Arg::from(Reference::one().of_type(TypeRef::new::<dyn Transport>().unwrap()))]),
        )
        .unwrap();
    assert_eq!(*container.resolve::<&str>("mailer").await.unwrap(), "mailer");
}

#[test]
fn test_find_by_annotation_with_returns_first_match() {
    let container = Container::new();
    let first = Annotation::with_payload("priority", 1u8);
    let second = Annotation::with_payload("priority", 2u8);
    container
        .register_definition(
            Definition::new("svc")
                .use_value(())
                .annotate(first.clone())
                .annotate(second),
        )
        .unwrap();

    let found = container.find_by_annotation_with(|a| a.is("priority"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1, first);
    assert_eq!(found[0].1.payload::<u8>(), Some(&1));
}
