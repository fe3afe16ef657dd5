#![no_main]

use blueprint_di::{Container, Definition, ErrorCode};
use futures::executor::block_on;
use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;

fuzz_target!(|data: &[u8]| {
    let container = Container::new();
    let child = container.child();
    let mut parent_names = HashSet::new();

    // Each chunk is one registration: first byte picks the scope, the rest is the name
    for chunk in data.chunks(4) {
        let (scope, name) = match chunk.split_first() {
            Some((scope, name)) => (*scope, String::from_utf8_lossy(name).into_owned()),
            None => continue,
        };
        let target = if scope % 2 == 0 { &container } else { &child };
        let result = target.register_definition(Definition::new(name.as_str()).use_value(name.clone()));

        if let Err(error) = &result {
            assert_eq!(error.code(), ErrorCode::AlreadyDefined);
        } else if scope % 2 == 0 {
            parent_names.insert(name);
        }
    }

    for name in &parent_names {
        let value = block_on(container.resolve::<String>(name.as_str())).unwrap();
        assert_eq!(value.as_str(), name.as_str());
        assert!(child.find_by_name(name).is_some());
    }
});
