#![no_main]

use blueprint_di::{Arg, Container, Definition, ErrorCode, Reference};
use futures::executor::block_on;
use libfuzzer_sys::fuzz_target;

const NODES: usize = 8;

fuzz_target!(|data: &[u8]| {
    let container = Container::new();
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); NODES];

    // Each byte is an edge: high nibble -> low nibble
    for byte in data.iter().take(32) {
        let from = (byte >> 4) as usize % NODES;
        let to = (byte & 0x0f) as usize % NODES;
        if !edges[from].contains(&to) {
            edges[from].push(to);
        }
    }

    for (node, deps) in edges.iter().enumerate() {
        let args: Vec<Arg> = deps
            .iter()
            .map(|dep| Arg::from(Reference::one().name(format!("n{}", dep))))
            .collect();
        container
            .register_definition(Definition::new(format!("n{}", node)).use_value(node).with_args(args))
            .unwrap();
    }

    for node in 0..NODES {
        match block_on(container.get(format!("n{}", node))) {
            Ok(_) => {}
            Err(error) => {
                assert_eq!(error.code(), ErrorCode::CircularDependencyDetected);
                let path = error.circular_path().unwrap();
                assert!(path.len() >= 2);
                assert_eq!(path.first(), Some(&format!("n{}", node)));
            }
        }
    }
});
