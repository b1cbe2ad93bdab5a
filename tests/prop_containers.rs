mod common;

use avcbox::diagnostics::DiagnosticEntry;
use avcbox::parser::{ParseOptions, parse, parse_with};
use common::{bx, container};
use proptest::prelude::*;

const CONTAINERS: [&[u8; 4]; 4] = [b"moov", b"trak", b"udta", b"edts"];

#[derive(Debug, Clone)]
enum Shape {
    Leaf(usize),
    Container(usize, Vec<Shape>),
}

impl Shape {
    fn encode(&self) -> Vec<u8> {
        match self {
            Shape::Leaf(n) => bx(b"free", &vec![0x5a; *n]),
            Shape::Container(t, kids) => {
                let kids: Vec<Vec<u8>> = kids.iter().map(Shape::encode).collect();
                container(CONTAINERS[*t], &kids)
            }
        }
    }

    fn count(&self) -> usize {
        match self {
            Shape::Leaf(_) => 1,
            Shape::Container(_, kids) => 1 + kids.iter().map(Shape::count).sum::<usize>(),
        }
    }
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = (0usize..48).prop_map(Shape::Leaf);
    leaf.prop_recursive(4, 48, 5, |inner| {
        (0..CONTAINERS.len(), prop::collection::vec(inner, 0..5))
            .prop_map(|(t, kids)| Shape::Container(t, kids))
    })
}

fn depth(entry: &DiagnosticEntry) -> usize {
    entry.box_path.matches('/').count()
}

proptest! {
    #[test]
    fn children_exactly_fill_their_container(shapes in prop::collection::vec(shape(), 1..4)) {
        let data: Vec<u8> = shapes.iter().flat_map(Shape::encode).collect();
        let tree = parse_with(&data, 0, &ParseOptions::default().with_diagnostics(true)).unwrap();
        let diag = tree.diagnostics.as_ref().unwrap();

        prop_assert_eq!(diag.len(), shapes.iter().map(Shape::count).sum::<usize>());

        let top: u64 = diag.iter().filter(|e| depth(e) == 1).map(|e| e.box_size).sum();
        prop_assert_eq!(top, data.len() as u64);

        for parent in diag.iter().filter(|e| CONTAINERS.contains(&&e.box_type.0)) {
            let body = parent.box_head + 8..parent.box_head + parent.box_size;
            let filled: u64 = diag
                .iter()
                .filter(|c| depth(c) == depth(parent) + 1 && body.contains(&c.box_head))
                .map(|c| c.box_size)
                .sum();
            prop_assert_eq!(filled, parent.box_size - 8, "container {}", &parent.box_path);
        }
    }

    #[test]
    fn parsing_twice_gives_equal_trees(shapes in prop::collection::vec(shape(), 1..4)) {
        let data: Vec<u8> = shapes.iter().flat_map(Shape::encode).collect();
        prop_assert_eq!(parse(&data).unwrap(), parse(&data).unwrap());
    }

    #[test]
    fn truncated_input_never_panics(shape in shape(), cut in 0usize..512) {
        let data = shape.encode();
        let cut = cut.min(data.len());
        let _ = parse(&data[..cut]);
    }
}
