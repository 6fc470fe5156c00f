//! Tests for template traversal and path addressing.

use std::collections::BTreeMap;

use crate::{Path, Step, Template};

/// A stand-in leaf union: some leaves are symbolic holes, others are plain
/// values that every traversal must pass through untouched.
#[derive(Clone, Debug, PartialEq)]
enum Leaf {
    Hole(&'static str),
    Plain(f64),
}

/// Nested fixture with 3 hole leaves and 2 plain leaves:
///
/// ```text
/// { "temps": { "a": Hole(a), "b": Plain(1.5) },
///   "tuple": ( Hole(b), Plain(2.5), [ Hole(c) ] ) }
/// ```
fn fixture() -> Template<Leaf> {
    Template::map_from([
        (
            "temps",
            Template::map_from([
                ("a", Template::leaf(Leaf::Hole("a"))),
                ("b", Template::leaf(Leaf::Plain(1.5))),
            ]),
        ),
        (
            "tuple",
            Template::Tuple(vec![
                Template::leaf(Leaf::Hole("b")),
                Template::leaf(Leaf::Plain(2.5)),
                Template::List(vec![Template::leaf(Leaf::Hole("c"))]),
            ]),
        ),
    ])
}

// ── Shape preservation ────────────────────────────────────────────────────────

mod shape_tests {
    use super::*;

    #[test]
    fn map_preserves_keys_order_and_arity() {
        let t = fixture();
        let mapped = t.map(&mut |leaf| match leaf {
            Leaf::Hole(name) => name.len() as f64,
            Leaf::Plain(v) => *v,
        });

        // Same shape: every path of the input exists in the output.
        let in_paths: Vec<Path> = t.flatten().into_iter().map(|(p, _)| p).collect();
        let out_paths: Vec<Path> = mapped.flatten().into_iter().map(|(p, _)| p).collect();
        assert_eq!(in_paths, out_paths);

        // Tuple arity survives.
        match mapped.at(&Path(vec![Step::Key("tuple".into())])) {
            Some(Template::Tuple(items)) => assert_eq!(items.len(), 3),
            other => panic!("expected a 3-tuple, got {other:?}"),
        }
    }

    #[test]
    fn replace_touches_only_matching_leaves() {
        let t = fixture();
        let resolved = t
            .try_replace::<()>(
                &|leaf| matches!(leaf, Leaf::Hole(_)),
                &mut |_| Ok(Leaf::Plain(9.0)),
            )
            .unwrap();

        let mut holes = 0;
        let mut untouched = 0;
        resolved.for_each(&mut |path, leaf| match leaf {
            Leaf::Hole(_) => holes += 1,
            Leaf::Plain(v) => {
                // The two original plain leaves pass through clone-identical.
                let original = t.at(path).and_then(Template::as_leaf);
                if original == Some(&Leaf::Plain(*v)) && *v != 9.0 {
                    untouched += 1;
                }
            }
        });
        assert_eq!(holes, 0, "all 3 holes replaced");
        assert_eq!(untouched, 2, "both plain leaves unchanged");
        assert_eq!(resolved.leaf_count(), t.leaf_count());
    }

    #[test]
    fn empty_template_has_no_leaves() {
        let t: Template<Leaf> = Template::empty();
        assert_eq!(t.leaf_count(), 0);
        assert!(t.flatten().is_empty());
    }
}

// ── Failure policy ────────────────────────────────────────────────────────────

mod failure_tests {
    use super::*;

    #[test]
    fn try_map_fails_fast_with_no_partial_result() {
        let t = fixture();
        let mut visited = 0;
        let result: Result<Template<f64>, &str> = t.try_map(&mut |leaf| {
            visited += 1;
            match leaf {
                Leaf::Hole("b") => Err("bad hole: b"),
                Leaf::Hole(_) => Ok(0.0),
                Leaf::Plain(v) => Ok(*v),
            }
        });
        assert_eq!(result, Err("bad hole: b"));
        // Traversal stopped at the failing leaf (deterministic order:
        // temps.a, temps.b, tuple[0]).
        assert_eq!(visited, 3);
    }

    #[test]
    fn try_replace_propagates_the_leaf_error() {
        let t = fixture();
        let result = t.try_replace(
            &|leaf| matches!(leaf, Leaf::Hole(_)),
            &mut |leaf| match leaf {
                Leaf::Hole(name) => Err(format!("no such reading: {name}")),
                other => Ok(other.clone()),
            },
        );
        assert_eq!(result, Err("no such reading: a".to_string()));
    }
}

// ── Paths ─────────────────────────────────────────────────────────────────────

mod path_tests {
    use super::*;

    #[test]
    fn flatten_reports_dotted_paths() {
        let t = fixture();
        let rendered: Vec<String> = t
            .flatten()
            .into_iter()
            .map(|(p, _)| p.to_string())
            .collect();
        assert_eq!(
            rendered,
            vec!["temps.a", "temps.b", "tuple[0]", "tuple[1]", "tuple[2][0]"],
        );
    }

    #[test]
    fn at_resolves_paths_and_rejects_shape_mismatches() {
        let t = fixture();
        let path = Path(vec![
            Step::Key("tuple".into()),
            Step::Index(2),
            Step::Index(0),
        ]);
        assert_eq!(t.at(&path).and_then(Template::as_leaf), Some(&Leaf::Hole("c")));

        // Key step into a tuple: shape mismatch.
        let bad = Path(vec![Step::Key("tuple".into()), Step::Key("x".into())]);
        assert!(t.at(&bad).is_none());
        // Out-of-range index.
        let oob = Path(vec![Step::Key("tuple".into()), Step::Index(3)]);
        assert!(t.at(&oob).is_none());
    }

    #[test]
    fn root_path_renders_as_root() {
        assert_eq!(Path::root().to_string(), "<root>");
        assert!(Path::root().is_root());
        // A bare-leaf template flattens to the root path.
        let t: Template<Leaf> = Template::leaf(Leaf::Plain(0.0));
        let flat = t.flatten();
        assert_eq!(flat.len(), 1);
        assert!(flat[0].0.is_root());
    }

    #[test]
    fn map_keys_iterate_in_sorted_order() {
        let t: Template<u8> = Template::Map(BTreeMap::from([
            ("zeta".to_string(), Template::leaf(1)),
            ("alpha".to_string(), Template::leaf(2)),
        ]));
        let order: Vec<String> = t.flatten().into_iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(order, vec!["alpha", "zeta"]);
    }
}
