use derive_builder::Builder;
use tracing::{debug, trace};

use crate::{
    error::Error,
    field::{Field, Kind, Node, Overridable},
    source::Source,
};

/// Default bound on structural descents for a single apply pass.
pub const DEFAULT_MAX_DEPTH: usize = 64;

///
/// The override engine: walks a structured value and applies any
/// convention-named values its source holds on top of it, in place.
///
/// The walk stops at the first field it cannot process; overrides
/// applied before that point are kept.
///
#[derive(Builder, Debug)]
#[builder(setter(into))]
pub struct Overlay<S> {
    /// Key/value source queried for override values.
    source: S,
    /// Bound on structural descents; past it the structure is presumed
    /// self-referential.
    #[builder(default = "DEFAULT_MAX_DEPTH")]
    max_depth: usize,
}

impl<S: Source> Overlay<S> {
    /// Engine over `source` with the default depth bound.
    pub fn new(source: S) -> Self {
        Overlay {
            source,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Apply overrides beneath `prefix` to `target`, in place.
    ///
    /// `prefix` becomes the first key segment for every top-level
    /// field; an empty prefix keys fields purely by their own names.
    /// The target must present as a structure; anything else is
    /// refused here rather than silently skipped.
    pub fn apply<'a>(&self, prefix: &str, target: impl Into<Node<'a>>) -> Result<(), Error> {
        match target.into() {
            Node::Struct(target) => {
                debug!(prefix, "applying overrides");
                self.walk_struct(prefix, target, 0)
            }
            Node::Opaque => Err(Error::NotAStruct {
                prefix: prefix.to_owned(),
            }),
        }
    }

    /// Recursive entry. Opaque nodes bottom out silently; structures
    /// are walked field by field.
    fn walk(&self, prefix: &str, node: Node<'_>, depth: usize) -> Result<(), Error> {
        if depth > self.max_depth {
            return Err(Error::RecursionOverflow {
                prefix: prefix.to_owned(),
                max_depth: self.max_depth,
            });
        }
        match node {
            Node::Struct(target) => self.walk_struct(prefix, target, depth),
            Node::Opaque => Ok(()),
        }
    }

    fn walk_struct(
        &self,
        prefix: &str,
        target: &mut dyn Overridable,
        depth: usize,
    ) -> Result<(), Error> {
        for field in target.fields() {
            self.apply_field(prefix, field, depth)?;
        }
        Ok(())
    }

    fn apply_field(&self, prefix: &str, field: Field<'_>, depth: usize) -> Result<(), Error> {
        let key = field.key(prefix);
        let Field {
            name,
            settable,
            kind,
            ..
        } = field;

        match kind {
            Kind::Struct(node) => self.walk(&key, node, depth + 1),
            Kind::Seq(nodes) => {
                // Plain key first: an index-specific override of the
                // same leaf lands second and wins.
                for (index, mut node) in nodes.into_iter().enumerate() {
                    self.walk(&key, node.reborrow(), depth + 1)?;
                    self.walk(&format!("{}_{}", key, index), node, depth + 1)?;
                }
                Ok(())
            }
            Kind::Other(node) => {
                self.leaf_value(&key, name, settable)?;
                if settable {
                    // descent target, not an assignment target
                    self.walk(&key, node, depth + 1)
                } else {
                    Ok(())
                }
            }
            Kind::Scalar(slot) => match self.leaf_value(&key, name, settable)? {
                Some(raw) => {
                    trace!(%key, field = name, "override found");
                    slot.assign(&key, name, &raw)
                }
                None => Ok(()),
            },
        }
    }

    /// Leaf gate: the override value for `key`, with empty normalized
    /// to absent. A present value for an unsettable field is an error;
    /// absence never is.
    fn leaf_value(
        &self,
        key: &str,
        name: &'static str,
        settable: bool,
    ) -> Result<Option<String>, Error> {
        let value = self.source.get(key).filter(|value| !value.is_empty());
        if !settable && value.is_some() {
            return Err(Error::Unsettable {
                key: key.to_owned(),
                field: name,
            });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Overlay, OverlayBuilder, DEFAULT_MAX_DEPTH};
    use crate::{
        error::Error,
        field::{Field, Kind, Node, Overridable},
    };
    use serde::Serialize;
    use std::{collections::HashMap, time::Duration};

    #[derive(Clone, Debug, Serialize)]
    struct Example {
        a: String,
        other: Option<Box<SubExample>>,
        others: Vec<SubExample>,
    }

    #[derive(Clone, Debug, Default, Serialize)]
    struct SubExample {
        integer: i32,
        b: String,
        hidden: i32,
        wait_for: Duration,
        other: Option<Box<SubExample>>,
        thing: Thing,
        things: Vec<Thing>,
    }

    /// Stand-in for a field whose declared type is open.
    #[derive(Clone, Debug, Serialize)]
    enum Thing {
        None,
        Text(String),
        Table(Box<SubExample>),
    }

    impl Default for Thing {
        fn default() -> Self {
            Thing::None
        }
    }

    impl Thing {
        fn node(&mut self) -> Node<'_> {
            match self {
                Thing::Table(sub) => Node::Struct(sub.as_mut()),
                _ => Node::Opaque,
            }
        }
    }

    impl Overridable for Example {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::new("a", &mut self.a),
                Field::new("other", Kind::Struct(Node::optional(self.other.as_deref_mut()))),
                Field::new("others", Kind::seq(&mut self.others)),
            ]
        }
    }

    impl Overridable for SubExample {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::new("integer", &mut self.integer),
                Field::new("b", &mut self.b),
                Field::new("hidden", &mut self.hidden).read_only(),
                Field::new("wait_for", &mut self.wait_for).renamed("wait-for"),
                Field::new("other", Kind::Struct(Node::optional(self.other.as_deref_mut()))),
                Field::new("thing", Kind::Other(self.thing.node())),
                Field::new("things", Kind::Seq(self.things.iter_mut().map(Thing::node).collect())),
            ]
        }
    }

    fn example() -> Example {
        Example {
            a: "asd".to_owned(),
            other: Some(Box::new(SubExample {
                integer: 2,
                b: "bsd".to_owned(),
                ..SubExample::default()
            })),
            others: vec![SubExample {
                b: "bsd".to_owned(),
                thing: Thing::Table(Box::new(SubExample {
                    b: "bsd".to_owned(),
                    ..SubExample::default()
                })),
                things: vec![Thing::Text("tsd".to_owned())],
                ..SubExample::default()
            }],
        }
    }

    fn source(environment: &[(&str, &str)]) -> HashMap<String, String> {
        environment
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn snapshot(value: &Example) -> String {
        serde_json::to_string_pretty(value).unwrap()
    }

    /// Apply `environment` to a fresh fixture and compare against a
    /// second fixture mutated by hand.
    fn run(environment: &[(&str, &str)], mutate: impl Fn(&mut Example)) {
        let mut actual = example();
        let mut expected = example();
        mutate(&mut expected);

        Overlay::new(source(environment)).apply("TEST", &mut actual).unwrap();

        assert_eq!(snapshot(&actual), snapshot(&expected));
    }

    #[test]
    fn applies_basic_overrides() {
        run(
            &[
                ("TEST_A", "asd2"),
                ("TEST_OTHER_B", "asd2"),
                ("TEST_OTHER_INTEGER", "10"),
                ("TEST_OTHERS_0_B", "asd2"),
            ],
            |example| {
                example.a = "asd2".to_owned();
                let other = example.other.as_mut().unwrap();
                other.b = "asd2".to_owned();
                other.integer = 10;
                example.others[0].b = "asd2".to_owned();
            },
        );
    }

    #[test]
    fn no_present_keys_is_a_no_op() {
        run(&[], |_| {});
    }

    #[test]
    fn empty_values_read_as_absent() {
        run(&[("TEST_A", "")], |_| {});
    }

    #[test]
    fn empty_prefix_keys_fields_by_name() {
        let mut actual = example();
        Overlay::new(source(&[("A", "asd2")])).apply("", &mut actual).unwrap();
        assert_eq!(actual.a, "asd2");
    }

    #[test]
    fn rename_hints_normalize_hyphens() {
        run(&[("TEST_OTHER_WAIT_FOR", "2h 30m")], |example| {
            example.other.as_mut().unwrap().wait_for = Duration::from_secs(9000);
        });
    }

    #[test]
    fn index_specific_key_wins_over_plain() {
        run(
            &[("TEST_OTHERS_B", "plain"), ("TEST_OTHERS_0_B", "indexed")],
            |example| example.others[0].b = "indexed".to_owned(),
        );
    }

    #[test]
    fn plain_sequence_key_applies_to_every_element() {
        let mut actual = example();
        actual.others.push(SubExample::default());

        Overlay::new(source(&[("TEST_OTHERS_B", "all")]))
            .apply("TEST", &mut actual)
            .unwrap();

        assert_eq!(actual.others[0].b, "all");
        assert_eq!(actual.others[1].b, "all");
    }

    #[test]
    fn indexes_past_the_sequence_are_unreachable() {
        run(&[("TEST_OTHERS_1_B", "asd2")], |_| {});
    }

    #[test]
    fn descends_into_structured_dynamic_fields() {
        run(&[("TEST_OTHERS_0_THING_B", "asd2")], |example| {
            match &mut example.others[0].thing {
                Thing::Table(sub) => sub.b = "asd2".to_owned(),
                other => panic!("fixture changed shape: {:?}", other),
            }
        });
    }

    #[test]
    fn skips_opaque_dynamic_fields() {
        // things[0] has no structure, so the override has nothing to
        // land on; that is not an error
        run(&[("TEST_OTHERS_0_THINGS_0_B", "asd2")], |_| {});
    }

    #[test]
    fn rejects_values_that_do_not_parse() {
        let mut actual = example();
        let err = Overlay::new(source(&[("TEST_OTHER_INTEGER", "o no")]))
            .apply("TEST", &mut actual)
            .unwrap_err();

        assert_eq!(
            err,
            Error::InvalidValue {
                key: "TEST_OTHER_INTEGER".to_owned(),
                field: "integer",
                type_name: "i32",
                value: "o no".to_owned(),
            }
        );
        assert_eq!(actual.other.as_ref().unwrap().integer, 2);
    }

    #[test]
    fn overrides_before_a_failure_are_kept() {
        let mut actual = example();
        let err = Overlay::new(source(&[
            ("TEST_A", "asd2"),
            ("TEST_OTHER_INTEGER", "o no"),
        ]))
        .apply("TEST", &mut actual)
        .unwrap_err();

        assert!(matches!(err, Error::InvalidValue { .. }));
        assert_eq!(actual.a, "asd2");
    }

    #[test]
    fn refuses_overrides_for_read_only_fields() {
        let mut environment = source(&[("TEST_OTHER_HIDDEN", "3")]);
        let mut actual = example();

        let err = Overlay::new(environment.clone())
            .apply("TEST", &mut actual)
            .unwrap_err();
        assert_eq!(
            err,
            Error::Unsettable {
                key: "TEST_OTHER_HIDDEN".to_owned(),
                field: "hidden",
            }
        );
        assert_eq!(actual.other.as_ref().unwrap().hidden, 0);

        // idempotent once the offending key is gone
        environment.remove("TEST_OTHER_HIDDEN");
        Overlay::new(environment).apply("TEST", &mut actual).unwrap();
    }

    #[test]
    fn rejects_a_target_with_no_structure() {
        let err = Overlay::new(HashMap::<String, String>::new())
            .apply("TEST", Node::Opaque)
            .unwrap_err();
        assert_eq!(
            err,
            Error::NotAStruct {
                prefix: "TEST".to_owned(),
            }
        );
    }

    struct Loopy;

    impl Overridable for Loopy {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::new("next", Kind::Struct(Node::Struct(self)))]
        }
    }

    #[test]
    fn cyclic_structures_hit_the_depth_bound() {
        let mut target = Loopy;
        let err = Overlay::new(HashMap::<String, String>::new())
            .apply("TEST", &mut target)
            .unwrap_err();

        match err {
            Error::RecursionOverflow { prefix, max_depth } => {
                assert_eq!(max_depth, DEFAULT_MAX_DEPTH);
                assert!(prefix.starts_with("TEST_NEXT"));
            }
            other => panic!("expected recursive overflow, got {:?}", other),
        }
    }

    #[test]
    fn builder_defaults_the_depth_bound() {
        let overlay: Overlay<HashMap<String, String>> = OverlayBuilder::default()
            .source(HashMap::new())
            .build()
            .unwrap();
        assert_eq!(overlay.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn depth_bound_is_configurable() {
        let mut actual = example();
        let overlay: Overlay<HashMap<String, String>> = OverlayBuilder::default()
            .source(HashMap::new())
            .max_depth(1usize)
            .build()
            .unwrap();

        let err = overlay.apply("TEST", &mut actual).unwrap_err();
        assert!(matches!(err, Error::RecursionOverflow { .. }));
    }
}
