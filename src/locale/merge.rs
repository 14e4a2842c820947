//! Deep merge of locale trees.

use serde_json::Value;

use crate::locale::LocaleTree;

/// Merges `source` into `target` in place.
///
/// Keys holding objects on both sides are merged recursively. Anything else
/// (a leaf, an array, or an object meeting a non-object) is replaced by the
/// source value, so the file merged last wins.
pub fn merge_trees(target: &mut LocaleTree, source: LocaleTree) {
    for (key, source_value) in source {
        match (target.get_mut(&key), source_value) {
            (Some(Value::Object(target_child)), Value::Object(source_child)) => {
                merge_trees(target_child, source_child);
            }
            (_, source_value) => {
                target.insert(key, source_value);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;
    use serde_json::json;

    use super::*;

    fn tree(value: Value) -> LocaleTree {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[rstest]
    fn merge_disjoint_keys() {
        let mut target = tree(json!({ "a": "A" }));

        merge_trees(&mut target, tree(json!({ "b": "B" })));

        assert_that!(Value::Object(target), eq(&json!({ "a": "A", "b": "B" })));
    }

    #[rstest]
    fn merge_nested_objects_recursively() {
        let mut target = tree(json!({ "user": { "name": "Name", "email": "Email" } }));

        merge_trees(&mut target, tree(json!({ "user": { "email": "E-mail", "age": "Age" } })));

        assert_that!(
            Value::Object(target),
            eq(&json!({ "user": { "name": "Name", "email": "E-mail", "age": "Age" } }))
        );
    }

    #[rstest]
    #[case::leaf_over_object(json!({ "a": { "b": "B" } }), json!({ "a": "A" }), json!({ "a": "A" }))]
    #[case::object_over_leaf(json!({ "a": "A" }), json!({ "a": { "b": "B" } }), json!({ "a": { "b": "B" } }))]
    #[case::arrays_replace(json!({ "a": ["1", "2"] }), json!({ "a": ["3"] }), json!({ "a": ["3"] }))]
    #[case::object_over_array(json!({ "a": ["1"] }), json!({ "a": { "b": "B" } }), json!({ "a": { "b": "B" } }))]
    fn merge_non_objects_replace(
        #[case] target: Value,
        #[case] source: Value,
        #[case] expected: Value,
    ) {
        let mut target = tree(target);

        merge_trees(&mut target, tree(source));

        assert_that!(Value::Object(target), eq(&expected));
    }

    #[rstest]
    fn merge_is_right_biased_and_associative() {
        let a = json!({ "k": "A", "x": { "y": "A" } });
        let b = json!({ "k": "B", "x": { "z": "B" } });
        let c = json!({ "k": "C", "x": { "y": "C" } });

        let mut left = tree(a.clone());
        merge_trees(&mut left, tree(b.clone()));
        merge_trees(&mut left, tree(c.clone()));

        let mut bc = tree(b);
        merge_trees(&mut bc, tree(c));
        let mut right = tree(a);
        merge_trees(&mut right, bc);

        assert_that!(left["k"], eq(&json!("C")));
        assert_that!(left["x"]["y"], eq(&json!("C")));
        assert_that!(left["x"]["z"], eq(&json!("B")));
        assert_that!(Value::Object(left), eq(&Value::Object(right)));
    }
}
