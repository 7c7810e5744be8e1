// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shape normalization: inject a discriminator field into every selection set.
//!
//! Clients that rewrite outgoing queries (most commonly by adding
//! `__typename` everywhere) must be matched against expectations that were
//! written without the rewrite. Applying the same transform on both sides
//! makes the printed text comparable again.

use crate::{Definition, Document, Field, Selection, SelectionSet};

/// Introspection field injected by the default shape normalization.
pub const TYPENAME_FIELD: &str = "__typename";

impl Document {
    /// Return a copy with `marker` selected in every non-empty selection set.
    ///
    /// Sets that already select `marker` directly are left untouched, so the
    /// transform is idempotent. Empty sets stay empty so that printing still
    /// reports them as malformed.
    pub fn with_shape_marker(&self, marker: &str) -> Document {
        let mut doc = self.clone();
        for def in &mut doc.definitions {
            let set = match def {
                Definition::Operation(op) => &mut op.selection_set,
                Definition::Fragment(frag) => &mut frag.selection_set,
            };
            decorate(set, marker);
        }
        doc
    }

    /// [`with_shape_marker`](Self::with_shape_marker) using [`TYPENAME_FIELD`].
    pub fn with_typename(&self) -> Document {
        self.with_shape_marker(TYPENAME_FIELD)
    }
}

fn decorate(set: &mut SelectionSet, marker: &str) {
    for sel in &mut set.items {
        match sel {
            Selection::Field(field) => {
                if let Some(sub) = field.selection_set.as_mut() {
                    decorate(sub, marker);
                }
            }
            Selection::InlineFragment(inline) => decorate(&mut inline.selection_set, marker),
            Selection::FragmentSpread(_) => {}
        }
    }
    if !set.items.is_empty() && !set.selects_field(marker) {
        set.items.push(Field::new(marker).into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{print, FragmentDefinition, OperationDefinition, OperationKind, Value};

    fn user_query() -> Document {
        Document::operation(
            OperationDefinition::new(OperationKind::Query, Some("UserInfo")).select(
                Field::new("user")
                    .argument("name", Value::String("Ed".into()))
                    .select(Field::new("name")),
            ),
        )
    }

    #[test]
    fn injects_marker_into_every_selection_set() {
        let text = print(&user_query().with_typename()).unwrap();
        assert_eq!(
            text,
            "query UserInfo {\n  user(name: \"Ed\") {\n    name\n    __typename\n  }\n  __typename\n}"
        );
    }

    #[test]
    fn transform_is_idempotent() {
        let once = user_query().with_typename();
        let twice = once.with_typename();
        assert_eq!(once, twice);
    }

    #[test]
    fn original_document_is_untouched() {
        let doc = user_query();
        let _ = doc.with_typename();
        assert!(!print(&doc).unwrap().contains(TYPENAME_FIELD));
    }

    #[test]
    fn decorates_fragment_definitions_with_custom_marker() {
        let doc = user_query().with_fragment(FragmentDefinition {
            name: "F".into(),
            type_condition: "User".into(),
            directives: vec![],
            selection_set: SelectionSet {
                items: vec![Field::new("id").into()],
            },
        });
        let text = print(&doc.with_shape_marker("kind")).unwrap();
        assert!(text.contains("fragment F on User {\n  id\n  kind\n}"));
    }

    #[test]
    fn empty_sets_stay_empty() {
        let mut set = SelectionSet::default();
        decorate(&mut set, TYPENAME_FIELD);
        assert!(set.items.is_empty());
    }
}
