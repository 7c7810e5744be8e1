// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Parsed GraphQL executable documents for stubwire.
//!
//! Parsing happens upstream; this crate only carries the already-parsed IR
//! (serde-friendly so fixtures can be stored as JSON), prints it back to
//! GraphQL text, and applies the shape-normalization transform that injects
//! a discriminator field into every selection set.
//!
//! # Modules
//!
//! - [`print`] - Authored-order and canonical printers (validating)
//! - [`shape`] - Shape normalization (`__typename` injection)
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod print;
pub mod shape;

pub use print::{print, print_canonical, validate};
pub use shape::TYPENAME_FIELD;

/// Errors raised when a document cannot be printed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The document carries no definitions at all.
    #[error("document has no definitions")]
    Empty,
    /// A selection set exists but selects nothing.
    #[error("empty selection set at {path}")]
    EmptySelectionSet {
        /// Dotted path to the offending selection set.
        path: String,
    },
    /// A name does not match `/[_A-Za-z][_0-9A-Za-z]*/`.
    #[error("invalid name {0:?}")]
    InvalidName(String),
    /// The same variable is declared twice on one operation.
    #[error("duplicate variable definition ${0}")]
    DuplicateVariable(String),
    /// NaN or infinite float literal.
    #[error("non-finite float literal")]
    NonFiniteFloat,
    /// `T!!` style type reference.
    #[error("non-null type cannot wrap another non-null type")]
    NestedNonNull,
}

// ─── Document ────────────────────────────────────────────────────────────────

/// A parsed executable document (operations plus fragments).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    /// Top-level definitions in authored order.
    pub definitions: Vec<Definition>,
}

impl Document {
    /// Document holding a single operation.
    pub fn operation(op: OperationDefinition) -> Self {
        Self {
            definitions: vec![Definition::Operation(op)],
        }
    }

    /// Append a fragment definition.
    pub fn with_fragment(mut self, fragment: FragmentDefinition) -> Self {
        self.definitions.push(Definition::Fragment(fragment));
        self
    }

    /// First operation in the document, if any.
    pub fn first_operation(&self) -> Option<&OperationDefinition> {
        self.definitions.iter().find_map(|def| match def {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
    }
}

/// Top-level definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Definition {
    /// `query`/`mutation`/`subscription` operation.
    Operation(OperationDefinition),
    /// `fragment Name on Type { ... }`.
    Fragment(FragmentDefinition),
}

/// Operation type keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Read-only operation.
    Query,
    /// State-mutating operation.
    Mutation,
    /// Long-lived subscription operation.
    Subscription,
}

impl OperationKind {
    /// GraphQL keyword for this operation type.
    pub fn keyword(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

/// An operation definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDefinition {
    /// Operation type.
    pub operation: OperationKind,
    /// Optional operation name.
    #[serde(default)]
    pub name: Option<String>,
    /// Declared variables.
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
    /// Operation-level directives.
    #[serde(default)]
    pub directives: Vec<Directive>,
    /// Root selection set.
    pub selection_set: SelectionSet,
}

impl OperationDefinition {
    /// New operation with an empty root selection set.
    pub fn new(operation: OperationKind, name: Option<&str>) -> Self {
        Self {
            operation,
            name: name.map(str::to_owned),
            variables: Vec::new(),
            directives: Vec::new(),
            selection_set: SelectionSet::default(),
        }
    }

    /// Declare a variable.
    pub fn variable(mut self, name: &str, ty: TypeRef) -> Self {
        self.variables.push(VariableDefinition {
            name: name.to_owned(),
            ty,
            default_value: None,
        });
        self
    }

    /// Add a root selection.
    pub fn select(mut self, selection: impl Into<Selection>) -> Self {
        self.selection_set.items.push(selection.into());
        self
    }
}

/// `$name: Type = default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Variable name without the `$`.
    pub name: String,
    /// Declared type.
    pub ty: TypeRef,
    /// Optional default value.
    #[serde(default)]
    pub default_value: Option<Value>,
}

/// Type reference in a variable definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeRef {
    /// Named type, e.g. `String`.
    Named {
        /// Type name.
        name: String,
    },
    /// `[T]`.
    List {
        /// Element type.
        of: Box<TypeRef>,
    },
    /// `T!`.
    NonNull {
        /// Wrapped type.
        of: Box<TypeRef>,
    },
}

impl TypeRef {
    /// Named type reference.
    pub fn named(name: &str) -> Self {
        TypeRef::Named {
            name: name.to_owned(),
        }
    }

    /// Wrap in a non-null marker.
    pub fn non_null(self) -> Self {
        TypeRef::NonNull { of: Box::new(self) }
    }

    /// Wrap in a list.
    pub fn list(self) -> Self {
        TypeRef::List { of: Box::new(self) }
    }
}

/// `fragment Name on Type @dirs { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentDefinition {
    /// Fragment name.
    pub name: String,
    /// Type condition (`on Type`).
    pub type_condition: String,
    /// Fragment directives.
    #[serde(default)]
    pub directives: Vec<Directive>,
    /// Fragment body.
    pub selection_set: SelectionSet,
}

// ─── Selections ──────────────────────────────────────────────────────────────

/// Ordered list of selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SelectionSet {
    /// Selections in authored order.
    pub items: Vec<Selection>,
}

impl SelectionSet {
    /// True when a plain field named `name` is selected directly in this set.
    pub fn selects_field(&self, name: &str) -> bool {
        self.items
            .iter()
            .any(|sel| matches!(sel, Selection::Field(field) if field.name == name))
    }
}

/// One entry in a selection set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Selection {
    /// Field selection.
    Field(Field),
    /// `...Name`.
    FragmentSpread(FragmentSpread),
    /// `... on Type { ... }`.
    InlineFragment(InlineFragment),
}

impl From<Field> for Selection {
    fn from(field: Field) -> Self {
        Selection::Field(field)
    }
}

impl From<FragmentSpread> for Selection {
    fn from(spread: FragmentSpread) -> Self {
        Selection::FragmentSpread(spread)
    }
}

impl From<InlineFragment> for Selection {
    fn from(fragment: InlineFragment) -> Self {
        Selection::InlineFragment(fragment)
    }
}

/// Field selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Response alias.
    #[serde(default)]
    pub alias: Option<String>,
    /// Field name.
    pub name: String,
    /// Arguments in authored order.
    #[serde(default)]
    pub arguments: Vec<Argument>,
    /// Field directives.
    #[serde(default)]
    pub directives: Vec<Directive>,
    /// Sub-selection; `None` for leaf fields.
    #[serde(default)]
    pub selection_set: Option<SelectionSet>,
}

impl Field {
    /// Leaf field with no arguments.
    pub fn new(name: &str) -> Self {
        Self {
            alias: None,
            name: name.to_owned(),
            arguments: Vec::new(),
            directives: Vec::new(),
            selection_set: None,
        }
    }

    /// Set the response alias.
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_owned());
        self
    }

    /// Append an argument.
    pub fn argument(mut self, name: &str, value: Value) -> Self {
        self.arguments.push(Argument {
            name: name.to_owned(),
            value,
        });
        self
    }

    /// Append a directive.
    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    /// Append a sub-selection, turning the field into a composite one.
    pub fn select(mut self, selection: impl Into<Selection>) -> Self {
        self.selection_set
            .get_or_insert_with(SelectionSet::default)
            .items
            .push(selection.into());
        self
    }
}

/// `...Name @dirs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentSpread {
    /// Referenced fragment name.
    pub name: String,
    /// Spread directives.
    #[serde(default)]
    pub directives: Vec<Directive>,
}

/// `... on Type @dirs { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineFragment {
    /// Optional type condition.
    #[serde(default)]
    pub type_condition: Option<String>,
    /// Fragment directives.
    #[serde(default)]
    pub directives: Vec<Directive>,
    /// Fragment body.
    pub selection_set: SelectionSet,
}

/// `name: value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Argument name.
    pub name: String,
    /// Argument value.
    pub value: Value,
}

/// `@name(args)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    /// Directive name without the `@`.
    pub name: String,
    /// Directive arguments.
    #[serde(default)]
    pub arguments: Vec<Argument>,
}

impl Directive {
    /// Directive with no arguments.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            arguments: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn argument(mut self, name: &str, value: Value) -> Self {
        self.arguments.push(Argument {
            name: name.to_owned(),
            value,
        });
        self
    }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// Input value literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    /// `$name`.
    Variable(String),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal.
    String(String),
    /// `true`/`false`.
    Boolean(bool),
    /// `null`.
    Null,
    /// Enum literal.
    Enum(String),
    /// `[a, b]`.
    List(Vec<Value>),
    /// `{a: 1}`.
    Object(Vec<ObjectField>),
}

impl Value {
    /// `$name` reference.
    pub fn variable(name: &str) -> Self {
        Value::Variable(name.to_owned())
    }
}

/// `name: value` inside an object literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ir_survives_json_round_trip() {
        let doc = Document::operation(
            OperationDefinition::new(OperationKind::Query, Some("UserInfo"))
                .variable("name", TypeRef::named("String"))
                .select(
                    Field::new("user")
                        .argument("name", Value::variable("name"))
                        .select(Field::new("name")),
                ),
        );
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn leaf_field_has_no_selection_set() {
        let field = Field::new("name");
        assert!(field.selection_set.is_none());
        let composite = field.select(Field::new("id"));
        assert!(composite.selection_set.is_some());
    }

    #[test]
    fn selects_field_ignores_nested_matches() {
        let set = SelectionSet {
            items: vec![Field::new("user").select(Field::new("__typename")).into()],
        };
        assert!(set.selects_field("user"));
        assert!(!set.selects_field("__typename"));
    }
}
