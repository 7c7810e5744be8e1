// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! GraphQL printers for the document IR.
//!
//! Both printers validate while they walk, so a document that prints is a
//! document that can be keyed. Layout follows the reference GraphQL printer:
//! two-space indentation, one selection per line, `", "` between arguments.
//!
//! The canonical printer additionally:
//! - sorts arguments, object-literal fields and variable definitions by name
//! - sorts selections within each selection set by their printed text
//!
//! Directive order is kept as authored; it is observable to servers.

use crate::{
    Argument, Definition, Directive, Document, DocumentError, FragmentDefinition,
    OperationDefinition, OperationKind, Selection, SelectionSet, TypeRef, Value,
    VariableDefinition,
};
use std::collections::BTreeSet;

type Result<T> = std::result::Result<T, DocumentError>;

/// Print `doc` in authored order.
pub fn print(doc: &Document) -> Result<String> {
    Printer::new(false).document(doc)
}

/// Print `doc` in canonical (order-insensitive) form.
pub fn print_canonical(doc: &Document) -> Result<String> {
    Printer::new(true).document(doc)
}

/// Check that `doc` can be printed (and therefore keyed).
pub fn validate(doc: &Document) -> Result<()> {
    print(doc).map(drop)
}

struct Printer {
    canonical: bool,
    path: Vec<String>,
}

impl Printer {
    fn new(canonical: bool) -> Self {
        Self {
            canonical,
            path: Vec::new(),
        }
    }

    fn document(&mut self, doc: &Document) -> Result<String> {
        if doc.definitions.is_empty() {
            return Err(DocumentError::Empty);
        }
        let parts = doc
            .definitions
            .iter()
            .map(|def| match def {
                Definition::Operation(op) => self.operation(op),
                Definition::Fragment(frag) => self.fragment(frag),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join("\n\n"))
    }

    fn operation(&mut self, op: &OperationDefinition) -> Result<String> {
        if let Some(name) = &op.name {
            check_name(name)?;
        }
        self.path.push(
            op.name
                .clone()
                .unwrap_or_else(|| op.operation.keyword().to_owned()),
        );
        let body = self.selection_set(&op.selection_set, 0);
        self.path.pop();
        let body = body?;

        let shorthand = op.operation == OperationKind::Query
            && op.name.is_none()
            && op.variables.is_empty()
            && op.directives.is_empty();
        if shorthand {
            return Ok(body);
        }

        let mut out = String::from(op.operation.keyword());
        if let Some(name) = &op.name {
            out.push(' ');
            out.push_str(name);
        }
        if !op.variables.is_empty() {
            if op.name.is_none() {
                out.push(' ');
            }
            out.push_str(&self.variable_definitions(&op.variables)?);
        }
        out.push_str(&self.directives(&op.directives)?);
        out.push(' ');
        out.push_str(&body);
        Ok(out)
    }

    fn fragment(&mut self, frag: &FragmentDefinition) -> Result<String> {
        check_name(&frag.name)?;
        check_name(&frag.type_condition)?;
        self.path.push(frag.name.clone());
        let body = self.selection_set(&frag.selection_set, 0);
        self.path.pop();
        Ok(format!(
            "fragment {} on {}{} {}",
            frag.name,
            frag.type_condition,
            self.directives(&frag.directives)?,
            body?
        ))
    }

    fn variable_definitions(&self, vars: &[VariableDefinition]) -> Result<String> {
        let mut seen = BTreeSet::new();
        let mut parts = Vec::with_capacity(vars.len());
        for var in vars {
            check_name(&var.name)?;
            if !seen.insert(var.name.as_str()) {
                return Err(DocumentError::DuplicateVariable(var.name.clone()));
            }
            let mut part = format!("${}: {}", var.name, type_ref(&var.ty)?);
            if let Some(default) = &var.default_value {
                part.push_str(" = ");
                part.push_str(&self.value(default)?);
            }
            parts.push((var.name.as_str(), part));
        }
        if self.canonical {
            parts.sort_by(|a, b| a.0.cmp(b.0));
        }
        let parts: Vec<String> = parts.into_iter().map(|(_, p)| p).collect();
        Ok(format!("({})", parts.join(", ")))
    }

    fn selection_set(&mut self, set: &SelectionSet, depth: usize) -> Result<String> {
        if set.items.is_empty() {
            return Err(DocumentError::EmptySelectionSet {
                path: self.path.join("."),
            });
        }
        let mut lines = set
            .items
            .iter()
            .map(|sel| self.selection(sel, depth + 1))
            .collect::<Result<Vec<_>>>()?;
        if self.canonical {
            lines.sort();
        }
        Ok(format!("{{\n{}\n{}}}", lines.join("\n"), indent(depth)))
    }

    fn selection(&mut self, sel: &Selection, depth: usize) -> Result<String> {
        let mut out = indent(depth);
        match sel {
            Selection::Field(field) => {
                if let Some(alias) = &field.alias {
                    check_name(alias)?;
                    out.push_str(alias);
                    out.push_str(": ");
                }
                check_name(&field.name)?;
                out.push_str(&field.name);
                out.push_str(&self.arguments(&field.arguments)?);
                out.push_str(&self.directives(&field.directives)?);
                if let Some(sub) = &field.selection_set {
                    self.path
                        .push(field.alias.clone().unwrap_or_else(|| field.name.clone()));
                    let body = self.selection_set(sub, depth);
                    self.path.pop();
                    out.push(' ');
                    out.push_str(&body?);
                }
            }
            Selection::FragmentSpread(spread) => {
                check_name(&spread.name)?;
                out.push_str("...");
                out.push_str(&spread.name);
                out.push_str(&self.directives(&spread.directives)?);
            }
            Selection::InlineFragment(inline) => {
                out.push_str("...");
                if let Some(cond) = &inline.type_condition {
                    check_name(cond)?;
                    out.push_str(" on ");
                    out.push_str(cond);
                }
                out.push_str(&self.directives(&inline.directives)?);
                self.path.push(format!(
                    "...{}",
                    inline.type_condition.as_deref().unwrap_or_default()
                ));
                let body = self.selection_set(&inline.selection_set, depth);
                self.path.pop();
                out.push(' ');
                out.push_str(&body?);
            }
        }
        Ok(out)
    }

    fn arguments(&self, args: &[Argument]) -> Result<String> {
        if args.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            check_name(&arg.name)?;
            parts.push((arg.name.as_str(), self.value(&arg.value)?));
        }
        if self.canonical {
            parts.sort_by(|a, b| a.0.cmp(b.0));
        }
        let parts: Vec<String> = parts
            .into_iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect();
        Ok(format!("({})", parts.join(", ")))
    }

    fn directives(&self, dirs: &[Directive]) -> Result<String> {
        let mut out = String::new();
        for dir in dirs {
            check_name(&dir.name)?;
            out.push_str(" @");
            out.push_str(&dir.name);
            out.push_str(&self.arguments(&dir.arguments)?);
        }
        Ok(out)
    }

    fn value(&self, value: &Value) -> Result<String> {
        Ok(match value {
            Value::Variable(name) => {
                check_name(name)?;
                format!("${name}")
            }
            Value::Int(n) => n.to_string(),
            Value::Float(f) => {
                if !f.is_finite() {
                    return Err(DocumentError::NonFiniteFloat);
                }
                // Debug keeps the fractional part ("1.0"), Display would not.
                format!("{f:?}")
            }
            Value::String(s) => quote(s),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_owned(),
            Value::Enum(name) => {
                check_name(name)?;
                name.clone()
            }
            Value::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.value(item))
                    .collect::<Result<Vec<_>>>()?;
                format!("[{}]", items.join(", "))
            }
            Value::Object(fields) => {
                let mut parts = Vec::with_capacity(fields.len());
                for field in fields {
                    check_name(&field.name)?;
                    parts.push((field.name.as_str(), self.value(&field.value)?));
                }
                if self.canonical {
                    parts.sort_by(|a, b| a.0.cmp(b.0));
                }
                let parts: Vec<String> = parts
                    .into_iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        })
    }
}

fn type_ref(ty: &TypeRef) -> Result<String> {
    match ty {
        TypeRef::Named { name } => {
            check_name(name)?;
            Ok(name.clone())
        }
        TypeRef::List { of } => Ok(format!("[{}]", type_ref(of)?)),
        TypeRef::NonNull { of } => {
            if matches!(**of, TypeRef::NonNull { .. }) {
                return Err(DocumentError::NestedNonNull);
            }
            Ok(format!("{}!", type_ref(of)?))
        }
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
    if head_ok && chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(DocumentError::InvalidName(name.to_owned()))
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if u32::from(c) < 0x20 => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
