//! Return value mutators.

use tree_sitter::Node;

use crate::mutation::mutator::{MutationContext, Mutator};
use crate::mutation::Mutation;
use crate::parser::queries;
use crate::types::{normalize, TypeKind};

use super::return_value;

fn is_boolean_text(text: &str) -> bool {
    text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false")
}

fn is_negated(ctx: &MutationContext<'_>, node: &Node<'_>) -> bool {
    node.kind() == "unary_expression"
        && node
            .child_by_field_name("operator")
            .is_some_and(|op| ctx.text(&op) == "-")
}

/// Whether `text` is a numeric literal equal to zero.
fn is_numeric_zero(text: &str) -> bool {
    let trimmed = text.trim().trim_end_matches(['l', 'L', 'd', 'D']);
    trimmed.parse::<f64>().is_ok_and(|v| v == 0.0)
}

/// Negates numeric return values.
pub struct NegationMutator;

impl Mutator for NegationMutator {
    fn name(&self) -> &'static str {
        "NegationMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces return x with return -x"
    }

    fn visit_return_statement(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        let Some(value) = return_value(node) else {
            return Vec::new();
        };
        let kind = value.kind();
        let text = ctx.text(&value).trim();

        if kind == "null_literal"
            || queries::is_string_literal(kind)
            || is_boolean_text(text)
            || is_negated(ctx, &value)
        {
            return Vec::new();
        }

        match ctx.method_return_type(&node) {
            Some(declared) if !declared.kind.is_numeric() => return Vec::new(),
            None if !(queries::is_numeric_literal(kind) || kind == "identifier") => {
                return Vec::new()
            }
            _ => {}
        }
        if ctx.resolve(&value).is_some_and(|t| !t.kind.is_numeric()) {
            return Vec::new();
        }

        let simple = queries::is_numeric_literal(kind)
            || matches!(
                kind,
                "identifier" | "field_access" | "method_invocation" | "parenthesized_expression"
            );
        let replacement = if simple {
            format!("-{text}")
        } else {
            format!("-({text})")
        };
        ctx.replace(self, &value, replacement).into_iter().collect()
    }
}

/// Flips boolean literals in return statements.
pub struct BooleanLiteralReturnMutator;

impl Mutator for BooleanLiteralReturnMutator {
    fn name(&self) -> &'static str {
        "BooleanLiteralReturnMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces return true with return false and back"
    }

    fn visit_return_statement(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        let Some(value) = return_value(node) else {
            return Vec::new();
        };
        let text = ctx.text(&value).trim();
        let replacement = if text.eq_ignore_ascii_case("true") {
            "false"
        } else if text.eq_ignore_ascii_case("false") {
            "true"
        } else {
            return Vec::new();
        };
        ctx.replace(self, &value, replacement).into_iter().collect()
    }
}

fn constant_boolean_return(
    mutator: &dyn Mutator,
    ctx: &MutationContext<'_>,
    node: Node<'_>,
    literal: &str,
) -> Vec<Mutation> {
    let Some(value) = return_value(node) else {
        return Vec::new();
    };
    let is_boolean_method = ctx
        .method_return_type(&node)
        .is_some_and(|t| t.kind == TypeKind::Boolean);
    if !is_boolean_method || is_boolean_text(ctx.text(&value).trim()) {
        return Vec::new();
    }
    ctx.replace(mutator, &value, literal).into_iter().collect()
}

/// Replaces computed boolean return values with `true`.
pub struct TrueReturnMutator;

impl Mutator for TrueReturnMutator {
    fn name(&self) -> &'static str {
        "TrueReturnMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces return <condition> with return true"
    }

    fn visit_return_statement(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        constant_boolean_return(self, ctx, node, "true")
    }
}

/// Replaces computed boolean return values with `false`.
pub struct FalseReturnMutator;

impl Mutator for FalseReturnMutator {
    fn name(&self) -> &'static str {
        "FalseReturnMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces return <condition> with return false"
    }

    fn visit_return_statement(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        constant_boolean_return(self, ctx, node, "false")
    }
}

/// Replaces return values with the empty value of the declared return type.
pub struct EmptyReturnMutator;

impl EmptyReturnMutator {
    fn is_already_empty(text: &str, target: &str, kind: TypeKind) -> bool {
        let current = normalize(text);
        let target = normalize(target);
        if current == target || current == target.replace("()", "{}") {
            return true;
        }
        kind.is_numeric() && is_numeric_zero(text)
    }
}

impl Mutator for EmptyReturnMutator {
    fn name(&self) -> &'static str {
        "EmptyReturnMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces return values with 0, '', null or an empty collection"
    }

    fn visit_return_statement(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        let Some(value) = return_value(node) else {
            return Vec::new();
        };
        let Some(declared) = ctx.method_return_type(&node) else {
            return Vec::new();
        };
        if matches!(declared.kind, TypeKind::Boolean | TypeKind::Void) {
            return Vec::new();
        }
        let Some(target) = declared.default_literal() else {
            return Vec::new();
        };
        if Self::is_already_empty(ctx.text(&value), &target, declared.kind) {
            return Vec::new();
        }
        ctx.replace(self, &value, target).into_iter().collect()
    }
}
