//! Increment, decrement and unary minus mutators.

use tree_sitter::Node;

use crate::mutation::mutator::{MutationContext, Mutator};
use crate::mutation::Mutation;
use crate::parser::children;

/// Operand and `++`/`--` token of an update expression.
fn update_parts(node: Node<'_>) -> Option<(Node<'_>, Node<'_>)> {
    let operand = node.named_child(0)?;
    let op = children(&node)
        .into_iter()
        .find(|c| matches!(c.kind(), "++" | "--"))?;
    Some((operand, op))
}

/// Drops `++`/`--`, leaving the bare operand.
pub struct RemoveIncrementsMutator;

impl Mutator for RemoveIncrementsMutator {
    fn name(&self) -> &'static str {
        "RemoveIncrementsMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces x++, x--, ++x and --x with x"
    }

    fn visit_update_expression(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        update_parts(node)
            .and_then(|(operand, _)| ctx.replace(self, &node, ctx.text(&operand)))
            .into_iter()
            .collect()
    }
}

/// Turns increments into decrements and back.
pub struct IncrementMutator;

impl Mutator for IncrementMutator {
    fn name(&self) -> &'static str {
        "IncrementMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces ++ with -- and back"
    }

    fn visit_update_expression(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        update_parts(node)
            .and_then(|(_, op)| {
                let replacement = if op.kind() == "++" { "--" } else { "++" };
                ctx.replace(self, &op, replacement)
            })
            .into_iter()
            .collect()
    }
}

/// Removes a unary minus.
pub struct InvertNegativesMutator;

impl Mutator for InvertNegativesMutator {
    fn name(&self) -> &'static str {
        "InvertNegativesMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces -x with x"
    }

    fn visit_unary_expression(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        let is_minus = node
            .child_by_field_name("operator")
            .is_some_and(|op| ctx.text(&op) == "-");
        if !is_minus {
            return Vec::new();
        }
        node.child_by_field_name("operand")
            .and_then(|operand| ctx.replace(self, &node, ctx.text(&operand)))
            .into_iter()
            .collect()
    }
}
