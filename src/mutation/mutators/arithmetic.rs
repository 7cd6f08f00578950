//! Arithmetic operator replacement and operand deletion.
//!
//! Both skip `+` when either side is provably a string, since that is
//! concatenation rather than arithmetic.

use tree_sitter::Node;

use crate::mutation::mutator::{MutationContext, Mutator};
use crate::mutation::Mutation;

use super::replacements_excluding_self;

const ARITHMETIC_OPERATORS: &[&str] = &["+", "-", "*", "/"];

/// Binary arithmetic operands and operator, unless this is string concatenation.
fn arithmetic_parts<'t>(
    ctx: &MutationContext<'_>,
    node: Node<'t>,
) -> Option<(Node<'t>, Node<'t>, Node<'t>)> {
    let op = node.child_by_field_name("operator")?;
    let left = node.child_by_field_name("left")?;
    let right = node.child_by_field_name("right")?;
    let op_text = ctx.text(&op);
    if !ARITHMETIC_OPERATORS.contains(&op_text) {
        return None;
    }
    if op_text == "+" && (ctx.is_string_expression(&left) || ctx.is_string_expression(&right)) {
        return None;
    }
    Some((left, op, right))
}

/// Replaces each arithmetic operator with the other three.
pub struct ArithmeticOperatorMutator;

impl Mutator for ArithmeticOperatorMutator {
    fn name(&self) -> &'static str {
        "ArithmeticOperatorMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces +, -, * and / with each other"
    }

    fn visit_binary_expression(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        let Some((_, op, _)) = arithmetic_parts(ctx, node) else {
            return Vec::new();
        };
        replacements_excluding_self(ARITHMETIC_OPERATORS, ctx.text(&op))
            .into_iter()
            .filter_map(|replacement| ctx.replace(self, &op, replacement))
            .collect()
    }
}

/// Replaces an arithmetic expression with either of its operands.
pub struct ArithmeticOperatorDeletionMutator;

impl Mutator for ArithmeticOperatorDeletionMutator {
    fn name(&self) -> &'static str {
        "ArithmeticOperatorDeletionMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces a + b with a, then with b"
    }

    fn visit_binary_expression(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        let Some((left, _, right)) = arithmetic_parts(ctx, node) else {
            return Vec::new();
        };
        [left, right]
            .iter()
            .filter_map(|operand| ctx.replace(self, &node, ctx.text(operand)))
            .collect()
    }
}
