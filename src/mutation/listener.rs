//! Tree walk that dispatches nodes to mutators and gates their candidates.

use tree_sitter::Node;

use crate::parser::{queries, start_line};

use super::generator::GenerationOptions;
use super::mutator::{MutationContext, Mutator};
use super::Mutation;

/// Walks a parse tree once with a set of active mutators.
///
/// Nodes starting on uncovered lines are never dispatched. Candidates are
/// dropped when their first token is on an uncovered or disallowed line,
/// or when their original text matches a skip pattern.
pub struct MutationListener<'a> {
    mutators: Vec<&'a dyn Mutator>,
    options: &'a GenerationOptions,
}

impl<'a> MutationListener<'a> {
    pub fn new(mutators: Vec<&'a dyn Mutator>, options: &'a GenerationOptions) -> Self {
        Self { mutators, options }
    }

    /// Visit every node in source order and collect accepted candidates.
    pub fn walk(&self, ctx: &MutationContext<'_>) -> Vec<Mutation> {
        let mut mutations = Vec::new();
        let mut cursor = ctx.parsed.tree.walk();

        loop {
            let node = cursor.node();
            if node.is_named() && self.options.covered_lines.contains(&start_line(&node)) {
                let in_method = ctx.enclosing_method(&node).is_some();
                for mutator in &self.mutators {
                    if mutator.requires_enclosing_method() && !in_method {
                        continue;
                    }
                    for mutation in dispatch(*mutator, ctx, node) {
                        if self.accept(ctx, &mutation) {
                            mutations.push(mutation);
                        }
                    }
                }
            }

            if cursor.goto_first_child() {
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return mutations;
                }
            }
        }
    }

    fn accept(&self, ctx: &MutationContext<'_>, mutation: &Mutation) -> bool {
        let line = mutation.line();
        if !self.options.covered_lines.contains(&line) {
            return false;
        }
        if let Some(allowed) = &self.options.allowed_lines {
            if !allowed.contains(&line) {
                return false;
            }
        }
        if self.options.skip_patterns.is_empty() {
            return true;
        }
        match mutation.original_text(&ctx.parsed.source) {
            Ok(original) => !self
                .options
                .skip_patterns
                .iter()
                .any(|pattern| pattern.is_match(original)),
            // Leave malformed spans for `mutate` to reject loudly.
            Err(_) => true,
        }
    }
}

fn dispatch(mutator: &dyn Mutator, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
    match node.kind() {
        "binary_expression" => mutator.visit_binary_expression(ctx, node),
        "unary_expression" => mutator.visit_unary_expression(ctx, node),
        "update_expression" => mutator.visit_update_expression(ctx, node),
        "return_statement" => mutator.visit_return_statement(ctx, node),
        "field_declaration" => mutator.visit_field_declaration(ctx, node),
        "local_variable_declaration" => mutator.visit_local_variable_declaration(ctx, node),
        "assignment_expression" => mutator.visit_assignment_expression(ctx, node),
        "method_invocation" => mutator.visit_method_invocation(ctx, node),
        "expression_statement" => mutator.visit_expression_statement(ctx, node),
        "ternary_expression" => match node.child_by_field_name("condition") {
            Some(condition) => mutator.visit_condition(ctx, node, condition),
            None => Vec::new(),
        },
        kind if queries::CONDITIONAL_STATEMENTS.contains(&kind) => {
            match node.child_by_field_name("condition").map(unwrap_parens) {
                Some(condition) => mutator.visit_condition(ctx, node, condition),
                None => Vec::new(),
            }
        }
        kind if queries::SWITCH_STATEMENTS.contains(&kind) => mutator.visit_switch(ctx, node),
        _ => Vec::new(),
    }
}

fn unwrap_parens(node: Node<'_>) -> Node<'_> {
    if node.kind() == "parenthesized_expression" {
        if let Some(inner) = node.named_child(0) {
            return inner;
        }
    }
    node
}
