//! Relational, equality and logical operator mutators, plus condition removal.

use tree_sitter::Node;

use crate::mutation::mutator::{MutationContext, Mutator};
use crate::mutation::Mutation;

use super::swap_binary_operator;

/// Moves comparison boundaries: `<` ↔ `<=`, `>` ↔ `>=`.
pub struct BoundaryConditionMutator;

impl Mutator for BoundaryConditionMutator {
    fn name(&self) -> &'static str {
        "BoundaryConditionMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces < with <=, > with >= and back"
    }

    fn visit_binary_expression(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        swap_binary_operator(
            self,
            ctx,
            node,
            &[("<", "<="), ("<=", "<"), (">", ">="), (">=", ">")],
        )
    }
}

/// Negates equality checks.
pub struct EqualityConditionMutator;

impl Mutator for EqualityConditionMutator {
    fn name(&self) -> &'static str {
        "EqualityConditionMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces == with != and back"
    }

    fn visit_binary_expression(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        swap_binary_operator(self, ctx, node, &[("==", "!="), ("!=", "==")])
    }
}

/// Swaps conjunction and disjunction.
pub struct LogicalOperatorMutator;

impl Mutator for LogicalOperatorMutator {
    fn name(&self) -> &'static str {
        "LogicalOperatorMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces && with || and back"
    }

    fn visit_binary_expression(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        swap_binary_operator(self, ctx, node, &[("&&", "||"), ("||", "&&")])
    }
}

/// Forces a branch condition to `true` and to `false`.
pub struct RemoveConditionalsMutator;

impl Mutator for RemoveConditionalsMutator {
    fn name(&self) -> &'static str {
        "RemoveConditionalsMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces if/while/do and ternary conditions with true and false"
    }

    fn visit_condition(
        &self,
        ctx: &MutationContext<'_>,
        _statement: Node<'_>,
        condition: Node<'_>,
    ) -> Vec<Mutation> {
        let current = ctx.text(&condition).trim();
        ["true", "false"]
            .into_iter()
            .filter(|literal| !current.eq_ignore_ascii_case(literal))
            .filter_map(|literal| ctx.replace(self, &condition, literal))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mutation::mutators::test_utils::{class, originals, replacements, run};

    #[test]
    fn test_boundary_condition() {
        let source = class(
            "    Boolean f(Integer a) {\n        return a < 1 || a >= 10;\n    }",
        );
        let mutations = run(&BoundaryConditionMutator, &source);
        assert_eq!(replacements(&mutations), vec!["<=", ">"]);
        assert_eq!(originals(&mutations, &source), vec!["<", ">="]);
    }

    #[test]
    fn test_equality_condition() {
        let source = class(
            "    Boolean f(Integer a) {\n        return a == 1 && a != 2;\n    }",
        );
        let mutations = run(&EqualityConditionMutator, &source);
        assert_eq!(replacements(&mutations), vec!["!=", "=="]);
    }

    #[test]
    fn test_logical_operator() {
        let source = class(
            "    Boolean f(Boolean a, Boolean b) {\n        return a && b;\n    }",
        );
        let mutations = run(&LogicalOperatorMutator, &source);
        assert_eq!(replacements(&mutations), vec!["||"]);
    }

    #[test]
    fn test_remove_conditionals_on_if_and_while() {
        let source = class(
            "    void f(Integer a) {\n        if (a > 0) {\n            a--;\n        }\n        while (true) {\n            a++;\n        }\n    }",
        );
        let mutations = run(&RemoveConditionalsMutator, &source);
        assert_eq!(replacements(&mutations), vec!["true", "false", "false"]);
        assert_eq!(originals(&mutations, &source), vec!["a > 0", "a > 0", "true"]);
    }

    #[test]
    fn test_remove_conditionals_on_ternary() {
        let source = class(
            "    Integer f(Boolean flag) {\n        return flag ? 1 : 2;\n    }",
        );
        let mutations = run(&RemoveConditionalsMutator, &source);
        assert_eq!(replacements(&mutations), vec!["true", "false"]);
        assert_eq!(originals(&mutations, &source), vec!["flag", "flag"]);
    }
}
