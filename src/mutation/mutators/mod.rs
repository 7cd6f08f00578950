//! Built-in mutators.
//!
//! | Mutator | Shape |
//! |---|---|
//! | `ArithmeticOperatorMutator` | `a + b` → `a - b`, `a * b`, `a / b` |
//! | `ArithmeticOperatorDeletionMutator` | `a + b` → `a`, `b` |
//! | `BoundaryConditionMutator` | `<` ↔ `<=`, `>` ↔ `>=` |
//! | `EqualityConditionMutator` | `==` ↔ `!=` |
//! | `LogicalOperatorMutator` | `&&` ↔ `\|\|` |
//! | `RemoveConditionalsMutator` | condition → `true` / `false` |
//! | `RemoveIncrementsMutator` | `x++` → `x` |
//! | `IncrementMutator` | `x++` ↔ `x--` |
//! | `InvertNegativesMutator` | `-x` → `x` |
//! | `NegationMutator` | `return x` → `return -x` |
//! | `BooleanLiteralReturnMutator` | `return true` ↔ `return false` |
//! | `TrueReturnMutator` / `FalseReturnMutator` | `return cond` → `return true` / `false` |
//! | `EmptyReturnMutator` | `return x` → `return 0`, `''`, `null`, ... |
//! | `MemberVariableMutator` | `Integer f = 1;` → `Integer f;` |
//! | `NonVoidMethodCallMutator` | `x = call()` → `x = <default>` |
//! | `ConstructorCallMutator` | `x = new T()` → `x = null` |
//! | `VoidMethodCallMutator` | `call();` removed |
//! | `ArgumentPropagationMutator` | `f(a)` → `a` |
//! | `NakedReceiverMutator` | `r.f()` → `r` |
//! | `SwitchMutator` | `when else` removal, duplication, branch swap |

mod arithmetic;
mod call;
mod conditional;
mod member;
mod return_value;
mod switch;
mod unary;

pub use arithmetic::{ArithmeticOperatorDeletionMutator, ArithmeticOperatorMutator};
pub use call::{
    ArgumentPropagationMutator, ConstructorCallMutator, NakedReceiverMutator,
    NonVoidMethodCallMutator, VoidMethodCallMutator,
};
pub use conditional::{
    BoundaryConditionMutator, EqualityConditionMutator, LogicalOperatorMutator,
    RemoveConditionalsMutator,
};
pub use member::MemberVariableMutator;
pub use return_value::{
    BooleanLiteralReturnMutator, EmptyReturnMutator, FalseReturnMutator, NegationMutator,
    TrueReturnMutator,
};
pub use switch::SwitchMutator;
pub use unary::{IncrementMutator, InvertNegativesMutator, RemoveIncrementsMutator};

use tree_sitter::Node;

use super::mutator::{MutationContext, Mutator};
use super::Mutation;

/// Every built-in mutator, in dispatch order.
pub fn all() -> Vec<Box<dyn Mutator>> {
    vec![
        Box::new(ArithmeticOperatorMutator),
        Box::new(ArithmeticOperatorDeletionMutator),
        Box::new(BoundaryConditionMutator),
        Box::new(EqualityConditionMutator),
        Box::new(LogicalOperatorMutator),
        Box::new(RemoveConditionalsMutator),
        Box::new(RemoveIncrementsMutator),
        Box::new(IncrementMutator),
        Box::new(InvertNegativesMutator),
        Box::new(NegationMutator),
        Box::new(BooleanLiteralReturnMutator),
        Box::new(TrueReturnMutator),
        Box::new(FalseReturnMutator),
        Box::new(EmptyReturnMutator),
        Box::new(MemberVariableMutator),
        Box::new(NonVoidMethodCallMutator),
        Box::new(ConstructorCallMutator),
        Box::new(VoidMethodCallMutator),
        Box::new(ArgumentPropagationMutator),
        Box::new(NakedReceiverMutator),
        Box::new(SwitchMutator),
    ]
}

/// All of `ops` except `current`, in order.
pub fn replacements_excluding_self(ops: &[&str], current: &str) -> Vec<String> {
    ops.iter()
        .filter(|&&o| o != current)
        .map(|&o| o.to_string())
        .collect()
}

/// Swap a binary operator for its counterpart from `pairs`.
fn swap_binary_operator(
    mutator: &dyn Mutator,
    ctx: &MutationContext<'_>,
    node: Node<'_>,
    pairs: &[(&str, &str)],
) -> Vec<Mutation> {
    let Some(op) = node.child_by_field_name("operator") else {
        return Vec::new();
    };
    let text = ctx.text(&op);
    pairs
        .iter()
        .filter(|(from, _)| *from == text)
        .filter_map(|(_, to)| ctx.replace(mutator, &op, *to))
        .collect()
}

/// The value of a `return` statement, if any.
fn return_value(node: Node<'_>) -> Option<Node<'_>> {
    node.named_child(0)
}

/// Declarators of a field or local declaration that carry an initializer.
fn initialized_declarators(node: Node<'_>) -> Vec<(Node<'_>, Node<'_>)> {
    crate::parser::named_children(&node)
        .into_iter()
        .filter(|c| c.kind() == "variable_declarator")
        .filter_map(|d| d.child_by_field_name("value").map(|v| (d, v)))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_utils {
    //! Helpers for running a single mutator over a snippet.

    use std::collections::BTreeSet;

    use crate::mutation::{GenerationOptions, Mutation, MutationListener, MutationContext};
    use crate::parser::ApexParser;
    use crate::types::{TypeDiscoverer, TypeRegistry};

    use super::Mutator;

    /// Run one mutator over `source` with every line covered and types
    /// discovered from the source itself.
    pub fn run(mutator: &dyn Mutator, source: &str) -> Vec<Mutation> {
        let types = discover(source);
        run_with(mutator, source, &types)
    }

    /// Run one mutator without any type information.
    pub fn run_untyped(mutator: &dyn Mutator, source: &str) -> Vec<Mutation> {
        run_with(mutator, source, &TypeRegistry::empty())
    }

    fn run_with(mutator: &dyn Mutator, source: &str, types: &TypeRegistry) -> Vec<Mutation> {
        let parsed = ApexParser::new().parse(source).unwrap();
        let lines: BTreeSet<u32> = (1..=source.lines().count() as u32).collect();
        let options = GenerationOptions::new(lines);
        let ctx = MutationContext::new(&parsed, types);
        MutationListener::new(vec![mutator], &options).walk(&ctx)
    }

    fn discover(source: &str) -> TypeRegistry {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(TypeDiscoverer::with_default_matchers(["Subject"]).discover(source))
            .unwrap()
    }

    /// Replacement texts of the given mutations.
    pub fn replacements(mutations: &[Mutation]) -> Vec<&str> {
        mutations.iter().map(|m| m.replacement.as_str()).collect()
    }

    /// Original texts of the given mutations.
    pub fn originals<'s>(mutations: &[Mutation], source: &'s str) -> Vec<&'s str> {
        mutations
            .iter()
            .map(|m| m.original_text(source).unwrap())
            .collect()
    }

    /// Wrap a method body in a class.
    pub fn class(body: &str) -> String {
        format!("public class Subject {{\n{body}\n}}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacements_excluding_self() {
        let replacements = replacements_excluding_self(&["+", "-", "*", "/"], "*");
        assert_eq!(replacements, vec!["+", "-", "/"]);
    }

    #[test]
    fn test_all_mutators_registered() {
        let names: Vec<_> = all().iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), 21);
        for expected in [
            "ArithmeticOperatorMutator",
            "ArithmeticOperatorDeletionMutator",
            "NegationMutator",
            "RemoveIncrementsMutator",
            "BooleanLiteralReturnMutator",
            "EmptyReturnMutator",
            "MemberVariableMutator",
            "NonVoidMethodCallMutator",
            "ArgumentPropagationMutator",
            "NakedReceiverMutator",
            "SwitchMutator",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }
}
