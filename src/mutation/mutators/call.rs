//! Method call mutators.

use tree_sitter::Node;

use crate::mutation::mutator::{MutationContext, Mutator};
use crate::mutation::Mutation;
use crate::parser::named_children;
use crate::types::{ClassifiedType, TypeKind};

use super::initialized_declarators;

/// String methods that return a String, so `s.trim()` can collapse to `s`.
const STRING_SELF_METHODS: &[&str] = &[
    "abbreviate",
    "capitalize",
    "deletewhitespace",
    "escapesinglequotes",
    "left",
    "normalizespace",
    "remove",
    "replace",
    "replaceall",
    "reverse",
    "right",
    "substring",
    "tolowercase",
    "touppercase",
    "trim",
    "uncapitalize",
];

/// Right-hand sides of a declaration or plain assignment, paired with the
/// declared type of their target.
fn assigned_values<'t>(
    ctx: &MutationContext<'_>,
    node: Node<'t>,
) -> Vec<(Node<'t>, Option<ClassifiedType>)> {
    match node.kind() {
        "local_variable_declaration" => {
            let declared = node
                .child_by_field_name("type")
                .map(|t| ctx.types.classify(ctx.text(&t)));
            initialized_declarators(node)
                .into_iter()
                .map(|(_, value)| (value, declared.clone()))
                .collect()
        }
        "assignment_expression" => {
            let is_plain = node
                .child_by_field_name("operator")
                .is_some_and(|op| ctx.text(&op) == "=");
            match (is_plain, node.child_by_field_name("left"), node.child_by_field_name("right")) {
                (true, Some(left), Some(right)) => vec![(right, ctx.resolve(&left))],
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

/// Replaces call results assigned to a variable with the type's default.
pub struct NonVoidMethodCallMutator;

impl NonVoidMethodCallMutator {
    fn mutate(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        assigned_values(ctx, node)
            .into_iter()
            .filter(|(value, _)| value.kind() == "method_invocation")
            .filter_map(|(value, declared)| {
                let default = declared?.default_literal()?;
                ctx.replace(self, &value, default)
            })
            .collect()
    }
}

impl Mutator for NonVoidMethodCallMutator {
    fn name(&self) -> &'static str {
        "NonVoidMethodCallMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces x = call() with x = <default of x's type>"
    }

    fn visit_local_variable_declaration(
        &self,
        ctx: &MutationContext<'_>,
        node: Node<'_>,
    ) -> Vec<Mutation> {
        self.mutate(ctx, node)
    }

    fn visit_assignment_expression(
        &self,
        ctx: &MutationContext<'_>,
        node: Node<'_>,
    ) -> Vec<Mutation> {
        self.mutate(ctx, node)
    }
}

/// Replaces assigned constructor calls with `null`.
pub struct ConstructorCallMutator;

impl ConstructorCallMutator {
    fn mutate(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        assigned_values(ctx, node)
            .into_iter()
            .filter(|(value, _)| value.kind() == "object_creation_expression")
            .filter_map(|(value, _)| ctx.replace(self, &value, "null"))
            .collect()
    }
}

impl Mutator for ConstructorCallMutator {
    fn name(&self) -> &'static str {
        "ConstructorCallMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces x = new T() with x = null"
    }

    fn visit_local_variable_declaration(
        &self,
        ctx: &MutationContext<'_>,
        node: Node<'_>,
    ) -> Vec<Mutation> {
        self.mutate(ctx, node)
    }

    fn visit_assignment_expression(
        &self,
        ctx: &MutationContext<'_>,
        node: Node<'_>,
    ) -> Vec<Mutation> {
        self.mutate(ctx, node)
    }
}

/// Removes calls whose result is discarded.
pub struct VoidMethodCallMutator;

impl Mutator for VoidMethodCallMutator {
    fn name(&self) -> &'static str {
        "VoidMethodCallMutator"
    }

    fn description(&self) -> &'static str {
        "Removes call(); statements"
    }

    fn visit_expression_statement(
        &self,
        ctx: &MutationContext<'_>,
        node: Node<'_>,
    ) -> Vec<Mutation> {
        let is_call = node
            .named_child(0)
            .is_some_and(|expr| expr.kind() == "method_invocation");
        if !is_call {
            return Vec::new();
        }
        ctx.replace(self, &node, "").into_iter().collect()
    }
}

/// Replaces a call with one of its arguments of the same type.
pub struct ArgumentPropagationMutator;

impl Mutator for ArgumentPropagationMutator {
    fn name(&self) -> &'static str {
        "ArgumentPropagationMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces f(a) with a when a has f's return type"
    }

    fn visit_method_invocation(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        let Some(arguments) = node.child_by_field_name("arguments") else {
            return Vec::new();
        };
        let arguments = named_children(&arguments);
        if arguments.is_empty() {
            return Vec::new();
        }
        let Some(returned) = ctx.resolve(&node) else {
            return Vec::new();
        };
        if returned.kind == TypeKind::Void {
            return Vec::new();
        }

        arguments
            .iter()
            .filter(|arg| {
                ctx.resolve(arg)
                    .is_some_and(|t| t.is_compatible_with(&returned))
            })
            .filter_map(|arg| ctx.replace(self, &node, ctx.text(arg)))
            .collect()
    }
}

/// Replaces `receiver.method(...)` with `receiver` when the method returns
/// the receiver's type.
pub struct NakedReceiverMutator;

impl NakedReceiverMutator {
    fn returned_type(
        ctx: &MutationContext<'_>,
        receiver: &ClassifiedType,
        method: &str,
    ) -> Option<ClassifiedType> {
        if let Some(signature) = ctx.types.method(method) {
            return Some(signature.classified.clone());
        }
        let lower = method.to_ascii_lowercase();
        (receiver.kind == TypeKind::String && STRING_SELF_METHODS.contains(&lower.as_str()))
            .then(|| receiver.clone())
    }
}

impl Mutator for NakedReceiverMutator {
    fn name(&self) -> &'static str {
        "NakedReceiverMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces r.f() with r when f returns r's type"
    }

    fn visit_method_invocation(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        let (Some(receiver), Some(name)) = (
            node.child_by_field_name("object"),
            node.child_by_field_name("name"),
        ) else {
            return Vec::new();
        };
        if matches!(receiver.kind(), "this" | "super") {
            return Vec::new();
        }
        let Some(receiver_type) = ctx.resolve(&receiver) else {
            return Vec::new();
        };
        if receiver_type.kind == TypeKind::Void {
            return Vec::new();
        }
        let Some(returned) = Self::returned_type(ctx, &receiver_type, ctx.text(&name)) else {
            return Vec::new();
        };
        if !receiver_type.is_compatible_with(&returned) {
            return Vec::new();
        }
        ctx.replace(self, &node, ctx.text(&receiver))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mutation::mutators::test_utils::{class, originals, replacements, run};

    const SERVICE: &str = "    Integer total;
    Account primary;
    Integer compute(Integer seed) {
        return seed;
    }
    Integer clamp(Integer value, String label) {
        return value;
    }
    void run(Account acct) {
        Integer a = compute(1), b = 2;
        List<Account> xs = load();
        Mystery m = make();
        total = compute(a);
        total += compute(a);
        acct.Name = label();
        Account created = new Account();
        primary = new Account(Name = 'x');
        log(a);
        Integer c = clamp(a, 'x');
        String t = acct.Name.trim();
        this.compute(a);
    }";

    #[test]
    fn test_non_void_method_call() {
        let source = class(SERVICE);
        let mutations = run(&NonVoidMethodCallMutator, &source);
        assert_eq!(
            replacements(&mutations),
            vec!["0", "new List<Account>()", "0", "''", "0", "''"]
        );
        assert_eq!(
            originals(&mutations, &source),
            vec![
                "compute(1)",
                "load()",
                "compute(a)",
                "label()",
                "clamp(a, 'x')",
                "acct.Name.trim()"
            ]
        );
    }

    #[test]
    fn test_constructor_call() {
        let source = class(SERVICE);
        let mutations = run(&ConstructorCallMutator, &source);
        assert_eq!(replacements(&mutations), vec!["null", "null"]);
        assert_eq!(
            originals(&mutations, &source),
            vec!["new Account()", "new Account(Name = 'x')"]
        );
    }

    #[test]
    fn test_void_method_call() {
        let source = class(SERVICE);
        let mutations = run(&VoidMethodCallMutator, &source);
        assert_eq!(
            originals(&mutations, &source),
            vec!["log(a);", "this.compute(a);"]
        );
        assert!(mutations.iter().all(|m| m.replacement.is_empty()));
    }

    #[test]
    fn test_argument_propagation() {
        let source = class(SERVICE);
        let mutations = run(&ArgumentPropagationMutator, &source);
        assert_eq!(replacements(&mutations), vec!["1", "a", "a", "a", "a"]);
        assert_eq!(
            originals(&mutations, &source),
            vec![
                "compute(1)",
                "compute(a)",
                "compute(a)",
                "clamp(a, 'x')",
                "this.compute(a)"
            ]
        );
    }

    #[test]
    fn test_naked_receiver() {
        let source = class(
            "    String f(String s, Account acct) {\n        String n = acct.Name.trim();\n        Integer len = s.length();\n        return s.toUpperCase();\n    }",
        );
        let mutations = run(&NakedReceiverMutator, &source);
        assert_eq!(replacements(&mutations), vec!["acct.Name", "s"]);
        assert_eq!(
            originals(&mutations, &source),
            vec!["acct.Name.trim()", "s.toUpperCase()"]
        );
    }

    #[test]
    fn test_naked_receiver_uses_method_table() {
        let source = class(
            "    Subject chain() {\n        return this;\n    }\n    void f(Subject other) {\n        Subject s = other.chain();\n        Subject t = this.chain();\n    }",
        );
        let mutations = run(&NakedReceiverMutator, &source);
        assert_eq!(replacements(&mutations), vec!["other"]);
    }
}
