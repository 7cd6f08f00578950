//! Mutator trait, visit context and registry.

use tree_sitter::Node;

use crate::parser::{find_ancestor, queries, ParseResult};
use crate::types::{ClassifiedType, TypeKind, TypeRegistry};

use super::{Mutation, TokenSpan};

/// A mutation strategy.
///
/// The listener walks the tree once and, for each node, calls the visit
/// method matching the node's shape on every active mutator. Mutators
/// override only the shapes they care about.
pub trait Mutator: Send + Sync {
    /// Name used for provenance and include/exclude filters.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Whether candidates outside any method body are discarded.
    fn requires_enclosing_method(&self) -> bool {
        true
    }

    /// `a OP b`
    fn visit_binary_expression(&self, _ctx: &MutationContext<'_>, _node: Node<'_>) -> Vec<Mutation> {
        Vec::new()
    }

    /// `-x`, `!x`
    fn visit_unary_expression(&self, _ctx: &MutationContext<'_>, _node: Node<'_>) -> Vec<Mutation> {
        Vec::new()
    }

    /// `x++`, `--x`
    fn visit_update_expression(&self, _ctx: &MutationContext<'_>, _node: Node<'_>) -> Vec<Mutation> {
        Vec::new()
    }

    /// `return expr;`
    fn visit_return_statement(&self, _ctx: &MutationContext<'_>, _node: Node<'_>) -> Vec<Mutation> {
        Vec::new()
    }

    /// Class member variables.
    fn visit_field_declaration(&self, _ctx: &MutationContext<'_>, _node: Node<'_>) -> Vec<Mutation> {
        Vec::new()
    }

    /// `Type a = expr, b;` inside a method.
    fn visit_local_variable_declaration(
        &self,
        _ctx: &MutationContext<'_>,
        _node: Node<'_>,
    ) -> Vec<Mutation> {
        Vec::new()
    }

    /// `target = expr`
    fn visit_assignment_expression(
        &self,
        _ctx: &MutationContext<'_>,
        _node: Node<'_>,
    ) -> Vec<Mutation> {
        Vec::new()
    }

    /// `receiver.method(args)` or `method(args)`
    fn visit_method_invocation(&self, _ctx: &MutationContext<'_>, _node: Node<'_>) -> Vec<Mutation> {
        Vec::new()
    }

    /// A call used as a statement.
    fn visit_expression_statement(
        &self,
        _ctx: &MutationContext<'_>,
        _node: Node<'_>,
    ) -> Vec<Mutation> {
        Vec::new()
    }

    /// Multi-branch statements.
    fn visit_switch(&self, _ctx: &MutationContext<'_>, _node: Node<'_>) -> Vec<Mutation> {
        Vec::new()
    }

    /// `if`/`while`/`do` statements and ternaries; `condition` is the bare
    /// condition expression without parentheses.
    fn visit_condition(
        &self,
        _ctx: &MutationContext<'_>,
        _statement: Node<'_>,
        _condition: Node<'_>,
    ) -> Vec<Mutation> {
        Vec::new()
    }
}

/// What a mutator can see while visiting a node.
pub struct MutationContext<'a> {
    pub parsed: &'a ParseResult,
    pub types: &'a TypeRegistry,
}

impl<'a> MutationContext<'a> {
    /// Create a context over a parsed source and its type registry.
    pub fn new(parsed: &'a ParseResult, types: &'a TypeRegistry) -> Self {
        Self { parsed, types }
    }

    /// Source text of a node.
    pub fn text(&self, node: &Node<'_>) -> &'a str {
        self.parsed.node_text(node)
    }

    /// Name of the nearest enclosing method or constructor.
    pub fn enclosing_method(&self, node: &Node<'_>) -> Option<&'a str> {
        let method = find_ancestor(*node, queries::METHOD_DECLARATIONS)?;
        method
            .child_by_field_name("name")
            .map(|name| self.parsed.node_text(&name))
    }

    /// Declared return type of the enclosing method.
    pub fn method_return_type(&self, node: &Node<'_>) -> Option<ClassifiedType> {
        let method = self.enclosing_method(node)?;
        self.types.resolve(method, None)
    }

    /// Resolve the type of an expression node in its method's context.
    pub fn resolve(&self, node: &Node<'_>) -> Option<ClassifiedType> {
        let method = self.enclosing_method(node).unwrap_or("");
        self.types.resolve(method, Some(self.text(node)))
    }

    /// Whether an expression provably evaluates to a string.
    pub fn is_string_expression(&self, node: &Node<'_>) -> bool {
        match node.kind() {
            k if queries::is_string_literal(k) => true,
            "parenthesized_expression" => node
                .named_child(0)
                .is_some_and(|inner| self.is_string_expression(&inner)),
            "binary_expression" => {
                let is_concat = node
                    .child_by_field_name("operator")
                    .is_some_and(|op| self.text(&op) == "+");
                is_concat
                    && [node.child_by_field_name("left"), node.child_by_field_name("right")]
                        .into_iter()
                        .flatten()
                        .any(|side| self.is_string_expression(&side))
            }
            _ => self
                .resolve(node)
                .is_some_and(|t| t.kind == TypeKind::String),
        }
    }

    /// Token span covering exactly `node`.
    pub fn span(&self, node: &Node<'_>) -> Option<TokenSpan> {
        self.span_between(node, node)
    }

    /// Token span from the start of `first` to the end of `last`.
    pub fn span_between(&self, first: &Node<'_>, last: &Node<'_>) -> Option<TokenSpan> {
        if last.end_byte() <= first.start_byte() {
            return None;
        }
        let mut start = self.parsed.start_token(first);
        let mut end = self.parsed.end_token(last);
        start.start_offset = first.start_byte();
        end.stop_offset = last.end_byte() - 1;
        Some(TokenSpan { start, end })
    }

    /// Candidate replacing `node` with `replacement`.
    pub fn replace(
        &self,
        mutator: &dyn Mutator,
        node: &Node<'_>,
        replacement: impl Into<String>,
    ) -> Option<Mutation> {
        self.span(node)
            .map(|span| Mutation::new(mutator.name(), span, replacement))
    }
}

/// Collection of mutators available to the generator.
pub struct MutatorRegistry {
    mutators: Vec<Box<dyn Mutator>>,
}

impl Default for MutatorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MutatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            mutators: Vec::new(),
        }
    }

    /// Registry with every built-in mutator.
    pub fn builtin() -> Self {
        Self {
            mutators: super::mutators::all(),
        }
    }

    /// Register a mutator.
    pub fn register(&mut self, mutator: Box<dyn Mutator>) {
        self.mutators.push(mutator);
    }

    /// All registered mutators.
    pub fn mutators(&self) -> &[Box<dyn Mutator>] {
        &self.mutators
    }

    /// Names of all registered mutators.
    pub fn names(&self) -> Vec<&'static str> {
        self.mutators.iter().map(|m| m.name()).collect()
    }

    /// Mutators whose name passes `allows`.
    pub fn select<F>(&self, allows: F) -> Vec<&dyn Mutator>
    where
        F: Fn(&str) -> bool,
    {
        self.mutators
            .iter()
            .filter(|m| allows(m.name()))
            .map(|m| m.as_ref())
            .collect()
    }
}
