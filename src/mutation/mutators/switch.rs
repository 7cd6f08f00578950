//! Multi-branch statement mutations.

use tree_sitter::Node;

use crate::mutation::mutator::{MutationContext, Mutator};
use crate::mutation::Mutation;
use crate::parser::{children, named_children, queries};

/// One arm of a switch block.
struct Branch<'t> {
    node: Node<'t>,
    /// `when else`.
    is_default: bool,
    /// End of the labels. In `when` arms this is the space before the body.
    separator: Option<Node<'t>>,
    /// First and last statement of the arm.
    body: Option<(Node<'t>, Node<'t>)>,
}

impl<'t> Branch<'t> {
    fn parse(node: Node<'t>) -> Self {
        let named = named_children(&node);
        let is_default = named
            .iter()
            .filter(|c| c.kind() == "switch_label")
            .any(|label| children(label).iter().any(|t| t.kind() == "default"));
        let separator = children(&node)
            .into_iter()
            .rev()
            .find(|c| matches!(c.kind(), ":" | "->"));
        let statements: Vec<_> = named
            .into_iter()
            .filter(|c| !matches!(c.kind(), "switch_label" | "line_comment" | "block_comment"))
            .collect();
        let body = match (statements.first(), statements.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        };
        Self {
            node,
            is_default,
            separator,
            body,
        }
    }

    fn body_text<'s>(&self, ctx: &'s MutationContext<'_>) -> Option<&'s str> {
        let (first, last) = self.body?;
        Some(ctx.parsed.range_text(&first, &last))
    }
}

/// Mutates `switch on` statements three ways: drops the `when else`
/// branch, makes `when else` run the first branch's body, and swaps the
/// bodies of the first pair of adjacent value branches.
///
/// Adjacency is counted among value branches only, so a fallback sitting
/// between two value branches does not block the swap; it stays in place.
pub struct SwitchMutator;

impl SwitchMutator {
    fn remove_default(
        &self,
        ctx: &MutationContext<'_>,
        default: &Branch<'_>,
        values: &[&Branch<'_>],
    ) -> Option<Mutation> {
        if values.is_empty() {
            return None;
        }
        ctx.replace(self, &default.node, "")
    }

    fn duplicate_first_into_default(
        &self,
        ctx: &MutationContext<'_>,
        default: &Branch<'_>,
        values: &[&Branch<'_>],
    ) -> Option<Mutation> {
        let first_body = values.first()?.body_text(ctx)?;
        if default.body_text(ctx) == Some(first_body) {
            return None;
        }
        let separator = default.separator?;
        let labels = ctx
            .parsed
            .source
            .get(default.node.start_byte()..separator.end_byte())?
            .trim_end();
        ctx.replace(self, &default.node, format!("{labels} {first_body}"))
    }

    fn swap_adjacent(&self, ctx: &MutationContext<'_>, values: &[&Branch<'_>]) -> Option<Mutation> {
        let source = ctx.parsed.source.as_str();
        values.windows(2).find_map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            let ((a_first, a_last), (b_first, b_last)) = (a.body?, b.body?);
            let a_text = a.body_text(ctx)?;
            let b_text = b.body_text(ctx)?;
            if a_text == b_text {
                return None;
            }
            let between = source.get(a_last.end_byte()..b_first.start_byte())?;
            let span = ctx.span_between(&a_first, &b_last)?;
            Some(Mutation::new(
                self.name(),
                span,
                format!("{b_text}{between}{a_text}"),
            ))
        })
    }
}

impl Mutator for SwitchMutator {
    fn name(&self) -> &'static str {
        "SwitchMutator"
    }

    fn description(&self) -> &'static str {
        "Removes or duplicates the when-else branch and swaps adjacent branch bodies"
    }

    fn visit_switch(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        let Some(block) = node.child_by_field_name("body") else {
            return Vec::new();
        };
        let branches: Vec<_> = named_children(&block)
            .into_iter()
            .filter(|c| queries::SWITCH_BRANCHES.contains(&c.kind()))
            .map(Branch::parse)
            .collect();
        let values: Vec<_> = branches.iter().filter(|b| !b.is_default).collect();

        let mut mutations = Vec::new();
        if let Some(default) = branches.iter().find(|b| b.is_default) {
            mutations.extend(self.remove_default(ctx, default, &values));
            mutations.extend(self.duplicate_first_into_default(ctx, default, &values));
        }
        mutations.extend(self.swap_adjacent(ctx, &values));
        mutations
    }
}
