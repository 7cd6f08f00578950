//! Member variable initializer removal.

use tree_sitter::Node;

use crate::mutation::mutator::{MutationContext, Mutator};
use crate::mutation::Mutation;

use super::initialized_declarators;

/// Strips initializers from class member variables, leaving them at their
/// default value.
pub struct MemberVariableMutator;

impl Mutator for MemberVariableMutator {
    fn name(&self) -> &'static str {
        "MemberVariableMutator"
    }

    fn description(&self) -> &'static str {
        "Replaces Type f = value; with Type f;"
    }

    fn requires_enclosing_method(&self) -> bool {
        false
    }

    fn visit_field_declaration(&self, ctx: &MutationContext<'_>, node: Node<'_>) -> Vec<Mutation> {
        initialized_declarators(node)
            .into_iter()
            .filter_map(|(declarator, _)| {
                let name = declarator.child_by_field_name("name")?;
                let dimensions = declarator
                    .child_by_field_name("dimensions")
                    .map(|d| ctx.text(&d))
                    .unwrap_or("");
                ctx.replace(self, &declarator, format!("{}{}", ctx.text(&name), dimensions))
            })
            .collect()
    }
}
