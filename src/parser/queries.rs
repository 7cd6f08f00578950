//! Node kinds of the Apex parse tree that the engine cares about.
//!
//! Apex is lowered and parsed with the tree-sitter Java grammar, so these
//! are the grammar's node kind names.

/// Method-like declarations that open a new variable scope.
pub const METHOD_DECLARATIONS: &[&str] = &["method_declaration", "constructor_declaration"];

/// Class-like declarations whose names are user-defined types.
pub const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
];

/// Multi-branch statements. `switch on` is lowered to this shape.
pub const SWITCH_STATEMENTS: &[&str] = &["switch_expression"];

/// Arms of a switch block. Each `when` arm is one statement group.
pub const SWITCH_BRANCHES: &[&str] = &["switch_block_statement_group", "switch_rule"];

/// Statements with a parenthesized condition.
pub const CONDITIONAL_STATEMENTS: &[&str] = &["if_statement", "while_statement", "do_statement"];

/// Integral literal kinds.
pub const INTEGER_LITERALS: &[&str] = &[
    "decimal_integer_literal",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
];

/// Floating point literal kinds.
pub const DECIMAL_LITERALS: &[&str] = &[
    "decimal_floating_point_literal",
    "hex_floating_point_literal",
];

/// Kinds that denote a written type.
pub const TYPE_NODES: &[&str] = &[
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "void_type",
];

/// Check if a node kind is a numeric literal.
pub fn is_numeric_literal(kind: &str) -> bool {
    INTEGER_LITERALS.contains(&kind) || DECIMAL_LITERALS.contains(&kind)
}

/// Check if a node kind is a string literal.
///
/// Apex strings are single-quoted, which the grammar reads as character literals.
pub fn is_string_literal(kind: &str) -> bool {
    matches!(kind, "string_literal" | "character_literal")
}

/// Check if a node kind opens a method scope.
pub fn is_method_declaration(kind: &str) -> bool {
    METHOD_DECLARATIONS.contains(&kind)
}
