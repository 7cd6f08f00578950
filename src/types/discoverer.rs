//! Single-pass type discovery over a parsed Apex class.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::core::Result;
use crate::parser::{named_children, queries, start_line, ApexParser, ParseResult};

use super::{
    classify, normalize, ClassFieldTable, CustomEntityMatcher, MethodSignature, ScopeTable,
    StandardEntityMatcher, TypeMatcher, TypeRegistry, UserClassMatcher,
};

/// Builds a [`TypeRegistry`] from source text.
///
/// ```ignore
/// let registry = TypeDiscoverer::with_default_matchers(["Calculator"])
///     .discover(source)
///     .await?;
/// ```
pub struct TypeDiscoverer {
    matchers: Vec<Box<dyn TypeMatcher>>,
}

impl Default for TypeDiscoverer {
    fn default() -> Self {
        Self::new()
    }
}

/// A method seen during the walk, classified once matchers are populated.
struct RawMethod {
    name: String,
    return_type: String,
    start_line: u32,
    end_line: u32,
}

#[derive(Default)]
struct Tables {
    methods: Vec<RawMethod>,
    scopes: HashMap<String, ScopeTable>,
    fields: ClassFieldTable,
    raw_types: Vec<String>,
    declared: Vec<String>,
}

impl TypeDiscoverer {
    /// Create a discoverer with no matchers.
    pub fn new() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    /// Create a discoverer with the built-in user-class and entity matchers.
    pub fn with_default_matchers<I, S>(user_classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new()
            .with_matcher(Box::new(UserClassMatcher::new(user_classes)))
            .with_matcher(Box::new(StandardEntityMatcher::new()))
            .with_matcher(Box::new(CustomEntityMatcher::new()))
    }

    /// Register a matcher. Matchers are consulted in registration order.
    pub fn with_matcher(mut self, matcher: Box<dyn TypeMatcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    /// Parse and discover in one step.
    pub async fn discover(self, source: &str) -> Result<TypeRegistry> {
        let parsed = ApexParser::new().parse(source)?;
        self.discover_parsed(&parsed).await
    }

    /// Discover types from an already parsed source.
    pub async fn discover_parsed(mut self, parsed: &ParseResult) -> Result<TypeRegistry> {
        let mut tables = Tables::default();
        walk(parsed, parsed.root_node(), None, &mut tables);

        for matcher in &mut self.matchers {
            for name in &tables.declared {
                matcher.declare(name);
            }
            for raw in &tables.raw_types {
                matcher.collect(raw);
            }
        }

        for matcher in &mut self.matchers {
            matcher.populate().await?;
            tracing::debug!(
                "Matcher {} saw {} type names",
                matcher.name(),
                matcher.collected_types().len()
            );
        }

        let methods = tables
            .methods
            .into_iter()
            .map(|m| {
                let classified = classify(&m.return_type, &self.matchers);
                (
                    normalize(&m.name),
                    MethodSignature {
                        name: m.name,
                        return_type: m.return_type,
                        start_line: m.start_line,
                        end_line: m.end_line,
                        classified,
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        tracing::debug!(
            "Discovered {} methods, {} fields",
            methods.len(),
            tables.fields.len()
        );

        Ok(TypeRegistry::from_parts(
            methods,
            tables.scopes,
            tables.fields,
            self.matchers,
        ))
    }
}

fn walk(parsed: &ParseResult, node: Node<'_>, method: Option<&str>, tables: &mut Tables) {
    let mut current_method = method.map(str::to_string);

    match node.kind() {
        kind if queries::is_method_declaration(kind) => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = parsed.node_text(&name_node).to_string();
                if node.kind() == "method_declaration" {
                    let return_type = node
                        .child_by_field_name("type")
                        .map(|t| parsed.node_text(&t).to_string())
                        .unwrap_or_else(|| "void".to_string());
                    tables.raw_types.push(return_type.clone());
                    tables.methods.push(RawMethod {
                        name: name.clone(),
                        return_type,
                        start_line: start_line(&node),
                        end_line: node.end_position().row as u32 + 1,
                    });
                }
                tables.scopes.insert(normalize(&name), ScopeTable::new());
                current_method = Some(name);
            }
        }
        kind if queries::TYPE_DECLARATIONS.contains(&kind) => {
            if let Some(name_node) = node.child_by_field_name("name") {
                tables.declared.push(parsed.node_text(&name_node).to_string());
            }
        }
        "formal_parameter" | "catch_formal_parameter" | "enhanced_for_statement" => {
            if let Some(method) = &current_method {
                record_single(parsed, &node, method, tables);
            }
        }
        "local_variable_declaration" => {
            if let Some(method) = &current_method {
                record_declarators(parsed, &node, Some(method), tables);
            }
        }
        "field_declaration" => {
            record_declarators(parsed, &node, None, tables);
        }
        _ => {}
    }

    for child in named_children(&node) {
        walk(parsed, child, current_method.as_deref(), tables);
    }
}

/// `Type name` shapes: parameters, catch parameters and for-each variables.
fn record_single(parsed: &ParseResult, node: &Node<'_>, method: &str, tables: &mut Tables) {
    let ty = declared_type(parsed, node);
    let name = node.child_by_field_name("name").or_else(|| {
        named_children(node)
            .into_iter()
            .find(|c| c.kind() == "identifier")
    });
    let (Some(ty), Some(name)) = (ty, name) else {
        return;
    };
    let name = parsed.node_text(&name).to_string();
    insert_variable(tables, Some(method), &name, &ty);
}

/// `Type a = 1, b;` shapes: locals and fields.
fn record_declarators(
    parsed: &ParseResult,
    node: &Node<'_>,
    method: Option<&str>,
    tables: &mut Tables,
) {
    let Some(ty) = declared_type(parsed, node) else {
        return;
    };
    for declarator in named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "variable_declarator")
    {
        if let Some(name) = declarator.child_by_field_name("name") {
            let name = parsed.node_text(&name).to_string();
            insert_variable(tables, method, &name, &ty);
        }
    }
}

fn declared_type(parsed: &ParseResult, node: &Node<'_>) -> Option<String> {
    node.child_by_field_name("type")
        .or_else(|| {
            named_children(node)
                .into_iter()
                .find(|c| c.kind() == "catch_type" || queries::TYPE_NODES.contains(&c.kind()))
        })
        .map(|t| parsed.node_text(&t).trim().to_string())
}

fn insert_variable(tables: &mut Tables, method: Option<&str>, name: &str, ty: &str) {
    tables.raw_types.push(ty.to_string());
    match method {
        Some(method) => {
            tables
                .scopes
                .entry(normalize(method))
                .or_default()
                .insert(normalize(name), ty.to_string());
        }
        None => {
            tables.fields.insert(normalize(name), ty.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::remote::tests::FakeSchema;
    use crate::types::{SchemaMatcher, TypeKind};

    const SOURCE: &str = r#"public class OrderService {
    private Integer count = 0;
    private String label;
    private Account primary;

    public Integer total(Integer a, Integer b) {
        Integer x = a + b;
        return x;
    }

    public String describe() {
        String count = 'n';
        for (Contact c : contacts) {
            count = count + c.Name;
        }
        return count;
    }

    public List<Account> accounts() {
        return new List<Account>();
    }

    public Decimal amount(Invoice__c inv) {
        return inv.Amount__c;
    }

    public Long total() {
        return 0L;
    }

    public class Line {
    }
}
"#;

    async fn registry() -> TypeRegistry {
        TypeDiscoverer::with_default_matchers(["OrderService"])
            .discover(SOURCE)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_scope_isolation() {
        let registry = registry().await;
        assert_eq!(registry.variable_type("describe", "c"), Some("Contact"));
        assert!(registry.resolve("accounts", Some("c")).is_none());
    }

    #[tokio::test]
    async fn test_local_shadows_field() {
        let registry = registry().await;
        assert!(registry.resolves_to("describe", "count", TypeKind::String));
        assert!(registry.resolves_to("accounts", "count", TypeKind::Integer));
        assert!(registry.resolves_to("accounts", "label", TypeKind::String));
    }

    #[tokio::test]
    async fn test_method_table_last_declaration_wins() {
        let registry = registry().await;
        let total = registry.method("total").unwrap();
        assert_eq!(total.return_type, "Long");
        assert_eq!(total.classified.kind, TypeKind::Long);

        let accounts = registry.method("ACCOUNTS").unwrap();
        assert_eq!(accounts.classified.kind, TypeKind::List);
        assert_eq!(accounts.classified.element_type.as_deref(), Some("Account"));
    }

    #[tokio::test]
    async fn test_methods_sorted_by_line() {
        let registry = registry().await;
        let names: Vec<_> = registry.methods().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["describe", "accounts", "amount", "total"]);
    }

    #[tokio::test]
    async fn test_calls_resolve_to_return_type() {
        let registry = registry().await;
        assert!(registry.resolves_to("describe", "describe()", TypeKind::String));
        assert!(registry.resolves_to("describe", "this.describe()", TypeKind::String));
        assert!(registry.resolve("describe", Some("unknown()")).is_none());
    }

    #[tokio::test]
    async fn test_dotted_resolution_uses_matchers() {
        let registry = registry().await;
        assert!(registry.resolves_to("describe", "c.Name", TypeKind::String));
        assert!(registry.resolves_to("describe", "primary.Id", TypeKind::Id));
        assert!(registry.resolve("amount", Some("inv.Amount__c")).is_none());
    }

    #[tokio::test]
    async fn test_declared_inner_classes_are_user_classes() {
        let registry = registry().await;
        assert_eq!(registry.classify("Line").kind, TypeKind::UserClass);
        assert_eq!(registry.classify("OrderService").kind, TypeKind::UserClass);
    }

    const APEX_CLASS: &str = r#"global with sharing class Svc {
    public String region { get; set; }

    public override Integer add(Integer a, Integer b) {
        return a + b;
    }

    public virtual Decimal rate() {
        return 1.5;
    }

    global Boolean ready() {
        return region != null;
    }

    public void save(Account acc) {
        update acc;
        insert new Contact();
    }
}
"#;

    #[tokio::test]
    async fn test_apex_modifiers_keep_method_names() {
        let registry = TypeDiscoverer::with_default_matchers(["Svc"])
            .discover(APEX_CLASS)
            .await
            .unwrap();
        let names: Vec<_> = registry.methods().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["add", "rate", "ready", "save"]);

        let add = registry.method("add").unwrap();
        assert_eq!(add.return_type, "Integer");
        assert_eq!(add.classified.kind, TypeKind::Integer);
        assert_eq!(registry.method("rate").unwrap().classified.kind, TypeKind::Decimal);
        assert_eq!(registry.method("ready").unwrap().classified.kind, TypeKind::Boolean);
        assert_eq!(registry.classify("Svc").kind, TypeKind::UserClass);
    }

    #[tokio::test]
    async fn test_properties_and_dml_keep_scopes_intact() {
        let registry = TypeDiscoverer::with_default_matchers(["Svc"])
            .discover(APEX_CLASS)
            .await
            .unwrap();
        assert!(registry.resolves_to("ready", "region", TypeKind::String));
        assert_eq!(registry.variable_type("save", "acc"), Some("Account"));
        assert!(registry.resolves_to("add", "a", TypeKind::Integer));
    }

    #[tokio::test]
    async fn test_schema_matcher_hydrates_field_types() {
        let schema = Arc::new(FakeSchema::with_entity(
            "Invoice__c",
            &[("Amount__c", TypeKind::Decimal)],
        ));
        let registry = TypeDiscoverer::with_default_matchers(["OrderService"])
            .with_matcher(Box::new(SchemaMatcher::new(schema)))
            .discover(SOURCE)
            .await
            .unwrap();
        assert!(registry.resolves_to("amount", "inv.Amount__c", TypeKind::Decimal));
    }
}
