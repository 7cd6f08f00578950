//! Pluggable resolvers for type names outside the built-in keyword set.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::core::Result;
use crate::remote::SchemaDescriber;

use super::{base_type_names, normalize, ClassifiedType, TypeKind};

/// Which classification a matcher's claims produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherCategory {
    /// User-defined classes, interfaces and enums.
    UserClass,
    /// Platform entities (SObjects), standard or custom.
    Entity,
}

/// A resolver for one category of type names.
///
/// Matchers see every type name declared in the class during discovery
/// (`collect`), may hydrate themselves from an external source once all
/// names are known (`populate`), and then answer membership and field
/// queries for the lifetime of the [`super::TypeRegistry`].
#[async_trait]
pub trait TypeMatcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The classification this matcher's claims map to.
    fn category(&self) -> MatcherCategory;

    /// Whether this matcher claims the given simple type name.
    fn matches(&self, type_name: &str) -> bool;

    /// Record a raw type string seen in the source.
    fn collect(&mut self, raw_type: &str);

    /// Names recorded so far, in sorted order.
    fn collected_types(&self) -> Vec<String>;

    /// Record a type declared by the class itself (inner classes, enums).
    fn declare(&mut self, _type_name: &str) {}

    /// Batch-resolve external metadata for the collected names.
    async fn populate(&mut self) -> Result<()> {
        Ok(())
    }

    /// Type of `field` on a value of type `owner`, if known.
    fn field_type(&self, _owner: &ClassifiedType, _field: &str) -> Option<ClassifiedType> {
        None
    }
}

/// Suffixes that mark custom platform entities.
pub const CUSTOM_ENTITY_SUFFIXES: &[&str] = &["__c", "__mdt", "__e", "__b", "__x", "__kav"];

/// Whether a name has a custom entity suffix.
pub fn is_custom_entity_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    CUSTOM_ENTITY_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

static STANDARD_ENTITIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "account",
        "accountcontactrelation",
        "asset",
        "attachment",
        "campaign",
        "campaignmember",
        "case",
        "casecomment",
        "contact",
        "contentdocument",
        "contentversion",
        "contract",
        "document",
        "emailmessage",
        "event",
        "group",
        "groupmember",
        "lead",
        "note",
        "opportunity",
        "opportunitycontactrole",
        "opportunitylineitem",
        "order",
        "orderitem",
        "organization",
        "pricebook2",
        "pricebookentry",
        "product2",
        "profile",
        "quote",
        "quotelineitem",
        "recordtype",
        "task",
        "user",
        "userrole",
    ]
    .into_iter()
    .collect()
});

/// Fields every entity carries.
static COMMON_ENTITY_FIELDS: Lazy<HashMap<&'static str, TypeKind>> = Lazy::new(|| {
    HashMap::from([
        ("id", TypeKind::Id),
        ("name", TypeKind::String),
        ("ownerid", TypeKind::Id),
        ("createddate", TypeKind::Datetime),
        ("createdbyid", TypeKind::Id),
        ("lastmodifieddate", TypeKind::Datetime),
        ("lastmodifiedbyid", TypeKind::Id),
        ("systemmodstamp", TypeKind::Datetime),
        ("isdeleted", TypeKind::Boolean),
        ("recordtypeid", TypeKind::Id),
    ])
});

fn common_field_type(owner: &ClassifiedType, field: &str) -> Option<ClassifiedType> {
    if !owner.kind.is_entity() {
        return None;
    }
    let kind = COMMON_ENTITY_FIELDS.get(field.to_ascii_lowercase().as_str())?;
    let raw = match kind {
        TypeKind::Id => "Id",
        TypeKind::String => "String",
        TypeKind::Datetime => "Datetime",
        _ => "Boolean",
    };
    Some(ClassifiedType::new(*kind, raw))
}

/// Shared bookkeeping for `collect`/`collected_types`.
#[derive(Debug, Default, Clone)]
struct Collected {
    names: BTreeSet<String>,
}

impl Collected {
    fn add(&mut self, raw_type: &str) {
        for name in base_type_names(raw_type) {
            self.names.insert(name);
        }
    }

    fn list(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

/// Claims user-defined class names.
#[derive(Debug, Default, Clone)]
pub struct UserClassMatcher {
    known: HashSet<String>,
    collected: Collected,
}

impl UserClassMatcher {
    /// Create a matcher claiming the given names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            known: names.into_iter().map(|n| normalize(n.as_ref())).collect(),
            collected: Collected::default(),
        }
    }
}

#[async_trait]
impl TypeMatcher for UserClassMatcher {
    fn name(&self) -> &'static str {
        "user-class"
    }

    fn category(&self) -> MatcherCategory {
        MatcherCategory::UserClass
    }

    fn matches(&self, type_name: &str) -> bool {
        self.known.contains(&normalize(type_name))
    }

    fn collect(&mut self, raw_type: &str) {
        self.collected.add(raw_type);
    }

    fn collected_types(&self) -> Vec<String> {
        self.collected.list()
    }

    fn declare(&mut self, type_name: &str) {
        self.known.insert(normalize(type_name));
    }
}

/// Claims the well-known standard platform entities.
#[derive(Debug, Default, Clone)]
pub struct StandardEntityMatcher {
    collected: Collected,
}

impl StandardEntityMatcher {
    /// Create a new matcher.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TypeMatcher for StandardEntityMatcher {
    fn name(&self) -> &'static str {
        "standard-entity"
    }

    fn category(&self) -> MatcherCategory {
        MatcherCategory::Entity
    }

    fn matches(&self, type_name: &str) -> bool {
        STANDARD_ENTITIES.contains(type_name.to_ascii_lowercase().as_str())
    }

    fn collect(&mut self, raw_type: &str) {
        self.collected.add(raw_type);
    }

    fn collected_types(&self) -> Vec<String> {
        self.collected.list()
    }

    fn field_type(&self, owner: &ClassifiedType, field: &str) -> Option<ClassifiedType> {
        common_field_type(owner, field)
    }
}

/// Claims names carrying a custom entity suffix.
#[derive(Debug, Default, Clone)]
pub struct CustomEntityMatcher {
    collected: Collected,
}

impl CustomEntityMatcher {
    /// Create a new matcher.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TypeMatcher for CustomEntityMatcher {
    fn name(&self) -> &'static str {
        "custom-entity"
    }

    fn category(&self) -> MatcherCategory {
        MatcherCategory::Entity
    }

    fn matches(&self, type_name: &str) -> bool {
        is_custom_entity_name(type_name)
    }

    fn collect(&mut self, raw_type: &str) {
        self.collected.add(raw_type);
    }

    fn collected_types(&self) -> Vec<String> {
        self.collected.list()
    }

    fn field_type(&self, owner: &ClassifiedType, field: &str) -> Option<ClassifiedType> {
        common_field_type(owner, field)
    }
}

/// Resolves entity field types from a live schema description.
pub struct SchemaMatcher {
    describer: Arc<dyn SchemaDescriber>,
    collected: Collected,
    /// entity (normalized) → field (normalized) → type
    schema: HashMap<String, HashMap<String, ClassifiedType>>,
}

impl SchemaMatcher {
    /// Create a matcher backed by the given describer.
    pub fn new(describer: Arc<dyn SchemaDescriber>) -> Self {
        Self {
            describer,
            collected: Collected::default(),
            schema: HashMap::new(),
        }
    }

    /// Number of entities described so far.
    pub fn described_entities(&self) -> usize {
        self.schema.len()
    }
}

#[async_trait]
impl TypeMatcher for SchemaMatcher {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn category(&self) -> MatcherCategory {
        MatcherCategory::Entity
    }

    fn matches(&self, type_name: &str) -> bool {
        self.schema.contains_key(&normalize(type_name))
    }

    fn collect(&mut self, raw_type: &str) {
        self.collected.add(raw_type);
    }

    fn collected_types(&self) -> Vec<String> {
        self.collected.list()
    }

    async fn populate(&mut self) -> Result<()> {
        for name in self.collected.list() {
            let key = normalize(&name);
            if super::KEYWORD_TYPES.contains_key(key.as_str())
                || matches!(key.as_str(), "list" | "set" | "map")
                || self.schema.contains_key(&key)
            {
                continue;
            }
            match self.describer.describe_entity(&name).await {
                Ok(Some(fields)) => {
                    let fields = fields
                        .into_iter()
                        .map(|(field, ty)| (normalize(&field), ty))
                        .collect();
                    self.schema.insert(key, fields);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Could not describe {}: {}", name, e);
                }
            }
        }
        tracing::debug!("Described {} entities", self.schema.len());
        Ok(())
    }

    fn field_type(&self, owner: &ClassifiedType, field: &str) -> Option<ClassifiedType> {
        let base = base_type_names(&owner.raw).into_iter().next()?;
        self.schema
            .get(&normalize(&base))
            .and_then(|fields| fields.get(&normalize(field)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::remote::tests::FakeSchema;

    #[test]
    fn test_user_class_matcher() {
        let mut matcher = UserClassMatcher::new(["AccountService"]);
        assert!(matcher.matches("accountservice"));
        assert!(!matcher.matches("Helper"));
        matcher.declare("Helper");
        assert!(matcher.matches("HELPER"));
    }

    #[test]
    fn test_collect_records_base_names() {
        let mut matcher = StandardEntityMatcher::new();
        matcher.collect("Map<Id, Account>");
        matcher.collect("Integer");
        assert_eq!(
            matcher.collected_types(),
            vec!["Account", "Id", "Integer", "Map"]
        );
    }

    #[test]
    fn test_standard_entity_matcher() {
        let matcher = StandardEntityMatcher::new();
        assert!(matcher.matches("Account"));
        assert!(matcher.matches("opportunity"));
        assert!(!matcher.matches("Invoice__c"));
    }

    #[test]
    fn test_custom_entity_matcher() {
        let matcher = CustomEntityMatcher::new();
        assert!(matcher.matches("Invoice__c"));
        assert!(matcher.matches("Setting__mdt"));
        assert!(!matcher.matches("Account"));
    }

    #[test]
    fn test_common_field_types() {
        let matcher = StandardEntityMatcher::new();
        let account = ClassifiedType::new(TypeKind::StandardEntity, "Account");
        assert_eq!(
            matcher.field_type(&account, "Name").map(|t| t.kind),
            Some(TypeKind::String)
        );
        assert!(matcher.field_type(&account, "AnnualRevenue").is_none());

        let not_entity = ClassifiedType::new(TypeKind::Integer, "Integer");
        assert!(matcher.field_type(&not_entity, "Name").is_none());
    }

    #[tokio::test]
    async fn test_schema_matcher_populate() {
        let describer = Arc::new(FakeSchema::with_entity(
            "Invoice__c",
            &[("Amount__c", TypeKind::Decimal), ("Status__c", TypeKind::String)],
        ));
        let mut matcher = SchemaMatcher::new(describer);
        matcher.collect("List<Invoice__c>");
        matcher.collect("Integer");
        matcher.populate().await.unwrap();

        assert_eq!(matcher.described_entities(), 1);
        assert!(matcher.matches("invoice__c"));

        let owner = ClassifiedType::new(TypeKind::CustomEntity, "Invoice__c");
        assert_eq!(
            matcher.field_type(&owner, "amount__c").map(|t| t.kind),
            Some(TypeKind::Decimal)
        );
        assert!(matcher.field_type(&owner, "Missing__c").is_none());
    }
}
