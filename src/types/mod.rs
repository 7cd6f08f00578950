//! Lightweight type inference for Apex sources.
//!
//! There is no semantic compiler here. Types are raw strings as written in
//! the source, classified into a small closed set of categories. That is
//! enough for mutators to decide whether a mutation is type-compatible,
//! e.g. whether `a + b` is arithmetic or string concatenation.

mod discoverer;
mod matcher;

pub use discoverer::TypeDiscoverer;
pub use matcher::{
    CustomEntityMatcher, MatcherCategory, SchemaMatcher, StandardEntityMatcher, TypeMatcher,
    UserClassMatcher,
};

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Category of a classified type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Void,
    Boolean,
    Integer,
    Long,
    Double,
    Decimal,
    String,
    Id,
    Blob,
    Date,
    Datetime,
    Time,
    /// The generic `SObject` type.
    Entity,
    Object,
    List,
    Set,
    Map,
    UserClass,
    CustomEntity,
    StandardEntity,
}

impl TypeKind {
    /// Integer, Long, Double or Decimal.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Long | Self::Double | Self::Decimal)
    }

    /// List, Set or Map.
    pub fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Map)
    }

    /// Any of the entity kinds.
    pub fn is_entity(self) -> bool {
        matches!(
            self,
            Self::Entity | Self::CustomEntity | Self::StandardEntity
        )
    }
}

/// A raw type string together with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedType {
    /// Category of the type.
    pub kind: TypeKind,
    /// The type as written (trimmed).
    pub raw: String,
    /// Generic parameter text for List/Set/Map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
}

impl ClassifiedType {
    /// Create a classified type without element type.
    pub fn new(kind: TypeKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            element_type: None,
        }
    }

    /// Create a collection type.
    pub fn collection(kind: TypeKind, raw: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            element_type: Some(element.into()),
        }
    }

    /// Whether two types are interchangeable as far as mutation is concerned.
    ///
    /// Compares kinds; collections also compare element types and named
    /// types (classes, entities) compare names, all case-insensitively.
    pub fn is_compatible_with(&self, other: &ClassifiedType) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match self.kind {
            kind if kind.is_collection() => {
                let a = normalize(self.element_type.as_deref().unwrap_or(""));
                let b = normalize(other.element_type.as_deref().unwrap_or(""));
                a == b
            }
            TypeKind::UserClass | TypeKind::CustomEntity | TypeKind::StandardEntity => {
                normalize(&self.raw) == normalize(&other.raw)
            }
            _ => true,
        }
    }

    /// Source text for an empty instance of a collection type.
    pub fn empty_collection_literal(&self) -> Option<String> {
        let outer = match self.kind {
            TypeKind::List => "List",
            TypeKind::Set => "Set",
            TypeKind::Map => "Map",
            _ => return None,
        };
        let element = self.element_type.as_deref()?;
        Some(format!("new {outer}<{element}>()"))
    }

    /// Default literal used when replacing a value of this type.
    ///
    /// Void has no default.
    pub fn default_literal(&self) -> Option<String> {
        match self.kind {
            TypeKind::Void => None,
            TypeKind::Boolean => Some("false".to_string()),
            TypeKind::Integer => Some("0".to_string()),
            TypeKind::Long => Some("0L".to_string()),
            TypeKind::Double | TypeKind::Decimal => Some("0.0".to_string()),
            TypeKind::String => Some("''".to_string()),
            kind if kind.is_collection() => self.empty_collection_literal(),
            _ => Some("null".to_string()),
        }
    }
}

impl fmt::Display for ClassifiedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Signature of one declared method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    /// Method name as declared.
    pub name: String,
    /// Return type as written.
    pub return_type: String,
    /// First line of the declaration (1-indexed).
    pub start_line: u32,
    /// Last line of the declaration (1-indexed).
    pub end_line: u32,
    /// Classified return type.
    pub classified: ClassifiedType,
}

/// Variable name → raw declared type for one method.
pub type ScopeTable = HashMap<String, String>;

/// Field name → raw declared type for the whole class.
pub type ClassFieldTable = HashMap<String, String>;

/// Immutable snapshot of everything type discovery learned about a class.
pub struct TypeRegistry {
    methods: HashMap<String, MethodSignature>,
    scopes: HashMap<String, ScopeTable>,
    fields: ClassFieldTable,
    matchers: Vec<Box<dyn TypeMatcher>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("methods", &self.methods.len())
            .field("scopes", &self.scopes.len())
            .field("fields", &self.fields.len())
            .field("matchers", &self.matchers.len())
            .finish()
    }
}

impl TypeRegistry {
    /// A registry that knows nothing. Every lookup resolves to `None`
    /// except literals.
    pub fn empty() -> Self {
        Self {
            methods: HashMap::new(),
            scopes: HashMap::new(),
            fields: HashMap::new(),
            matchers: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        methods: HashMap<String, MethodSignature>,
        scopes: HashMap<String, ScopeTable>,
        fields: ClassFieldTable,
        matchers: Vec<Box<dyn TypeMatcher>>,
    ) -> Self {
        Self {
            methods,
            scopes,
            fields,
            matchers,
        }
    }

    /// Look up a method signature by name (case-insensitive).
    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.get(&normalize(name))
    }

    /// All discovered method signatures, sorted by start line.
    pub fn methods(&self) -> Vec<&MethodSignature> {
        let mut methods: Vec<_> = self.methods.values().collect();
        methods.sort_by_key(|m| (m.start_line, m.name.clone()));
        methods
    }

    /// Classify a raw type string with this registry's matchers.
    pub fn classify(&self, raw: &str) -> ClassifiedType {
        classify(raw, &self.matchers)
    }

    /// Resolve an expression inside a method to a classified type.
    ///
    /// Without an expression this returns the method's return type.
    /// Unknown expressions resolve to `None`.
    pub fn resolve(&self, method_name: &str, expression: Option<&str>) -> Option<ClassifiedType> {
        let Some(expression) = expression else {
            return self.method(method_name).map(|m| m.classified.clone());
        };
        let expr = expression.trim();
        if expr.is_empty() {
            return None;
        }

        if let Some(kind) = literal_kind(expr) {
            return Some(ClassifiedType::new(kind, literal_type_name(kind)));
        }

        if is_identifier(expr) {
            return self
                .variable_type(method_name, expr)
                .map(|raw| self.classify(raw));
        }

        if expr.ends_with(')') {
            return self.resolve_call(expr);
        }

        if let Some(field) = strip_this(expr) {
            if is_identifier(field) {
                return self.fields.get(&normalize(field)).map(|raw| self.classify(raw));
            }
        }

        let mut parts = expr.split('.');
        if let (Some(left), Some(right), None) = (parts.next(), parts.next(), parts.next()) {
            let (left, right) = (left.trim(), right.trim());
            if !is_identifier(left) || !is_identifier(right) {
                return None;
            }
            let owner = self.resolve(method_name, Some(left))?;
            return self
                .matchers
                .iter()
                .find_map(|m| m.field_type(&owner, right));
        }

        None
    }

    /// Declared type of a variable: method scope first, then class fields.
    pub fn variable_type(&self, method_name: &str, variable: &str) -> Option<&str> {
        let key = normalize(variable);
        self.scopes
            .get(&normalize(method_name))
            .and_then(|scope| scope.get(&key))
            .or_else(|| self.fields.get(&key))
            .map(|s| s.as_str())
    }

    /// Whether an expression provably has the given kind.
    pub fn resolves_to(&self, method_name: &str, expression: &str, kind: TypeKind) -> bool {
        self.resolve(method_name, Some(expression))
            .is_some_and(|t| t.kind == kind)
    }

    fn resolve_call(&self, expr: &str) -> Option<ClassifiedType> {
        let open = expr.find('(')?;
        let head = expr[..open].trim();
        let head = strip_this(head).unwrap_or(head);
        if !is_identifier(head) {
            return None;
        }
        self.method(head).map(|m| m.classified.clone())
    }
}

static KEYWORD_TYPES: Lazy<HashMap<&'static str, TypeKind>> = Lazy::new(|| {
    HashMap::from([
        ("void", TypeKind::Void),
        ("boolean", TypeKind::Boolean),
        ("integer", TypeKind::Integer),
        ("long", TypeKind::Long),
        ("double", TypeKind::Double),
        ("decimal", TypeKind::Decimal),
        ("string", TypeKind::String),
        ("id", TypeKind::Id),
        ("blob", TypeKind::Blob),
        ("date", TypeKind::Date),
        ("datetime", TypeKind::Datetime),
        ("time", TypeKind::Time),
        ("sobject", TypeKind::Entity),
        ("object", TypeKind::Object),
    ])
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));
static INTEGER_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+$").expect("valid integer regex"));
static LONG_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+[lL]$").expect("valid long regex"));
static DOUBLE_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?[dD]$").expect("valid double regex"));
static DECIMAL_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d*\.\d+$").expect("valid decimal regex"));

/// Lower-cased, whitespace-free form used for case-insensitive comparisons.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Whether the text is a plain identifier.
pub fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

fn strip_this(expr: &str) -> Option<&str> {
    let (head, rest) = expr.split_once('.')?;
    head.trim()
        .eq_ignore_ascii_case("this")
        .then_some(rest.trim())
}

/// Kind of a literal, detected by its lexical shape.
pub fn literal_kind(expr: &str) -> Option<TypeKind> {
    let expr = expr.trim();
    if expr.len() >= 2
        && ((expr.starts_with('\'') && expr.ends_with('\''))
            || (expr.starts_with('"') && expr.ends_with('"')))
    {
        return Some(TypeKind::String);
    }
    if expr.eq_ignore_ascii_case("true") || expr.eq_ignore_ascii_case("false") {
        return Some(TypeKind::Boolean);
    }
    if LONG_LITERAL.is_match(expr) {
        return Some(TypeKind::Long);
    }
    if INTEGER_LITERAL.is_match(expr) {
        return Some(TypeKind::Integer);
    }
    if DOUBLE_LITERAL.is_match(expr) {
        return Some(TypeKind::Double);
    }
    if DECIMAL_LITERAL.is_match(expr) {
        return Some(TypeKind::Decimal);
    }
    None
}

fn literal_type_name(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::String => "String",
        TypeKind::Boolean => "Boolean",
        TypeKind::Long => "Long",
        TypeKind::Integer => "Integer",
        TypeKind::Double => "Double",
        _ => "Decimal",
    }
}

/// Split generic parameters on top-level commas.
fn split_generic_params(inner: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                params.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        params.push(current.trim().to_string());
    }
    params
}

/// Strip a `System.` or `Schema.` namespace prefix.
fn strip_namespace(name: &str) -> &str {
    for prefix in ["system.", "schema."] {
        if name.len() > prefix.len() && name[..prefix.len()].eq_ignore_ascii_case(prefix) {
            return &name[prefix.len()..];
        }
    }
    name
}

/// Every simple type name mentioned by a raw type string.
///
/// `Map<Id, List<Account>>` yields `Map`, `Id`, `List`, `Account`.
pub fn base_type_names(raw: &str) -> Vec<String> {
    raw.split(|c: char| matches!(c, '<' | '>' | ',' | '[' | ']') || c.is_whitespace())
        .map(|s| strip_namespace(s.trim()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Classify a raw type string.
///
/// Total: every input yields exactly one classification. Unknown names
/// classify as `Void`, the safest non-mutable answer.
pub fn classify(raw: &str, matchers: &[Box<dyn TypeMatcher>]) -> ClassifiedType {
    let raw = raw.trim();

    if let Some(element) = raw.strip_suffix("[]") {
        return ClassifiedType::collection(TypeKind::List, raw, element.trim());
    }

    if let (Some(open), true) = (raw.find('<'), raw.ends_with('>')) {
        let outer = strip_namespace(raw[..open].trim());
        let params = split_generic_params(&raw[open + 1..raw.len() - 1]);
        let kind = match outer.to_ascii_lowercase().as_str() {
            "list" => Some(TypeKind::List),
            "set" => Some(TypeKind::Set),
            "map" => Some(TypeKind::Map),
            _ => None,
        };
        return match kind {
            Some(kind) => ClassifiedType::collection(kind, raw, params.join(", ")),
            None => ClassifiedType {
                raw: raw.to_string(),
                ..classify_name(outer, matchers)
            },
        };
    }

    ClassifiedType {
        raw: raw.to_string(),
        ..classify_name(strip_namespace(raw), matchers)
    }
}

fn classify_name(name: &str, matchers: &[Box<dyn TypeMatcher>]) -> ClassifiedType {
    if let Some(kind) = KEYWORD_TYPES.get(name.to_ascii_lowercase().as_str()) {
        return ClassifiedType::new(*kind, name);
    }

    let claimed = |category: MatcherCategory| {
        matchers
            .iter()
            .any(|m| m.category() == category && m.matches(name))
    };

    if claimed(MatcherCategory::UserClass) {
        return ClassifiedType::new(TypeKind::UserClass, name);
    }
    if claimed(MatcherCategory::Entity) {
        let kind = if matcher::is_custom_entity_name(name) {
            TypeKind::CustomEntity
        } else {
            TypeKind::StandardEntity
        };
        return ClassifiedType::new(kind, name);
    }

    ClassifiedType::new(TypeKind::Void, name)
}
