//! Contracts with the remote execution platform.
//!
//! The engine never talks to the platform directly. Deploying a class,
//! running its tests and describing entity schemas all go through these
//! traits, so any adapter (HTTP tooling API, CLI wrapper, test fake) can
//! be plugged in.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::types::ClassifiedType;

/// A class as stored on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApexClass {
    /// Platform record id.
    pub id: String,
    /// Class name.
    pub name: String,
    /// Source body.
    pub body: String,
}

/// Overall outcome of a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed,
    Skipped,
    Error,
}

/// Result of running a subset of test methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunResult {
    /// Overall outcome.
    pub outcome: TestOutcome,
    /// Number of test methods executed.
    pub tests_ran: usize,
    /// Number of failing test methods.
    pub failing: usize,
}

/// Result of the baseline run of the whole test class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageResult {
    /// Overall outcome.
    pub outcome: TestOutcome,
    /// Number of test methods executed.
    pub tests_ran: usize,
    /// Number of failing test methods.
    pub failing: usize,
    /// Covered line → names of the test methods that execute it.
    pub per_line_test_methods: BTreeMap<u32, BTreeSet<String>>,
}

/// Compile, deploy and test operations of the platform.
///
/// Every call mutates or observes the single remote copy of a class, so
/// callers must never have two calls against the same class in flight.
#[async_trait]
pub trait RemoteExecution: Send + Sync {
    /// Fetch a class by name.
    async fn read(&self, class_name: &str) -> Result<ApexClass>;

    /// Deploy a new body for an existing class. Compilation failures are
    /// reported as errors.
    async fn update(&self, class: &ApexClass) -> Result<()>;

    /// Run the given test methods of a test class.
    async fn run_covering_tests(
        &self,
        test_class: &str,
        test_methods: &[String],
    ) -> Result<TestRunResult>;

    /// Run the whole test class and report per-line coverage.
    async fn baseline_coverage(&self, test_class: &str) -> Result<CoverageResult>;
}

/// Entity schema lookups.
#[async_trait]
pub trait SchemaDescriber: Send + Sync {
    /// Field name → type of every field of an entity, or `None` if the
    /// entity is unknown.
    async fn describe_entity(
        &self,
        entity: &str,
    ) -> Result<Option<HashMap<String, ClassifiedType>>>;

    /// Type of a single field.
    async fn describe_entity_field(
        &self,
        entity: &str,
        field: &str,
    ) -> Result<Option<ClassifiedType>> {
        let fields = self.describe_entity(entity).await?;
        Ok(fields.and_then(|fields| {
            fields
                .into_iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(field))
                .map(|(_, ty)| ty)
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    //! In-memory fakes of the platform, shared by unit tests.

    use super::*;

    use parking_lot::Mutex;

    use crate::core::Error;
    use crate::types::TypeKind;

    type UpdateHook = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;
    type TestHook = Box<dyn Fn(&str, &[String]) -> Result<TestRunResult> + Send + Sync>;

    /// Fake platform holding classes in memory.
    pub struct FakeRemote {
        pub classes: Mutex<HashMap<String, ApexClass>>,
        pub coverage: Mutex<Result<CoverageResult>>,
        pub updates: Mutex<Vec<String>>,
        pub test_calls: Mutex<Vec<Vec<String>>>,
        on_update: UpdateHook,
        on_test: TestHook,
    }

    impl FakeRemote {
        pub fn new(class_name: &str, body: &str, test_class: &str, test_body: &str) -> Self {
            let mut classes = HashMap::new();
            classes.insert(
                class_name.to_string(),
                ApexClass {
                    id: "01p000000000001".to_string(),
                    name: class_name.to_string(),
                    body: body.to_string(),
                },
            );
            classes.insert(
                test_class.to_string(),
                ApexClass {
                    id: "01p000000000002".to_string(),
                    name: test_class.to_string(),
                    body: test_body.to_string(),
                },
            );
            Self {
                classes: Mutex::new(classes),
                coverage: Mutex::new(Ok(passing_coverage(&[]))),
                updates: Mutex::new(Vec::new()),
                test_calls: Mutex::new(Vec::new()),
                on_update: Box::new(|_| Ok(())),
                on_test: Box::new(|_, _| {
                    Ok(TestRunResult {
                        outcome: TestOutcome::Passed,
                        tests_ran: 1,
                        failing: 0,
                    })
                }),
            }
        }

        pub fn with_coverage(self, coverage: Result<CoverageResult>) -> Self {
            *self.coverage.lock() = coverage;
            self
        }

        pub fn on_update<F>(mut self, hook: F) -> Self
        where
            F: Fn(&str) -> Result<()> + Send + Sync + 'static,
        {
            self.on_update = Box::new(hook);
            self
        }

        pub fn on_test<F>(mut self, hook: F) -> Self
        where
            F: Fn(&str, &[String]) -> Result<TestRunResult> + Send + Sync + 'static,
        {
            self.on_test = Box::new(hook);
            self
        }

        pub fn body_of(&self, name: &str) -> Option<String> {
            self.classes.lock().get(name).map(|c| c.body.clone())
        }
    }

    /// Coverage where every listed line is covered by the listed methods.
    pub fn passing_coverage(lines: &[(u32, &[&str])]) -> CoverageResult {
        CoverageResult {
            outcome: TestOutcome::Passed,
            tests_ran: lines.len().max(1),
            failing: 0,
            per_line_test_methods: lines
                .iter()
                .map(|(line, methods)| (*line, methods.iter().map(|m| m.to_string()).collect()))
                .collect(),
        }
    }

    #[async_trait]
    impl RemoteExecution for FakeRemote {
        async fn read(&self, class_name: &str) -> Result<ApexClass> {
            self.classes
                .lock()
                .get(class_name)
                .cloned()
                .ok_or_else(|| Error::remote(format!("No class named {class_name}")))
        }

        async fn update(&self, class: &ApexClass) -> Result<()> {
            self.updates.lock().push(class.body.clone());
            (self.on_update)(&class.body)?;
            self.classes.lock().insert(class.name.clone(), class.clone());
            Ok(())
        }

        async fn run_covering_tests(
            &self,
            _test_class: &str,
            test_methods: &[String],
        ) -> Result<TestRunResult> {
            self.test_calls.lock().push(test_methods.to_vec());
            let current = self
                .classes
                .lock()
                .values()
                .map(|c| c.body.clone())
                .collect::<Vec<_>>()
                .join("\n");
            (self.on_test)(&current, test_methods)
        }

        async fn baseline_coverage(&self, _test_class: &str) -> Result<CoverageResult> {
            match &*self.coverage.lock() {
                Ok(c) => Ok(c.clone()),
                Err(e) => Err(Error::remote(e.message())),
            }
        }
    }

    /// Fake schema describer.
    #[derive(Default)]
    pub struct FakeSchema {
        entities: HashMap<String, HashMap<String, ClassifiedType>>,
    }

    impl FakeSchema {
        pub fn with_entity(name: &str, fields: &[(&str, TypeKind)]) -> Self {
            let mut schema = Self::default();
            schema.entities.insert(
                name.to_ascii_lowercase(),
                fields
                    .iter()
                    .map(|(f, k)| (f.to_string(), ClassifiedType::new(*k, format!("{k:?}"))))
                    .collect(),
            );
            schema
        }
    }

    #[async_trait]
    impl SchemaDescriber for FakeSchema {
        async fn describe_entity(
            &self,
            entity: &str,
        ) -> Result<Option<HashMap<String, ClassifiedType>>> {
            Ok(self.entities.get(&entity.to_ascii_lowercase()).cloned())
        }
    }

    #[tokio::test]
    async fn test_describe_entity_field_default() {
        let schema = FakeSchema::with_entity("Invoice__c", &[("Amount__c", TypeKind::Decimal)]);
        let ty = schema
            .describe_entity_field("Invoice__c", "amount__c")
            .await
            .unwrap();
        assert_eq!(ty.map(|t| t.kind), Some(TypeKind::Decimal));

        let missing = schema.describe_entity_field("Nope__c", "x").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_fake_remote_round_trip() {
        let remote = FakeRemote::new("Calc", "class Calc {}", "CalcTest", "class CalcTest {}");
        let mut class = remote.read("Calc").await.unwrap();
        class.body = "class Calc { }".to_string();
        remote.update(&class).await.unwrap();
        assert_eq!(remote.body_of("Calc").as_deref(), Some("class Calc { }"));
        assert!(remote.read("Missing").await.is_err());
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_string(&TestOutcome::Passed).unwrap(),
            "\"passed\""
        );
    }
}
