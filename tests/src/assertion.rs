//! Assertion types and builders for verifying step results.

use tessera_core::{Document, Value};
use tessera_query::{ErrorKind, QueryError};

use crate::error::{ScenarioError, ScenarioResult};

/// What a successful step produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub rows: Vec<Document>,
    pub read_only: bool,
    pub plan: String,
}

/// A complete assertion for a step result.
#[derive(Default)]
pub struct Assertion {
    pub rows: Option<usize>,
    pub empty: Option<bool>,
    pub returns: Option<Vec<Document>>,
    pub ordered: bool,
    pub first: Option<Document>,

    // Single-row, single-field result
    pub scalar_field: Option<String>,
    pub scalar_value: Option<Value>,

    pub read_only: Option<bool>,
    pub plan: Option<String>,

    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,

    #[allow(clippy::type_complexity)]
    pub custom: Option<Box<dyn Fn(&StepOutcome) -> bool>>,
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("rows", &self.rows)
            .field("empty", &self.empty)
            .field("returns", &self.returns)
            .field("ordered", &self.ordered)
            .field("scalar_field", &self.scalar_field)
            .field("read_only", &self.read_only)
            .field("plan", &self.plan)
            .field("error", &self.error)
            .field("error_kind", &self.error_kind)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    fn expects_error(&self) -> bool {
        self.error.is_some() || self.error_kind.is_some()
    }

    /// Verify the assertion against a step result.
    pub fn verify(&self, step: &str, result: &Result<StepOutcome, QueryError>) -> ScenarioResult<()> {
        if self.expects_error() {
            return match result {
                Ok(_) => Err(ScenarioError::assertion_failed(
                    step,
                    "expected an error, but step succeeded",
                )),
                Err(e) => self.verify_error(step, e),
            };
        }

        let outcome = result
            .as_ref()
            .map_err(|e| ScenarioError::assertion_failed(step, format!("step failed: {}", e)))?;

        if let Some(ref custom) = self.custom {
            if !custom(outcome) {
                return Err(ScenarioError::assertion_failed(step, "custom assertion failed"));
            }
        }

        if let Some(expected) = self.read_only {
            if outcome.read_only != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected read_only = {}, got {}", expected, outcome.read_only),
                ));
            }
        }

        if let Some(ref expected) = self.plan {
            if outcome.plan != *expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("plan mismatch:\n  expected: {}\n  actual:   {}", expected, outcome.plan),
                ));
            }
        }

        self.verify_rows(step, &outcome.rows)
    }

    fn verify_error(&self, step: &str, error: &QueryError) -> ScenarioResult<()> {
        if let Some(ref expected) = self.error {
            let message = error.to_string();
            if !message.contains(expected.as_str()) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected error containing '{}', got: {}", expected, message),
                ));
            }
        }

        if let Some(expected) = self.error_kind {
            if error.kind() != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected {:?} error, got {:?}: {}", expected, error.kind(), error),
                ));
            }
        }

        Ok(())
    }

    fn verify_rows(&self, step: &str, rows: &[Document]) -> ScenarioResult<()> {
        if let Some(ref field) = self.scalar_field {
            let [row] = rows else {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("scalar() expects 1 row, got {}", rows.len()),
                ));
            };
            let keys: Vec<&str> = row.keys().collect();
            if keys != [field.as_str()] {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("scalar() expects the single field \"{}\", got {:?}", field, keys),
                ));
            }
            if let Some(ref expected) = self.scalar_value {
                let actual = row.get(field).unwrap_or(&Value::Null);
                if actual != expected {
                    return Err(ScenarioError::assertion_failed(
                        step,
                        format!(
                            "scalar() value mismatch for \"{}\":\n  expected: {}\n  actual:   {}",
                            field, expected, actual
                        ),
                    ));
                }
            }
        }

        if let Some(expected) = self.rows {
            if rows.len() != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected {} rows, got {}", expected, rows.len()),
                ));
            }
        }

        if let Some(expected_empty) = self.empty {
            if rows.is_empty() != expected_empty {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "expected {}empty, got {} rows",
                        if expected_empty { "" } else { "not " },
                        rows.len()
                    ),
                ));
            }
        }

        if let Some(ref expected_rows) = self.returns {
            if rows.len() != expected_rows.len() {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "returns() row count mismatch:\n  expected: {} rows\n  actual:   {} rows\n  rows:     {}",
                        expected_rows.len(),
                        rows.len(),
                        format_rows(rows)
                    ),
                ));
            }

            if self.ordered {
                for (i, (expected, actual)) in expected_rows.iter().zip(rows).enumerate() {
                    if expected != actual {
                        return Err(ScenarioError::assertion_failed(
                            step,
                            format!(
                                "returns().ordered() row mismatch at index {}:\n  expected: {}\n  actual:   {}",
                                i, expected, actual
                            ),
                        ));
                    }
                }
            } else {
                // Multiset comparison
                let mut remaining: Vec<&Document> = rows.iter().collect();
                for (i, expected) in expected_rows.iter().enumerate() {
                    match remaining.iter().position(|row| *row == expected) {
                        Some(pos) => {
                            remaining.remove(pos);
                        }
                        None => {
                            return Err(ScenarioError::assertion_failed(
                                step,
                                format!(
                                    "returns() missing expected row at index {}:\n  expected: {}\n  rows:     {}",
                                    i,
                                    expected,
                                    format_rows(rows)
                                ),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(ref expected_first) = self.first {
            match rows.first() {
                None => {
                    return Err(ScenarioError::assertion_failed(
                        step,
                        "expected first row but result is empty",
                    ))
                }
                Some(actual) if actual != expected_first => {
                    return Err(ScenarioError::assertion_failed(
                        step,
                        format!(
                            "first() row mismatch:\n  expected: {}\n  actual:   {}",
                            expected_first, actual
                        ),
                    ))
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

/// Builder for fluent assertion construction.
#[derive(Default)]
pub struct AssertionBuilder {
    assertion: Assertion,
}

impl AssertionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> Assertion {
        self.assertion
    }

    // ========== Rows ==========

    /// Assert that the result has exactly N rows.
    pub fn rows(mut self, n: usize) -> Self {
        self.assertion.rows = Some(n);
        self
    }

    pub fn empty(mut self) -> Self {
        self.assertion.empty = Some(true);
        self
    }

    pub fn not_empty(mut self) -> Self {
        self.assertion.empty = Some(false);
        self
    }

    /// Assert that the result holds exactly these rows.
    ///
    /// Order does not matter unless `.ordered()` is also set. Rows compare
    /// as whole documents, field order included.
    pub fn returns(mut self, rows: Vec<Document>) -> Self {
        self.assertion.returns = Some(rows);
        self
    }

    pub fn ordered(mut self) -> Self {
        self.assertion.ordered = true;
        self
    }

    pub fn first(mut self, row: Document) -> Self {
        self.assertion.first = Some(row);
        self
    }

    /// Assert a single-row result with exactly one field.
    ///
    /// # Example
    /// ```ignore
    /// .step("count", stmt, |a| a.scalar("COUNT(*)", 5))
    /// ```
    pub fn scalar(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.assertion.scalar_field = Some(field.to_string());
        self.assertion.scalar_value = Some(value.into());
        self
    }

    // ========== Statement ==========

    pub fn read_only(mut self, expected: bool) -> Self {
        self.assertion.read_only = Some(expected);
        self
    }

    /// Assert the rendered stream of the compiled statement.
    pub fn plan(mut self, rendered: impl Into<String>) -> Self {
        self.assertion.plan = Some(rendered.into());
        self
    }

    // ========== Errors ==========

    /// Assert that the step fails with an error containing the given string.
    pub fn error(mut self, contains: impl Into<String>) -> Self {
        self.assertion.error = Some(contains.into());
        self
    }

    pub fn error_kind(mut self, kind: ErrorKind) -> Self {
        self.assertion.error_kind = Some(kind);
        self
    }

    // ========== Advanced ==========

    pub fn assert_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&StepOutcome) -> bool + 'static,
    {
        self.assertion.custom = Some(Box::new(f));
        self
    }
}

fn format_rows(rows: &[Document]) -> String {
    let parts: Vec<String> = rows.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn outcome(rows: Vec<Document>) -> Result<StepOutcome, QueryError> {
        Ok(StepOutcome {
            rows,
            read_only: true,
            plan: "table.Scan(t)".to_string(),
        })
    }

    #[test]
    fn test_returns_is_unordered_by_default() {
        // GIVEN
        let result = outcome(vec![row! { "a" => 1 }, row! { "a" => 2 }]);
        let assertion = AssertionBuilder::new()
            .returns(vec![row! { "a" => 2 }, row! { "a" => 1 }])
            .build();

        // THEN
        assert!(assertion.verify("s", &result).is_ok());
    }

    #[test]
    fn test_ordered_returns() {
        let result = outcome(vec![row! { "a" => 1 }, row! { "a" => 2 }]);
        let assertion = AssertionBuilder::new()
            .returns(vec![row! { "a" => 2 }, row! { "a" => 1 }])
            .ordered()
            .build();

        let err = assertion.verify("s", &result).unwrap_err();

        assert!(err.to_string().contains("index 0"));
    }

    #[test]
    fn test_scalar() {
        let result = outcome(vec![row! { "COUNT(*)" => 3 }]);

        assert!(AssertionBuilder::new().scalar("COUNT(*)", 3).build().verify("s", &result).is_ok());
        assert!(AssertionBuilder::new().scalar("COUNT(*)", 4).build().verify("s", &result).is_err());
        assert!(AssertionBuilder::new().scalar("n", 3).build().verify("s", &result).is_err());
    }

    #[test]
    fn test_error_expectations() {
        let result: Result<StepOutcome, QueryError> = Err(QueryError::NoTablesSpecified);

        let matching = AssertionBuilder::new()
            .error("no tables")
            .error_kind(ErrorKind::Compile)
            .build();
        let wrong_kind = AssertionBuilder::new().error_kind(ErrorKind::Runtime).build();
        let unexpected = AssertionBuilder::new().rows(0).build();

        assert!(matching.verify("s", &result).is_ok());
        assert!(wrong_kind.verify("s", &result).is_err());
        assert!(unexpected.verify("s", &result).is_err());
        assert!(matching.verify("s", &outcome(vec![])).is_err());
    }

    #[test]
    fn test_read_only_and_plan() {
        let result = outcome(vec![]);

        assert!(AssertionBuilder::new()
            .read_only(true)
            .plan("table.Scan(t)")
            .empty()
            .build()
            .verify("s", &result)
            .is_ok());
        assert!(AssertionBuilder::new().read_only(false).build().verify("s", &result).is_err());
    }
}
