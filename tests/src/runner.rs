//! Scenario runner.

use tessera_expr::ExecutionContext;
use tessera_query::{QueryError, Statement};
use tessera_stream::MemoryCatalog;
use tracing::{debug, info};

use crate::assertion::StepOutcome;
use crate::error::{ScenarioError, ScenarioResult};
use crate::scenario::Scenario;

/// Runs a scenario against an in-memory catalog.
pub struct Runner<'s> {
    scenario: &'s Scenario,
    catalog: MemoryCatalog,
}

impl<'s> Runner<'s> {
    pub fn new(scenario: &'s Scenario) -> ScenarioResult<Self> {
        let catalog = scenario.load_fixture()?.to_catalog();
        Ok(Self { scenario, catalog })
    }

    pub fn catalog(&self) -> &MemoryCatalog {
        &self.catalog
    }

    pub fn run(&self) -> ScenarioResult<()> {
        info!(scenario = self.scenario.name(), steps = self.scenario.steps().len(), "scenario started");

        let ctx = ExecutionContext::new()
            .with_catalog(&self.catalog)
            .with_params(self.scenario.exec_params().to_vec())
            .with_config(self.scenario.exec_config().clone());

        for step in self.scenario.steps() {
            let result = execute(&step.statement, &ctx);
            debug!(step = %step.name, ok = result.is_ok(), "step executed");
            step.assertion.verify(&step.name, &result)?;
        }

        Ok(())
    }

    /// Compile a statement without running it.
    pub fn compile(&self, step: &str) -> ScenarioResult<String> {
        let step = self
            .scenario
            .steps()
            .iter()
            .find(|s| s.name == step)
            .ok_or_else(|| ScenarioError::compile(step, "no such step"))?;
        step.statement
            .to_stream()
            .map(|stmt| stmt.explain())
            .map_err(|e| ScenarioError::compile(&step.name, e.to_string()))
    }
}

fn execute(statement: &Statement, ctx: &ExecutionContext<'_>) -> Result<StepOutcome, QueryError> {
    let stmt = statement.to_stream()?;
    let rows = stmt.run(ctx)?;
    Ok(StepOutcome {
        rows,
        read_only: stmt.read_only,
        plan: stmt.explain(),
    })
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_runner_with_inline_tables() {
        let scenario = Scenario::new("inline")
            .table("t", &[r#"{"a": 1}"#, r#"{"a": 2}"#])
            .unwrap()
            .step("all", select(core(vec![Expr::Wildcard]).from_table("t")), |a| a.rows(2))
            .step("count", select(core(vec![count()]).from_table("t")), |a| {
                a.scalar("COUNT(*)", 2)
            });

        scenario.run().unwrap();
    }

    #[test]
    fn test_sequences_persist_across_steps() {
        let next = || select(core(vec![Expr::auto_named(Expr::next_value_for("seq"))]));
        let scenario = Scenario::new("sequences")
            .sequence("seq")
            .step("first", next(), |a| a.scalar("NEXT VALUE FOR seq", 1).read_only(false))
            .step("second", next(), |a| a.scalar("NEXT VALUE FOR seq", 2));

        scenario.run().unwrap();
    }

    #[test]
    fn test_failed_assertion_names_the_step() {
        let scenario = Scenario::new("failing")
            .table("t", &[r#"{"a": 1}"#])
            .unwrap()
            .step("wrong_count", select(core(vec![Expr::Wildcard]).from_table("t")), |a| a.rows(5));

        let err = scenario.run().unwrap_err();

        assert!(err.to_string().starts_with("step 'wrong_count'"));
    }

    #[test]
    fn test_compile_step() {
        let scenario = Scenario::new("plan")
            .step("q", select(core(vec![Expr::Wildcard]).from_table("t")), |a| a);
        let runner = crate::Runner::new(&scenario).unwrap();

        assert_eq!(runner.compile("q").unwrap(), "table.Scan(t) | docs.Project(*)");
        assert!(runner.compile("missing").is_err());
    }
}
