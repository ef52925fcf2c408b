//! Test execution engine.

use crate::diff;
use crate::execute::execute_fixture_case;
use crate::fixtures::{FixtureCase, FixtureSet};
use crate::verify::VerificationResult;

/// Runs a fixture set and collects verification results.
pub struct TestRunner {
    /// Name of the test campaign.
    pub campaign: String,
    /// Mode being tested (strict or hardened).
    pub mode: String,
}

impl TestRunner {
    /// Create a new test runner.
    #[must_use]
    pub fn new(campaign: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
            mode: mode.into(),
        }
    }

    /// Run all fixtures in a set that apply to this runner's mode.
    pub fn run(&self, fixture_set: &FixtureSet) -> Vec<VerificationResult> {
        fixture_set
            .cases
            .iter()
            .filter(|case| mode_matches(&self.mode, &case.mode))
            .map(|case| self.run_case(case))
            .collect()
    }

    fn run_case(&self, case: &FixtureCase) -> VerificationResult {
        let case_name = if case.mode.eq_ignore_ascii_case("both") {
            format!("{} [{}]", case.name, self.mode)
        } else {
            case.name.clone()
        };

        let (actual, healing_action) =
            match execute_fixture_case(&case.function, &case.inputs, &self.mode) {
                Ok(run) => (
                    run.output,
                    run.healing.is_heal().then(|| run.healing.label().to_string()),
                ),
                Err(err) => (format!("error:{err}"), None),
            };
        let passed = actual == case.expected_output;
        let diff = (!passed).then(|| diff::render_diff(&case.expected_output, &actual));

        VerificationResult {
            case_name,
            function: case.function.clone(),
            contract: case.contract.clone(),
            passed,
            expected: case.expected_output.clone(),
            actual,
            healing_action,
            diff,
        }
    }
}

fn mode_matches(active_mode: &str, case_mode: &str) -> bool {
    let active = active_mode.to_ascii_lowercase();
    let case = case_mode.to_ascii_lowercase();
    case == active || case == "both"
}
