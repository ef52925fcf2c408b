//! Human-readable verification reports.

use crate::verify::VerificationSummary;

/// Render verification summaries (one per mode) as markdown.
#[must_use]
pub fn render_markdown(title: &str, timestamp: &str, summaries: &[VerificationSummary]) -> String {
    let mut out = format!("# {title}\n\nGenerated: {timestamp}\n\n");
    out.push_str("| mode | total | passed | failed |\n|---|---:|---:|---:|\n");
    for s in summaries {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            s.mode, s.total, s.passed, s.failed
        ));
    }

    for s in summaries {
        out.push_str(&format!("\n## {} mode\n\n", s.mode));
        out.push_str("| case | function | contract | result | healing |\n|---|---|---|---|---|\n");
        for r in &s.results {
            out.push_str(&format!(
                "| {} | `{}` | {} | {} | {} |\n",
                r.case_name,
                r.function,
                r.contract,
                if r.passed { "PASS" } else { "FAIL" },
                r.healing_action.as_deref().unwrap_or("-"),
            ));
        }
        for r in s.results.iter().filter(|r| !r.passed) {
            if let Some(diff) = &r.diff {
                out.push_str(&format!("\n### {}\n\n```diff\n{diff}```\n", r.case_name));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::VerificationResult;

    fn result(name: &str, passed: bool) -> VerificationResult {
        VerificationResult {
            case_name: name.to_string(),
            function: "to_c_str".to_string(),
            contract: "4.1".to_string(),
            passed,
            expected: "[0]".to_string(),
            actual: if passed { "[0]" } else { "[63, 0]" }.to_string(),
            healing_action: None,
            diff: (!passed).then(|| "--- expected\n+++ actual\n".to_string()),
        }
    }

    #[test]
    fn report_lists_totals_and_failures() {
        let summary = VerificationSummary::from_results(
            "strict",
            vec![result("ok", true), result("bad", false)],
        );
        let md = render_markdown("Conformance", "2026-10-16T00:00:00Z", &[summary]);
        assert!(md.contains("| strict | 2 | 1 | 1 |"));
        assert!(md.contains("| ok | `to_c_str` | 4.1 | PASS | - |"));
        assert!(md.contains("### bad"));
        assert!(!md.contains("### ok"));
    }
}
