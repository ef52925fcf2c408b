//! Diff rendering for fixture comparison.

/// Render a text diff between expected and actual output.
#[must_use]
pub fn render_diff(expected: &str, actual: &str) -> String {
    if expected == actual {
        return String::from("[identical]");
    }

    let mut out = String::new();
    out.push_str("--- expected\n");
    out.push_str("+++ actual\n");
    let expected_lines: Vec<&str> = expected.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();
    for i in 0..expected_lines.len().max(actual_lines.len()) {
        let e = expected_lines.get(i);
        let a = actual_lines.get(i);
        if e != a {
            out.push_str(&format!("@@ line {} @@\n", i + 1));
            if let Some(e) = e {
                out.push_str(&format!("-{e}\n"));
            }
            if let Some(a) = a {
                out.push_str(&format!("+{a}\n"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs() {
        assert_eq!(render_diff("[1, 2]", "[1, 2]"), "[identical]");
    }

    #[test]
    fn single_line_mismatch() {
        let diff = render_diff("[97, 0]", "[63, 0]");
        assert!(diff.contains("-[97, 0]"));
        assert!(diff.contains("+[63, 0]"));
        assert!(diff.contains("@@ line 1 @@"));
    }

    #[test]
    fn extra_actual_line_is_reported() {
        let diff = render_diff("a", "a\nb");
        assert!(diff.contains("@@ line 2 @@"));
        assert!(diff.contains("+b"));
    }
}
