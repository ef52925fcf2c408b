//! Capture of the reference conversion fixture set.
//!
//! The case list below is the canonical coverage of the conversion contract.
//! Expected outputs are computed by running each case through the executor,
//! so a captured file pins today's behavior for later `verify` runs.

use serde_json::{Value, json};

use crate::error::HarnessError;
use crate::execute::execute_fixture_case;
use crate::fixtures::{FixtureCase, FixtureSet};
use crate::structured_log::now_utc;

struct CaseSpec {
    name: &'static str,
    function: &'static str,
    contract: &'static str,
    mode: &'static str,
    inputs: Value,
}

fn case_specs() -> Vec<CaseSpec> {
    let spec = |name, function, contract, mode, inputs| CaseSpec {
        name,
        function,
        contract,
        mode,
        inputs,
    };
    vec![
        spec(
            "narrow_ascii",
            "to_c_str",
            "narrow: ascii copied, NUL appended",
            "both",
            json!({"units": [72, 101, 108, 108, 111]}),
        ),
        spec(
            "narrow_empty",
            "to_c_str",
            "narrow: empty yields terminator only",
            "both",
            json!({"units": []}),
        ),
        spec(
            "narrow_smiley",
            "to_c_str",
            "narrow: unit >= 0x80 becomes '?'",
            "both",
            json!({"units": [104, 105, 9786, 33]}),
        ),
        spec(
            "narrow_boundary",
            "to_c_str",
            "narrow: 0x7F kept, 0x80 substituted",
            "both",
            json!({"units": [127, 128, 255, 65535]}),
        ),
        spec(
            "narrow_interior_zero",
            "to_c_str",
            "narrow: interior zero copied",
            "both",
            json!({"units": [97, 0, 98]}),
        ),
        spec(
            "narrow_null_strict",
            "to_c_str",
            "narrow: NULL input",
            "strict",
            json!({"units": null}),
        ),
        spec(
            "narrow_null_hardened",
            "to_c_str",
            "narrow: NULL input healed",
            "hardened",
            json!({"units": null}),
        ),
        spec(
            "widen_abc",
            "from_c_str",
            "widen: length from terminator",
            "both",
            json!({"bytes": [97, 98, 99, 0]}),
        ),
        spec(
            "widen_high_bytes",
            "from_c_str",
            "widen: zero-extension",
            "both",
            json!({"bytes": [255, 128, 1, 0]}),
        ),
        spec(
            "widen_first_nul",
            "from_c_str",
            "widen: stops at first NUL",
            "both",
            json!({"bytes": [120, 0, 121, 0]}),
        ),
        spec(
            "widen_unterminated_strict",
            "from_c_str",
            "widen: unterminated buffer",
            "strict",
            json!({"bytes": [1, 2, 3]}),
        ),
        spec(
            "widen_unterminated_hardened",
            "from_c_str",
            "widen: scan bounded by own buffer's extent",
            "hardened",
            json!({"bytes": [1, 2, 3], "origin": "library"}),
        ),
        spec(
            "widen_unterminated_foreign_hardened",
            "from_c_str",
            "widen: caller buffer is not bounded",
            "hardened",
            json!({"bytes": [1, 2, 3], "origin": "caller"}),
        ),
        spec(
            "widen_null_hardened",
            "from_c_str",
            "widen: NULL input healed",
            "hardened",
            json!({"bytes": null}),
        ),
        spec(
            "widen_len_embedded_nul",
            "from_c_str_with_length",
            "widen_len: embedded NULs kept",
            "both",
            json!({"bytes": [97, 0, 98, 0, 99], "len": 5}),
        ),
        spec(
            "widen_len_prefix",
            "from_c_str_with_length",
            "widen_len: shorter than buffer",
            "both",
            json!({"bytes": [97, 98, 99, 100], "len": 2}),
        ),
        spec(
            "widen_len_zero_null",
            "from_c_str_with_length",
            "widen_len: zero length ignores pointer",
            "both",
            json!({"bytes": null, "len": 0}),
        ),
        spec(
            "widen_len_overflow_strict",
            "from_c_str_with_length",
            "widen_len: length past buffer",
            "strict",
            json!({"bytes": [1, 2], "len": 4}),
        ),
        spec(
            "widen_len_overflow_hardened",
            "from_c_str_with_length",
            "widen_len: length clamped to own buffer's extent",
            "hardened",
            json!({"bytes": [1, 2], "len": 4, "origin": "library"}),
        ),
        spec(
            "widen_len_overflow_foreign_hardened",
            "from_c_str_with_length",
            "widen_len: caller length is trusted",
            "hardened",
            json!({"bytes": [1, 2], "len": 4, "origin": "caller"}),
        ),
    ]
}

/// Build the reference fixture set.
pub fn capture_conversion_fixture_set() -> Result<FixtureSet, HarnessError> {
    let mut cases = Vec::new();
    for spec in case_specs() {
        // `both` cases must agree across modes; strict is the reference.
        let reference_mode = if spec.mode == "hardened" { "hardened" } else { "strict" };
        let run = execute_fixture_case(spec.function, &spec.inputs, reference_mode)?;
        cases.push(FixtureCase {
            name: spec.name.to_string(),
            function: spec.function.to_string(),
            contract: spec.contract.to_string(),
            inputs: spec.inputs,
            expected_output: run.output,
            mode: spec.mode.to_string(),
        });
    }
    Ok(FixtureSet {
        version: "v1".to_string(),
        family: "convert".to_string(),
        captured_at: now_utc(),
        cases,
    })
}
