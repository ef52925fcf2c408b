//! Fixture execution against the core conversion kernels.
//!
//! Fixture inputs describe buffers as JSON integer arrays. A JSON `null`
//! buffer stands for a NULL pointer.
//!
//! The native entrypoints only know a buffer's extent when it is a sealed
//! buffer returned by `strbridge_to_c_str`. Inputs mark such buffers with
//! `"origin": "library"`; anything else is a caller buffer. Reading past the
//! array is reported as `UB` in strict mode, and in hardened mode too unless
//! the buffer is library-owned, where the executor applies the same healing
//! decision the ABI layer makes.

use serde_json::Value;
use strbridge_core::{narrow_lossy, widen_with_length};
use strbridge_membrane::{HealingAction, SafetyLevel, global_healing_policy};

use crate::error::HarnessError;

/// Output of one fixture execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Canonical rendering of the result.
    pub output: String,
    /// Healing applied (always `None` in strict mode).
    pub healing: HealingAction,
}

impl Execution {
    fn plain(output: String) -> Self {
        Self {
            output,
            healing: HealingAction::None,
        }
    }

    fn healed(output: String, healing: HealingAction) -> Self {
        global_healing_policy().record(&healing);
        Self { output, healing }
    }
}

/// Marker output for inputs whose native behavior is undefined.
pub const UNDEFINED: &str = "UB";

/// Marker output for a NULL result.
pub const NULL: &str = "NULL";

/// Run one fixture case under `mode`.
pub fn execute_fixture_case(
    function: &str,
    inputs: &Value,
    mode: &str,
) -> Result<Execution, HarnessError> {
    let mode = SafetyLevel::from_str_loose(mode);
    match function {
        "to_c_str" => exec_to_c_str(inputs, mode),
        "from_c_str" => exec_from_c_str(inputs, mode),
        "from_c_str_with_length" => exec_from_c_str_with_length(inputs, mode),
        other => Err(HarnessError::UnsupportedFunction(other.to_string())),
    }
}

/// Canonical rendering of a byte or code unit sequence.
#[must_use]
pub fn render<T: std::fmt::Debug>(values: &[T]) -> String {
    format!("{values:?}")
}

fn exec_to_c_str(inputs: &Value, mode: SafetyLevel) -> Result<Execution, HarnessError> {
    match parse_array::<u16>(inputs, "units")? {
        Some(units) => Ok(Execution::plain(render(&narrow_lossy(&units)))),
        None if mode.heals_enabled() => Ok(Execution::healed(
            render(&narrow_lossy(&[])),
            HealingAction::ReturnSafeDefault,
        )),
        None => Ok(Execution::plain(NULL.to_string())),
    }
}

fn exec_from_c_str(inputs: &Value, mode: SafetyLevel) -> Result<Execution, HarnessError> {
    let Some(bytes) = parse_array::<u8>(inputs, "bytes")? else {
        return Ok(null_input(mode));
    };
    let bounded = library_owned(inputs)? && mode.heals_enabled();

    match bytes.iter().position(|&b| b == 0) {
        Some(len) => Ok(Execution::plain(render(
            widen_with_length(&bytes, len).as_units(),
        ))),
        None if bounded => {
            let action = global_healing_policy().heal_unterminated_scan(bytes.len());
            Ok(Execution::healed(
                render(widen_with_length(&bytes, bytes.len()).as_units()),
                action,
            ))
        }
        None => Ok(Execution::plain(UNDEFINED.to_string())),
    }
}

fn exec_from_c_str_with_length(
    inputs: &Value,
    mode: SafetyLevel,
) -> Result<Execution, HarnessError> {
    let len = inputs
        .get("len")
        .and_then(Value::as_u64)
        .ok_or_else(|| HarnessError::BadInput {
            field: "len",
            message: "expected a non-negative integer".to_string(),
        })?;
    let len = u32::try_from(len).map_err(|_| HarnessError::BadInput {
        field: "len",
        message: format!("{len} does not fit in an unsigned int"),
    })? as usize;

    let bytes = match parse_array::<u8>(inputs, "bytes")? {
        Some(bytes) => bytes,
        None if len == 0 => Vec::new(),
        None => return Ok(null_input(mode)),
    };
    let bounded = library_owned(inputs)? && mode.heals_enabled();

    if len <= bytes.len() {
        return Ok(Execution::plain(render(
            widen_with_length(&bytes, len).as_units(),
        )));
    }
    if !bounded {
        return Ok(Execution::plain(UNDEFINED.to_string()));
    }
    let action = global_healing_policy().heal_explicit_length(len, Some(bytes.len()));
    Ok(Execution::healed(
        render(widen_with_length(&bytes, bytes.len()).as_units()),
        action,
    ))
}

fn null_input(mode: SafetyLevel) -> Execution {
    if mode.heals_enabled() {
        Execution::healed(render::<u16>(&[]), HealingAction::ReturnSafeDefault)
    } else {
        Execution::plain(NULL.to_string())
    }
}

/// Whether the input buffer is one the library produced and can bound.
fn library_owned(inputs: &Value) -> Result<bool, HarnessError> {
    match inputs.get("origin") {
        None | Some(Value::Null) => Ok(false),
        Some(origin) => match origin.as_str() {
            Some("library") => Ok(true),
            Some("caller") => Ok(false),
            _ => Err(HarnessError::BadInput {
                field: "origin",
                message: format!("{origin} is neither \"library\" nor \"caller\""),
            }),
        },
    }
}

/// Read `inputs[field]` as an integer array; `null` means a NULL pointer.
fn parse_array<T: TryFrom<u64>>(
    inputs: &Value,
    field: &'static str,
) -> Result<Option<Vec<T>>, HarnessError> {
    let value = inputs.get(field).ok_or_else(|| HarnessError::BadInput {
        field,
        message: "missing".to_string(),
    })?;
    if value.is_null() {
        return Ok(None);
    }
    let items = value.as_array().ok_or_else(|| HarnessError::BadInput {
        field,
        message: "expected an array or null".to_string(),
    })?;
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|n| T::try_from(n).ok())
                .ok_or_else(|| HarnessError::BadInput {
                    field,
                    message: format!("element {item} out of range"),
                })
        })
        .collect::<Result<Vec<T>, _>>()
        .map(Some)
}
