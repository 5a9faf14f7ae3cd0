//! State codec: validation, decoding and encoding of persisted state.
//!
//! Untrusted documents go through validate-then-construct: parse into a
//! [`serde_json::Value`], run [`validate`] to collect every structural
//! problem at once, and only then build the typed [`GameState`]. Validation
//! itself never fails; callers such as [`decode`] turn an invalid
//! [`ValidationReport`] into [`CodecError::Validation`].

use serde_json::{Map, Value};
use timeloop_types::{GameState, LoopState};

/// Subsystem blocks every game-state document must carry.
const SUBSYSTEM_BLOCKS: [&str; 6] = [
    "loopManager",
    "npcs",
    "doors",
    "photos",
    "dayNightCycle",
    "hourlyCycle",
];

/// Errors surfaced by save/load/import operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The document does not have the expected shape.
    #[error("invalid state: {}", .messages.join("; "))]
    Validation {
        /// One message per violated rule.
        messages: Vec<String>,
    },

    /// The input is not JSON at all.
    #[error("failed to parse state JSON: {source}")]
    Parse {
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The state could not be encoded.
    #[error("failed to encode state: {source}")]
    Serialization {
        /// The underlying encoding error.
        #[from]
        source: serde_json::Error,
    },

    /// A numeric field holds NaN or infinity, which JSON cannot carry.
    #[error("cannot encode non-finite value in {field}")]
    NonFinite {
        /// Dotted path of the offending field.
        field: String,
    },
}

/// Outcome of validating a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Violated rules; empty means the document is valid.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Whether no rule was violated.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Convert into a `Result`, failing with [`CodecError::Validation`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Validation`] carrying every message if the
    /// report is not valid.
    pub fn into_result(self) -> Result<(), CodecError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CodecError::Validation {
                messages: self.errors,
            })
        }
    }

    fn push(&mut self, message: String) {
        self.errors.push(message);
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Check the structure of a full game-state document.
pub fn validate(value: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(root) = value.as_object() else {
        report.push("state must be an object".to_owned());
        return report;
    };

    match root.get("version") {
        None => report.push("missing required field: version".to_owned()),
        Some(v) if !v.is_string() => report.push("version must be a string".to_owned()),
        Some(_) => {}
    }
    match root.get("timestamp") {
        None => report.push("missing required field: timestamp".to_owned()),
        Some(v) if !v.is_number() => report.push("timestamp must be a number".to_owned()),
        Some(_) => {}
    }

    for block in SUBSYSTEM_BLOCKS {
        match root.get(block) {
            None => report.push(format!("missing required field: {block}")),
            Some(v) if !v.is_object() => report.push(format!("{block} must be an object")),
            Some(_) => {}
        }
    }

    if let Some(loop_manager) = root.get("loopManager").and_then(Value::as_object) {
        check_loop_manager(loop_manager, "loopManager", &mut report);
    }
    if let Some(npcs) = root.get("npcs").and_then(Value::as_object) {
        require_array(npcs, "npcs", "npcs", &mut report);
    }
    if let Some(doors) = root.get("doors").and_then(Value::as_object) {
        require_array(doors, "doors", "doors", &mut report);
    }
    if let Some(photos) = root.get("photos").and_then(Value::as_object) {
        require_array(photos, "photos", "photos", &mut report);
    }
    if let Some(cycle) = root.get("dayNightCycle").and_then(Value::as_object) {
        require_number(cycle, "dayNightCycle", "currentTime", &mut report);
    }
    if let Some(cycle) = root.get("hourlyCycle").and_then(Value::as_object) {
        require_number(cycle, "hourlyCycle", "currentHour", &mut report);
    }

    report
}

/// Check the structure of a bare loop-state object.
pub fn validate_loop_state(value: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    match value.as_object() {
        Some(object) => check_loop_manager(object, "loopManager", &mut report),
        None => report.push("loopManager must be an object".to_owned()),
    }
    report
}

fn check_loop_manager(object: &Map<String, Value>, path: &str, report: &mut ValidationReport) {
    require_number(object, path, "elapsedSeconds", report);
    require_number(object, path, "loopDurationSeconds", report);
    require_number(object, path, "timeScale", report);
    match object.get("isRunning") {
        None => report.push(format!("missing required field: {path}.isRunning")),
        Some(v) if !v.is_boolean() => report.push(format!("{path}.isRunning must be a boolean")),
        Some(_) => {}
    }

    let Some(events) = require_array(object, path, "events", report) else {
        return;
    };
    for (index, event) in events.iter().enumerate() {
        let at = format!("{path}.events[{index}]");
        let Some(event) = event.as_object() else {
            report.push(format!("{at} must be an object"));
            continue;
        };
        match event.get("id") {
            Some(v) if v.is_string() => {}
            _ => report.push(format!("{at}.id must be a string")),
        }
        require_number(event, &at, "triggerTime", report);
        match event.get("isRepeating") {
            Some(v) if v.is_boolean() => {}
            _ => report.push(format!("{at}.isRepeating must be a boolean")),
        }
    }
}

fn require_number(
    object: &Map<String, Value>,
    path: &str,
    field: &str,
    report: &mut ValidationReport,
) {
    match object.get(field) {
        None => report.push(format!("missing required field: {path}.{field}")),
        Some(v) if !v.is_number() => report.push(format!("{path}.{field} must be a number")),
        Some(_) => {}
    }
}

fn require_array<'a>(
    object: &'a Map<String, Value>,
    path: &str,
    field: &str,
    report: &mut ValidationReport,
) -> Option<&'a Vec<Value>> {
    match object.get(field) {
        None => {
            report.push(format!("missing required field: {path}.{field}"));
            None
        }
        Some(Value::Array(items)) => Some(items),
        Some(_) => {
            report.push(format!("{path}.{field} must be an array"));
            None
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Validate a document, then construct the typed [`GameState`].
///
/// # Errors
///
/// Returns [`CodecError::Validation`] if the structure is wrong, including
/// nested records the structural pass does not inspect field by field.
pub fn decode(value: Value) -> Result<GameState, CodecError> {
    validate(&value).into_result()?;
    serde_json::from_value(value).map_err(|source| CodecError::Validation {
        messages: vec![source.to_string()],
    })
}

/// Parse JSON text and [`decode`] it.
///
/// # Errors
///
/// Returns [`CodecError::Parse`] for malformed JSON, otherwise as
/// [`decode`].
pub fn decode_str(json: &str) -> Result<GameState, CodecError> {
    let value: Value = serde_json::from_str(json).map_err(|source| CodecError::Parse { source })?;
    decode(value)
}

/// Validate and construct a bare [`LoopState`].
///
/// # Errors
///
/// Returns [`CodecError::Validation`] if the structure is wrong.
pub fn decode_loop_state(value: Value) -> Result<LoopState, CodecError> {
    validate_loop_state(&value).into_result()?;
    serde_json::from_value(value).map_err(|source| CodecError::Validation {
        messages: vec![source.to_string()],
    })
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a game-state document as JSON text.
///
/// # Errors
///
/// Returns [`CodecError::NonFinite`] if any number in the document is NaN
/// or infinite, or [`CodecError::Serialization`] if encoding fails.
pub fn encode(state: &GameState) -> Result<String, CodecError> {
    check_finite_loop(&state.loop_manager, "loopManager")?;
    for (index, npc) in state.npcs.npcs.iter().enumerate() {
        let path = format!("npcs.npcs[{index}]");
        check_finite(npc.position.x, &format!("{path}.position.x"))?;
        check_finite(npc.position.y, &format!("{path}.position.y"))?;
        check_finite(npc.position.z, &format!("{path}.position.z"))?;
        check_finite(npc.rotation, &format!("{path}.rotation"))?;
    }
    for (index, photo) in state.photos.photos.iter().enumerate() {
        check_finite(
            photo.taken_at_seconds,
            &format!("photos.photos[{index}].takenAtSeconds"),
        )?;
    }
    let cycle = &state.day_night_cycle;
    check_finite(cycle.current_time, "dayNightCycle.currentTime")?;
    check_finite(cycle.cycle_duration_seconds, "dayNightCycle.cycleDurationSeconds")?;
    check_finite(
        state.hourly_cycle.hour_duration_seconds,
        "hourlyCycle.hourDurationSeconds",
    )?;
    Ok(serde_json::to_string(state)?)
}

/// Encode a bare loop state as a JSON value.
///
/// # Errors
///
/// Same as [`encode`].
pub fn encode_loop_state(state: &LoopState) -> Result<Value, CodecError> {
    check_finite_loop(state, "loopManager")?;
    Ok(serde_json::to_value(state)?)
}

fn check_finite_loop(state: &LoopState, path: &str) -> Result<(), CodecError> {
    check_finite(state.elapsed_seconds, &format!("{path}.elapsedSeconds"))?;
    check_finite(state.loop_duration_seconds, &format!("{path}.loopDurationSeconds"))?;
    check_finite(state.time_scale, &format!("{path}.timeScale"))?;
    for (index, event) in state.events.iter().enumerate() {
        check_finite(event.trigger_time, &format!("{path}.events[{index}].triggerTime"))?;
        if let Some(interval) = event.repeat_interval {
            check_finite(interval, &format!("{path}.events[{index}].repeatInterval"))?;
        }
        if let Some(origin) = event.original_trigger_time {
            check_finite(origin, &format!("{path}.events[{index}].originalTriggerTime"))?;
        }
    }
    Ok(())
}

fn check_finite(value: f64, field: &str) -> Result<(), CodecError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CodecError::NonFinite {
            field: field.to_owned(),
        })
    }
}
