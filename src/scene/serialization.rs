use crate::scene::{ObjectId, ScenarioData};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid scenario data: {0}")]
    Invalid(#[from] ValidationError),
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),
    #[error("response has no `{0}` field")]
    MissingField(String),
}

/// Structural problems that make a fetched record unusable. Form-level limits
/// (temperature range, name pattern, ...) are not checked here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("object id {0} is used more than once")]
    DuplicateObjectId(ObjectId),
    #[error("emitter {0} has only one of endPoint/endTime")]
    HalfTrajectory(ObjectId),
    #[error("{field} of object {id} is not a finite number")]
    NonFinite { id: ObjectId, field: &'static str },
    #[error("{field} of object {id} is negative")]
    NegativeTime { id: ObjectId, field: &'static str },
    #[error("scenario {0} is not a finite number")]
    NonFiniteScenarioField(&'static str),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn validate_scenario(scenario: &ScenarioData) -> std::result::Result<(), ValidationError> {
    let scenario_fields = [
        ("temperatureCelsius", scenario.temperature_celsius),
        ("humidityPercent", scenario.humidity_percent),
        ("atmosphericPressurePa", scenario.atmospheric_pressure_pa),
        ("scenarioStartTime", scenario.scenario_start_time),
        ("scenarioEndTime", scenario.scenario_end_time),
    ];
    for (field, value) in scenario_fields {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteScenarioField(field));
        }
    }

    let mut seen: HashSet<ObjectId> = HashSet::new();
    for id in scenario.object_ids() {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateObjectId(id));
        }
    }

    for emitter in &scenario.emitters {
        let id = emitter.id;
        if emitter.end_point.is_some() != emitter.end_time.is_some() {
            return Err(ValidationError::HalfTrajectory(id));
        }
        if !emitter.start_point.is_finite() {
            return Err(ValidationError::NonFinite {
                id,
                field: "startPoint",
            });
        }
        if emitter.end_point.is_some_and(|end| !end.is_finite()) {
            return Err(ValidationError::NonFinite {
                id,
                field: "endPoint",
            });
        }
        check_time(id, "startTime", Some(emitter.start_time))?;
        check_time(id, "endTime", emitter.end_time)?;
    }

    for listener in &scenario.listeners {
        if !listener.position.is_finite() {
            return Err(ValidationError::NonFinite {
                id: listener.id,
                field: "position",
            });
        }
        if !listener.rotation.is_finite() {
            return Err(ValidationError::NonFinite {
                id: listener.id,
                field: "rotation",
            });
        }
    }
    Ok(())
}

fn check_time(
    id: ObjectId,
    field: &'static str,
    value: Option<f32>,
) -> std::result::Result<(), ValidationError> {
    match value {
        Some(value) if !value.is_finite() => Err(ValidationError::NonFinite { id, field }),
        Some(value) if value < 0.0 => Err(ValidationError::NegativeTime { id, field }),
        _ => Ok(()),
    }
}

pub fn parse_scenario(json: &str) -> Result<ScenarioData> {
    let scenario: ScenarioData = serde_json::from_str(json)?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

pub fn parse_scenario_list(json: &str) -> Result<Vec<ScenarioData>> {
    let scenarios: Vec<ScenarioData> = serde_json::from_str(json)?;
    for scenario in &scenarios {
        validate_scenario(scenario)?;
    }
    Ok(scenarios)
}

#[derive(serde::Deserialize)]
struct GraphQlEnvelope {
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(serde::Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

fn graphql_field(body: &str, field: &str) -> Result<serde_json::Value> {
    let envelope: GraphQlEnvelope = serde_json::from_str(body)?;
    if !envelope.errors.is_empty() {
        return Err(SerializationError::GraphQl(
            envelope.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    envelope
        .data
        .and_then(|mut data| data.get_mut(field).map(serde_json::Value::take))
        .filter(|value| !value.is_null())
        .ok_or_else(|| SerializationError::MissingField(field.to_string()))
}

/// Decodes `{"data": {"<field>": {...}}}` into a validated scenario.
pub fn decode_scenario_response(body: &str, field: &str) -> Result<ScenarioData> {
    let value = graphql_field(body, field)?;
    let scenario: ScenarioData = serde_json::from_value(value)?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

pub fn decode_scenario_list_response(body: &str, field: &str) -> Result<Vec<ScenarioData>> {
    let value = graphql_field(body, field)?;
    let scenarios: Vec<ScenarioData> = serde_json::from_value(value)?;
    for scenario in &scenarios {
        validate_scenario(scenario)?;
    }
    Ok(scenarios)
}

pub fn save_scenario_to_file(scenario: &ScenarioData, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(scenario)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_scenario_from_file(path: &Path) -> Result<ScenarioData> {
    let json = std::fs::read_to_string(path)?;
    parse_scenario(&json)
}
