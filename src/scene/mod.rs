pub mod serialization;
pub mod store;

pub type ObjectId = u32;
pub type ScenarioId = u32;

pub const SCENARIO_NAME_PATTERN: &str = "[a-zA-Z0-9 ]*";

pub const ETALON_TEMPERATURE_CELSIUS: f32 = 20.0;
pub const ETALON_ATMOSPHERIC_PRESSURE_PA: f32 = 101_325.0;
pub const DEFAULT_HUMIDITY_PERCENT: f32 = 50.0;

pub const TEMPERATURE_CELSIUS_MIN: f32 = -100.0;
pub const TEMPERATURE_CELSIUS_MAX: f32 = 100.0;
pub const HUMIDITY_PERCENT_MIN: f32 = 0.0;
pub const HUMIDITY_PERCENT_MAX: f32 = 100.0;
pub const ATMOSPHERIC_PRESSURE_MIN: f32 = 0.0;
pub const ATMOSPHERIC_PRESSURE_MAX: f32 = 1_000_000.0;

pub const MIN_EMITTER_HEIGHT_METERS: f32 = 1.0;
pub const MIN_LISTENER_HEIGHT_METERS: f32 = 0.5;
/// Listener rotation lives in `[MIN_LISTENER_ROTATION, MAX_LISTENER_ROTATION)`.
pub const MIN_LISTENER_ROTATION: f32 = 0.0;
pub const MAX_LISTENER_ROTATION: f32 = 360.0;

/// World-space coordinate; `y` is height above ground.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_vec3(self) -> glam::Vec3 {
        glam::Vec3::new(self.x, self.y, self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<glam::Vec3> for Position {
    fn from(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Sound source, optionally moving linearly from `start_point` to `end_point`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitterData {
    pub id: ObjectId,
    pub start_point: Position,
    pub start_time: f32,
    pub end_point: Option<Position>,
    pub end_time: Option<f32>,
    pub audio_file_uri: Option<String>,
}

impl EmitterData {
    pub fn new(id: ObjectId, start_point: Position) -> Self {
        Self {
            id,
            start_point,
            start_time: 0.0,
            end_point: None,
            end_time: None,
            audio_file_uri: None,
        }
    }

    pub fn has_trajectory(&self) -> bool {
        self.end_point.is_some() && self.end_time.is_some()
    }
}

/// Microphone-array receiver.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerData {
    pub id: ObjectId,
    pub position: Position,
    /// Degrees, kept in `[0, 360)` by [`ListenerData::set_rotation`].
    pub rotation: f32,
}

impl ListenerData {
    pub fn new(id: ObjectId, position: Position) -> Self {
        Self {
            id,
            position,
            rotation: 0.0,
        }
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = normalize_degrees(degrees);
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioData {
    pub id: ScenarioId,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub temperature_celsius: f32,
    pub humidity_percent: f32,
    pub atmospheric_pressure_pa: f32,
    pub scenario_start_time: f32,
    pub scenario_end_time: f32,
    pub emitters: Vec<EmitterData>,
    pub listeners: Vec<ListenerData>,
}

impl Default for ScenarioData {
    fn default() -> Self {
        Self {
            id: 0,
            name: "New Scenario".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
            temperature_celsius: ETALON_TEMPERATURE_CELSIUS,
            humidity_percent: DEFAULT_HUMIDITY_PERCENT,
            atmospheric_pressure_pa: ETALON_ATMOSPHERIC_PRESSURE_PA,
            scenario_start_time: 0.0,
            scenario_end_time: 10.0,
            emitters: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

impl ScenarioData {
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.emitters
            .iter()
            .map(|emitter| emitter.id)
            .chain(self.listeners.iter().map(|listener| listener.id))
    }

    /// `max(ids) + 1`, or 0 for a scenario without objects.
    pub fn next_object_id(&self) -> ObjectId {
        self.object_ids()
            .max()
            .map(|max| max.saturating_add(1))
            .unwrap_or(0)
    }

    pub fn emitter(&self, id: ObjectId) -> Option<&EmitterData> {
        self.emitters.iter().find(|emitter| emitter.id == id)
    }

    pub fn listener(&self, id: ObjectId) -> Option<&ListenerData> {
        self.listeners.iter().find(|listener| listener.id == id)
    }

    /// Replaces the emitter with the same id. Returns false when none matched.
    pub fn replace_emitter(&mut self, data: EmitterData) -> bool {
        match self.emitters.iter_mut().find(|emitter| emitter.id == data.id) {
            Some(existing) => {
                *existing = data;
                true
            }
            None => false,
        }
    }

    pub fn replace_listener(&mut self, data: ListenerData) -> bool {
        match self.listeners.iter_mut().find(|listener| listener.id == data.id) {
            Some(existing) => {
                *existing = data;
                true
            }
            None => false,
        }
    }
}

/// Wraps any angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

pub fn is_valid_scenario_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ')
}
