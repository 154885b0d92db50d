//! Form state behind the designer panels.
//!
//! Editors never touch the scene; the designer copies their values into the
//! edited clone with `sync_to` and refreshes visuals afterwards.

pub mod panels;

use crate::scene::{
    is_valid_scenario_name, EmitterData, ListenerData, ScenarioData, ATMOSPHERIC_PRESSURE_MAX,
    ATMOSPHERIC_PRESSURE_MIN, HUMIDITY_PERCENT_MAX, HUMIDITY_PERCENT_MIN,
    MAX_LISTENER_ROTATION, MIN_EMITTER_HEIGHT_METERS, MIN_LISTENER_HEIGHT_METERS,
    MIN_LISTENER_ROTATION, TEMPERATURE_CELSIUS_MAX, TEMPERATURE_CELSIUS_MIN,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("name is required")]
    NameRequired,
    #[error("name may only contain letters, digits and spaces")]
    NameInvalid,
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("scenario start time must not be after its end time")]
    StartAfterEnd,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditorError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: &'static str, min: f32 },
    #[error("{field} must be below {max}")]
    NotBelow { field: &'static str, max: f32 },
}

fn check_range(
    errors: &mut Vec<FormError>,
    field: &'static str,
    value: Option<f32>,
    min: f32,
    max: f32,
) {
    match value {
        None => errors.push(FormError::Required(field)),
        Some(v) if !(min..=max).contains(&v) => {
            errors.push(FormError::OutOfRange { field, min, max })
        }
        _ => {}
    }
}

fn check_minimum(
    errors: &mut Vec<EditorError>,
    field: &'static str,
    value: Option<f32>,
    min: f32,
) {
    match value {
        None => errors.push(EditorError::Required(field)),
        Some(v) if v < min || v.is_nan() => errors.push(EditorError::BelowMinimum { field, min }),
        _ => {}
    }
}

/// Top-level scenario fields. Values are optional while the user edits them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioForm {
    pub name: String,
    pub temperature_celsius: Option<f32>,
    pub humidity_percent: Option<f32>,
    pub atmospheric_pressure_pa: Option<f32>,
    pub scenario_start_time: Option<f32>,
    pub scenario_end_time: Option<f32>,
}

impl Default for ScenarioForm {
    fn default() -> Self {
        Self::from_scenario(&ScenarioData::default())
    }
}

impl ScenarioForm {
    pub fn from_scenario(scenario: &ScenarioData) -> Self {
        Self {
            name: scenario.name.clone(),
            temperature_celsius: Some(scenario.temperature_celsius),
            humidity_percent: Some(scenario.humidity_percent),
            atmospheric_pressure_pa: Some(scenario.atmospheric_pressure_pa),
            scenario_start_time: Some(scenario.scenario_start_time),
            scenario_end_time: Some(scenario.scenario_end_time),
        }
    }

    pub fn errors(&self) -> Vec<FormError> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push(FormError::NameRequired);
        } else if !is_valid_scenario_name(&self.name) {
            errors.push(FormError::NameInvalid);
        }
        check_range(
            &mut errors,
            "temperature",
            self.temperature_celsius,
            TEMPERATURE_CELSIUS_MIN,
            TEMPERATURE_CELSIUS_MAX,
        );
        check_range(
            &mut errors,
            "humidity",
            self.humidity_percent,
            HUMIDITY_PERCENT_MIN,
            HUMIDITY_PERCENT_MAX,
        );
        check_range(
            &mut errors,
            "atmospheric pressure",
            self.atmospheric_pressure_pa,
            ATMOSPHERIC_PRESSURE_MIN,
            ATMOSPHERIC_PRESSURE_MAX,
        );
        for (field, value) in [
            ("start time", self.scenario_start_time),
            ("end time", self.scenario_end_time),
        ] {
            match value {
                None => errors.push(FormError::Required(field)),
                Some(v) if v < 0.0 => errors.push(FormError::Negative(field)),
                _ => {}
            }
        }
        if let (Some(start), Some(end)) = (self.scenario_start_time, self.scenario_end_time) {
            if start > end {
                errors.push(FormError::StartAfterEnd);
            }
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    /// Writes the form into `scenario`; missing numbers become 0.
    pub fn merge_into(&self, scenario: &mut ScenarioData) {
        scenario.name = self.name.clone();
        scenario.temperature_celsius = self.temperature_celsius.unwrap_or(0.0);
        scenario.humidity_percent = self.humidity_percent.unwrap_or(0.0);
        scenario.atmospheric_pressure_pa = self.atmospheric_pressure_pa.unwrap_or(0.0);
        scenario.scenario_start_time = self.scenario_start_time.unwrap_or(0.0);
        scenario.scenario_end_time = self.scenario_end_time.unwrap_or(0.0);
    }
}

/// Which emitter endpoint a ground click moves while editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditTarget {
    #[default]
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmitterEditor {
    pub start_height: Option<f32>,
    pub start_time: Option<f32>,
    pub end_height: Option<f32>,
    pub end_time: Option<f32>,
    pub audio_file_uri: Option<String>,
    has_end_point: bool,
    edit_target: EditTarget,
}

impl EmitterEditor {
    pub fn from_data(data: &EmitterData) -> Self {
        Self {
            start_height: Some(data.start_point.y),
            start_time: Some(data.start_time),
            end_height: data.end_point.map(|end| end.y),
            end_time: data.end_time,
            audio_file_uri: data.audio_file_uri.clone(),
            has_end_point: data.end_point.is_some(),
            edit_target: EditTarget::Start,
        }
    }

    pub fn has_end_point(&self) -> bool {
        self.has_end_point
    }

    pub fn edit_target(&self) -> EditTarget {
        self.edit_target
    }

    /// The end target is only selectable while an end point exists.
    pub fn set_edit_target(&mut self, target: EditTarget) -> bool {
        if target == EditTarget::End && !self.has_end_point {
            log::debug!("End target requested without an end point");
            return false;
        }
        self.edit_target = target;
        true
    }

    pub fn toggle_end_point(&mut self, enable: bool) {
        self.has_end_point = enable;
        if enable {
            if self.end_height.is_none() {
                self.end_height = self.start_height;
            }
            self.edit_target = EditTarget::End;
        } else {
            self.edit_target = EditTarget::Start;
            self.end_height = None;
            self.end_time = None;
        }
    }

    pub fn errors(&self) -> Vec<EditorError> {
        let mut errors = Vec::new();
        check_minimum(
            &mut errors,
            "start height",
            self.start_height,
            MIN_EMITTER_HEIGHT_METERS,
        );
        check_minimum(&mut errors, "start time", self.start_time, 0.0);
        if self.has_end_point {
            check_minimum(
                &mut errors,
                "end height",
                self.end_height,
                MIN_EMITTER_HEIGHT_METERS,
            );
            check_minimum(&mut errors, "end time", self.end_time, 0.0);
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    /// Copies heights, times and audio into `data`. Horizontal coordinates are
    /// owned by ground clicks and left alone.
    pub fn sync_to(&self, data: &mut EmitterData) {
        let start_height = self.start_height.unwrap_or(MIN_EMITTER_HEIGHT_METERS);
        data.start_point.y = start_height;
        data.start_time = self.start_time.unwrap_or(0.0);
        data.audio_file_uri = self.audio_file_uri.clone();

        if self.has_end_point {
            let end = data.end_point.get_or_insert(data.start_point);
            end.y = self.end_height.unwrap_or(start_height);
            data.end_time = self.end_time;
        } else {
            data.end_point = None;
            data.end_time = None;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListenerEditor {
    pub height: Option<f32>,
    rotation: Option<f32>,
}

impl ListenerEditor {
    pub fn from_data(data: &ListenerData) -> Self {
        Self {
            height: Some(data.position.y),
            rotation: Some(data.rotation),
        }
    }

    pub fn rotation(&self) -> Option<f32> {
        self.rotation
    }

    /// Stores the rotation wrapped into a full turn.
    pub fn set_rotation(&mut self, degrees: Option<f32>) {
        self.rotation = degrees.map(crate::scene::normalize_degrees);
    }

    pub fn errors(&self) -> Vec<EditorError> {
        let mut errors = Vec::new();
        check_minimum(&mut errors, "height", self.height, MIN_LISTENER_HEIGHT_METERS);
        check_minimum(&mut errors, "rotation", self.rotation, MIN_LISTENER_ROTATION);
        if let Some(rotation) = self.rotation {
            if rotation >= MAX_LISTENER_ROTATION {
                errors.push(EditorError::NotBelow {
                    field: "rotation",
                    max: MAX_LISTENER_ROTATION,
                });
            }
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    pub fn sync_to(&self, data: &mut ListenerData) {
        data.position.y = self.height.unwrap_or(MIN_LISTENER_HEIGHT_METERS);
        data.set_rotation(self.rotation.unwrap_or(MIN_LISTENER_ROTATION));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Position;

    #[test]
    fn default_form_is_valid() {
        let form = ScenarioForm::default();
        assert!(form.is_valid(), "{:?}", form.errors());
        assert_eq!(form.name, "New Scenario");
    }

    #[test]
    fn form_reports_every_violation() {
        let form = ScenarioForm {
            name: "bad-name".to_string(),
            temperature_celsius: Some(150.0),
            humidity_percent: None,
            atmospheric_pressure_pa: Some(101_325.0),
            scenario_start_time: Some(5.0),
            scenario_end_time: Some(2.0),
        };
        let errors = form.errors();
        assert!(errors.contains(&FormError::NameInvalid));
        assert!(errors.contains(&FormError::Required("humidity")));
        assert!(errors.contains(&FormError::StartAfterEnd));
        assert!(matches!(
            errors.iter().find(|e| matches!(e, FormError::OutOfRange { .. })),
            Some(FormError::OutOfRange {
                field: "temperature",
                ..
            })
        ));
        assert!(!form.is_valid());
    }

    #[test]
    fn merge_turns_missing_numbers_into_zero() {
        let form = ScenarioForm {
            name: String::new(),
            temperature_celsius: None,
            humidity_percent: Some(10.0),
            atmospheric_pressure_pa: None,
            scenario_start_time: None,
            scenario_end_time: Some(3.0),
        };
        let mut scenario = ScenarioData::default();
        form.merge_into(&mut scenario);
        assert_eq!(scenario.name, "");
        assert_eq!(scenario.temperature_celsius, 0.0);
        assert_eq!(scenario.humidity_percent, 10.0);
        assert_eq!(scenario.atmospheric_pressure_pa, 0.0);
        assert_eq!(scenario.scenario_end_time, 3.0);
    }

    #[test]
    fn end_point_toggle_reseeds_from_start() {
        let mut data = EmitterData::new(1, Position::new(0.0, 2.5, 0.0));
        let mut editor = EmitterEditor::from_data(&data);
        assert_eq!(editor.end_height, None);

        editor.toggle_end_point(true);
        assert_eq!(editor.end_height, Some(2.5));
        assert_eq!(editor.edit_target(), EditTarget::End);
        editor.end_time = Some(4.0);
        editor.sync_to(&mut data);
        assert_eq!(data.end_point, Some(Position::new(0.0, 2.5, 0.0)));
        assert_eq!(data.end_time, Some(4.0));

        editor.toggle_end_point(false);
        assert_eq!(editor.end_height, None);
        assert_eq!(editor.end_time, None);
        assert_eq!(editor.edit_target(), EditTarget::Start);
        editor.sync_to(&mut data);
        assert_eq!(data.end_point, None);
        assert_eq!(data.end_time, None);

        editor.start_height = Some(3.0);
        editor.toggle_end_point(true);
        assert_eq!(editor.end_height, Some(3.0));
    }

    #[test]
    fn end_target_needs_end_point() {
        let data = EmitterData::new(1, Position::new(0.0, 2.0, 0.0));
        let mut editor = EmitterEditor::from_data(&data);
        assert!(!editor.set_edit_target(EditTarget::End));
        assert_eq!(editor.edit_target(), EditTarget::Start);
        editor.toggle_end_point(true);
        assert!(editor.set_edit_target(EditTarget::Start));
        assert!(editor.set_edit_target(EditTarget::End));
    }

    #[test]
    fn emitter_editor_validation() {
        let data = EmitterData::new(1, Position::new(0.0, 2.0, 0.0));
        let mut editor = EmitterEditor::from_data(&data);
        assert!(editor.is_valid());
        editor.start_height = Some(0.5);
        assert!(editor
            .errors()
            .contains(&EditorError::BelowMinimum {
                field: "start height",
                min: MIN_EMITTER_HEIGHT_METERS
            }));
        editor.start_height = Some(2.0);
        editor.toggle_end_point(true);
        assert_eq!(editor.errors(), vec![EditorError::Required("end time")]);
        editor.end_time = Some(-1.0);
        assert!(!editor.is_valid());
        editor.end_time = Some(6.0);
        assert!(editor.is_valid());
    }

    #[test]
    fn listener_editor_normalizes_rotation() {
        let mut data = ListenerData::new(2, Position::new(1.0, 1.0, 1.0));
        let mut editor = ListenerEditor::from_data(&data);
        editor.set_rotation(Some(-30.0));
        assert_eq!(editor.rotation(), Some(330.0));
        editor.set_rotation(Some(725.0));
        assert_eq!(editor.rotation(), Some(5.0));
        editor.height = Some(2.2);
        editor.sync_to(&mut data);
        assert_eq!(data.rotation, 5.0);
        assert_eq!(data.position.y, 2.2);
        assert_eq!(data.position.x, 1.0);
    }

    #[test]
    fn listener_editor_validation() {
        let data = ListenerData::new(2, Position::new(1.0, 1.0, 1.0));
        let mut editor = ListenerEditor::from_data(&data);
        assert!(editor.is_valid());
        editor.height = Some(0.1);
        assert!(!editor.is_valid());
        editor.height = None;
        assert!(editor.errors().contains(&EditorError::Required("height")));
        editor.height = Some(1.0);
        editor.set_rotation(None);
        assert_eq!(editor.errors(), vec![EditorError::Required("rotation")]);
    }
}
