//! egui panels. Each function draws one panel and reports what the user asked
//! for; applying it is up to the designer.

use super::{EditTarget, EmitterEditor, ListenerEditor, ScenarioForm};
use crate::render::{ObjectKey, ObjectKind};
use crate::scene::{
    ATMOSPHERIC_PRESSURE_MAX, ATMOSPHERIC_PRESSURE_MIN, HUMIDITY_PERCENT_MAX,
    HUMIDITY_PERCENT_MIN, MAX_LISTENER_ROTATION, MIN_EMITTER_HEIGHT_METERS,
    MIN_LISTENER_HEIGHT_METERS, MIN_LISTENER_ROTATION, TEMPERATURE_CELSIUS_MAX,
    TEMPERATURE_CELSIUS_MIN,
};
use egui::{Color32, DragValue, Ui};
use glam::Vec3;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementAction {
    AddEmitter,
    AddListener,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAction {
    Delete,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Save,
    Cancel,
    ChooseAudio,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorResponse {
    /// A field changed and the edited object must be refreshed.
    pub changed: bool,
    pub action: Option<EditorAction>,
}

const ERROR_COLOR: Color32 = Color32::from_rgb(200, 60, 60);

fn optional_value(
    ui: &mut Ui,
    label: &str,
    value: &mut Option<f32>,
    range: RangeInclusive<f32>,
    speed: f64,
) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        match value {
            Some(v) => ui.add(DragValue::new(v).range(range).speed(speed)).changed(),
            None => {
                let mut fresh = *range.start();
                if ui.add(DragValue::new(&mut fresh).range(range).speed(speed)).changed() {
                    *value = Some(fresh);
                    true
                } else {
                    false
                }
            }
        }
    })
    .inner
}

fn show_errors<E: std::fmt::Display>(ui: &mut Ui, errors: &[E]) {
    for error in errors {
        ui.colored_label(ERROR_COLOR, error.to_string());
    }
}

/// Name, environment and time window. Returns true when any field changed.
pub fn scenario_form_panel(ui: &mut Ui, form: &mut ScenarioForm) -> bool {
    ui.heading("Scenario");
    let mut changed = ui
        .horizontal(|ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut form.name).changed()
        })
        .inner;
    changed |= optional_value(
        ui,
        "Temperature (°C)",
        &mut form.temperature_celsius,
        TEMPERATURE_CELSIUS_MIN..=TEMPERATURE_CELSIUS_MAX,
        0.1,
    );
    changed |= optional_value(
        ui,
        "Humidity (%)",
        &mut form.humidity_percent,
        HUMIDITY_PERCENT_MIN..=HUMIDITY_PERCENT_MAX,
        0.1,
    );
    changed |= optional_value(
        ui,
        "Pressure (Pa)",
        &mut form.atmospheric_pressure_pa,
        ATMOSPHERIC_PRESSURE_MIN..=ATMOSPHERIC_PRESSURE_MAX,
        10.0,
    );
    changed |= optional_value(
        ui,
        "Start time (s)",
        &mut form.scenario_start_time,
        0.0..=f32::MAX,
        0.1,
    );
    changed |= optional_value(
        ui,
        "End time (s)",
        &mut form.scenario_end_time,
        0.0..=f32::MAX,
        0.1,
    );
    show_errors(ui, &form.errors());
    changed
}

/// Offers object creation while a placement marker is staged.
pub fn placement_panel(ui: &mut Ui, marker: Option<Vec3>) -> Option<PlacementAction> {
    let marker = marker?;
    ui.separator();
    ui.label(format!("New object at ({:.2}, {:.2})", marker.x, marker.z));
    ui.horizontal(|ui| {
        if ui.button("Add emitter").clicked() {
            return Some(PlacementAction::AddEmitter);
        }
        if ui.button("Add listener").clicked() {
            return Some(PlacementAction::AddListener);
        }
        None
    })
    .inner
}

/// Selected object summary with Delete/Edit, both disabled while editing.
pub fn object_info_panel(
    ui: &mut Ui,
    selected: Option<ObjectKey>,
    edit_mode: bool,
) -> Option<ObjectAction> {
    let key = selected?;
    ui.separator();
    let kind = match key.kind {
        ObjectKind::Emitter => "Emitter",
        ObjectKind::Listener => "Listener",
    };
    ui.label(format!("{} #{}", kind, key.id));
    ui.horizontal(|ui| {
        if ui.add_enabled(!edit_mode, egui::Button::new("Delete")).clicked() {
            return Some(ObjectAction::Delete);
        }
        if ui.add_enabled(!edit_mode, egui::Button::new("Edit")).clicked() {
            return Some(ObjectAction::Edit);
        }
        None
    })
    .inner
}

fn save_cancel(ui: &mut Ui, valid: bool) -> Option<EditorAction> {
    ui.horizontal(|ui| {
        if ui.add_enabled(valid, egui::Button::new("Save")).clicked() {
            return Some(EditorAction::Save);
        }
        if ui.button("Cancel").clicked() {
            return Some(EditorAction::Cancel);
        }
        None
    })
    .inner
}

pub fn emitter_editor_panel(ui: &mut Ui, editor: &mut EmitterEditor) -> EditorResponse {
    let mut response = EditorResponse::default();
    ui.heading("Emitter");

    ui.horizontal(|ui| {
        ui.label("Ground click moves");
        let mut target = editor.edit_target();
        ui.selectable_value(&mut target, EditTarget::Start, "Start");
        ui.add_enabled_ui(editor.has_end_point(), |ui| {
            ui.selectable_value(&mut target, EditTarget::End, "End");
        });
        if target != editor.edit_target() {
            editor.set_edit_target(target);
        }
    });

    let heights = MIN_EMITTER_HEIGHT_METERS..=f32::MAX;
    response.changed |= optional_value(
        ui,
        "Start height (m)",
        &mut editor.start_height,
        heights.clone(),
        0.05,
    );
    response.changed |= optional_value(
        ui,
        "Start time (s)",
        &mut editor.start_time,
        0.0..=f32::MAX,
        0.1,
    );

    let mut has_end = editor.has_end_point();
    if ui.checkbox(&mut has_end, "Has end point").changed() {
        editor.toggle_end_point(has_end);
        response.changed = true;
    }
    if editor.has_end_point() {
        response.changed |= optional_value(
            ui,
            "End height (m)",
            &mut editor.end_height,
            heights,
            0.05,
        );
        response.changed |=
            optional_value(ui, "End time (s)", &mut editor.end_time, 0.0..=f32::MAX, 0.1);
    }

    ui.horizontal(|ui| {
        let audio = editor.audio_file_uri.as_deref().unwrap_or("no audio");
        ui.label(audio);
        if ui.button("Choose audio…").clicked() {
            response.action = Some(EditorAction::ChooseAudio);
        }
    });

    let errors = editor.errors();
    show_errors(ui, &errors);
    if let Some(action) = save_cancel(ui, errors.is_empty()) {
        response.action = Some(action);
    }
    response
}

pub fn listener_editor_panel(ui: &mut Ui, editor: &mut ListenerEditor) -> EditorResponse {
    let mut response = EditorResponse::default();
    ui.heading("Listener");

    response.changed |= optional_value(
        ui,
        "Height (m)",
        &mut editor.height,
        MIN_LISTENER_HEIGHT_METERS..=f32::MAX,
        0.05,
    );
    let mut rotation = editor.rotation();
    if optional_value(
        ui,
        "Rotation (°)",
        &mut rotation,
        MIN_LISTENER_ROTATION..=MAX_LISTENER_ROTATION,
        1.0,
    ) {
        editor.set_rotation(rotation);
        response.changed = true;
    }

    let errors = editor.errors();
    show_errors(ui, &errors);
    response.action = save_cancel(ui, errors.is_empty());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{EmitterData, ListenerData, Position};

    fn run_headless(mut draw: impl FnMut(&mut Ui)) {
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| draw(ui));
        });
    }

    #[test]
    fn panels_without_input_request_nothing() {
        let mut form = ScenarioForm::default();
        let mut emitter = EmitterEditor::from_data(&EmitterData::new(
            1,
            Position::new(0.0, 1.0, 0.0),
        ));
        let mut listener =
            ListenerEditor::from_data(&ListenerData::new(2, Position::new(1.0, 1.0, 1.0)));
        run_headless(|ui| {
            assert!(!scenario_form_panel(ui, &mut form));
            assert_eq!(
                placement_panel(ui, Some(Vec3::new(1.0, 0.0, 2.0))),
                None
            );
            assert_eq!(
                object_info_panel(ui, Some(ObjectKey::emitter(1)), false),
                None
            );
            assert_eq!(emitter_editor_panel(ui, &mut emitter), EditorResponse::default());
            assert_eq!(
                listener_editor_panel(ui, &mut listener),
                EditorResponse::default()
            );
        });
        assert_eq!(form, ScenarioForm::default());
    }

    #[test]
    fn hidden_panels_return_early() {
        run_headless(|ui| {
            assert_eq!(placement_panel(ui, None), None);
            assert_eq!(object_info_panel(ui, None, false), None);
        });
    }
}
