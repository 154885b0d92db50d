mod config;
mod egui_host;
mod gpu;
mod host;
pub mod input;
pub mod pages;
pub mod timing;

pub use config::{ConfigError, DesignerConfig, CONFIG_ENV_VAR};
pub use gpu::GpuError;
pub use host::{run, HostError, HostOptions};

use crate::render::highlight::{
    clickable_parts, hide_listener_cones, highlight, restore_default_colors, show_listener_cones,
};
use crate::render::objects::{
    create_emitter_display, create_listener_display, create_placement_marker, emitter_heading,
    mark_as_edited, update_listener_geometry,
};
use crate::render::{
    pick, DesignedEmitter, DesignedObject, NodeId, ObjectKey, ObjectKind, SceneGraph, SceneView,
    TrajectoryLines,
};
use crate::scene::{
    EmitterData, ListenerData, ObjectId, Position, ScenarioData, MIN_EMITTER_HEIGHT_METERS,
    MIN_LISTENER_HEIGHT_METERS,
};
use crate::ui::panels::{self, EditorAction, ObjectAction, PlacementAction};
use crate::ui::{EditTarget, EmitterEditor, ListenerEditor, ScenarioForm};
use glam::{Quat, Vec2, Vec3};
use input::{InputState, PointerRelease, PointerTracker};
use std::collections::BTreeMap;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Work the designer cannot do itself and hands back to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequest {
    ChooseAudio,
}

#[derive(Debug, Clone, Copy)]
struct StagedMarker {
    node: NodeId,
    position: Vec3,
}

#[derive(Debug, Clone)]
enum ObjectEditor {
    Emitter(EmitterEditor),
    Listener(ListenerEditor),
}

impl ObjectEditor {
    fn is_valid(&self) -> bool {
        match self {
            ObjectEditor::Emitter(editor) => editor.is_valid(),
            ObjectEditor::Listener(editor) => editor.is_valid(),
        }
    }
}

/// A detached working copy of one object. The committed record in the
/// scenario stays untouched until save.
struct EditSession {
    clone: DesignedObject,
    editor: ObjectEditor,
}

/// Scene editing orchestrator: owns the scene graph, the object index, the
/// placement marker and the edit-mode working copy.
pub struct Designer {
    config: DesignerConfig,
    view: SceneView,
    input: InputState,
    pointer: PointerTracker,
    scenario: ScenarioData,
    loaded: bool,
    form: ScenarioForm,
    objects: BTreeMap<ObjectId, DesignedObject>,
    trajectories: TrajectoryLines,
    selected: Option<ObjectId>,
    edit: Option<EditSession>,
    marker: Option<StagedMarker>,
    next_id: ObjectId,
}

impl Designer {
    pub fn new(config: DesignerConfig, width: u32, height: u32) -> Self {
        let view = SceneView::new(config.initial_camera(), width, height);
        let pointer = PointerTracker::new(config.drag_threshold_px);
        let scenario = ScenarioData::default();
        Self {
            config,
            view,
            input: InputState::default(),
            pointer,
            form: ScenarioForm::from_scenario(&scenario),
            scenario,
            loaded: false,
            objects: BTreeMap::new(),
            trajectories: TrajectoryLines::new(),
            selected: None,
            edit: None,
            marker: None,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &DesignerConfig {
        &self.config
    }

    pub fn view(&self) -> &SceneView {
        &self.view
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.view.graph
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.view.resize(width, height);
    }

    // --- scenario in/out ---------------------------------------------------

    /// Replaces the whole scene with `scenario`. `None` leaves everything as is.
    pub fn set_scenario(&mut self, scenario: Option<ScenarioData>) {
        let Some(scenario) = scenario else {
            log::debug!("Ignoring empty scenario");
            return;
        };
        self.clear_scene();
        self.next_id = scenario.next_object_id();
        self.form = ScenarioForm::from_scenario(&scenario);
        for emitter in &scenario.emitters {
            self.insert_emitter(emitter.clone());
        }
        for listener in &scenario.listeners {
            self.insert_listener(listener.clone());
        }
        log::info!(
            "Loaded scenario {} '{}' ({} emitters, {} listeners)",
            scenario.id,
            scenario.name,
            scenario.emitters.len(),
            scenario.listeners.len()
        );
        self.scenario = scenario;
        self.loaded = true;
    }

    /// True once a scenario has been installed with [`Designer::set_scenario`].
    pub fn has_loaded_scenario(&self) -> bool {
        self.loaded
    }

    /// Snapshot for persistence, with the top-level form merged in.
    pub fn get_scenario(&mut self) -> ScenarioData {
        self.form.merge_into(&mut self.scenario);
        self.scenario.clone()
    }

    pub fn is_valid(&self) -> bool {
        self.form.is_valid()
    }

    pub fn form(&self) -> &ScenarioForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ScenarioForm {
        &mut self.form
    }

    // --- queries -----------------------------------------------------------

    pub fn object(&self, id: ObjectId) -> Option<&DesignedObject> {
        self.objects.get(&id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn trajectories(&self) -> &TrajectoryLines {
        &self.trajectories
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    /// The highlighted object, or the working copy while editing.
    pub fn selected_object(&self) -> Option<&DesignedObject> {
        match &self.edit {
            Some(session) => Some(&session.clone),
            None => self.selected.and_then(|id| self.objects.get(&id)),
        }
    }

    pub fn selected_key(&self) -> Option<ObjectKey> {
        self.selected_object().map(DesignedObject::key)
    }

    pub fn staged_marker(&self) -> Option<Vec3> {
        self.marker.map(|marker| marker.position)
    }

    pub fn emitter_editor(&self) -> Option<&EmitterEditor> {
        match &self.edit.as_ref()?.editor {
            ObjectEditor::Emitter(editor) => Some(editor),
            ObjectEditor::Listener(_) => None,
        }
    }

    pub fn listener_editor(&self) -> Option<&ListenerEditor> {
        match &self.edit.as_ref()?.editor {
            ObjectEditor::Listener(editor) => Some(editor),
            ObjectEditor::Emitter(_) => None,
        }
    }

    // --- pointer & keyboard ------------------------------------------------

    pub fn pointer_down(&mut self, button: MouseButton, x: f32, y: f32) {
        if button == MouseButton::Left {
            self.pointer.press(Vec2::new(x, y));
        }
    }

    /// Returns true when the camera turned.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        match self.pointer.motion(Vec2::new(x, y)) {
            Some(delta) => {
                self.view
                    .camera
                    .look(delta.x, delta.y, self.config.look_sensitivity);
                true
            }
            None => false,
        }
    }

    pub fn pointer_leave(&mut self) {
        self.pointer.leave();
    }

    pub fn pointer_enter(&mut self) {
        self.pointer.enter();
    }

    pub fn pointer_up(&mut self, button: MouseButton, x: f32, y: f32) {
        if button != MouseButton::Left {
            return;
        }
        if let PointerRelease::Click(position) = self.pointer.release(Vec2::new(x, y)) {
            self.handle_click(position);
        }
    }

    pub fn key_down(&mut self, key: KeyCode) -> bool {
        self.input.handle_key(key, true)
    }

    pub fn key_up(&mut self, key: KeyCode) -> bool {
        self.input.handle_key(key, false)
    }

    /// Drops held movement keys, e.g. when the window loses focus.
    pub fn release_keys(&mut self) {
        self.input.clear();
    }

    /// Advances camera movement by `dt` seconds. Returns true when it moved.
    pub fn tick(&mut self, dt: f32) -> bool {
        let movement = self.input.movement();
        self.view.camera.update_movement(
            &movement,
            dt,
            self.config.move_speed,
            self.config.min_camera_height(),
        )
    }

    fn handle_click(&mut self, position: Vec2) {
        if self.edit.is_some() {
            self.move_edited_object(position);
            return;
        }
        if !self.select_at(position) {
            self.stage_marker_at(position);
        }
    }

    /// Selects the nearest object under the cursor. A miss clears the selection.
    fn select_at(&mut self, position: Vec2) -> bool {
        let candidates: Vec<NodeId> = self.objects.values().flat_map(clickable_parts).collect();
        let hits = self.view.pick(position.x, position.y, &candidates);
        self.clear_selection();
        let Some(key) = pick::nearest_owner(&hits) else {
            return false;
        };
        let Some(object) = self.objects.get(&key.id) else {
            log::error!("Hit {key:?} has no designed object");
            return false;
        };
        highlight(&mut self.view.graph, object);
        if object.kind() == ObjectKind::Listener {
            show_listener_cones(&mut self.view.graph, object);
        }
        log::debug!("Selected {key:?}");
        self.selected = Some(key.id);
        true
    }

    fn stage_marker_at(&mut self, position: Vec2) {
        let Some(mut point) = self.view.pick_ground(position.x, position.y) else {
            return;
        };
        point.y = 0.0;
        self.discard_marker();
        let node = create_placement_marker(&mut self.view.graph, point);
        let root = self.view.graph.root();
        self.view.graph.attach(root, node);
        self.marker = Some(StagedMarker {
            node,
            position: point,
        });
    }

    fn discard_marker(&mut self) {
        if let Some(marker) = self.marker.take() {
            self.view.graph.dispose(marker.node);
        }
    }

    fn clear_selection(&mut self) {
        let Some(id) = self.selected.take() else {
            return;
        };
        if let Some(object) = self.objects.get(&id) {
            restore_default_colors(&mut self.view.graph, object);
            hide_listener_cones(&mut self.view.graph, object);
        }
    }

    fn move_edited_object(&mut self, position: Vec2) {
        let Some(point) = self.view.pick_ground(position.x, position.y) else {
            return;
        };
        let Some(session) = self.edit.as_mut() else {
            return;
        };
        let graph = &mut self.view.graph;
        match (&mut session.clone, &session.editor) {
            (DesignedObject::Emitter(emitter), ObjectEditor::Emitter(editor)) => {
                let data = &mut emitter.data;
                match editor.edit_target() {
                    EditTarget::Start => {
                        data.start_point.x = point.x;
                        data.start_point.z = point.z;
                    }
                    EditTarget::End => {
                        let start = data.start_point;
                        let end = data.end_point.get_or_insert(start);
                        end.x = point.x;
                        end.z = point.z;
                    }
                }
                refresh_emitter(graph, &mut self.trajectories, emitter);
            }
            (DesignedObject::Listener(listener), ObjectEditor::Listener(_)) => {
                listener.data.position.x = point.x;
                listener.data.position.z = point.z;
                update_listener_geometry(graph, listener);
            }
            _ => log::error!("Editor does not match the edited object"),
        }
    }

    // --- object lifecycle --------------------------------------------------

    pub fn add_emitter(&mut self) -> Option<ObjectId> {
        let marker = self.take_marker("emitter")?;
        let id = self.allocate_id();
        let data = EmitterData::new(
            id,
            Position::new(marker.x, MIN_EMITTER_HEIGHT_METERS, marker.z),
        );
        self.scenario.emitters.push(data.clone());
        self.insert_emitter(data);
        log::info!("Added emitter {id}");
        Some(id)
    }

    pub fn add_listener(&mut self) -> Option<ObjectId> {
        let marker = self.take_marker("listener")?;
        let id = self.allocate_id();
        let data = ListenerData::new(
            id,
            Position::new(marker.x, MIN_LISTENER_HEIGHT_METERS, marker.z),
        );
        self.scenario.listeners.push(data.clone());
        self.insert_listener(data);
        log::info!("Added listener {id}");
        Some(id)
    }

    fn take_marker(&mut self, what: &str) -> Option<Vec3> {
        let Some(marker) = self.marker.take() else {
            log::warn!("Cannot add {what}: no placement staged");
            return None;
        };
        self.view.graph.dispose(marker.node);
        Some(marker.position)
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn insert_emitter(&mut self, data: EmitterData) {
        let emitter = create_emitter_display(&mut self.view.graph, &data);
        let root = self.view.graph.root();
        self.view.graph.attach(root, emitter.root);
        refresh_emitter(&mut self.view.graph, &mut self.trajectories, &emitter);
        self.objects
            .insert(data.id, DesignedObject::Emitter(emitter));
    }

    fn insert_listener(&mut self, data: ListenerData) {
        let listener = create_listener_display(&mut self.view.graph, &data);
        let root = self.view.graph.root();
        self.view.graph.attach(root, listener.root);
        self.objects
            .insert(data.id, DesignedObject::Listener(listener));
    }

    pub fn delete_selected(&mut self) -> bool {
        if self.edit.is_some() {
            log::warn!("Cannot delete while editing");
            return false;
        }
        let Some(id) = self.selected.take() else {
            return false;
        };
        if let Some(object) = self.objects.remove(&id) {
            object.dispose(&mut self.view.graph);
        }
        self.trajectories.remove(&mut self.view.graph, id);
        self.scenario.emitters.retain(|emitter| emitter.id != id);
        self.scenario.listeners.retain(|listener| listener.id != id);
        log::info!("Deleted object {id}");
        true
    }

    fn clear_scene(&mut self) {
        if let Some(session) = self.edit.take() {
            session.clone.dispose(&mut self.view.graph);
        }
        self.discard_marker();
        self.selected = None;
        for object in std::mem::take(&mut self.objects).into_values() {
            object.dispose(&mut self.view.graph);
        }
        self.trajectories.clear(&mut self.view.graph);
    }

    // --- edit mode ---------------------------------------------------------

    pub fn enter_edit_mode(&mut self) -> bool {
        if self.edit.is_some() {
            log::warn!("Already editing");
            return false;
        }
        let Some(id) = self.selected else {
            log::warn!("Cannot edit: nothing selected");
            return false;
        };
        self.discard_marker();
        let graph = &mut self.view.graph;
        let Some(original) = self.objects.get(&id) else {
            log::error!("Selected object {id} is not indexed");
            self.selected = None;
            return false;
        };
        graph.detach(original.root());

        let root = graph.root();
        let session = match original {
            DesignedObject::Emitter(emitter) => {
                let data = emitter.data.clone();
                let clone = create_emitter_display(graph, &data);
                graph.attach(root, clone.root);
                refresh_emitter(graph, &mut self.trajectories, &clone);
                EditSession {
                    editor: ObjectEditor::Emitter(EmitterEditor::from_data(&data)),
                    clone: DesignedObject::Emitter(clone),
                }
            }
            DesignedObject::Listener(listener) => {
                let data = listener.data.clone();
                let clone = DesignedObject::Listener(create_listener_display(graph, &data));
                graph.attach(root, clone.root());
                show_listener_cones(graph, &clone);
                EditSession {
                    editor: ObjectEditor::Listener(ListenerEditor::from_data(&data)),
                    clone,
                }
            }
        };
        mark_as_edited(graph, &session.clone);
        log::info!("Editing object {id}");
        self.edit = Some(session);
        true
    }

    /// Applies `change` to the emitter editor and refreshes the working copy.
    pub fn update_emitter_editor(&mut self, change: impl FnOnce(&mut EmitterEditor)) -> bool {
        match self.edit.as_mut().map(|session| &mut session.editor) {
            Some(ObjectEditor::Emitter(editor)) => change(editor),
            _ => {
                log::warn!("No emitter is being edited");
                return false;
            }
        }
        self.sync_edited_object();
        true
    }

    pub fn update_listener_editor(&mut self, change: impl FnOnce(&mut ListenerEditor)) -> bool {
        match self.edit.as_mut().map(|session| &mut session.editor) {
            Some(ObjectEditor::Listener(editor)) => change(editor),
            _ => {
                log::warn!("No listener is being edited");
                return false;
            }
        }
        self.sync_edited_object();
        true
    }

    pub fn set_audio_file_uri(&mut self, uri: String) -> bool {
        self.update_emitter_editor(|editor| editor.audio_file_uri = Some(uri))
    }

    /// Pushes editor fields into the working copy and rebuilds what depends
    /// on them.
    fn sync_edited_object(&mut self) {
        let Some(session) = self.edit.as_mut() else {
            return;
        };
        let graph = &mut self.view.graph;
        match (&mut session.clone, &session.editor) {
            (DesignedObject::Emitter(emitter), ObjectEditor::Emitter(editor)) => {
                editor.sync_to(&mut emitter.data);
                refresh_emitter(graph, &mut self.trajectories, emitter);
            }
            (DesignedObject::Listener(listener), ObjectEditor::Listener(editor)) => {
                editor.sync_to(&mut listener.data);
                update_listener_geometry(graph, listener);
            }
            _ => log::error!("Editor does not match the edited object"),
        }
    }

    /// Commits the working copy and rebuilds it from the stored record. The
    /// selection is cleared for both kinds.
    pub fn save_edit(&mut self) -> bool {
        let Some(session) = self.edit.as_ref() else {
            log::warn!("Nothing to save");
            return false;
        };
        if !session.editor.is_valid() {
            log::warn!("Rejected save: editor form is invalid");
            return false;
        }
        let id = session.clone.id();
        let Some(original) = self.objects.get(&id) else {
            log::error!("Edited object {id} has no original");
            return false;
        };
        if original.kind() != session.clone.kind() {
            log::error!(
                "Edited object {id} changed kind from {:?} to {:?}; aborting commit",
                original.kind(),
                session.clone.kind()
            );
            return false;
        }
        let recorded = match original.kind() {
            ObjectKind::Emitter => self.scenario.emitter(id).is_some(),
            ObjectKind::Listener => self.scenario.listener(id).is_some(),
        };
        if !recorded {
            log::error!("Edited object {id} is missing from the scenario");
            return false;
        }

        let Some(session) = self.edit.take() else {
            return false;
        };
        if let Some(original) = self.objects.remove(&id) {
            original.dispose(&mut self.view.graph);
        }
        session.clone.dispose(&mut self.view.graph);
        self.selected = None;

        match session.clone {
            DesignedObject::Emitter(emitter) => {
                self.scenario.replace_emitter(emitter.data.clone());
                self.insert_emitter(emitter.data);
            }
            DesignedObject::Listener(listener) => {
                self.scenario.replace_listener(listener.data.clone());
                self.insert_listener(listener.data);
            }
        }
        log::info!("Committed object {id}");
        true
    }

    /// Drops the working copy and rebuilds the original from committed data.
    pub fn cancel_edit(&mut self) -> bool {
        let Some(session) = self.edit.take() else {
            return false;
        };
        let id = session.clone.id();
        session.clone.dispose(&mut self.view.graph);
        let original = self.objects.remove(&id);
        if let Some(original) = &original {
            original.dispose(&mut self.view.graph);
        }
        self.selected = None;

        match session.clone.kind() {
            ObjectKind::Emitter => match self.scenario.emitter(id).cloned() {
                Some(data) => self.insert_emitter(data),
                None => {
                    log::error!("Emitter {id} vanished during edit");
                    self.trajectories.remove(&mut self.view.graph, id);
                }
            },
            ObjectKind::Listener => match self.scenario.listener(id).cloned() {
                Some(data) => self.insert_listener(data),
                None => log::error!("Listener {id} vanished during edit"),
            },
        }
        log::info!("Cancelled edit of object {id}");
        true
    }

    // --- ui ----------------------------------------------------------------

    /// Draws the side panel and applies what the user asked for.
    pub fn show_ui(&mut self, ctx: &egui::Context) -> Option<HostRequest> {
        let marker = self.staged_marker();
        let selected = self.selected_key();
        let editing = self.is_editing();
        let mut placement = None;
        let mut object_action = None;
        let mut editor_response = panels::EditorResponse::default();

        egui::SidePanel::right("scenario-designer")
            .default_width(280.0)
            .show(ctx, |ui| {
                panels::scenario_form_panel(ui, &mut self.form);
                placement = panels::placement_panel(ui, marker);
                object_action = panels::object_info_panel(ui, selected, editing);
                if let Some(session) = self.edit.as_mut() {
                    ui.separator();
                    editor_response = match &mut session.editor {
                        ObjectEditor::Emitter(editor) => panels::emitter_editor_panel(ui, editor),
                        ObjectEditor::Listener(editor) => {
                            panels::listener_editor_panel(ui, editor)
                        }
                    };
                }
            });

        if editor_response.changed {
            self.sync_edited_object();
        }
        match placement {
            Some(PlacementAction::AddEmitter) => {
                self.add_emitter();
            }
            Some(PlacementAction::AddListener) => {
                self.add_listener();
            }
            None => {}
        }
        match object_action {
            Some(ObjectAction::Delete) => {
                self.delete_selected();
            }
            Some(ObjectAction::Edit) => {
                self.enter_edit_mode();
            }
            None => {}
        }
        match editor_response.action {
            Some(EditorAction::Save) => {
                self.save_edit();
                None
            }
            Some(EditorAction::Cancel) => {
                self.cancel_edit();
                None
            }
            Some(EditorAction::ChooseAudio) => Some(HostRequest::ChooseAudio),
            None => None,
        }
    }
}

/// Re-derives an emitter's placement, heading and trajectory line from its data.
fn refresh_emitter(
    graph: &mut SceneGraph,
    trajectories: &mut TrajectoryLines,
    emitter: &DesignedEmitter,
) {
    let data = &emitter.data;
    if let Some(root) = graph.get_mut(emitter.root) {
        root.position = data.start_point.to_vec3();
        match data.end_point {
            Some(end) => {
                if let Some(heading) = emitter_heading(data.start_point, end) {
                    root.rotation = heading;
                }
            }
            None => root.rotation = Quat::IDENTITY,
        }
    }
    trajectories.update(graph, data);
}
