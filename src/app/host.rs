use super::egui_host::{EguiHost, Route};
use super::gpu::{GpuError, GpuSurface};
use super::pages::{self, PageError};
use super::timing::FrameTiming;
use super::{Designer, DesignerConfig, HostRequest};
use crate::assets::{self, AudioError, AudioUploader, LocalAudioStore};
use crate::render::preview;
use crate::scene::store::{FileScenarioStore, StoreError};
use crate::scene::ScenarioId;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, ModifiersState, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

const WINDOW_TITLE: &str = "Scenario Designer";

#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Directory holding `scenario_{id}.json` records.
    pub store_dir: PathBuf,
    /// Directory uploaded audio is copied into.
    pub audio_dir: PathBuf,
    /// Scenario to open for editing; a new one is started when absent.
    pub scenario_id: Option<ScenarioId>,
    pub config: DesignerConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("could not open scenario {id}: {source}")]
    Load {
        id: ScenarioId,
        #[source]
        source: PageError,
    },
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Everything that only exists while a window is open.
struct Mounted {
    window: Arc<Window>,
    gpu: GpuSurface,
    egui: EguiHost,
    designer: Designer,
    timing: FrameTiming,
    cursor: Option<(f32, f32)>,
}

struct DesignerHost {
    options: HostOptions,
    store: FileScenarioStore,
    audio: LocalAudioStore,
    modifiers: ModifiersState,
    mounted: Option<Mounted>,
}

impl DesignerHost {
    fn new(options: HostOptions) -> Result<Self, HostError> {
        let store = FileScenarioStore::open(&options.store_dir)?;
        let audio = LocalAudioStore::open(&options.audio_dir)?;
        Ok(Self {
            options,
            store,
            audio,
            modifiers: ModifiersState::empty(),
            mounted: None,
        })
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<Mounted, HostError> {
        let attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);
        let window = Arc::new(event_loop.create_window(attrs)?);
        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        let gpu = GpuSurface::new(window.clone())?;
        let egui = EguiHost::new(&window);
        let designer = open_designer(&self.options, &self.store, size.width, size.height)?;

        Ok(Mounted {
            window,
            gpu,
            egui,
            designer,
            timing: FrameTiming::new(),
            cursor: None,
        })
    }

    fn save(&mut self) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        let designer = &mut mounted.designer;
        let result = if designer.has_loaded_scenario() {
            pages::save_changes(designer, &mut self.store).map(|updated| {
                if updated {
                    log::info!("Saved scenario {}", designer.get_scenario().id);
                }
            })
        } else {
            pages::create_scenario(designer, &mut self.store)
                .map(|id| log::info!("Created scenario {id}"))
        };
        match result {
            Ok(()) => {}
            Err(PageError::InvalidForm(errors)) => {
                for error in errors {
                    log::warn!("Cannot save: {error}");
                }
            }
            Err(err) => log::error!("Saving failed: {err}"),
        }
    }

    fn choose_audio(&mut self) {
        let Some(path) = assets::pick_audio_file() else {
            return;
        };
        match self.audio.upload_audio(&path) {
            Ok(uploaded) => {
                if let Some(mounted) = self.mounted.as_mut() {
                    mounted.designer.set_audio_file_uri(uploaded.uri);
                }
            }
            Err(err) => log::error!("Audio upload failed: {err}"),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        let dt = mounted.timing.update(Instant::now());
        mounted.designer.tick(dt);

        let designer = &mut mounted.designer;
        let mut request = None;
        let frame = mounted.egui.run_ui(&mounted.window, |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            preview::paint_scene(&painter, ctx.screen_rect(), designer.view());
            request = designer.show_ui(ctx).or(request);
        });

        match mounted.gpu.render(frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                mounted.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, shutting down");
                self.mounted = None;
                event_loop.exit();
                return;
            }
            Err(err) => log::warn!("Frame skipped: {err}"),
        }

        if let Some(HostRequest::ChooseAudio) = request {
            self.choose_audio();
        }
    }
}

/// Builds the designer, loading the requested scenario. A scenario that cannot
/// be loaded is an error; the designer never falls back to a fresh record that
/// Ctrl+S would then create.
fn open_designer(
    options: &HostOptions,
    store: &FileScenarioStore,
    width: u32,
    height: u32,
) -> Result<Designer, HostError> {
    let mut designer = Designer::new(options.config.clone(), width, height);
    if let Some(id) = options.scenario_id {
        pages::load_for_edit(&mut designer, store, id)
            .map_err(|source| HostError::Load { id, source })?;
        log::info!("Editing scenario {id}");
    }
    Ok(designer)
}

impl ApplicationHandler for DesignerHost {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.mounted.is_some() {
            return;
        }
        match self.mount(event_loop) {
            Ok(mounted) => {
                mounted.window.request_redraw();
                self.mounted = Some(mounted);
            }
            Err(err) => {
                log::error!("Designer window unavailable: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        let consumed = mounted.egui.route(&mounted.window, &event) == Route::Panel;

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                self.mounted = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                mounted.gpu.resize(size.width, size.height);
                mounted.designer.resize(size.width, size.height);
            }
            WindowEvent::Focused(false) => {
                mounted.designer.release_keys();
                mounted.timing.reset();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                mounted.cursor = Some((x, y));
                if !consumed {
                    mounted.designer.pointer_move(x, y);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                mounted.cursor = None;
                mounted.designer.pointer_leave();
            }
            WindowEvent::CursorEntered { .. } => {
                mounted.designer.pointer_enter();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some((x, y)) = mounted.cursor else {
                    return;
                };
                match state {
                    ElementState::Pressed if !consumed => {
                        mounted.designer.pointer_down(button, x, y)
                    }
                    ElementState::Released => mounted.designer.pointer_up(button, x, y),
                    ElementState::Pressed => {}
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                match event.state {
                    ElementState::Released => {
                        mounted.designer.key_up(code);
                    }
                    ElementState::Pressed if consumed => {}
                    ElementState::Pressed => {
                        if code == KeyCode::KeyS && self.modifiers.control_key() {
                            if !event.repeat {
                                self.save();
                            }
                        } else {
                            mounted.designer.key_down(code);
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mounted) = &self.mounted {
            mounted.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.mounted = None;
    }
}

/// Opens the designer window and runs until it is closed.
pub fn run(options: HostOptions) -> Result<(), HostError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut host = DesignerHost::new(options)?;
    event_loop.run_app(&mut host)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::store::ScenarioStore;
    use crate::scene::ScenarioData;

    fn options(dir: &std::path::Path, scenario_id: Option<ScenarioId>) -> HostOptions {
        HostOptions {
            store_dir: dir.join("scenarios"),
            audio_dir: dir.join("audio"),
            scenario_id,
            config: DesignerConfig::default(),
        }
    }

    #[test]
    fn missing_scenario_refuses_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let options = options(dir.path(), Some(9));
        let store = FileScenarioStore::open(&options.store_dir).unwrap();
        let err = open_designer(&options, &store, 640, 480).err().unwrap();
        assert!(matches!(
            err,
            HostError::Load {
                id: 9,
                source: PageError::Store(StoreError::NotFound(9))
            }
        ));
        assert!(store.list_scenarios().unwrap().is_empty());
    }

    #[test]
    fn requested_scenario_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let options_new = options(dir.path(), None);
        let mut store = FileScenarioStore::open(&options_new.store_dir).unwrap();
        let fresh = open_designer(&options_new, &store, 640, 480).unwrap();
        assert!(!fresh.has_loaded_scenario());

        let id = store.create_scenario(&ScenarioData::default()).unwrap();
        let mut designer = open_designer(&options(dir.path(), Some(id)), &store, 640, 480).unwrap();
        assert!(designer.has_loaded_scenario());
        assert_eq!(designer.get_scenario().id, id);
    }
}
