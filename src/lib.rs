//! Interactive 3D editor for acoustic scenarios.
//!
//! The [`app::Designer`] owns a retained [`render::SceneGraph`] built from
//! [`scene::ScenarioData`] and turns pointer/keyboard input into selection,
//! placement and edit-mode changes. The binary hosts it in a winit window.

pub mod app;
pub mod assets;
pub mod render;
pub mod scene;
pub mod ui;
