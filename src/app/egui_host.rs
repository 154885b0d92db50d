use egui_winit::winit::event::{ElementState, WindowEvent};
use winit::window::Window;

/// Tessellated output of one egui pass, ready for the GPU painter.
pub struct EguiFrameOutput {
    pub clipped_primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// Who an input event belongs to once the panels have seen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Panel,
    Canvas,
}

/// A press over a panel stays with the panel even when egui did not consume
/// it, so clicking panel chrome never stages a marker behind it.
fn route_for(consumed: bool, pointer_over_panel: bool, is_press: bool) -> Route {
    if consumed || (is_press && pointer_over_panel) {
        Route::Panel
    } else {
        Route::Canvas
    }
}

/// Owns the egui context and feeds it the designer window's input.
pub struct EguiHost {
    context: egui::Context,
    winit_state: egui_winit::State,
}

impl EguiHost {
    pub fn new(window: &Window) -> Self {
        let context = egui::Context::default();
        let winit_state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        Self {
            context,
            winit_state,
        }
    }

    pub fn route(&mut self, window: &Window, event: &WindowEvent) -> Route {
        let response = self.winit_state.on_window_event(window, event);
        if response.repaint {
            window.request_redraw();
        }
        let is_press = matches!(
            event,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            }
        );
        route_for(
            response.consumed,
            self.context.is_pointer_over_area(),
            is_press,
        )
    }

    pub fn run_ui<F>(&mut self, window: &Window, run_ui: F) -> EguiFrameOutput
    where
        F: FnMut(&egui::Context),
    {
        let raw_input = self.winit_state.take_egui_input(window);
        let output = self.context.run(raw_input, run_ui);
        self.winit_state
            .handle_platform_output(window, output.platform_output);

        EguiFrameOutput {
            clipped_primitives: self
                .context
                .tessellate(output.shapes, output.pixels_per_point),
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumed_events_stay_with_panels() {
        assert_eq!(route_for(true, false, false), Route::Panel);
        assert_eq!(route_for(true, false, true), Route::Panel);
    }

    #[test]
    fn presses_over_panels_do_not_reach_canvas() {
        assert_eq!(route_for(false, true, true), Route::Panel);
        assert_eq!(route_for(false, true, false), Route::Canvas);
        assert_eq!(route_for(false, false, true), Route::Canvas);
    }
}
