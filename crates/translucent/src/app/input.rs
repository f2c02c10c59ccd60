use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowId,
};

use translucent_core::{MaterialPreset, PointerButton, PointerEvent, RenderContext};

use super::App;

/// Factor applied to the material scale by the bracket keys.
pub const MATERIAL_SCALE_STEP: f32 = 1.25;

/// Wheel units per scrolled line.
const LINE_DELTA_UNITS: f32 = 120.0;

/// Keyboard shortcuts of the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyCommand {
    SelectMaterial(MaterialPreset),
    ToggleReflection,
    ToggleTransmission,
    ScaleMaterial(f32),
    Close,
}

impl KeyCommand {
    /// Maps a pressed key to its command.
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Digit1 => Some(Self::SelectMaterial(MaterialPreset::Milk)),
            KeyCode::Digit2 => Some(Self::SelectMaterial(MaterialPreset::Skin)),
            KeyCode::KeyR => Some(Self::ToggleReflection),
            KeyCode::KeyT => Some(Self::ToggleTransmission),
            KeyCode::BracketLeft => Some(Self::ScaleMaterial(1.0 / MATERIAL_SCALE_STEP)),
            KeyCode::BracketRight => Some(Self::ScaleMaterial(MATERIAL_SCALE_STEP)),
            KeyCode::Escape => Some(Self::Close),
            _ => None,
        }
    }

    /// Applies the command to the shading state. Returns true for `Close`.
    pub fn apply(self, context: &mut RenderContext) -> bool {
        match self {
            Self::SelectMaterial(preset) => context.select_preset(preset),
            Self::ToggleReflection => {
                let enabled = !context.reflection_enabled();
                context.set_reflection_enabled(enabled);
                log::info!("reflection {}", if enabled { "on" } else { "off" });
            }
            Self::ToggleTransmission => {
                let enabled = !context.transmission_enabled();
                context.set_transmission_enabled(enabled);
                log::info!("transmission {}", if enabled { "on" } else { "off" });
            }
            Self::ScaleMaterial(factor) => {
                let scale = context.material().scale * factor;
                context.set_material_scale(scale);
            }
            Self::Close => return true,
        }
        false
    }
}

/// Maps a winit mouse button to an arcball button.
pub fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Tertiary),
        _ => None,
    }
}

/// Converts a scroll delta to wheel units (one notch is 120).
pub fn wheel_delta(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y * LINE_DELTA_UNITS,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init_graphics(event_loop) {
            self.fail(e);
            event_loop.exit();
            return;
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                self.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                self.render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                self.queue_pointer_event(PointerEvent::Move {
                    position: self.cursor,
                });
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    if let Some(button) = pointer_button(button) {
                        self.queue_pointer_event(PointerEvent::Press {
                            button,
                            position: self.cursor,
                        });
                    }
                }
                ElementState::Released => {
                    self.queue_pointer_event(PointerEvent::Release);
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                self.queue_pointer_event(PointerEvent::Wheel {
                    delta: wheel_delta(delta),
                });
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        if let Some(command) = KeyCommand::from_key(code) {
                            if command.apply(&mut self.context) {
                                self.close_requested = true;
                            }
                        }
                    }
                }
            }
            _ => {}
        }

        if self.close_requested {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(
            KeyCommand::from_key(KeyCode::Digit2),
            Some(KeyCommand::SelectMaterial(MaterialPreset::Skin))
        );
        assert_eq!(
            KeyCommand::from_key(KeyCode::Escape),
            Some(KeyCommand::Close)
        );
        assert_eq!(KeyCommand::from_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_commands_update_context() {
        let mut ctx = RenderContext::new(MaterialPreset::Milk, 40.0);

        assert!(!KeyCommand::ToggleReflection.apply(&mut ctx));
        assert!(!ctx.reflection_enabled());
        assert!(ctx.transmission_enabled());

        KeyCommand::ToggleTransmission.apply(&mut ctx);
        KeyCommand::ToggleTransmission.apply(&mut ctx);
        assert!(ctx.transmission_enabled());

        KeyCommand::from_key(KeyCode::BracketRight)
            .unwrap()
            .apply(&mut ctx);
        assert!((ctx.material().scale - 50.0).abs() < 1e-4);
        KeyCommand::from_key(KeyCode::BracketLeft)
            .unwrap()
            .apply(&mut ctx);
        assert!((ctx.material().scale - 40.0).abs() < 1e-4);

        KeyCommand::SelectMaterial(MaterialPreset::Skin).apply(&mut ctx);
        assert_eq!(ctx.preset(), MaterialPreset::Skin);
        assert!((ctx.material().scale - 40.0).abs() < 1e-4);

        assert!(KeyCommand::Close.apply(&mut ctx));
    }

    #[test]
    fn test_pointer_mapping() {
        assert_eq!(pointer_button(MouseButton::Left), Some(PointerButton::Primary));
        assert_eq!(pointer_button(MouseButton::Middle), Some(PointerButton::Tertiary));
        assert_eq!(pointer_button(MouseButton::Back), None);
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, -1.0)), -120.0);
    }

    proptest! {
        #[test]
        fn prop_scale_steps_cancel(scale in 0.1f32..500.0, steps in 1usize..6) {
            let mut ctx = RenderContext::new(MaterialPreset::Milk, scale);
            for _ in 0..steps {
                KeyCommand::ScaleMaterial(MATERIAL_SCALE_STEP).apply(&mut ctx);
            }
            prop_assert!(ctx.material().scale > scale);
            for _ in 0..steps {
                KeyCommand::ScaleMaterial(1.0 / MATERIAL_SCALE_STEP).apply(&mut ctx);
            }
            prop_assert!((ctx.material().scale - scale).abs() <= scale * 1e-4);
        }
    }
}
