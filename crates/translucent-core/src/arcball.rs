//! Arcball camera interaction.
//!
//! Pointer drags are mapped onto a virtual hemisphere to rotate the model,
//! pan the view in the camera plane, or zoom by scaling the model. The
//! controller accumulates state across events and exposes the resulting model
//! and view matrices.

use glam::{Mat4, Vec2, Vec3};

use crate::options::CameraConfig;

/// Rotation angle amplification.
pub const ROTATE_GAIN: f32 = 4.0;
/// Pan distance per viewport width/height of pointer travel.
pub const TRANSLATE_GAIN: f32 = 10.0;
/// Zoom accumulated per viewport height of vertical pointer travel.
pub const SCALE_GAIN: f32 = 20.0;
/// Model scale lost per unit of accumulated zoom.
pub const ZOOM_STEP: f32 = 0.1;
/// Wheel delta units per unit of accumulated zoom.
pub const WHEEL_DIVISOR: f32 = 1000.0;

/// Interaction mode, selected by the pressed pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcballMode {
    /// No drag in progress.
    #[default]
    None,
    /// Rotate the model.
    Rotate,
    /// Pan the view.
    Translate,
    /// Zoom by scaling the model.
    Scale,
}

/// Pointer buttons understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Usually the left mouse button.
    Primary,
    /// Usually the right mouse button.
    Secondary,
    /// Usually the middle mouse button.
    Tertiary,
}

impl PointerButton {
    /// Returns the interaction mode this button starts.
    #[must_use]
    pub fn mode(self) -> ArcballMode {
        match self {
            PointerButton::Primary => ArcballMode::Rotate,
            PointerButton::Secondary => ArcballMode::Translate,
            PointerButton::Tertiary => ArcballMode::Scale,
        }
    }
}

/// A pointer event in window coordinates (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// A button went down at `position`.
    Press { button: PointerButton, position: Vec2 },
    /// The pointer moved to `position`.
    Move { position: Vec2 },
    /// The pressed button was released.
    Release,
    /// Wheel rotation, 120 units per notch.
    Wheel { delta: f32 },
}

/// Arcball camera controller.
#[derive(Debug, Clone)]
pub struct ArcballController {
    viewport: Vec2,
    rotation: Mat4,
    look_at: Mat4,
    translation: Vec3,
    zoom: f32,
    mode: ArcballMode,
    last_pointer: Vec2,
    current_pointer: Vec2,
    model: Mat4,
    view: Mat4,
}

impl ArcballController {
    /// Creates a controller for a viewport of the given size.
    #[must_use]
    pub fn new(config: &CameraConfig, width: u32, height: u32) -> Self {
        let mut controller = Self {
            viewport: Vec2::ONE,
            rotation: Mat4::IDENTITY,
            look_at: Mat4::IDENTITY,
            translation: Vec3::ZERO,
            zoom: 0.0,
            mode: ArcballMode::None,
            last_pointer: Vec2::ZERO,
            current_pointer: Vec2::ZERO,
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
        };
        controller.set_viewport(width, height);
        controller.init_model_view(config.model_matrix(), config.look_at());
        controller
    }

    /// Resets the accumulated rotation and the look-at matrix.
    pub fn init_model_view(&mut self, model: Mat4, view: Mat4) {
        self.rotation = model;
        self.look_at = view;
        self.update();
    }

    /// Sets the viewport size used to normalize pointer coordinates.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    /// Applies a pointer event.
    pub fn handle_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Press { button, position } => self.press(button, position),
            PointerEvent::Move { position } => self.move_to(position),
            PointerEvent::Release => self.release(),
            PointerEvent::Wheel { delta } => self.wheel(delta),
        }
    }

    /// Starts a drag.
    pub fn press(&mut self, button: PointerButton, position: Vec2) {
        self.last_pointer = position;
        self.current_pointer = position;
        self.mode = button.mode();
        log::debug!("arcball mode {:?}", self.mode);
    }

    /// Moves the pointer, updating the transform for the current mode.
    pub fn move_to(&mut self, position: Vec2) {
        self.current_pointer = position;
        self.update();
        self.last_pointer = position;
    }

    /// Ends the drag.
    pub fn release(&mut self) {
        self.mode = ArcballMode::None;
    }

    /// Accumulates wheel rotation into the zoom without changing the mode.
    pub fn wheel(&mut self, delta: f32) {
        self.zoom += delta / WHEEL_DIVISOR;
        self.update();
    }

    /// Applies the current mode and rebuilds the output matrices.
    pub fn update(&mut self) {
        match self.mode {
            ArcballMode::Rotate => self.update_rotate(),
            ArcballMode::Translate => self.update_translate(),
            ArcballMode::Scale => self.update_scale(),
            ArcballMode::None => {}
        }

        // No clamp: a large zoom drives the scale negative and mirrors the model.
        self.model = self.rotation * Mat4::from_scale(Vec3::splat(1.0 - self.zoom * ZOOM_STEP));
        self.view = self.look_at * Mat4::from_translation(self.translation);
    }

    /// Projects a window position onto the unit hemisphere facing the viewer.
    ///
    /// Points outside the unit disc keep `z = 0` and are not normalized.
    #[must_use]
    pub fn hemisphere_point(&self, position: Vec2) -> Vec3 {
        let x = 2.0 * position.x / self.viewport.x - 1.0;
        let y = -2.0 * position.y / self.viewport.y + 1.0;
        let xy_squared = x * x + y * y;
        if xy_squared <= 1.0 {
            Vec3::new(x, y, (1.0 - xy_squared).sqrt())
        } else {
            Vec3::new(x, y, 0.0)
        }
    }

    /// Angle (radians) and camera-space axis of the rotation between the last
    /// and current pointer positions, before amplification.
    #[must_use]
    pub fn incremental_rotation(&self) -> (f32, Vec3) {
        let u = self.hemisphere_point(self.current_pointer);
        let v = self.hemisphere_point(self.last_pointer);
        let angle = u.dot(v).clamp(-1.0, 1.0).acos();
        (angle, v.cross(u))
    }

    fn update_rotate(&mut self) {
        let (angle, axis) = self.incremental_rotation();
        let object_axis = self.rotation.inverse().transform_vector3(axis);
        if angle == 0.0 || object_axis.length_squared() <= f32::EPSILON * f32::EPSILON {
            return;
        }
        let incremental = Mat4::from_axis_angle(object_axis.normalize(), ROTATE_GAIN * angle);
        self.rotation *= incremental;
    }

    fn update_translate(&mut self) {
        let camera_to_object = self.look_at.inverse();
        let right = camera_to_object.transform_vector3(Vec3::X).normalize();
        let up = camera_to_object.transform_vector3(Vec3::Y).normalize();

        let delta = self.current_pointer - self.last_pointer;
        let dx = TRANSLATE_GAIN * delta.x / self.viewport.x;
        let dy = TRANSLATE_GAIN * delta.y / self.viewport.y;

        self.translation += right * dx - up * dy;
    }

    fn update_scale(&mut self) {
        let dy = self.current_pointer.y - self.last_pointer.y;
        self.zoom += SCALE_GAIN * dy / self.viewport.y;
    }

    /// Returns the model matrix.
    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Returns view * model.
    #[must_use]
    pub fn model_view_matrix(&self) -> Mat4 {
        self.view * self.model
    }

    /// Returns the accumulated rotation matrix.
    #[must_use]
    pub fn rotation(&self) -> Mat4 {
        self.rotation
    }

    /// Returns the accumulated pan.
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Returns the accumulated zoom.
    #[must_use]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Returns the interaction mode.
    #[must_use]
    pub fn mode(&self) -> ArcballMode {
        self.mode
    }

    /// Returns the viewport size.
    #[must_use]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }
}
