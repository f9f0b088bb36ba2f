//! First-person camera and its input controller.
//!
//! The camera keeps yaw and pitch in radians and derives its front/right/up basis from
//! them. Pitch is clamped to +-89 degrees so the basis never flips. The controller turns
//! held keys into movement and left-button drags into yaw/pitch changes.

use winit::{
    event::{ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::{
    config::{CameraConfig, InputConfig},
    error::Result,
    math::{Matrix4, Vector2, Vector3, clamp, to_degrees, to_radians},
};

pub const MAX_PITCH_DEGREES: f32 = 89.0;

/// Maps OpenGL clip space (z in -w..w) to wgpu clip space (z in 0..w), row-vector form.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 0.5, 0.0],
    [0.0, 0.0, 0.5, 1.0],
];

#[derive(Debug, Clone)]
pub struct Camera {
    position: Vector3,
    front: Vector3,
    up: Vector3,
    right: Vector3,
    yaw: f32,
    pitch: f32,
    aspect: f32,
    fov: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            position: config.position,
            front: -Vector3::unit_z(),
            up: Vector3::unit_y(),
            right: Vector3::unit_x(),
            yaw: to_radians(config.yaw),
            pitch: 0.0,
            aspect,
            fov: config.fov,
            near: config.near,
            far: config.far,
        };
        camera.set_pitch_degrees(config.pitch);
        camera
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    pub fn translate(&mut self, offset: Vector3) {
        self.position = self.position + offset;
    }

    pub fn front(&self) -> Vector3 {
        self.front
    }

    pub fn right(&self) -> Vector3 {
        self.right
    }

    pub fn up(&self) -> Vector3 {
        self.up
    }

    /// Pitch in degrees.
    pub fn pitch(&self) -> f32 {
        to_degrees(self.pitch)
    }

    pub fn set_pitch_degrees(&mut self, degrees: f32) {
        let degrees = clamp(degrees, -MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
        self.pitch = to_radians(degrees);
        self.update_vectors();
    }

    /// Yaw in degrees. Unbounded.
    pub fn yaw(&self) -> f32 {
        to_degrees(self.yaw)
    }

    pub fn set_yaw_degrees(&mut self, degrees: f32) {
        self.yaw = to_radians(degrees);
        self.update_vectors();
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Only the aspect ratio changes; the projection is rebuilt on demand.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Result<Matrix4> {
        Matrix4::look_at(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self) -> Result<Matrix4> {
        Matrix4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    fn update_vectors(&mut self) {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        // cos(pitch) never reaches zero under the clamp, so none of these can be degenerate
        let front = Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw);
        self.front = front.normalize().unwrap_or(front);
        let right = self.front.cross(Vector3::unit_y());
        self.right = right.normalize().unwrap_or(Vector3::unit_x());
        let up = self.right.cross(self.front);
        self.up = up.normalize().unwrap_or(Vector3::unit_y());
    }
}

/// GPU copy of the camera, bound at group 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        let identity = Matrix4::identity().to_array();
        Self {
            view: identity,
            projection: identity,
            position: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn update(&mut self, camera: &Camera) -> Result<()> {
        let to_wgpu = Matrix4::from_rows(
            OPENGL_TO_WGPU_MATRIX[0].into(),
            OPENGL_TO_WGPU_MATRIX[1].into(),
            OPENGL_TO_WGPU_MATRIX[2].into(),
            OPENGL_TO_WGPU_MATRIX[3].into(),
        );
        self.view = camera.view_matrix()?.to_array();
        self.projection = (camera.projection_matrix()? * to_wgpu).to_array();
        self.position = camera.position().extend(1.0).into();
        Ok(())
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// WASD plus Space and left Shift.
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::KeyW => Some(Self::Forward),
            KeyCode::KeyS => Some(Self::Backward),
            KeyCode::KeyA => Some(Self::Left),
            KeyCode::KeyD => Some(Self::Right),
            KeyCode::Space => Some(Self::Up),
            KeyCode::ShiftLeft => Some(Self::Down),
            _ => None,
        }
    }
}

/// Look and move control for a [`Camera`].
///
/// Input is accumulated between frames and applied in [`CameraController::update`].
#[derive(Debug, Clone)]
pub struct CameraController {
    speed: f32,
    sensitivity: f32,
    held: [bool; 6],
    looking: bool,
    first_move: bool,
    last_cursor: Vector2,
    look_delta: Vector2,
}

impl CameraController {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            speed: config.speed,
            sensitivity: config.sensitivity,
            held: [false; 6],
            looking: false,
            first_move: true,
            last_cursor: Vector2::zero(),
            look_delta: Vector2::zero(),
        }
    }

    pub fn process_direction(&mut self, direction: Direction, pressed: bool) {
        self.held[direction as usize] = pressed;
    }

    /// Tracks the primary button. Releasing it resets the first-move flag so the next
    /// drag does not start with a jump.
    pub fn process_button(&mut self, pressed: bool) {
        self.looking = pressed;
        if !pressed {
            self.first_move = true;
        }
    }

    pub fn process_cursor(&mut self, x: f32, y: f32) {
        if !self.looking {
            self.first_move = true;
            return;
        }
        let cursor = Vector2::new(x, y);
        if self.first_move {
            self.first_move = false;
        } else {
            self.look_delta = self.look_delta + (cursor - self.last_cursor);
        }
        self.last_cursor = cursor;
    }

    /// Maps winit window events onto the controller. Returns whether the event was used.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return false;
                };
                match Direction::from_key(code) {
                    Some(direction) => {
                        self.process_direction(direction, event.state == ElementState::Pressed);
                        true
                    }
                    None => false,
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.process_button(*state == ElementState::Pressed);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.process_cursor(position.x as f32, position.y as f32);
                self.looking
            }
            WindowEvent::Focused(false) => {
                self.held = [false; 6];
                self.process_button(false);
                false
            }
            _ => false,
        }
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held[direction as usize]
    }

    /// Applies accumulated look input, then moves along the camera basis by
    /// `speed * dt` for every held direction.
    pub fn update(&mut self, camera: &mut Camera, dt: f32) {
        if self.look_delta != Vector2::zero() {
            let Vector2 { x: dx, y: dy } = self.look_delta * self.sensitivity;
            camera.set_yaw_degrees(camera.yaw() + dx);
            // screen y grows downwards
            camera.set_pitch_degrees(camera.pitch() - dy);
            self.look_delta = Vector2::zero();
        }

        let step = self.speed * dt;
        let moves = [
            (Direction::Forward, camera.front()),
            (Direction::Backward, -camera.front()),
            (Direction::Left, -camera.right()),
            (Direction::Right, camera.right()),
            (Direction::Up, camera.up()),
            (Direction::Down, -camera.up()),
        ];
        for (direction, axis) in moves {
            if self.is_held(direction) {
                camera.translate(axis * step);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector4;

    fn camera() -> Camera {
        Camera::new(&CameraConfig::default(), 16.0 / 9.0)
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = camera();
        camera.set_pitch_degrees(200.0);
        assert!((camera.pitch() - 89.0).abs() < 1e-4);
        camera.set_pitch_degrees(-200.0);
        assert!((camera.pitch() + 89.0).abs() < 1e-4);
        camera.set_pitch_degrees(30.0);
        assert!((camera.pitch() - 30.0).abs() < 1e-4);
    }

    #[test]
    fn yaw_is_unbounded() {
        let mut camera = camera();
        camera.set_yaw_degrees(720.0 + 45.0);
        assert!((camera.yaw() - 765.0).abs() < 1e-3);
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = camera();
        assert!(camera.front().approx_eq(-Vector3::unit_z(), 1e-6));
        assert!(camera.right().approx_eq(Vector3::unit_x(), 1e-6));
        assert!(camera.up().approx_eq(Vector3::unit_y(), 1e-6));
        assert_eq!(camera.position(), Vector3::new(0.0, 6.0, 22.0));
    }

    #[test]
    fn basis_stays_orthonormal() {
        let mut camera = camera();
        camera.set_yaw_degrees(33.0);
        camera.set_pitch_degrees(70.0);
        let (f, r, u) = (camera.front(), camera.right(), camera.up());
        for v in [f, r, u] {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
        assert!(f.dot(r).abs() < 1e-5);
        assert!(f.dot(u).abs() < 1e-5);
        assert!(r.dot(u).abs() < 1e-5);
    }

    #[test]
    fn resize_changes_only_aspect() {
        let mut camera = camera();
        let before = camera.view_matrix().unwrap();
        camera.resize(800, 400);
        assert_eq!(camera.aspect(), 2.0);
        assert_eq!(camera.view_matrix().unwrap(), before);
        camera.resize(800, 0);
        assert_eq!(camera.aspect(), 2.0);
    }

    #[test]
    fn view_matrix_puts_eye_at_origin() {
        let camera = camera();
        let eye = camera.position().extend(1.0) * camera.view_matrix().unwrap();
        assert!(eye.approx_eq(Vector4::unit_w(), 1e-5));
    }

    #[test]
    fn uniform_projection_maps_near_plane_to_zero_depth() {
        let camera = camera();
        let mut uniform = CameraUniform::new();
        uniform.update(&camera).unwrap();
        let projection = Matrix4::from_rows(
            uniform.projection[0].into(),
            uniform.projection[1].into(),
            uniform.projection[2].into(),
            uniform.projection[3].into(),
        );
        let near = Vector4::new(0.0, 0.0, -0.1, 1.0) * projection;
        let far = Vector4::new(0.0, 0.0, -1000.0, 1.0) * projection;
        assert!((near.z / near.w).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
        assert_eq!(uniform.position, [0.0, 6.0, 22.0, 1.0]);
    }

    #[test]
    fn held_keys_move_along_basis() {
        let mut camera = camera();
        let mut controller = CameraController::new(&InputConfig::default());
        controller.process_direction(Direction::Forward, true);
        controller.update(&mut camera, 0.5);
        assert!(camera.position().approx_eq(Vector3::new(0.0, 6.0, 7.0), 1e-4));

        controller.process_direction(Direction::Forward, false);
        controller.process_direction(Direction::Up, true);
        controller.process_direction(Direction::Left, true);
        controller.update(&mut camera, 0.1);
        assert!(camera.position().approx_eq(Vector3::new(-3.0, 9.0, 7.0), 1e-4));
    }

    #[test]
    fn drag_turns_camera_without_initial_jump() {
        let mut camera = camera();
        let mut controller = CameraController::new(&InputConfig::default());

        // moving without the button held does nothing
        controller.process_cursor(500.0, 500.0);
        controller.update(&mut camera, 0.0);
        assert!((camera.yaw() + 90.0).abs() < 1e-4);

        controller.process_button(true);
        controller.process_cursor(100.0, 100.0);
        controller.process_cursor(150.0, 80.0);
        controller.update(&mut camera, 0.0);
        assert!((camera.yaw() - (-90.0 + 50.0 * 0.2)).abs() < 1e-3);
        assert!((camera.pitch() - 20.0 * 0.2).abs() < 1e-3);

        controller.process_button(false);
        controller.process_button(true);
        controller.process_cursor(900.0, 900.0);
        controller.update(&mut camera, 0.0);
        assert!((camera.yaw() - (-80.0)).abs() < 1e-3);
    }

    #[test]
    fn keys_map_to_directions() {
        assert_eq!(Direction::from_key(KeyCode::KeyW), Some(Direction::Forward));
        assert_eq!(Direction::from_key(KeyCode::ShiftLeft), Some(Direction::Down));
        assert_eq!(Direction::from_key(KeyCode::KeyQ), None);
    }
}
