//! Orbit camera around the garment.
//!
//! The camera sits on a sphere around `target` described by distance, pitch
//! and yaw. Dragging with the left mouse button rotates, the wheel zooms;
//! the distance is always kept inside [`OrbitBounds`].

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, Zero};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Studio framing: straight on, eight units away.
pub const DEFAULT_DISTANCE: f32 = 8.0;
pub const MIN_DISTANCE: f32 = 3.0;
pub const MAX_DISTANCE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitBounds {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for OrbitBounds {
    fn default() -> Self {
        Self {
            min_distance: MIN_DISTANCE,
            max_distance: MAX_DISTANCE,
            min_pitch: -std::f32::consts::FRAC_PI_2 + 0.01,
            max_pitch: std::f32::consts::FRAC_PI_2 - 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32, aspect: f32) -> Self {
        let bounds = OrbitBounds::default();
        let mut camera = Self {
            distance: distance.clamp(bounds.min_distance, bounds.max_distance),
            pitch: 0.0,
            yaw: 0.0,
            eye: Vector3::zero(),
            target: Vector3::zero(),
            up: Vector3::unit_y(),
            bounds,
            aspect,
            fovy: cgmath::Deg(45.0).into(),
            znear: 0.1,
            zfar: 1000.0,
        };
        camera.update();
        camera
    }

    pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        let proj = OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(self.bounds.min_distance, self.bounds.max_distance);
        self.update();
    }

    pub fn add_distance(&mut self, delta: f32) {
        self.set_distance(self.distance + delta);
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.pitch = (self.pitch + delta).clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.yaw += delta;
        self.update();
    }

    pub fn reset(&mut self, distance: f32) {
        self.pitch = 0.0;
        self.yaw = 0.0;
        self.target = Vector3::zero();
        self.set_distance(distance);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    fn update(&mut self) {
        self.eye = Vector3::new(
            self.distance * self.yaw.sin() * self.pitch.cos(),
            self.distance * self.pitch.sin(),
            self.distance * self.yaw.cos() * self.pitch.cos(),
        ) + self.target;
    }

    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.eye).normalize()
    }
}

/// Accumulates pointer input between frames.
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    rotate: (f32, f32),
    zoom: f32,
}

impl OrbitController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            dragging: false,
            last_cursor: None,
            rotate: (0.0, 0.0),
            zoom: 0.0,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last)) = (self.dragging, self.last_cursor) {
                    self.handle_mouse(position.x - last.x, position.y - last.y);
                }
                self.last_cursor = Some(*position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.dragging = false;
                self.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.zoom -= match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 50.0,
                };
            }
            _ => (),
        }
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate.0 += dx as f32;
        self.rotate.1 += dy as f32;
    }

    /// Apply everything accumulated since the last frame.
    pub fn update(&mut self, camera: &mut OrbitCamera, _dt: Duration) {
        let (dx, dy) = std::mem::take(&mut self.rotate);
        if dx != 0.0 {
            camera.add_yaw(-dx * self.rotate_speed);
        }
        if dy != 0.0 {
            camera.add_pitch(dy * self.rotate_speed);
        }
        let zoom = std::mem::take(&mut self.zoom);
        if zoom != 0.0 {
            camera.add_distance(zoom * self.zoom_speed);
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &OrbitCamera) {
        self.view_position = camera.eye.extend(1.0).into();
        self.view_proj = camera.build_view_projection_matrix().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: OrbitCamera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, aspect: f32) -> Self {
        let camera = OrbitCamera::new(DEFAULT_DISTANCE, aspect);
        let controller = OrbitController::new(0.005, 0.5);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera);

        let bind_group_layout = camera_layout(device);
        let buffer = mk_buffer(device, &uniform, "Camera Buffer");
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Apply pending input and push the matrices to the GPU.
    pub fn update(&mut self, queue: &wgpu::Queue, dt: Duration) {
        self.controller.update(&mut self.camera, dt);
        self.uniform.update_view_proj(&self.camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn camera_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

pub fn mk_buffer(device: &wgpu::Device, uniform: &CameraUniform, label: &str) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&[*uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some("camera_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn starts_eight_units_in_front_of_the_origin() {
        let camera = OrbitCamera::new(DEFAULT_DISTANCE, 16.0 / 9.0);
        assert_relative_eq!(camera.eye.x, 0.0);
        assert_relative_eq!(camera.eye.y, 0.0);
        assert_relative_eq!(camera.eye.z, 8.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = OrbitCamera::new(DEFAULT_DISTANCE, 1.0);
        camera.add_distance(100.0);
        assert_eq!(camera.distance, MAX_DISTANCE);
        camera.add_distance(-100.0);
        assert_eq!(camera.distance, MIN_DISTANCE);
    }

    #[test]
    fn accumulated_motion_becomes_yaw() {
        let mut camera = OrbitCamera::new(DEFAULT_DISTANCE, 1.0);
        let mut controller = OrbitController::new(0.01, 1.0);
        controller.handle_mouse(10.0, 0.0);
        controller.update(&mut camera, Duration::from_millis(16));
        assert_relative_eq!(camera.yaw, -0.1);
        // consumed
        controller.update(&mut camera, Duration::from_millis(16));
        assert_relative_eq!(camera.yaw, -0.1);
    }
}
