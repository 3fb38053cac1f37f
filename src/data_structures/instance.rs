//! Per-primitive transforms.
//!
//! Every drawn primitive gets one instance: its world transform packed into
//! a small vertex buffer that the vertex shader reads with
//! `VertexStepMode::Instance`.

use std::ops::Mul;

use cgmath::{ElementWise, One};

use crate::data_structures::model;

/// Translation, rotation and (possibly non-uniform) scale, applied in
/// scale, rotate, translate order.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn uniform_scale(scale: f32) -> Self {
        Self {
            scale: cgmath::Vector3::new(scale, scale, scale),
            ..Self::new()
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
        }
    }
}

/// Parent * child: the child's transform expressed in the parent's space.
impl Mul<&Instance> for &Instance {
    type Output = Instance;

    fn mul(self, child: &Instance) -> Instance {
        Instance {
            position: self.position + self.rotation * self.scale.mul_element_wise(child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.mul_element_wise(child.scale),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU layout of an [`Instance`]: the model matrix followed by the normal
/// matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x3,
        10 => Float32x3,
        11 => Float32x3,
    ];
}

impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::Rotation3;

    use super::*;

    #[test]
    fn child_translation_is_scaled_and_rotated_by_the_parent() {
        let parent = Instance {
            rotation: cgmath::Quaternion::from_angle_y(cgmath::Deg(90.0)),
            ..Instance::uniform_scale(2.0)
        };
        let child = Instance {
            position: cgmath::Vector3::new(1.0, 0.0, 0.0),
            ..Instance::new()
        };
        let world = &parent * &child;
        assert_relative_eq!(world.position.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(world.position.z, -2.0, epsilon = 1e-5);
        assert_relative_eq!(world.scale.y, 2.0);
    }
}
