use wgpu::util::DeviceExt;

/// Studio lighting as laid out in `garment.wgsl`.
///
/// Both lights are directional: the shader only uses the direction from the
/// origin towards the given position. `w` holds the intensity.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub ambient: [f32; 4],
    pub key: [f32; 4],
    pub fill: [f32; 4],
    pub color: [f32; 4],
}

impl LightUniform {
    pub fn studio() -> Self {
        Self {
            // rgb, intensity
            ambient: [1.0, 1.0, 1.0, 0.6],
            key: [10.0, 10.0, 5.0, 1.0],
            fill: [-10.0, -10.0, -5.0, 0.5],
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn ambient_intensity(&self) -> f32 {
        self.ambient[3]
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self::studio()
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
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
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn studio_lighting() {
        let light = LightUniform::studio();
        assert_eq!(light.ambient_intensity(), 0.6);
        assert_eq!(light.key, [10.0, 10.0, 5.0, 1.0]);
        assert_eq!(light.fill, [-10.0, -10.0, -5.0, 0.5]);
        assert_eq!(std::mem::size_of::<LightUniform>() % 16, 0);
    }
}
