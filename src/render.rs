//! Render composition.
//!
//! Flows describe what they want drawn each frame with a [`Render`]. The
//! engine flattens the tree into a list of [`Instanced`] draws and records
//! them with [`draw`], both for the window surface and for offscreen
//! captures.

use crate::{
    context::Context,
    data_structures::model::{DrawMesh, GpuMesh},
};

/// One instanced draw: a mesh, the material bind group it is painted with,
/// and the instance buffer carrying its world transforms.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a GpuMesh,
    pub material: &'a wgpu::BindGroup,
    pub amount: usize,
    pub id: u32,
}

/// Specifies how a flow should be rendered.
///
/// - `None` renders nothing
/// - `Default(Instanced)` renders a single instanced primitive
/// - `Defaults(Vec<Instanced>)` renders a batch of primitives
/// - `Composed(Vec<Render>)` recursively renders a composition
pub enum Render<'a> {
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn flatten_into(self, out: &mut Vec<Instanced<'a>>) {
        match self {
            Render::None => (),
            Render::Default(instanced) => out.push(instanced),
            Render::Defaults(mut vec) => out.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.flatten_into(out)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Render::None => 0,
            Render::Default(_) => 1,
            Render::Defaults(vec) => vec.len(),
            Render::Composed(renders) => renders.iter().map(Render::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Record `draws` into `render_pass` with `pipeline`.
///
/// The camera bind group is passed separately so exports can draw with a
/// projection matching their own aspect ratio.
pub fn draw(
    ctx: &Context,
    render_pass: &mut wgpu::RenderPass<'_>,
    pipeline: &wgpu::RenderPipeline,
    camera_bind_group: &wgpu::BindGroup,
    draws: &[Instanced<'_>],
) {
    render_pass.set_pipeline(pipeline);
    for instanced in draws {
        if instanced.amount == 0 || instanced.instance.size() == 0 {
            log::warn!("you attemted to render something with zero instances");
            continue;
        }
        render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
        render_pass.draw_mesh_instanced(
            instanced.mesh,
            instanced.material,
            0..instanced.amount as u32,
            camera_bind_group,
            &ctx.light.bind_group,
        );
    }
}
