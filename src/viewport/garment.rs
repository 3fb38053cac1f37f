//! GPU mirror of the scene renderer.
//!
//! A [`GarmentModel`] holds one material and one instance buffer per
//! primitive, in the depth-first order of its scene graph. [`GpuScene`]
//! keeps the placeholder, the loaded model and the uploaded map, and pushes
//! the painted state of the active graph to the GPU before each frame.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::{GpuMaterial, GpuMesh},
        scene_graph::{SceneGraph, SurfaceMaterial, TextureId},
        texture::Texture,
    },
    render::{Instanced, Render},
    resources::mesh::MeshData,
    viewport::{SceneRenderer, tracker::LoadTicket},
};

#[derive(Debug)]
pub struct GarmentModel {
    meshes: Vec<GpuMesh>,
    /// Per primitive, depth-first.
    primitive_meshes: Vec<usize>,
    materials: Vec<GpuMaterial>,
    instances: Vec<wgpu::Buffer>,
}

impl GarmentModel {
    pub fn upload(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        white: &Texture,
        graph: &SceneGraph,
        meshes: &[MeshData],
    ) -> Self {
        let gpu_meshes: Vec<GpuMesh> = meshes
            .iter()
            .map(|mesh| GpuMesh::upload(device, mesh))
            .collect();

        let transforms = graph.world_transforms(&Instance::new());
        let mut primitive_meshes = Vec::new();
        let mut materials = Vec::new();
        let mut instances = Vec::new();
        for (idx, (primitive, transform)) in graph.primitives().into_iter().zip(transforms).enumerate() {
            let name = meshes
                .get(primitive.mesh)
                .map(|mesh| mesh.name.as_str())
                .unwrap_or("garment");
            // the map is bound on the first write, once it exists on the GPU
            let unmapped = SurfaceMaterial {
                map: None,
                ..primitive.material.clone()
            };
            materials.push(GpuMaterial::new(device, layout, name, &unmapped, white));
            instances.push(
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Instance Buffer {idx}")),
                    contents: bytemuck::cast_slice(&[transform.to_raw()]),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                }),
            );
            primitive_meshes.push(primitive.mesh);
        }

        Self {
            meshes: gpu_meshes,
            primitive_meshes,
            materials,
            instances,
        }
    }

    pub fn primitive_count(&self) -> usize {
        self.materials.len()
    }

    /// Push painted materials and the current world transforms.
    fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        graph: &mut SceneGraph,
        root: &Instance,
        map: Option<(TextureId, &Texture)>,
        white: &Texture,
    ) {
        let materials = &mut self.materials;
        graph.for_each_primitive_mut(|idx, primitive| {
            if !primitive.material.needs_update {
                return;
            }
            let Some(gpu) = materials.get_mut(idx) else {
                return;
            };
            match (primitive.material.map, map) {
                (Some(wanted), Some((id, texture))) if wanted == id => {
                    gpu.write(device, queue, layout, &primitive.material, texture)
                }
                _ => {
                    let unmapped = SurfaceMaterial {
                        map: None,
                        ..primitive.material.clone()
                    };
                    gpu.write(device, queue, layout, &unmapped, white)
                }
            }
            primitive.material.needs_update = false;
        });

        for (buffer, transform) in self.instances.iter().zip(graph.world_transforms(root)) {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[transform.to_raw()]));
        }
    }

    pub fn render(&self) -> Render<'_> {
        Render::Defaults(
            self.primitive_meshes
                .iter()
                .zip(self.materials.iter().zip(self.instances.iter()))
                .enumerate()
                .filter_map(|(idx, (mesh, (material, instance)))| {
                    Some(Instanced {
                        instance,
                        mesh: self.meshes.get(*mesh)?,
                        material: &material.bind_group,
                        amount: 1,
                        id: idx as u32,
                    })
                })
                .collect(),
        )
    }
}

#[derive(Debug)]
pub struct GpuScene {
    white: Texture,
    placeholder: GarmentModel,
    model: Option<(LoadTicket, GarmentModel)>,
    map: Option<(TextureId, Texture)>,
}

impl GpuScene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        scene: &SceneRenderer,
    ) -> Self {
        let white = Texture::create_solid(device, queue, [255, 255, 255, 255], "blank map");
        let placeholder = GarmentModel::upload(
            device,
            layout,
            &white,
            &scene.placeholder,
            &SceneRenderer::placeholder_meshes(),
        );
        Self {
            white,
            placeholder,
            model: None,
            map: None,
        }
    }

    pub fn upload_model(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        scene: &SceneRenderer,
        meshes: &[MeshData],
    ) {
        let (Some(ticket), Some(model)) = (scene.model_ticket(), scene.model()) else {
            return;
        };
        let garment = GarmentModel::upload(device, layout, &self.white, &model.graph, meshes);
        log::info!(
            "Uploaded {} ({} primitives)",
            model.source,
            garment.primitive_count()
        );
        self.model = Some((ticket, garment));
    }

    pub fn upload_map(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: TextureId,
        image: &image::DynamicImage,
    ) {
        let texture = Texture::from_image(device, queue, image, Some("garment map"));
        self.map = Some((id, texture));
    }

    /// Drop GPU copies the scene no longer references and write the active
    /// graph. Every material is rewritten when the map changed.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        scene: &mut SceneRenderer,
    ) {
        if self.model.as_ref().map(|(ticket, _)| *ticket) != scene.model_ticket() {
            self.model = None;
        }
        if self.map.as_ref().map(|(id, _)| *id) != scene.map() {
            self.map = None;
        }

        let root = scene.root_transform();
        let shows_model = scene.shows_model();
        let Some(graph) = scene.active_graph_mut() else {
            return;
        };
        let garment = if shows_model {
            match &mut self.model {
                Some((_, garment)) => garment,
                None => return,
            }
        } else {
            &mut self.placeholder
        };
        let map = self.map.as_ref().map(|(id, texture)| (*id, texture));
        garment.write(device, queue, layout, graph, &root, map, &self.white);
    }

    pub fn render(&self, scene: &SceneRenderer) -> Render<'_> {
        if scene.active_graph().is_none() {
            return Render::None;
        }
        if scene.shows_model() {
            match &self.model {
                Some((_, garment)) => garment.render(),
                None => Render::None,
            }
        } else {
            self.placeholder.render()
        }
    }
}
