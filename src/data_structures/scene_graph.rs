//! Scene graph of a garment.
//!
//! The graph is pure CPU data: a tree of nodes with local transforms, where
//! each node may carry primitives (a mesh index plus the surface material it
//! is painted with). GPU resources are created from it by
//! [`crate::viewport::garment::GarmentModel`] and addressed by the
//! depth-first order of primitives, which never changes after loading.

use crate::{data_structures::instance::Instance, material::SurfaceProperties};

/// Identifies an uploaded texture map.
///
/// Ids are the generation of the decode that produced the texture, so two
/// uploads of the same image still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// The appearance painted onto every primitive during a synchronization
/// pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub base_color: [f32; 4],
    pub surface: SurfaceProperties,
    pub map: Option<TextureId>,
}

/// Per-primitive material state.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMaterial {
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    pub map: Option<TextureId>,
    /// Set whenever the values changed and the GPU copy is stale.
    pub needs_update: bool,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            roughness: 1.0,
            metalness: 0.0,
            map: None,
            needs_update: true,
        }
    }
}

impl SurfaceMaterial {
    /// Overwrite every paintable property. There is no diffing: a paint
    /// always marks the material for upload.
    pub fn paint(&mut self, paint: &Paint) {
        self.base_color = paint.base_color;
        self.roughness = paint.surface.roughness;
        self.metalness = paint.surface.metalness;
        self.map = paint.map;
        self.needs_update = true;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Index into the mesh list the graph was loaded with.
    pub mesh: usize,
    pub material: SurfaceMaterial,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub local: Instance,
    pub primitives: Vec<Primitive>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Instance::default(),
            primitives: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, local: Instance) -> Self {
        self.local = local;
        self
    }

    pub fn with_primitive(mut self, mesh: usize, material: SurfaceMaterial) -> Self {
        self.primitives.push(Primitive { mesh, material });
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn is_mesh(&self) -> bool {
        !self.primitives.is_empty()
    }

    pub fn traverse<F: FnMut(&SceneNode)>(&self, f: &mut F) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    pub fn traverse_mut<F: FnMut(&mut SceneNode)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    fn collect_world_transforms(&self, parent: &Instance, out: &mut Vec<Instance>) {
        let world = parent * &self.local;
        out.extend(self.primitives.iter().map(|_| world.clone()));
        for child in &self.children {
            child.collect_world_transforms(&world, out);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    pub root: SceneNode,
}

impl SceneGraph {
    pub fn new(root: SceneNode) -> Self {
        Self { root }
    }

    /// Wrap several top-level nodes in an unnamed container.
    pub fn from_nodes(nodes: Vec<SceneNode>) -> Self {
        if nodes.len() == 1 {
            return Self::new(nodes.into_iter().next().unwrap_or_else(|| SceneNode::new("")));
        }
        let mut root = SceneNode::new("root");
        root.children = nodes;
        Self { root }
    }

    pub fn mesh_node_count(&self) -> usize {
        let mut count = 0;
        self.root.traverse(&mut |node| {
            if node.is_mesh() {
                count += 1;
            }
        });
        count
    }

    pub fn primitive_count(&self) -> usize {
        let mut count = 0;
        self.root
            .traverse(&mut |node| count += node.primitives.len());
        count
    }

    /// Primitives in depth-first order.
    pub fn primitives(&self) -> Vec<&Primitive> {
        fn collect<'a>(node: &'a SceneNode, out: &mut Vec<&'a Primitive>) {
            out.extend(node.primitives.iter());
            for child in &node.children {
                collect(child, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.root, &mut out);
        out
    }

    pub fn for_each_primitive_mut<F: FnMut(usize, &mut Primitive)>(&mut self, mut f: F) {
        let mut idx = 0;
        self.root.traverse_mut(&mut |node| {
            for primitive in node.primitives.iter_mut() {
                f(idx, primitive);
                idx += 1;
            }
        });
    }

    /// Walk every mesh node and paint each of its primitives. Returns the
    /// number of primitives painted.
    pub fn apply_paint(&mut self, paint: &Paint) -> usize {
        let mut painted = 0;
        self.for_each_primitive_mut(|_, primitive| {
            primitive.material.paint(paint);
            painted += 1;
        });
        painted
    }

    /// World transform of each primitive (depth-first order) when the graph
    /// is placed at `base`.
    pub fn world_transforms(&self, base: &Instance) -> Vec<Instance> {
        let mut out = Vec::with_capacity(self.primitive_count());
        self.root.collect_world_transforms(base, &mut out);
        out
    }
}
