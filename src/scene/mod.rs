//! Scene graph
//!
//! Holds the model instances that can be drawn. The avatar core only ever
//! mounts two kinds of node: the persistent base avatar and at most one
//! transient external model. GPU-side resources are represented by handles
//! counted in a [`ResourceLedger`], so a leaked model is visible in tests.

pub mod skeleton;

use std::collections::BTreeMap;

use glam::{Mat4, Quat, Vec3};

pub use skeleton::*;

use crate::config::ModelTransform;

/// Immutable scene description decoded from an asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneTemplate {
    pub name: String,
    pub skeleton: Skeleton,
    pub meshes: Vec<MeshTemplate>,
}

/// A (possibly skinned) mesh node in a template.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTemplate {
    pub name: String,
    /// Bone the mesh hangs off
    pub node: usize,
    /// Skin joints as bone indices; empty for rigid meshes
    pub joints: Vec<usize>,
    pub material: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(u64);

/// Per-instance mesh with its own geometry and material resources.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    pub name: String,
    pub node: usize,
    pub joints: Vec<usize>,
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
}

/// Root transform of a model; rotation is Euler XYZ in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootTransform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl From<ModelTransform> for RootTransform {
    fn from(t: ModelTransform) -> Self {
        Self {
            position: t.position,
            rotation: t.rotation,
            scale: t.scale,
        }
    }
}

impl RootTransform {
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            glam::EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// A drawable instance of a [`SceneTemplate`].
#[derive(Debug)]
pub struct Model {
    id: ModelId,
    pub label: String,
    pub transform: RootTransform,
    /// Home position the pose controller bobs around
    pub anchor: Vec3,
    pub skeleton: Skeleton,
    pub meshes: Vec<MeshInstance>,
    pub visible: bool,
}

impl Model {
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Reset the root transform and anchor to fixed constants.
    pub fn place(&mut self, transform: ModelTransform) {
        self.transform = transform.into();
        self.anchor = transform.position;
    }
}

/// Live GPU resource counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceLedger {
    pub geometries: usize,
    pub materials: usize,
    next_handle: u64,
}

impl ResourceLedger {
    fn allocate(&mut self) -> (GeometryHandle, MaterialHandle) {
        self.next_handle += 1;
        self.geometries += 1;
        self.materials += 1;
        (
            GeometryHandle(self.next_handle),
            MaterialHandle(self.next_handle),
        )
    }

    fn release(&mut self, mesh: &MeshInstance) {
        let _ = (mesh.geometry, mesh.material);
        self.geometries = self.geometries.saturating_sub(1);
        self.materials = self.materials.saturating_sub(1);
    }
}

/// The set of models currently mounted for rendering.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<ModelId, Model>,
    next_id: u64,
    ledger: ResourceLedger,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skeleton-aware deep clone of a template into a fresh, unmounted model.
    pub fn instantiate(&mut self, template: &SceneTemplate, label: impl Into<String>) -> Model {
        self.next_id += 1;
        let meshes = template
            .meshes
            .iter()
            .map(|mesh| {
                let (geometry, material) = self.ledger.allocate();
                MeshInstance {
                    name: mesh.name.clone(),
                    node: mesh.node,
                    joints: mesh.joints.clone(),
                    geometry,
                    material,
                }
            })
            .collect();

        let transform = RootTransform::from(ModelTransform::default());
        Model {
            id: ModelId(self.next_id),
            label: label.into(),
            transform,
            anchor: transform.position,
            skeleton: template.skeleton.clone(),
            meshes,
            visible: true,
        }
    }

    pub fn add(&mut self, model: Model) -> ModelId {
        let id = model.id;
        self.nodes.insert(id, model);
        id
    }

    pub fn remove(&mut self, id: ModelId) -> Option<Model> {
        self.nodes.remove(&id)
    }

    /// Release the geometry and material of a model that left the scene.
    pub fn dispose(&mut self, model: Model) {
        for mesh in &model.meshes {
            self.ledger.release(mesh);
        }
        log::debug!("Disposed model {:?} ({})", model.id, model.label);
    }

    /// Remove and dispose in one step.
    pub fn remove_and_dispose(&mut self, id: ModelId) -> bool {
        match self.remove(id) {
            Some(model) => {
                self.dispose(model);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: ModelId) -> Option<&Model> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: ModelId) -> Option<&mut Model> {
        self.nodes.get_mut(&id)
    }

    pub fn set_visible(&mut self, id: ModelId, visible: bool) {
        if let Some(model) = self.nodes.get_mut(&id) {
            model.visible = visible;
        }
    }

    pub fn traverse(&self) -> impl Iterator<Item = &Model> {
        self.nodes.values()
    }

    pub fn visible_models(&self) -> impl Iterator<Item = &Model> {
        self.nodes.values().filter(|m| m.visible)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ledger(&self) -> ResourceLedger {
        self.ledger
    }
}
