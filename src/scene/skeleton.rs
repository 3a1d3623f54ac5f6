use glam::{Mat4, Quat, Vec3};

use crate::anim::{Channel, TrackSample};

/// Local translation/rotation/scale of a bone relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl BoneTransform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// A node of the skeleton hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Parent bone index (None for roots). Parents precede children.
    pub parent: Option<usize>,
    /// Bind/rest transform from the asset
    pub rest: BoneTransform,
    /// Current animated transform
    pub local: BoneTransform,
}

/// Named bone hierarchy of one model instance.
///
/// Cloning a skeleton copies every bone, so two instances never share
/// mutable transform state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    /// Build from `(name, parent, rest)` triples. Parents must come first.
    pub fn new(bones: impl IntoIterator<Item = (String, Option<usize>, BoneTransform)>) -> Self {
        let bones = bones
            .into_iter()
            .map(|(name, parent, rest)| Bone {
                name,
                parent,
                rest,
                local: rest,
            })
            .collect();
        Self { bones }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.find(name).map(|i| &self.bones[i])
    }

    /// Put every bone back into its rest transform.
    pub fn reset_to_rest(&mut self) {
        for bone in &mut self.bones {
            bone.local = bone.rest;
        }
    }

    /// Blend a sampled channel into a bone with the given weight.
    ///
    /// Returns false when the skeleton has no bone with that name.
    pub fn blend(
        &mut self,
        bone: &str,
        channel: Channel,
        sample: TrackSample,
        weight: f32,
    ) -> bool {
        let Some(index) = self.find(bone) else {
            return false;
        };
        let local = &mut self.bones[index].local;
        match (channel, sample) {
            (Channel::Position, TrackSample::Vec3(v)) => {
                local.translation = local.translation.lerp(v, weight)
            }
            (Channel::Scale, TrackSample::Vec3(v)) => local.scale = local.scale.lerp(v, weight),
            (Channel::Rotation, TrackSample::Quat(q)) => {
                local.rotation = local.rotation.slerp(q, weight).normalize()
            }
            _ => return false,
        }
        true
    }

    /// Model-space matrix of every bone, in bone order.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            let local = bone.local.matrix();
            let matrix = match bone.parent {
                Some(parent) if parent < world.len() => world[parent] * local,
                _ => local,
            };
            world.push(matrix);
        }
        world
    }
}
