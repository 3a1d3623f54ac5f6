//! GLB decoding
//!
//! Turns a binary glTF into a [`LoadedAsset`]: the node hierarchy becomes the
//! skeleton, mesh nodes become mesh templates and every animation becomes a
//! clip whose tracks target node names.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation;

use super::LoadedAsset;
use crate::anim::{AnimationClip, Track};
use crate::error::AssetLoadError;
use crate::scene::{BoneTransform, MeshTemplate, SceneTemplate, Skeleton};

fn decode_error(key: &str, reason: impl ToString) -> AssetLoadError {
    AssetLoadError::Decode {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

/// Decode GLB bytes fetched for `key`.
pub fn decode(key: &str, bytes: &[u8]) -> Result<LoadedAsset, AssetLoadError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| decode_error(key, e))?;
    let buffers = gltf::import_buffers(&gltf.document, None, gltf.blob.clone())
        .map_err(|e| decode_error(key, e))?;
    let document = gltf.document;

    let (skeleton, meshes) = read_hierarchy(&document);

    let clips = document
        .animations()
        .enumerate()
        .map(|(i, animation)| {
            let name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Animation {i}"));
            read_clip(key, name, &animation, &buffers).map(Arc::new)
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::info!(
        "Decoded `{}`: {} bones, {} meshes, {} clips",
        key,
        skeleton.len(),
        meshes.len(),
        clips.len()
    );

    let scene_name = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .and_then(|s| s.name().map(str::to_string))
        .unwrap_or_else(|| key.to_string());

    Ok(LoadedAsset {
        key: key.to_string(),
        scene: SceneTemplate {
            name: scene_name,
            skeleton,
            meshes,
        },
        clips,
    })
}

/// Walk the scene depth-first so parents always precede their children.
fn read_hierarchy(document: &gltf::Document) -> (Skeleton, Vec<MeshTemplate>) {
    let roots: Vec<gltf::Node> = match document.default_scene().or_else(|| document.scenes().next())
    {
        Some(scene) => scene.nodes().collect(),
        None => {
            let children: Vec<usize> = document
                .nodes()
                .flat_map(|n| n.children().map(|c| c.index()).collect::<Vec<_>>())
                .collect();
            document
                .nodes()
                .filter(|n| !children.contains(&n.index()))
                .collect()
        }
    };

    let mut bones = Vec::new();
    let mut bone_of_node = HashMap::new();
    let mut mesh_nodes = Vec::new();
    let mut stack: Vec<(gltf::Node, Option<usize>)> =
        roots.into_iter().rev().map(|n| (n, None)).collect();

    while let Some((node, parent)) = stack.pop() {
        if bone_of_node.contains_key(&node.index()) {
            continue;
        }
        let index = bones.len();
        bone_of_node.insert(node.index(), index);

        let (translation, rotation, scale) = node.transform().decomposed();
        bones.push((
            node_name(&node),
            parent,
            BoneTransform {
                translation: Vec3::from(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from(scale),
            },
        ));

        if node.mesh().is_some() {
            mesh_nodes.push(node.clone());
        }
        let children: Vec<_> = node.children().collect();
        for child in children.into_iter().rev() {
            stack.push((child, Some(index)));
        }
    }

    let meshes = mesh_nodes
        .iter()
        .filter_map(|node| {
            let mesh = node.mesh()?;
            let joints = node
                .skin()
                .map(|skin| {
                    skin.joints()
                        .filter_map(|j| bone_of_node.get(&j.index()).copied())
                        .collect()
                })
                .unwrap_or_default();
            let material = mesh
                .primitives()
                .next()
                .and_then(|p| p.material().name().map(str::to_string))
                .unwrap_or_else(|| "default".to_string());
            Some(MeshTemplate {
                name: mesh
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| node_name(node)),
                node: bone_of_node.get(&node.index()).copied().unwrap_or(0),
                joints,
                material,
            })
        })
        .collect();

    (Skeleton::new(bones), meshes)
}

/// Cubic-spline outputs carry in-tangent, value, out-tangent per key.
fn key_values<T: Copy>(values: Vec<T>, interpolation: Interpolation) -> Vec<T> {
    match interpolation {
        Interpolation::CubicSpline => values.chunks(3).filter_map(|c| c.get(1).copied()).collect(),
        _ => values,
    }
}

fn read_clip(
    key: &str,
    name: String,
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
) -> Result<AnimationClip, AssetLoadError> {
    let mut tracks = Vec::new();

    for channel in animation.channels() {
        let bone = node_name(&channel.target().node());
        let interpolation = channel.sampler().interpolation();
        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

        let times: Vec<f32> = reader
            .read_inputs()
            .ok_or_else(|| decode_error(key, format!("channel on `{bone}` has no input times")))?
            .collect();
        let Some(outputs) = reader.read_outputs() else {
            return Err(decode_error(key, format!("channel on `{bone}` has no outputs")));
        };

        let track = match outputs {
            ReadOutputs::Translations(values) => Track::position(
                bone,
                times,
                key_values(values.map(Vec3::from).collect(), interpolation),
            ),
            ReadOutputs::Rotations(values) => Track::rotation(
                bone,
                times,
                key_values(
                    values.into_f32().map(Quat::from_array).collect(),
                    interpolation,
                ),
            ),
            ReadOutputs::Scales(values) => Track::scale(
                bone,
                times,
                key_values(values.map(Vec3::from).collect(), interpolation),
            ),
            // Morph target weights do not drive bones
            ReadOutputs::MorphTargetWeights(_) => continue,
        };
        tracks.push(track);
    }

    Ok(AnimationClip::new(name, tracks))
}
