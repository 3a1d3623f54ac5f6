//! Loaded GLB assets, their cache and the file naming manifest.

mod cache;
pub mod glb;
mod manifest;

use std::sync::Arc;

pub use cache::ClipCache;
pub use manifest::{AssetManifest, ManifestEntry};

use crate::anim::AnimationClip;
use crate::scene::SceneTemplate;

/// Decoded asset: scene template plus its clips in file order.
///
/// Immutable once cached; consumers instantiate the template instead of
/// mutating it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAsset {
    pub key: String,
    pub scene: SceneTemplate,
    pub clips: Vec<Arc<AnimationClip>>,
}

impl LoadedAsset {
    pub fn clip_names(&self) -> Vec<String> {
        self.clips.iter().map(|c| c.name.clone()).collect()
    }

    /// Clip named `name`, or the first clip when no name is given.
    pub fn clip(&self, name: Option<&str>) -> Option<&Arc<AnimationClip>> {
        match name {
            Some(name) => self.clips.iter().find(|c| c.name == name),
            None => self.clips.first(),
        }
    }
}
