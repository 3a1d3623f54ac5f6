//! Track filter
//!
//! Strips channels that would displace the avatar from its anchor before a
//! one-shot clip is played on it.

use regex::{Regex, RegexBuilder};

use super::clip::{AnimationClip, Channel, Track};
use crate::config::FilterPolicy;
use crate::error::ConfigError;

/// Compiled form of [`FilterPolicy`].
#[derive(Debug, Clone)]
pub struct TrackFilter {
    root: Regex,
    /// Present only under the strict policy
    stabilizers: Option<Regex>,
}

impl TrackFilter {
    pub fn new(policy: &FilterPolicy) -> Result<Self, ConfigError> {
        let root = RegexBuilder::new(&policy.root_pattern)
            .case_insensitive(true)
            .build()?;
        let stabilizers = if policy.strip_stabilizers {
            Some(
                RegexBuilder::new(&policy.stabilizer_pattern)
                    .case_insensitive(true)
                    .build()?,
            )
        } else {
            None
        };
        Ok(Self { root, stabilizers })
    }

    pub fn is_root(&self, bone: &str) -> bool {
        self.root.is_match(bone)
    }

    /// Whether a track survives filtering.
    pub fn keeps(&self, track: &Track) -> bool {
        if track.channel == Channel::Position {
            return false;
        }
        if track.channel == Channel::Rotation && self.is_root(&track.bone) {
            return false;
        }
        match &self.stabilizers {
            Some(pattern) => !pattern.is_match(&track.bone),
            None => true,
        }
    }

    /// Return a copy of `clip` without displacing tracks.
    ///
    /// A clip left without tracks becomes a zero-length no-op that still
    /// finishes, so callers waiting on completion are not stranded.
    pub fn filter(&self, clip: &AnimationClip) -> AnimationClip {
        let tracks: Vec<Track> = clip
            .tracks
            .iter()
            .filter(|t| self.keeps(t))
            .cloned()
            .collect();

        let removed = clip.tracks.len() - tracks.len();
        if removed > 0 {
            log::debug!(
                "Filtered {} of {} tracks from `{}`",
                removed,
                clip.tracks.len(),
                clip.name
            );
        }

        let duration = if tracks.is_empty() { 0.0 } else { clip.duration };
        AnimationClip {
            name: clip.name.clone(),
            duration,
            tracks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use wasm_bindgen_test::*;

    const BONES: [&str; 12] = [
        "Hips",
        "mixamorigHips",
        "Root",
        "CharacterArmature",
        "Spine",
        "Neck",
        "Head",
        "LeftShoulder",
        "RightArm",
        "LeftUpLeg",
        "RightFoot",
        "RightHandIndex1",
    ];

    fn random_clip(rng: &mut StdRng) -> AnimationClip {
        let count = rng.random_range(0..24);
        let tracks = (0..count)
            .map(|_| {
                let bone = BONES[rng.random_range(0..BONES.len())];
                let times = vec![0.0, rng.random_range(0.1..2.0)];
                match rng.random_range(0..3) {
                    0 => Track::position(bone, times, vec![Vec3::ZERO, Vec3::X]),
                    1 => Track::rotation(
                        bone,
                        times,
                        vec![Quat::IDENTITY, Quat::from_rotation_z(0.3)],
                    ),
                    _ => Track::scale(bone, times, vec![Vec3::ONE, Vec3::splat(1.1)]),
                }
            })
            .collect();
        AnimationClip::new("random", tracks)
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_default_root_pattern() {
        let filter = TrackFilter::new(&FilterPolicy::default()).unwrap();
        for root in ["Hips", "hips", "mixamorigHips", "mixamorig:Hips", "Root", "Character_01"] {
            assert!(filter.is_root(root), "{} should be a root bone", root);
        }
        for bone in ["Spine", "Head", "LeftUpLeg", "RightHand"] {
            assert!(!filter.is_root(bone), "{} should not be a root bone", bone);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_filter_is_idempotent_and_strips_displacement() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for policy in [FilterPolicy::default(), FilterPolicy::strict()] {
            let filter = TrackFilter::new(&policy).unwrap();
            for _ in 0..200 {
                let clip = random_clip(&mut rng);
                let once = filter.filter(&clip);
                let twice = filter.filter(&once);
                assert_eq!(once, twice);

                for track in &once.tracks {
                    assert_ne!(track.channel, Channel::Position);
                    assert!(
                        !(track.channel == Channel::Rotation && filter.is_root(&track.bone)),
                        "root rotation on {} survived",
                        track.bone
                    );
                }
            }
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_strict_policy_drops_stabilizers() {
        let clip = AnimationClip::new(
            "nod",
            vec![
                Track::rotation("Head", vec![0.0, 1.0], vec![Quat::IDENTITY; 2]),
                Track::rotation("Spine1", vec![0.0, 1.0], vec![Quat::IDENTITY; 2]),
                Track::rotation("LeftUpLeg", vec![0.0, 1.0], vec![Quat::IDENTITY; 2]),
                Track::rotation("RightShoulder", vec![0.0, 1.0], vec![Quat::IDENTITY; 2]),
            ],
        );

        let relaxed = TrackFilter::new(&FilterPolicy::default()).unwrap();
        assert_eq!(relaxed.filter(&clip).tracks.len(), 4);

        let strict = TrackFilter::new(&FilterPolicy::strict()).unwrap();
        let kept: Vec<_> = strict
            .filter(&clip)
            .tracks
            .into_iter()
            .map(|t| t.bone)
            .collect();
        assert_eq!(kept, vec!["Head".to_string()]);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_fully_stripped_clip_has_zero_duration() {
        let clip = AnimationClip::new(
            "slide",
            vec![Track::position("Hips", vec![0.0, 2.0], vec![Vec3::ZERO, Vec3::Z])],
        );
        let filtered = TrackFilter::new(&FilterPolicy::default())
            .unwrap()
            .filter(&clip);
        assert!(filtered.is_empty());
        assert_eq!(filtered.duration, 0.0);
    }
}
