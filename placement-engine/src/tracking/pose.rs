use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::hit_test::HitSample;

/// Coordinate space hit poses are interpreted against.
///
/// Chosen once per session at request time; all pose math for a session uses
/// exactly one reference frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceFrame {
    /// Poses expressed against the detected floor anchor (world space).
    #[default]
    FloorRelative,
    /// Poses expressed relative to the viewer at sample time.
    ViewerRelative,
}

/// A position plus optional orientation in the session's reference frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Option<Quat>,
}

impl Pose {
    pub fn to_transform(&self) -> Transform {
        Transform {
            translation: self.position,
            rotation: self.orientation.unwrap_or(Quat::IDENTITY),
            scale: Vec3::ONE,
        }
    }

    /// Surface normal implied by the pose orientation (local +Y).
    pub fn up(&self) -> Vec3 {
        self.orientation.map_or(Vec3::Y, |q| q * Vec3::Y)
    }
}

/// The single canonical conversion from a raw hit transform to a `Pose`.
///
/// Always routed through `Transform::from_matrix`; nothing in this crate
/// reads matrix columns directly, so pose semantics stay independent of the
/// runtime's transform representation.
pub fn extract_pose(sample: &HitSample) -> Pose {
    let transform = Transform::from_matrix(sample.raw_transform);
    Pose {
        position: transform.translation,
        orientation: Some(transform.rotation),
    }
}

/// Express a viewer-relative transform in world space using the viewer's
/// current transform. Floor-relative poses are world space already and never
/// pass through here.
pub fn reproject_from_viewer(local: Transform, viewer: &GlobalTransform) -> Transform {
    Transform::from_matrix(viewer.compute_matrix() * local.compute_matrix())
}
