use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::runtime::Tracking;

/// Features the placement pipeline needs from a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionFeature {
    /// Poses expressed against a floor-anchored reference space.
    FloorReference,
    /// Per-frame ray vs real-world-geometry queries.
    HitTest,
}

/// What the host tracking runtime supports, probed once at startup.
///
/// Immutable for the process lifetime. Absence of support is a normal,
/// representable outcome, not a failure.
#[derive(Resource, Debug, Clone)]
pub struct TrackingCapability {
    pub supported: bool,
    pub required_features: Vec<SessionFeature>,
}

impl TrackingCapability {
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            required_features: Vec::new(),
        }
    }
}

/// Startup system: query the runtime once and publish the result.
pub fn probe_capability(runtime: Res<Tracking>, mut commands: Commands) {
    let capability = runtime.0.probe();
    if capability.supported {
        info!(
            "tracking supported, required features: {:?}",
            capability.required_features
        );
    } else {
        warn!("AR tracking is not supported on this device");
    }
    commands.insert_resource(capability);
}
