//! Tracking subsystem boundary: capability probe, session lifecycle, and the
//! per-frame hit-test sampler.
//!
//! Everything the placement pipeline knows about the platform tracker flows
//! through the [`runtime::TrackingRuntime`] seam: one capability query at
//! startup, a channel-backed asynchronous session request, and a termination
//! notification stream. Hit testing itself is frame-driven: while a session
//! is active the sampler intersects the viewer-forward ray with the
//! session's detected geometry and publishes an ordered sample list that is
//! overwritten every frame.

pub mod capability;
pub mod error;
pub mod hit_test;
pub mod pose;
pub mod runtime;
pub mod session;

use std::sync::Arc;

use bevy::prelude::*;

use crate::placement::state::{PlacementPolicy, PlacementState};

pub use capability::{SessionFeature, TrackingCapability};
pub use error::{NoValidSurface, SessionError};
pub use hit_test::{FrameHitResults, HitSample};
pub use pose::{Pose, ReferenceFrame, extract_pose};
pub use session::{
    ArSessionState, EndSessionEvent, SessionLifecycleEvent, SessionManager, SessionRequestEvent,
};

use capability::probe_capability;
use hit_test::{DetectedPlanes, PlaneAcquisition, acquire_floor_plane, sample_hit_tests};
use runtime::{SimulatedRuntime, Tracking, TrackingRuntime};
use session::{
    handle_end_session_requests, handle_session_requests, poll_session_request,
    register_end_stream, watch_session_end,
};

/// Frame ordering inside `Update`: session/sampler events apply before the
/// placement update, which applies before any render read.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementSet {
    Sample,
    Update,
    Render,
}

/// Registers the tracking boundary and the frame sampling loop.
pub struct TrackingPlugin {
    runtime: Arc<dyn TrackingRuntime>,
}

impl Default for TrackingPlugin {
    fn default() -> Self {
        Self::with_runtime(Arc::new(SimulatedRuntime::new()))
    }
}

impl TrackingPlugin {
    pub fn with_runtime(runtime: Arc<dyn TrackingRuntime>) -> Self {
        Self { runtime }
    }
}

impl Plugin for TrackingPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Tracking(self.runtime.clone()))
            .init_state::<ArSessionState>()
            .init_resource::<SessionManager>()
            .init_resource::<FrameHitResults>()
            .init_resource::<DetectedPlanes>()
            .init_resource::<PlaneAcquisition>()
            .init_resource::<PlacementState>()
            .init_resource::<PlacementPolicy>()
            .add_event::<SessionRequestEvent>()
            .add_event::<EndSessionEvent>()
            .add_event::<SessionLifecycleEvent>()
            .configure_sets(
                Update,
                (PlacementSet::Sample, PlacementSet::Update, PlacementSet::Render).chain(),
            )
            .add_systems(Startup, (probe_capability, register_end_stream))
            .add_systems(
                Update,
                (
                    handle_session_requests.run_if(in_state(ArSessionState::Idle)),
                    poll_session_request.run_if(in_state(ArSessionState::Requesting)),
                    handle_end_session_requests.run_if(in_state(ArSessionState::Active)),
                    watch_session_end,
                    acquire_floor_plane.run_if(in_state(ArSessionState::Active)),
                    sample_hit_tests.run_if(in_state(ArSessionState::Active)),
                )
                    .chain()
                    .in_set(PlacementSet::Sample),
            );
    }
}
