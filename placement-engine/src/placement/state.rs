use bevy::prelude::*;

use crate::tracking::error::NoValidSurface;
use crate::tracking::hit_test::{FrameHitResults, HitSample};
use crate::tracking::pose::{Pose, extract_pose};

/// User-visible phase of the placement pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementPhase {
    /// No surface under the viewer's ray; the reticle is hidden.
    Searching,
    /// A surface is tracked; the reticle follows it, nothing committed yet.
    Tracking,
    /// A pose has been committed; the reticle keeps tracking independently.
    Placed,
}

/// The single mutable record of the pipeline.
///
/// One writer context (the frame/session event source), any number of
/// read-only render consumers. `committed_pose` is only ever a copy of a
/// value previously held by `reticle_pose` at commit time.
#[derive(Resource, Debug, Default, Clone)]
pub struct PlacementState {
    session_active: bool,
    reticle_pose: Option<Pose>,
    committed_pose: Option<Pose>,
}

impl PlacementState {
    /// Frame tick: results\[0\] is the primary candidate; an empty set hides
    /// the reticle. Idempotent for identical input.
    pub fn on_frame(&mut self, results: &[HitSample]) {
        if !self.session_active {
            self.reticle_pose = None;
            return;
        }
        self.reticle_pose = results.first().map(extract_pose);
    }

    /// Freeze the reticle's current pose as the object pose.
    ///
    /// The copy is independent of future reticle updates. With no valid
    /// reticle this is a reported no-op.
    pub fn commit(&mut self) -> Result<Pose, NoValidSurface> {
        let pose = self.reticle_pose.ok_or(NoValidSurface)?;
        self.committed_pose = Some(pose);
        Ok(pose)
    }

    /// Clear the committed pose. Always succeeds.
    pub fn reset(&mut self) {
        self.committed_pose = None;
    }

    pub fn begin_session(&mut self) {
        self.session_active = true;
    }

    /// Tracking loss invalidates the reticle but leaves a placed object
    /// alone; re-validation on restart is the session policy's business.
    pub fn end_session(&mut self) {
        self.session_active = false;
        self.reticle_pose = None;
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    /// Render binding: current reticle pose, `None` while hidden.
    pub fn reticle_pose(&self) -> Option<Pose> {
        self.reticle_pose
    }

    /// Render binding: committed object pose, `None` while nothing placed.
    pub fn committed_pose(&self) -> Option<Pose> {
        self.committed_pose
    }

    pub fn phase(&self) -> PlacementPhase {
        if self.committed_pose.is_some() {
            PlacementPhase::Placed
        } else if self.reticle_pose.is_some() {
            PlacementPhase::Tracking
        } else {
            PlacementPhase::Searching
        }
    }
}

/// Whether a committed placement survives a session restart.
///
/// Platforms differ on this, so it is an explicit flag at the integration
/// boundary; the default keeps the placement.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PlacementPolicy {
    pub clear_on_session_restart: bool,
}

/// Frame tick: feed this frame's samples into the state machine. Ordered
/// after the sampler and before any render read.
pub fn apply_frame_hits(results: Res<FrameHitResults>, mut state: ResMut<PlacementState>) {
    state.on_frame(&results.samples);
}
