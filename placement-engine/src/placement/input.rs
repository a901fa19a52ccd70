use bevy::prelude::*;

use crate::tracking::pose::Pose;
use crate::tracking::session::EndSessionEvent;

use super::state::PlacementState;

/// Edge-triggered user request to freeze the reticle pose.
#[derive(Event, Debug, Clone, Copy)]
pub struct CommitPlacementEvent;

/// Edge-triggered user request to clear the committed pose.
#[derive(Event, Debug, Clone, Copy)]
pub struct ResetPlacementEvent;

/// Broadcast after the placement changed, for UI and RPC observers.
#[derive(Event, Debug, Clone)]
pub enum PlacementChangedEvent {
    Committed(Pose),
    CommitRejected,
    Reset,
}

/// Keyboard and mouse triggers for native builds: left click or Space
/// commits, R resets, Escape ends the session.
#[cfg(not(target_arch = "wasm32"))]
pub fn placement_keyboard_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut commits: EventWriter<CommitPlacementEvent>,
    mut resets: EventWriter<ResetPlacementEvent>,
    mut ends: EventWriter<EndSessionEvent>,
) {
    if mouse.just_pressed(MouseButton::Left) || keyboard.just_pressed(KeyCode::Space) {
        commits.write(CommitPlacementEvent);
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        resets.write(ResetPlacementEvent);
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        ends.write(EndSessionEvent);
    }
}

/// Placeholder for wasm builds where the hosting page drives placement over
/// RPC instead of device input.
#[cfg(target_arch = "wasm32")]
pub fn placement_keyboard_input() {}

pub fn apply_commit_events(
    mut events: EventReader<CommitPlacementEvent>,
    mut state: ResMut<PlacementState>,
    mut changed: EventWriter<PlacementChangedEvent>,
) {
    for _ in events.read() {
        match state.commit() {
            Ok(pose) => {
                info!("placement committed at {:?}", pose.position);
                changed.write(PlacementChangedEvent::Committed(pose));
            }
            Err(error) => {
                warn!("{error}");
                changed.write(PlacementChangedEvent::CommitRejected);
            }
        }
    }
}

pub fn apply_reset_events(
    mut events: EventReader<ResetPlacementEvent>,
    mut state: ResMut<PlacementState>,
    mut changed: EventWriter<PlacementChangedEvent>,
) {
    for _ in events.read() {
        state.reset();
        info!("placement reset");
        changed.write(PlacementChangedEvent::Reset);
    }
}
