//! Placement state machine and its render binding.
//!
//! One resource ([`state::PlacementState`]) holds the reticle pose and the
//! committed object pose. Frame samples drive the reticle continuously; an
//! explicit commit copies the reticle pose into the committed pose and the
//! two stay decoupled from then on, so re-placement is always possible.

pub mod input;
pub mod object;
pub mod reticle;
pub mod state;
#[cfg(not(target_arch = "wasm32"))]
pub mod ui;

use bevy::prelude::*;

use crate::tracking::PlacementSet;

pub use input::{CommitPlacementEvent, PlacementChangedEvent, ResetPlacementEvent};
pub use object::PlaceableCatalog;
pub use state::{PlacementPhase, PlacementPolicy, PlacementState};

use input::{apply_commit_events, apply_reset_events, placement_keyboard_input};
use object::{
    CatalogLoader, apply_catalog_when_loaded, spawn_placed_object, start_catalog_load,
    update_placed_object,
};
use reticle::{spawn_reticle, update_reticle_visual};
#[cfg(not(target_arch = "wasm32"))]
use ui::{spawn_placement_ui, start_button_interaction, update_status_text};

/// Registers placement state, user triggers, and the reticle/object visuals.
pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacementState>()
            .init_resource::<PlacementPolicy>()
            .init_resource::<CatalogLoader>()
            .add_event::<CommitPlacementEvent>()
            .add_event::<ResetPlacementEvent>()
            .add_event::<PlacementChangedEvent>()
            .add_systems(
                Startup,
                (spawn_reticle, spawn_placed_object, start_catalog_load),
            )
            .add_systems(
                Update,
                (
                    placement_keyboard_input,
                    state::apply_frame_hits,
                    apply_commit_events,
                    apply_reset_events,
                )
                    .chain()
                    .in_set(PlacementSet::Update),
            )
            .add_systems(
                Update,
                (
                    update_reticle_visual,
                    update_placed_object,
                    apply_catalog_when_loaded,
                )
                    .in_set(PlacementSet::Render),
            );

        // Status overlay is native-only; the wasm shell owns its own UI.
        #[cfg(not(target_arch = "wasm32"))]
        {
            app.add_systems(Startup, spawn_placement_ui).add_systems(
                Update,
                (start_button_interaction, update_status_text).in_set(PlacementSet::Render),
            );
        }
    }
}
