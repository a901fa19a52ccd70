use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use crate::tracking::pose::{ReferenceFrame, reproject_from_viewer};
use crate::tracking::session::SessionManager;

use super::state::PlacementState;

#[derive(Component)]
pub struct Reticle;

pub fn spawn_reticle(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let [r, g, b, a] = constants::placement::RETICLE_COLOUR;
    commands.spawn((
        Mesh3d(meshes.add(Annulus::new(
            constants::placement::RETICLE_INNER_RADIUS,
            constants::placement::RETICLE_OUTER_RADIUS,
        ))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgba(r, g, b, a),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            cull_mode: None,
            ..default()
        })),
        Transform::default(),
        Visibility::Hidden,
        Reticle,
        Name::new("reticle"),
    ));
}

/// Render binding: pure read of the reticle pose. Drawn only while valid.
/// Viewer-relative poses are reprojected through the viewer before drawing.
pub fn update_reticle_visual(
    state: Res<PlacementState>,
    session: Res<SessionManager>,
    viewers: Query<&GlobalTransform, With<Camera3d>>,
    mut query: Query<(&mut Transform, &mut Visibility), With<Reticle>>,
) {
    let Ok((mut transform, mut visibility)) = query.single_mut() else {
        return;
    };
    match state.reticle_pose() {
        Some(pose) => {
            let mut target = pose.to_transform();
            target.translation += pose.up() * constants::placement::RETICLE_SURFACE_OFFSET;
            // The annulus mesh lies in the XY plane; lay it onto the surface.
            target.rotation *= Quat::from_rotation_x(-FRAC_PI_2);
            if session.reference_frame() == ReferenceFrame::ViewerRelative {
                let Ok(viewer) = viewers.single() else {
                    *visibility = Visibility::Hidden;
                    return;
                };
                target = reproject_from_viewer(target, viewer);
            }
            *transform = target;
            *visibility = Visibility::Visible;
        }
        None => *visibility = Visibility::Hidden,
    }
}
