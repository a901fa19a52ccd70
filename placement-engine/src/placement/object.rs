use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::tracking::pose::{ReferenceFrame, reproject_from_viewer};
use crate::tracking::session::SessionManager;

use super::state::PlacementState;

/// JSON catalog of placeable models. The asset boundary stays opaque: the
/// pipeline only ever hands a renderable a pose to sit at.
#[derive(Asset, TypePath, Debug, Clone, Serialize, Deserialize)]
pub struct PlaceableCatalog {
    pub placeables: Vec<PlaceableDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceableDefinition {
    pub name: String,
    /// Full extents in metres.
    pub size: [f32; 3],
    /// Linear RGB tint.
    pub colour: [f32; 3],
}

#[derive(Resource, Default)]
pub struct CatalogLoader {
    handle: Option<Handle<PlaceableCatalog>>,
    loaded: bool,
}

/// The one placed renderable. Kept spawned and hidden until a commit.
#[derive(Component)]
pub struct PlacedObject {
    /// Offset so the model sits flat on the surface rather than halfway in.
    pub half_height: f32,
}

pub fn start_catalog_load(mut loader: ResMut<CatalogLoader>, asset_server: Res<AssetServer>) {
    loader.handle = Some(asset_server.load("placeables.json"));
}

pub fn spawn_placed_object(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let size = constants::placement::DEFAULT_PLACEABLE_SIZE;
    let [r, g, b] = constants::placement::DEFAULT_PLACEABLE_COLOUR;
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::from_size(Vec3::splat(size)))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(r, g, b),
            ..default()
        })),
        Transform::default(),
        Visibility::Hidden,
        PlacedObject {
            half_height: size * 0.5,
        },
        Name::new("placed_object"),
    ));
}

/// Swap the fallback cube for the catalog's first entry once it has loaded.
pub fn apply_catalog_when_loaded(
    mut loader: ResMut<CatalogLoader>,
    catalogs: Res<Assets<PlaceableCatalog>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut query: Query<(
        &mut Mesh3d,
        &mut MeshMaterial3d<StandardMaterial>,
        &mut PlacedObject,
    )>,
) {
    if loader.loaded {
        return;
    }
    let Some(handle) = loader.handle.as_ref() else {
        return;
    };
    let Some(catalog) = catalogs.get(handle) else {
        return;
    };
    let Some(placeable) = catalog.placeables.first() else {
        warn!("placeable catalog is empty, keeping fallback cube");
        loader.loaded = true;
        return;
    };
    let Ok((mut mesh, mut material, mut object)) = query.single_mut() else {
        return;
    };

    let size = Vec3::from(placeable.size).max(Vec3::splat(0.001));
    let [r, g, b] = placeable.colour;
    mesh.0 = meshes.add(Cuboid::from_size(size));
    material.0 = materials.add(StandardMaterial {
        base_color: Color::srgb(r, g, b),
        ..default()
    });
    object.half_height = size.y * 0.5;
    loader.loaded = true;
    info!("placeable catalog loaded: {}", placeable.name);
}

/// Render binding: the object is drawn only at its fixed committed pose,
/// independent of further reticle movement. A pose committed in a
/// viewer-relative session stays anchored to the viewer, so it reprojects
/// through the viewer's current transform every frame.
pub fn update_placed_object(
    state: Res<PlacementState>,
    session: Res<SessionManager>,
    viewers: Query<&GlobalTransform, With<Camera3d>>,
    mut query: Query<(&mut Transform, &mut Visibility, &PlacedObject)>,
) {
    let Ok((mut transform, mut visibility, object)) = query.single_mut() else {
        return;
    };
    match state.committed_pose() {
        Some(pose) => {
            let mut target = pose.to_transform();
            target.translation += pose.up() * object.half_height;
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
