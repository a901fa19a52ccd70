//! Simulation rig around the pipeline: camera, lighting, and a faint
//! reference grid standing in for the real room. Pure collaborator; no
//! placement state lives here.

pub mod camera;

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;

use camera::{SimCamera, look_controller, spawn_camera};

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimCamera>()
            .add_systems(Startup, (spawn_camera, spawn_lighting, spawn_reference_grid))
            .add_systems(Update, look_controller);
    }
}

fn spawn_lighting(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

/// Faint line grid at floor height so the viewer can orient themselves.
fn spawn_reference_grid(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let half = constants::session::FLOOR_HALF_EXTENT;
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let lines = (half * 2.0) as i32 + 1;
    for i in 0..lines {
        let offset = -half + i as f32;
        positions.push([offset, 0.0, -half]);
        positions.push([offset, 0.0, half]);
        positions.push([-half, 0.0, offset]);
        positions.push([half, 0.0, offset]);
    }

    let mesh = Mesh::new(
        PrimitiveTopology::LineList,
        RenderAssetUsages::default(),
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions);

    commands.spawn((
        Mesh3d(meshes.add(mesh)),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgba(1.0, 1.0, 1.0, 0.25),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        })),
        Transform::IDENTITY,
        Name::new("reference_grid"),
    ));
}
