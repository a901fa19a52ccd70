use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;

/// Orientation of the handheld simulation camera.
#[derive(Resource)]
pub struct SimCamera {
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for SimCamera {
    fn default() -> Self {
        // Slightly downward so the floor enters the forward ray quickly.
        Self {
            yaw: 0.0,
            pitch: -0.45,
        }
    }
}

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, constants::session::EYE_HEIGHT, 0.0),
        Name::new("sim_camera"),
    ));
}

/// Handheld-device stand-in: hold right mouse to look, WASD to walk at eye
/// height. Moving the view is what gains and loses the floor under the ray.
pub fn look_controller(
    mut cameras: Query<&mut Transform, With<Camera3d>>,
    mut sim: ResMut<SimCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok(mut transform) = cameras.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        let yaw_sens = 0.0035;
        let pitch_sens = 0.0030;
        sim.yaw -= mouse_delta.x * yaw_sens;
        sim.pitch = (sim.pitch - mouse_delta.y * pitch_sens).clamp(-1.55, 1.55);
    }

    let rotation = Quat::from_euler(EulerRot::YXZ, sim.yaw, sim.pitch, 0.0);
    transform.rotation = rotation;

    let mut move_input = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        move_input.z -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        move_input.z += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        move_input.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        move_input.x -= 1.0;
    }

    if move_input != Vec3::ZERO {
        let planar = Quat::from_rotation_y(sim.yaw);
        let delta = planar * move_input.normalize() * 1.5 * time.delta_secs();
        transform.translation += delta;
        // Stay at eye height; the sim walks, it does not fly.
        transform.translation.y = constants::session::EYE_HEIGHT;
    }
}
