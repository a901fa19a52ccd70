use bevy::prelude::*;

use super::pose::ReferenceFrame;
use super::session::SessionManager;

/// One candidate surface intersection for the current frame.
///
/// Carries the runtime's raw transform representation; pose semantics are
/// recovered exclusively through `pose::extract_pose`.
#[derive(Debug, Clone, Copy)]
pub struct HitSample {
    pub raw_transform: Mat4,
    pub distance: f32,
}

/// The current frame's ordered hit samples, nearest first.
///
/// Overwritten every frame; samples are never retained past the frame
/// boundary. Empty is a normal, expected result.
#[derive(Resource, Default)]
pub struct FrameHitResults {
    pub samples: Vec<HitSample>,
}

/// A bounded horizontal surface the tracker has anchored.
#[derive(Debug, Clone, Copy)]
pub struct DetectedPlane {
    pub center: Vec3,
    pub normal: Vec3,
    pub half_extents: Vec2,
}

impl DetectedPlane {
    pub fn floor(half_extent: f32) -> Self {
        Self {
            center: Vec3::ZERO,
            normal: Vec3::Y,
            half_extents: Vec2::splat(half_extent),
        }
    }

    /// Orthonormal in-plane axes for the extent check.
    fn tangent_basis(&self) -> (Vec3, Vec3) {
        let u = self.normal.any_orthonormal_vector();
        (u, self.normal.cross(u))
    }
}

/// Surface geometry known to the active session. Cleared on session end;
/// tracking data does not outlive its session.
#[derive(Resource, Default)]
pub struct DetectedPlanes {
    pub planes: Vec<DetectedPlane>,
}

/// Warm-up before the simulated tracker anchors the floor plane.
#[derive(Resource)]
pub struct PlaneAcquisition {
    pub timer: Timer,
}

impl Default for PlaneAcquisition {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(
                constants::session::PLANE_ACQUISITION_SECS,
                TimerMode::Once,
            ),
        }
    }
}

/// Ray vs bounded plane intersection, returns distance along the ray.
pub fn ray_plane_hit(origin: Vec3, direction: Vec3, plane: &DetectedPlane) -> Option<f32> {
    let denom = direction.dot(plane.normal);
    if denom.abs() < 1e-4 {
        return None;
    }
    let t = (plane.center - origin).dot(plane.normal) / denom;
    if t <= 0.0 {
        return None;
    }
    let local = origin + direction * t - plane.center;
    let (u, v) = plane.tangent_basis();
    if local.dot(u).abs() > plane.half_extents.x || local.dot(v).abs() > plane.half_extents.y {
        return None;
    }
    Some(t)
}

/// Anchor the floor plane once the scan warm-up has elapsed.
pub fn acquire_floor_plane(
    time: Res<Time>,
    mut acquisition: ResMut<PlaneAcquisition>,
    mut planes: ResMut<DetectedPlanes>,
) {
    if !planes.planes.is_empty() {
        return;
    }
    acquisition.timer.tick(time.delta());
    if acquisition.timer.just_finished() {
        planes
            .planes
            .push(DetectedPlane::floor(constants::session::FLOOR_HALF_EXTENT));
        info!("floor plane anchored");
    }
}

/// Per-frame hit-test query: viewer-forward ray against detected geometry.
///
/// Results are ordered by the distance heuristic, nearest first; index 0 is
/// the primary candidate and no re-ranking happens downstream.
pub fn sample_hit_tests(
    session: Res<SessionManager>,
    cameras: Query<(&GlobalTransform, &Camera), With<Camera3d>>,
    planes: Res<DetectedPlanes>,
    mut results: ResMut<FrameHitResults>,
) {
    results.samples.clear();

    let Ok((camera_transform, camera)) = cameras.single() else {
        return;
    };
    let (origin, direction) = viewer_forward_ray(camera, camera_transform);

    for plane in &planes.planes {
        let Some(t) = ray_plane_hit(origin, direction, plane) else {
            continue;
        };
        let point = origin + direction * t;
        let rotation = Quat::from_rotation_arc(Vec3::Y, plane.normal);
        let mut raw_transform = Mat4::from_rotation_translation(rotation, point);
        if session.reference_frame() == ReferenceFrame::ViewerRelative {
            raw_transform = camera_transform.compute_matrix().inverse() * raw_transform;
        }
        results.samples.push(HitSample {
            raw_transform,
            distance: t,
        });
    }

    results
        .samples
        .sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

/// Screen-centre ray when a viewport exists, transform forward otherwise.
fn viewer_forward_ray(camera: &Camera, camera_transform: &GlobalTransform) -> (Vec3, Vec3) {
    if let Some(size) = camera.logical_viewport_size() {
        if let Ok(ray) = camera.viewport_to_world(camera_transform, size * 0.5) {
            return (ray.origin, *ray.direction);
        }
    }
    let transform = camera_transform.compute_transform();
    (transform.translation, *transform.forward())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::pose::{extract_pose, reproject_from_viewer};
    use approx::assert_relative_eq;
    use bevy::ecs::system::RunSystemOnce;

    fn floor() -> DetectedPlane {
        DetectedPlane::floor(5.0)
    }

    #[test]
    fn downward_ray_hits_floor() {
        let t = ray_plane_hit(Vec3::new(0.5, 2.0, -1.0), -Vec3::Y, &floor());
        assert_relative_eq!(t.expect("hit"), 2.0);
    }

    #[test]
    fn ray_pointing_away_misses() {
        assert!(ray_plane_hit(Vec3::new(0.0, 2.0, 0.0), Vec3::Y, &floor()).is_none());
    }

    #[test]
    fn parallel_ray_misses() {
        assert!(ray_plane_hit(Vec3::new(0.0, 2.0, 0.0), Vec3::X, &floor()).is_none());
    }

    #[test]
    fn hit_outside_plane_extents_misses() {
        let origin = Vec3::new(20.0, 2.0, 0.0);
        assert!(ray_plane_hit(origin, -Vec3::Y, &floor()).is_none());
    }

    #[test]
    fn viewer_relative_samples_reproject_back_to_world() {
        let mut world = World::new();
        world.insert_resource(SessionManager::with_reference_frame(
            ReferenceFrame::ViewerRelative,
        ));
        world.init_resource::<FrameHitResults>();
        world.insert_resource(DetectedPlanes {
            planes: vec![floor()],
        });
        let camera =
            Transform::from_xyz(0.0, 1.6, 0.0).looking_at(Vec3::new(0.0, 0.0, -2.0), Vec3::Y);
        world.spawn((Camera3d::default(), Camera::default(), GlobalTransform::from(camera)));

        world
            .run_system_once(sample_hit_tests)
            .expect("system runs");

        let results = world.resource::<FrameHitResults>();
        let sample = results.samples.first().expect("floor hit");
        assert_relative_eq!(sample.distance, Vec3::new(0.0, 1.6, 2.0).length(), epsilon = 1e-4);

        // The raw transform is camera-local; reprojection restores the world
        // point on the floor.
        let pose = extract_pose(sample);
        let drawn = reproject_from_viewer(pose.to_transform(), &GlobalTransform::from(camera));
        assert_relative_eq!(drawn.translation.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(drawn.translation.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(drawn.translation.z, -2.0, epsilon = 1e-4);
    }

    #[test]
    fn nearer_plane_wins_ordering() {
        let low = floor();
        let high = DetectedPlane {
            center: Vec3::new(0.0, 1.0, 0.0),
            normal: Vec3::Y,
            half_extents: Vec2::splat(5.0),
        };
        let origin = Vec3::new(0.0, 3.0, 0.0);
        let t_low = ray_plane_hit(origin, -Vec3::Y, &low).expect("hit");
        let t_high = ray_plane_hit(origin, -Vec3::Y, &high).expect("hit");
        assert!(t_high < t_low);
    }
}
