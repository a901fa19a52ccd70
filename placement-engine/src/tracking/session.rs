use bevy::prelude::*;
use crossbeam_channel::{Receiver, TryRecvError};

use crate::placement::state::{PlacementPolicy, PlacementState};

use super::capability::TrackingCapability;
use super::error::SessionError;
use super::hit_test::{DetectedPlanes, FrameHitResults, PlaneAcquisition};
use super::pose::ReferenceFrame;
use super::runtime::{SessionEndReason, SessionEnded, SessionHandle, Tracking};

/// Application-level session lifecycle.
///
/// `Requesting` suspends on the runtime's reply channel; every other
/// transition is frame-synchronous. A failed or ended session returns to
/// `Idle`, from which a new request may be issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, States)]
pub enum ArSessionState {
    #[default]
    Idle,
    Requesting,
    Active,
}

/// Ask the session manager to start a tracking session.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct SessionRequestEvent {
    pub reference_frame: ReferenceFrame,
}

/// Ask the session manager to stop the active session.
#[derive(Event, Debug, Clone, Copy)]
pub struct EndSessionEvent;

/// Broadcast after the session lifecycle changed, for UI and RPC observers.
#[derive(Event, Debug, Clone)]
pub enum SessionLifecycleEvent {
    Started,
    Failed(SessionError),
    Ended(SessionEndReason),
}

struct PendingRequest {
    reply: Receiver<Result<SessionHandle, SessionError>>,
    reference_frame: ReferenceFrame,
}

/// Owner of the session handle and the reference frame chosen at request
/// time. The handle never leaves this resource.
#[derive(Resource, Default)]
pub struct SessionManager {
    handle: Option<SessionHandle>,
    pending: Option<PendingRequest>,
    reference_frame: ReferenceFrame,
    last_error: Option<SessionError>,
}

impl SessionManager {
    #[cfg(test)]
    pub(crate) fn with_reference_frame(reference_frame: ReferenceFrame) -> Self {
        Self {
            reference_frame,
            ..Self::default()
        }
    }

    pub fn reference_frame(&self) -> ReferenceFrame {
        self.reference_frame
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }
}

/// Clone of the runtime's termination stream, registered at startup.
#[derive(Resource)]
pub struct SessionEndEvents(Receiver<SessionEnded>);

pub fn register_end_stream(runtime: Res<Tracking>, mut commands: Commands) {
    commands.insert_resource(SessionEndEvents(runtime.0.end_events()));
}

/// Handle start requests while idle.
///
/// Gated on the startup capability probe: when the platform is unsupported
/// the runtime is never asked for a session and state stays `Idle`.
pub fn handle_session_requests(
    mut events: EventReader<SessionRequestEvent>,
    capability: Res<TrackingCapability>,
    runtime: Res<Tracking>,
    mut manager: ResMut<SessionManager>,
    mut next_state: ResMut<NextState<ArSessionState>>,
    mut lifecycle: EventWriter<SessionLifecycleEvent>,
) {
    for event in events.read() {
        if manager.pending.is_some() {
            continue;
        }
        if !capability.supported {
            manager.last_error = Some(SessionError::UnsupportedPlatform);
            lifecycle.write(SessionLifecycleEvent::Failed(
                SessionError::UnsupportedPlatform,
            ));
            warn!("session request refused: {}", SessionError::UnsupportedPlatform);
            continue;
        }

        let reply = runtime.0.request_session(&capability.required_features);
        manager.pending = Some(PendingRequest {
            reply,
            reference_frame: event.reference_frame,
        });
        next_state.set(ArSessionState::Requesting);
        info!("session requested ({:?})", event.reference_frame);
    }
}

/// Poll the pending request; runs while `Requesting`.
pub fn poll_session_request(
    mut manager: ResMut<SessionManager>,
    policy: Res<PlacementPolicy>,
    mut placement: ResMut<PlacementState>,
    mut next_state: ResMut<NextState<ArSessionState>>,
    mut lifecycle: EventWriter<SessionLifecycleEvent>,
) {
    let Some(pending) = manager.pending.take() else {
        next_state.set(ArSessionState::Idle);
        return;
    };

    match pending.reply.try_recv() {
        Err(TryRecvError::Empty) => {
            // Still suspended on the user/system response.
            manager.pending = Some(pending);
        }
        Ok(Ok(handle)) => {
            manager.handle = Some(handle);
            manager.reference_frame = pending.reference_frame;
            manager.last_error = None;
            placement.begin_session();
            if policy.clear_on_session_restart {
                placement.reset();
            }
            next_state.set(ArSessionState::Active);
            lifecycle.write(SessionLifecycleEvent::Started);
            info!("session active ({:?})", manager.reference_frame);
        }
        Ok(Err(error)) => {
            warn!("session request failed: {error}");
            manager.last_error = Some(error.clone());
            next_state.set(ArSessionState::Idle);
            lifecycle.write(SessionLifecycleEvent::Failed(error));
        }
        Err(TryRecvError::Disconnected) => {
            let error = SessionError::RequestFailed("runtime dropped the request".into());
            warn!("{error}");
            manager.last_error = Some(error.clone());
            next_state.set(ArSessionState::Idle);
            lifecycle.write(SessionLifecycleEvent::Failed(error));
        }
    }
}

/// Forward an explicit end request to the runtime. The actual transition
/// arrives back through the termination stream like any other end.
pub fn handle_end_session_requests(
    mut events: EventReader<EndSessionEvent>,
    runtime: Res<Tracking>,
    manager: Res<SessionManager>,
) {
    for _ in events.read() {
        let Some(handle) = manager.handle else {
            continue;
        };
        runtime.0.end_session(handle);
    }
}

/// Drain the runtime's termination stream.
///
/// This is the only state transition that happens asynchronously, outside
/// any explicit user call. Ending invalidates the reticle and the session's
/// tracked geometry but never touches a committed placement.
pub fn watch_session_end(
    end_events: Res<SessionEndEvents>,
    mut manager: ResMut<SessionManager>,
    mut placement: ResMut<PlacementState>,
    mut planes: ResMut<DetectedPlanes>,
    mut acquisition: ResMut<PlaneAcquisition>,
    mut hits: ResMut<FrameHitResults>,
    mut next_state: ResMut<NextState<ArSessionState>>,
    mut lifecycle: EventWriter<SessionLifecycleEvent>,
) {
    while let Ok(ended) = end_events.0.try_recv() {
        if manager.handle != Some(ended.handle) {
            continue; // Stale notification for an already-invalidated handle.
        }
        manager.handle = None;
        placement.end_session();
        planes.planes.clear();
        acquisition.timer.reset();
        hits.samples.clear();
        next_state.set(ArSessionState::Idle);

        match ended.reason {
            SessionEndReason::UserEnded => info!("session ended"),
            SessionEndReason::Interrupted => {
                manager.last_error = Some(SessionError::Interrupted);
                warn!("session interrupted");
            }
        }
        lifecycle.write(SessionLifecycleEvent::Ended(ended.reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::TrackingPlugin;
    use crate::tracking::hit_test::HitSample;
    use crate::tracking::runtime::SimulatedRuntime;
    use bevy::state::app::StatesPlugin;
    use std::sync::Arc;

    fn test_app(runtime: Arc<SimulatedRuntime>) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.add_plugins(TrackingPlugin::with_runtime(runtime));
        app.update(); // Run startup: probe + end-stream registration.
        app
    }

    fn session_state(app: &App) -> ArSessionState {
        *app.world().resource::<State<ArSessionState>>().get()
    }

    fn settle(app: &mut App) {
        for _ in 0..4 {
            app.update();
        }
    }

    fn sample_at(x: f32, y: f32, z: f32) -> HitSample {
        HitSample {
            raw_transform: Mat4::from_translation(Vec3::new(x, y, z)),
            distance: 1.0,
        }
    }

    #[test]
    fn unsupported_platform_never_reaches_the_runtime() {
        let runtime = Arc::new(SimulatedRuntime::unsupported());
        let mut app = test_app(runtime.clone());

        app.world_mut().send_event(SessionRequestEvent::default());
        settle(&mut app);

        assert_eq!(session_state(&app), ArSessionState::Idle);
        assert_eq!(runtime.request_count(), 0);
        let manager = app.world().resource::<SessionManager>();
        assert_eq!(manager.last_error(), Some(&SessionError::UnsupportedPlatform));
        assert!(!app.world().resource::<PlacementState>().session_active());
    }

    #[test]
    fn granted_request_activates_session() {
        let mut app = test_app(Arc::new(SimulatedRuntime::new()));

        app.world_mut().send_event(SessionRequestEvent::default());
        settle(&mut app);

        assert_eq!(session_state(&app), ArSessionState::Active);
        assert!(app.world().resource::<PlacementState>().session_active());
        assert!(app.world().resource::<SessionManager>().last_error().is_none());
    }

    #[test]
    fn denied_request_returns_to_idle() {
        let runtime = Arc::new(SimulatedRuntime::new());
        runtime.deny_next_request();
        let mut app = test_app(runtime);

        app.world_mut().send_event(SessionRequestEvent::default());
        settle(&mut app);

        assert_eq!(session_state(&app), ArSessionState::Idle);
        let manager = app.world().resource::<SessionManager>();
        assert_eq!(manager.last_error(), Some(&SessionError::RequestDenied));
    }

    #[test]
    fn interruption_keeps_committed_pose() {
        let runtime = Arc::new(SimulatedRuntime::new());
        let mut app = test_app(runtime.clone());

        app.world_mut().send_event(SessionRequestEvent::default());
        settle(&mut app);
        assert_eq!(session_state(&app), ArSessionState::Active);

        // Track a surface and commit it.
        let committed = {
            let mut placement = app.world_mut().resource_mut::<PlacementState>();
            placement.on_frame(&[sample_at(0.4, 0.0, -1.0)]);
            placement.commit().expect("valid reticle")
        };

        runtime.interrupt();
        settle(&mut app);

        assert_eq!(session_state(&app), ArSessionState::Idle);
        let placement = app.world().resource::<PlacementState>();
        assert!(placement.reticle_pose().is_none());
        assert_eq!(placement.committed_pose(), Some(committed));
        let manager = app.world().resource::<SessionManager>();
        assert_eq!(manager.last_error(), Some(&SessionError::Interrupted));
    }

    #[test]
    fn restart_clears_placement_when_policy_asks() {
        let mut app = test_app(Arc::new(SimulatedRuntime::new()));
        app.world_mut().resource_mut::<PlacementPolicy>().clear_on_session_restart = true;

        app.world_mut().send_event(SessionRequestEvent::default());
        settle(&mut app);
        {
            let mut placement = app.world_mut().resource_mut::<PlacementState>();
            placement.on_frame(&[sample_at(0.0, 0.0, -2.0)]);
            placement.commit().expect("valid reticle");
        }

        app.world_mut().send_event(EndSessionEvent);
        settle(&mut app);
        assert_eq!(session_state(&app), ArSessionState::Idle);
        // Policy A: the placement survives the session ending.
        assert!(app.world().resource::<PlacementState>().committed_pose().is_some());

        app.world_mut().send_event(SessionRequestEvent::default());
        settle(&mut app);
        assert_eq!(session_state(&app), ArSessionState::Active);
        // The restart policy clears it on re-activation.
        assert!(app.world().resource::<PlacementState>().committed_pose().is_none());
    }
}
