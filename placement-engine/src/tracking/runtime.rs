use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use super::capability::{SessionFeature, TrackingCapability};
use super::error::SessionError;

/// Opaque identifier for an active tracking session.
///
/// Owned exclusively by the session manager; invalidated on session end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(u64);

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    UserEnded,
    Interrupted,
}

/// Termination notification delivered on the runtime's end stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnded {
    pub handle: SessionHandle,
    pub reason: SessionEndReason,
}

/// Boundary to the platform tracking subsystem.
///
/// The engine consumes exactly four things through this seam: a capability
/// query, an asynchronous session request, a way to stop a session, and the
/// termination notification stream. Session requests resolve on the returned
/// channel; termination (user- or system-initiated) always arrives on
/// `end_events`, which is the sole asynchronous state transition source.
pub trait TrackingRuntime: Send + Sync + 'static {
    fn probe(&self) -> TrackingCapability;

    /// Begin an asynchronous session request. The result arrives on the
    /// returned channel once the user/system responds.
    fn request_session(
        &self,
        features: &[SessionFeature],
    ) -> Receiver<Result<SessionHandle, SessionError>>;

    /// Ask the runtime to stop a session. Completion is reported on
    /// `end_events`, not synchronously.
    fn end_session(&self, handle: SessionHandle);

    /// Clone of the termination notification stream.
    fn end_events(&self) -> Receiver<SessionEnded>;
}

/// Resource wrapping the active tracking runtime.
#[derive(Resource, Clone)]
pub struct Tracking(pub Arc<dyn TrackingRuntime>);

/// Simulated tracking runtime backing native and wasm builds.
///
/// Grants sessions immediately and reports floor/hit-test support; request
/// denial and mid-session interruption can be forced for testing.
pub struct SimulatedRuntime {
    supported: bool,
    features: Vec<SessionFeature>,
    next_handle: AtomicU64,
    active: Mutex<Option<SessionHandle>>,
    deny_next: AtomicBool,
    requests_seen: AtomicU64,
    end_tx: Sender<SessionEnded>,
    end_rx: Receiver<SessionEnded>,
}

impl Default for SimulatedRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRuntime {
    pub fn new() -> Self {
        let (end_tx, end_rx) = unbounded();
        Self {
            supported: true,
            features: vec![SessionFeature::FloorReference, SessionFeature::HitTest],
            next_handle: AtomicU64::new(1),
            active: Mutex::new(None),
            deny_next: AtomicBool::new(false),
            requests_seen: AtomicU64::new(0),
            end_tx,
            end_rx,
        }
    }

    /// Runtime variant that reports no tracking support at all.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            features: Vec::new(),
            ..Self::new()
        }
    }

    /// Force the next session request to be denied, as a user would.
    pub fn deny_next_request(&self) {
        self.deny_next.store(true, Ordering::SeqCst);
    }

    /// Simulate a system-initiated interruption of the active session.
    pub fn interrupt(&self) {
        let ended = self.active.lock().ok().and_then(|mut active| active.take());
        if let Some(handle) = ended {
            let _ = self.end_tx.send(SessionEnded {
                handle,
                reason: SessionEndReason::Interrupted,
            });
        }
    }

    /// Number of session requests observed, for test assertions.
    pub fn request_count(&self) -> u64 {
        self.requests_seen.load(Ordering::SeqCst)
    }
}

impl TrackingRuntime for SimulatedRuntime {
    fn probe(&self) -> TrackingCapability {
        if !self.supported {
            return TrackingCapability::unsupported();
        }
        TrackingCapability {
            supported: true,
            required_features: self.features.clone(),
        }
    }

    fn request_session(
        &self,
        features: &[SessionFeature],
    ) -> Receiver<Result<SessionHandle, SessionError>> {
        self.requests_seen.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = bounded(1);

        if self.deny_next.swap(false, Ordering::SeqCst) {
            let _ = tx.send(Err(SessionError::RequestDenied));
            return rx;
        }
        if let Some(missing) = features.iter().find(|f| !self.features.contains(f)) {
            let _ = tx.send(Err(SessionError::RequestFailed(format!(
                "unsupported feature: {missing:?}"
            ))));
            return rx;
        }

        let handle = SessionHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        if let Ok(mut active) = self.active.lock() {
            *active = Some(handle);
        }
        let _ = tx.send(Ok(handle));
        rx
    }

    fn end_session(&self, handle: SessionHandle) {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        if *active != Some(handle) {
            return;
        }
        *active = None;
        let _ = self.end_tx.send(SessionEnded {
            handle,
            reason: SessionEndReason::UserEnded,
        });
    }

    fn end_events(&self) -> Receiver<SessionEnded> {
        self.end_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_session_and_reports_user_end() {
        let runtime = SimulatedRuntime::new();
        let features = runtime.probe().required_features;
        let reply = runtime.request_session(&features);
        let handle = reply.recv().expect("reply").expect("granted");

        runtime.end_session(handle);
        let ended = runtime.end_events().try_recv().expect("end event");
        assert_eq!(ended.handle, handle);
        assert_eq!(ended.reason, SessionEndReason::UserEnded);
    }

    #[test]
    fn denied_request_resolves_with_error() {
        let runtime = SimulatedRuntime::new();
        runtime.deny_next_request();
        let reply = runtime.request_session(&[SessionFeature::HitTest]);
        assert_eq!(reply.recv().expect("reply"), Err(SessionError::RequestDenied));
        assert_eq!(runtime.request_count(), 1);
    }

    #[test]
    fn unsupported_feature_combination_fails() {
        let runtime = SimulatedRuntime::unsupported();
        let reply = runtime.request_session(&[SessionFeature::FloorReference]);
        match reply.recv().expect("reply") {
            Err(SessionError::RequestFailed(_)) => {}
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn interrupt_ends_active_session() {
        let runtime = SimulatedRuntime::new();
        let reply = runtime.request_session(&[SessionFeature::HitTest]);
        let handle = reply.recv().expect("reply").expect("granted");

        runtime.interrupt();
        let ended = runtime.end_events().try_recv().expect("end event");
        assert_eq!(ended.handle, handle);
        assert_eq!(ended.reason, SessionEndReason::Interrupted);

        // Ending again is a no-op; the handle is already invalid.
        runtime.end_session(handle);
        assert!(runtime.end_events().try_recv().is_err());
    }
}
