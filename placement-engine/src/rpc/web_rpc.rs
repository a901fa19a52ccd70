use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::placement::input::{CommitPlacementEvent, PlacementChangedEvent, ResetPlacementEvent};
use crate::placement::state::PlacementState;
use crate::tracking::PlacementSet;
use crate::tracking::capability::TrackingCapability;
use crate::tracking::pose::{Pose, ReferenceFrame};
use crate::tracking::runtime::SessionEndReason;
use crate::tracking::session::{
    ArSessionState, EndSessionEvent, SessionLifecycleEvent, SessionRequestEvent,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification for one-way engine-to-page communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC error structure following the specification.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }
}

/// Resource managing bidirectional RPC traffic between the hosting page and
/// the engine: request-response plus notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
    #[cfg(test)]
    sent_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send a notification to the hosting page without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing the RPC layer for iframe-based deployment. On native
/// builds the message queue never exists and the layer idles.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_event::<CommitPlacementEvent>()
            .add_event::<ResetPlacementEvent>()
            .add_event::<PlacementChangedEvent>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    notify_state_changes,
                    send_outgoing_messages,
                )
                    .chain()
                    // Reads of placement state must see this frame's update.
                    .in_set(PlacementSet::Render),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();
            // Validate the RPC envelope before queuing.
            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .expect("Failed to register message listener");
    }

    // Prevent the closure from being dropped by handing ownership to JS.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Thread-safe message queue filled by the wasm message listener.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Incoming RPC message from the hosting page.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

#[derive(serde::Deserialize, Default)]
struct SessionRequestParams {
    #[serde(default)]
    reference_frame: Option<ReferenceFrame>,
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    placement: Res<PlacementState>,
    session_state: Res<State<ArSessionState>>,
    capability: Option<Res<TrackingCapability>>,
    mut session_requests: EventWriter<SessionRequestEvent>,
    mut session_ends: EventWriter<EndSessionEvent>,
    mut commits: EventWriter<CommitPlacementEvent>,
    mut resets: EventWriter<ResetPlacementEvent>,
) {
    for event in events.read() {
        let request = match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => request,
            Err(parse_error) => {
                warn!("unparseable RPC message: {parse_error}");
                continue;
            }
        };

        // Only requests with an id get a response; notifications do not.
        let Some(id) = request.id.clone() else {
            continue;
        };

        let result = match request.method.as_str() {
            "request_session" => {
                // A request outside `Idle` would expire unhandled; refuse it
                // so the page learns immediately.
                if *session_state.get() != ArSessionState::Idle {
                    Err(RpcError {
                        code: -32001,
                        message: "session already requested or active".to_string(),
                        data: None,
                    })
                } else {
                    match serde_json::from_value::<SessionRequestParams>(request.params.clone()) {
                        Ok(params) => {
                            session_requests.write(SessionRequestEvent {
                                reference_frame: params.reference_frame.unwrap_or_default(),
                            });
                            Ok(serde_json::json!({ "accepted": true }))
                        }
                        Err(_) => Err(RpcError::invalid_params(
                            "expected optional 'reference_frame'",
                        )),
                    }
                }
            }
            "end_session" => {
                session_ends.write(EndSessionEvent);
                Ok(serde_json::json!({ "accepted": true }))
            }
            "commit_placement" => {
                commits.write(CommitPlacementEvent);
                Ok(serde_json::json!({ "accepted": true }))
            }
            "reset_placement" => {
                resets.write(ResetPlacementEvent);
                Ok(serde_json::json!({ "accepted": true }))
            }
            "get_placement_state" => Ok(placement_state_json(
                &placement,
                *session_state.get(),
                capability.as_deref(),
            )),
            _ => {
                warn!("unknown RPC method: {}", request.method);
                Err(RpcError {
                    code: -32601,
                    message: "Method not found".to_string(),
                    data: Some(serde_json::json!({ "method": request.method })),
                })
            }
        };

        let response = match result {
            Ok(value) => RpcResponse {
                jsonrpc: "2.0".to_string(),
                result: Some(value),
                error: None,
                id: Some(id),
            },
            Err(error) => RpcResponse {
                jsonrpc: "2.0".to_string(),
                result: None,
                error: Some(error),
                id: Some(id),
            },
        };
        rpc_interface.queue_response(response);
    }
}

/// Push session and placement transitions to the hosting page.
fn notify_state_changes(
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut lifecycle: EventReader<SessionLifecycleEvent>,
    mut placement_changes: EventReader<PlacementChangedEvent>,
    capability: Option<Res<TrackingCapability>>,
    mut capability_sent: Local<bool>,
) {
    if !*capability_sent {
        if let Some(capability) = capability {
            rpc_interface.send_notification(
                "capability",
                serde_json::json!({
                    "supported": capability.supported,
                    "required_features": capability.required_features,
                }),
            );
            *capability_sent = true;
        }
    }

    for event in lifecycle.read() {
        let params = match event {
            SessionLifecycleEvent::Started => serde_json::json!({ "state": "active" }),
            SessionLifecycleEvent::Failed(error) => {
                serde_json::json!({ "state": "idle", "error": error.to_string() })
            }
            SessionLifecycleEvent::Ended(reason) => serde_json::json!({
                "state": "idle",
                "reason": match reason {
                    SessionEndReason::UserEnded => "user-ended",
                    SessionEndReason::Interrupted => "interrupted",
                },
            }),
        };
        rpc_interface.send_notification("session_state_changed", params);
    }

    for event in placement_changes.read() {
        let params = match event {
            PlacementChangedEvent::Committed(pose) => {
                serde_json::json!({ "change": "committed", "pose": pose_json(pose) })
            }
            PlacementChangedEvent::CommitRejected => {
                serde_json::json!({ "change": "rejected", "reason": "no valid surface" })
            }
            PlacementChangedEvent::Reset => serde_json::json!({ "change": "reset" }),
        };
        rpc_interface.send_notification("placement_changed", params);
    }
}

fn placement_state_json(
    placement: &PlacementState,
    session_state: ArSessionState,
    capability: Option<&TrackingCapability>,
) -> serde_json::Value {
    serde_json::json!({
        "supported": capability.map(|c| c.supported),
        "session": match session_state {
            ArSessionState::Idle => "idle",
            ArSessionState::Requesting => "requesting",
            ArSessionState::Active => "active",
        },
        "reticle_pose": placement.reticle_pose().map(|p| pose_json(&p)),
        "committed_pose": placement.committed_pose().map(|p| pose_json(&p)),
    })
}

fn pose_json(pose: &Pose) -> serde_json::Value {
    serde_json::json!({
        "position": [pose.position.x, pose.position.y, pose.position.z],
        "orientation": pose.orientation.map(|q| [q.x, q.y, q.z, q.w]),
    })
}

/// Send queued notifications and responses to the hosting page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in std::mem::take(&mut rpc_interface.outgoing_notifications) {
        send_message_to_parent(&notification);
    }
    for response in std::mem::take(&mut rpc_interface.outgoing_responses) {
        send_message_to_parent(&response);
        #[cfg(test)]
        rpc_interface.sent_responses.push(response);
    }
}

/// Serialize a message to the parent window (the hosting page).
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("failed to send message to parent: {e:?}");
                        }
                    }
                }
            }
            Err(e) => error!("failed to serialize message: {e}"),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}
