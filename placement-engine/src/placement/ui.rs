use bevy::prelude::*;

use crate::tracking::capability::TrackingCapability;
use crate::tracking::session::{ArSessionState, SessionManager, SessionRequestEvent};

use super::state::{PlacementPhase, PlacementState};

#[derive(Component)]
pub struct StatusText;

#[derive(Component)]
pub struct StartSessionButton;

/// Native-only status overlay: a start button plus one status line. On wasm
/// the hosting page renders its own shell and drives the engine over RPC.
pub fn spawn_placement_ui(mut commands: Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("Probing AR support…"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                StatusText,
            ));

            parent
                .spawn((
                    Button,
                    Node {
                        position_type: PositionType::Absolute,
                        top: Val::Px(12.0),
                        left: Val::Px(12.0),
                        padding: UiRect::axes(Val::Px(14.0), Val::Px(8.0)),
                        ..default()
                    },
                    BackgroundColor(Color::srgb(0.22, 0.24, 0.28)),
                    StartSessionButton,
                ))
                .with_children(|button| {
                    button.spawn((
                        Text::new("Start AR"),
                        TextFont {
                            font_size: 14.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));
                });
        });
}

/// Start button requests a session; ignored outside `Idle`.
pub fn start_button_interaction(
    mut query: Query<
        (&Interaction, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>, With<StartSessionButton>),
    >,
    mut requests: EventWriter<SessionRequestEvent>,
) {
    for (interaction, mut background) in &mut query {
        match *interaction {
            Interaction::Pressed => {
                requests.write(SessionRequestEvent::default());
                *background = BackgroundColor(Color::srgb(0.18, 0.20, 0.24));
            }
            Interaction::Hovered => *background = BackgroundColor(Color::srgb(0.26, 0.28, 0.32)),
            Interaction::None => *background = BackgroundColor(Color::srgb(0.22, 0.24, 0.28)),
        }
    }
}

pub fn update_status_text(
    capability: Option<Res<TrackingCapability>>,
    session_state: Res<State<ArSessionState>>,
    manager: Res<SessionManager>,
    placement: Res<PlacementState>,
    mut query: Query<&mut Text, With<StatusText>>,
) {
    let Ok(mut text) = query.single_mut() else {
        return;
    };
    text.0 = status_line(
        capability.as_deref(),
        *session_state.get(),
        &manager,
        &placement,
    );
}

fn status_line(
    capability: Option<&TrackingCapability>,
    session_state: ArSessionState,
    manager: &SessionManager,
    placement: &PlacementState,
) -> String {
    let Some(capability) = capability else {
        return "Probing AR support…".into();
    };
    if !capability.supported {
        return "AR tracking is not supported on this device".into();
    }
    match session_state {
        ArSessionState::Idle => match manager.last_error() {
            Some(error) => format!("Session ended: {error}. Press Start AR to retry."),
            None => "Press Start AR to begin".into(),
        },
        ArSessionState::Requesting => "Requesting AR session…".into(),
        ArSessionState::Active => match placement.phase() {
            PlacementPhase::Searching => "Move around to find a surface…".into(),
            PlacementPhase::Tracking => "Surface found. Click or press Space to place.".into(),
            PlacementPhase::Placed => "Placed. R resets, Escape ends the session.".into(),
        },
    }
}
