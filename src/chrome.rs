// Site chrome: the landing header, the music toggle shown in the corner of
// every page, and the orange cursor that replaces the system one.
use bevy::picking::Pickable;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::audio::{BackgroundMusic, MusicSystems, ToggleMusic};
use crate::pages::{NavigateTo, Page, spawn_button};

pub struct ChromePlugin;

impl Plugin for ChromePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_music_toggle, spawn_cursor))
            .add_systems(OnEnter(Page::Landing), spawn_header)
            .add_systems(
                Update,
                (
                    music_toggle_pressed.before(MusicSystems),
                    music_toggle_label.run_if(resource_changed::<BackgroundMusic>),
                    header_pressed,
                    follow_cursor,
                ),
            );
    }
}

const CURSOR_ORANGE: Color = Color::srgb(0.824, 0.361, 0.145);
const CURSOR_RING: f32 = 28.0;
const CURSOR_DOT: f32 = 6.0;
/// How quickly the ring catches up with the pointer, per second.
const CURSOR_RING_RATE: f32 = 14.0;

#[derive(Component)]
struct MusicToggle;

#[derive(Component)]
struct HeaderLogo;

#[derive(Component)]
struct CursorDot;

/// Trailing ring around the cursor dot.
#[derive(Component, Default)]
struct CursorRing {
    position: Option<Vec2>,
}

fn label(playing: bool) -> &'static str {
    if playing { "Music: On" } else { "Music: Off" }
}

fn spawn_music_toggle(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(16.0),
                right: Val::Px(16.0),
                ..default()
            },
            GlobalZIndex(150),
        ))
        .with_children(|parent| spawn_button(parent, label(false), MusicToggle));
}

fn music_toggle_pressed(
    query: Query<&Interaction, (Changed<Interaction>, With<MusicToggle>)>,
    mut toggle: MessageWriter<ToggleMusic>,
) {
    for interaction in &query {
        if *interaction == Interaction::Pressed {
            toggle.write(ToggleMusic);
        }
    }
}

fn music_toggle_label(
    music: Res<BackgroundMusic>,
    buttons: Query<&Children, With<MusicToggle>>,
    mut texts: Query<&mut Text>,
) {
    for children in &buttons {
        for child in children.iter() {
            if let Ok(mut text) = texts.get_mut(child) {
                **text = label(music.is_playing()).to_owned();
            }
        }
    }
}

fn spawn_header(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(12.0),
                left: Val::Px(24.0),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            GlobalZIndex(100),
            DespawnOnExit(Page::Landing),
        ))
        .with_children(|parent| {
            parent
                .spawn((HeaderLogo, Button, Node::default()))
                .with_children(|logo| {
                    logo.spawn((
                        Text::new("PAINTING WING"),
                        TextFont {
                            font_size: 26.0,
                            ..default()
                        },
                        TextColor(Color::srgb(0.1, 0.1, 0.1)),
                    ));
                });
            parent.spawn((
                Text::new("Let Satisfaction Prevail"),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                TextColor(Color::srgb(0.3, 0.3, 0.3)),
            ));
        });
}

fn header_pressed(
    query: Query<&Interaction, (Changed<Interaction>, With<HeaderLogo>)>,
    mut navigate: MessageWriter<NavigateTo>,
) {
    for interaction in &query {
        if *interaction == Interaction::Pressed {
            navigate.write(NavigateTo(Page::Landing.route().to_owned()));
        }
    }
}

fn spawn_cursor(mut commands: Commands) {
    commands.spawn((
        CursorRing::default(),
        Node {
            position_type: PositionType::Absolute,
            width: Val::Px(CURSOR_RING),
            height: Val::Px(CURSOR_RING),
            border: UiRect::all(Val::Px(2.0)),
            border_radius: BorderRadius::MAX,
            ..default()
        },
        BorderColor::all(CURSOR_ORANGE),
        Visibility::Hidden,
        Pickable::IGNORE,
        GlobalZIndex(1000),
    ));
    commands.spawn((
        CursorDot,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Px(CURSOR_DOT),
            height: Val::Px(CURSOR_DOT),
            border_radius: BorderRadius::MAX,
            ..default()
        },
        BackgroundColor(CURSOR_ORANGE),
        Visibility::Hidden,
        Pickable::IGNORE,
        GlobalZIndex(1001),
    ));
}

/// Frame-rate independent step of `current` toward `target`.
fn trail(current: Vec2, target: Vec2, dt: f32) -> Vec2 {
    let t = 1.0 - (-CURSOR_RING_RATE * dt).exp();
    current.lerp(target, t)
}

fn follow_cursor(
    time: Res<Time>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut dots: Query<(&mut Node, &mut Visibility), (With<CursorDot>, Without<CursorRing>)>,
    mut rings: Query<(&mut CursorRing, &mut Node, &mut Visibility), Without<CursorDot>>,
) {
    let pointer = windows.single().ok().and_then(Window::cursor_position);

    for (mut node, mut visibility) in &mut dots {
        place(&mut node, &mut visibility, pointer, CURSOR_DOT);
    }
    for (mut ring, mut node, mut visibility) in &mut rings {
        ring.position = match (ring.position, pointer) {
            (Some(current), Some(target)) => Some(trail(current, target, time.delta_secs())),
            (_, target) => target,
        };
        place(&mut node, &mut visibility, ring.position, CURSOR_RING);
    }
}

fn place(node: &mut Node, visibility: &mut Visibility, centre: Option<Vec2>, size: f32) {
    match centre {
        Some(centre) => {
            node.left = Val::Px(centre.x - size / 2.0);
            node.top = Val::Px(centre.y - size / 2.0);
            *visibility = Visibility::Inherited;
        }
        None => *visibility = Visibility::Hidden,
    }
}
