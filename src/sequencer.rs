// Decides on every landing mount whether the intro plays, and drives the
// reveal signal the nav titles, marker and model follow.
use bevy::prelude::*;

use crate::intro::IntroFinished;
use crate::pages::Page;
use crate::session::{Session, SessionFlag};

pub struct SequencerPlugin;

impl Plugin for SequencerPlugin {
    fn build(&self, app: &mut App) {
        app.add_sub_state::<SceneState>()
            .init_resource::<RevealSignal>()
            .init_resource::<Tooltip>()
            .add_systems(OnEnter(SceneState::Initializing), mount_scene)
            .add_systems(OnEnter(Page::Landing), spawn_tooltip)
            .add_systems(
                Update,
                finish_intro.run_if(in_state(SceneState::IntroPlaying)),
            )
            .add_systems(
                Update,
                (update_reveal, update_tooltip)
                    .chain()
                    .after(finish_intro)
                    .run_if(in_state(Page::Landing)),
            )
            .add_systems(OnExit(Page::Landing), unmount_scene);
    }
}

/// Landing scene lifecycle. Rebuilt as `Initializing` on every mount of the
/// landing page and gone while any other page is shown.
#[derive(SubStates, Debug, Clone, Copy, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[source(Page = Page::Landing)]
pub enum SceneState {
    #[default]
    Initializing,
    IntroPlaying,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountPlan {
    PlayIntro,
    SkipIntro,
}

/// Forward-only view of the scene state for one mount.
#[derive(Resource, Debug, Default)]
pub struct SceneSequencer {
    state: SceneState,
}

impl SceneSequencer {
    /// Reads `hasSeenIntro` and, when the intro is going to play, records it
    /// as seen straight away so a reload mid-intro skips it.
    pub fn mount(&mut self, session: &Session) -> MountPlan {
        if session.is_enabled(SessionFlag::HasSeenIntro) {
            self.advance(SceneState::Ready);
            MountPlan::SkipIntro
        } else {
            session.set(SessionFlag::HasSeenIntro, true);
            self.advance(SceneState::IntroPlaying);
            MountPlan::PlayIntro
        }
    }

    /// Moves to `next` if that is forward. Returns whether it moved.
    pub fn advance(&mut self, next: SceneState) -> bool {
        if next <= self.state {
            return false;
        }
        self.state = next;
        true
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn reveal(&self) -> f32 {
        if self.state == SceneState::Ready { 1.0 } else { 0.0 }
    }
}

/// Seconds for revealed elements to fade from 0 to 1.
const REVEAL_FADE_SECS: f32 = 0.6;
/// Tooltip waits for this much opacity so it does not flicker mid-fade.
pub const TOOLTIP_MIN_OPACITY: f32 = 0.95;
const TOOLTIP_OFFSET: Vec2 = Vec2::new(16.0, 16.0);

/// Shared visibility of the nav titles and model.
///
/// `target` is the discrete signal (1 once the scene is ready) and gates
/// interaction; `opacity` eases toward it for display.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct RevealSignal {
    pub target: f32,
    pub opacity: f32,
}

impl RevealSignal {
    pub fn is_revealed(&self) -> bool {
        self.target >= 1.0
    }

    fn step(&mut self, target: f32, dt: f32) {
        self.target = target;
        let max_delta = dt / REVEAL_FADE_SECS;
        let delta = (self.target - self.opacity).clamp(-max_delta, max_delta);
        self.opacity = (self.opacity + delta).clamp(0.0, 1.0);
    }
}

/// Pointer hint shown over the studio model.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct Tooltip {
    pub hovering: bool,
    pub visible: bool,
    pub position: Vec2,
}

impl Tooltip {
    pub fn pointer_enter(&mut self, position: Vec2) {
        self.hovering = true;
        self.position = position;
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        if self.hovering {
            self.position = position;
        }
    }

    pub fn pointer_leave(&mut self) {
        self.hovering = false;
        self.visible = false;
    }

    fn refresh(&mut self, reveal_opacity: f32) {
        self.visible = self.hovering && reveal_opacity >= TOOLTIP_MIN_OPACITY;
    }
}

#[derive(Component)]
struct TooltipText;

fn mount_scene(
    mut commands: Commands,
    session: Res<Session>,
    mut next_state: ResMut<NextState<SceneState>>,
) {
    let mut sequencer = SceneSequencer::default();
    let plan = sequencer.mount(&session);
    info!("landing mounted: {plan:?}");
    // Applied on the next state transition, never inside this one.
    next_state.set(sequencer.state());
    commands.insert_resource(sequencer);
}

fn finish_intro(
    mut finished: MessageReader<IntroFinished>,
    mut sequencer: ResMut<SceneSequencer>,
    mut next_state: ResMut<NextState<SceneState>>,
) {
    if finished.read().count() == 0 {
        return;
    }
    if sequencer.advance(SceneState::Ready) {
        next_state.set(SceneState::Ready);
    }
}

fn update_reveal(
    time: Res<Time>,
    scene_state: Option<Res<State<SceneState>>>,
    mut reveal: ResMut<RevealSignal>,
) {
    let target = match scene_state {
        Some(state) if *state.get() == SceneState::Ready => 1.0,
        _ => 0.0,
    };
    reveal.step(target, time.delta_secs());
}

fn spawn_tooltip(mut commands: Commands) {
    commands.spawn((
        TooltipText,
        Text::new("Click a title to explore"),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgb(0.2, 0.2, 0.2)),
        BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.85)),
        Node {
            position_type: PositionType::Absolute,
            padding: UiRect::all(Val::Px(6.0)),
            ..default()
        },
        Visibility::Hidden,
        GlobalZIndex(50),
        DespawnOnExit(Page::Landing),
    ));
}

fn update_tooltip(
    reveal: Res<RevealSignal>,
    mut tooltip: ResMut<Tooltip>,
    mut text: Query<(&mut Node, &mut Visibility), With<TooltipText>>,
) {
    tooltip.refresh(reveal.opacity);

    let Ok((mut node, mut visibility)) = text.single_mut() else {
        return;
    };
    if tooltip.visible {
        node.left = Val::Px(tooltip.position.x + TOOLTIP_OFFSET.x);
        node.top = Val::Px(tooltip.position.y + TOOLTIP_OFFSET.y);
        *visibility = Visibility::Inherited;
    } else if *visibility != Visibility::Hidden {
        *visibility = Visibility::Hidden;
    }
}

pub(crate) fn tooltip_over(over: On<Pointer<Over>>, mut tooltip: ResMut<Tooltip>) {
    tooltip.pointer_enter(over.pointer_location.position);
}

pub(crate) fn tooltip_move(moved: On<Pointer<Move>>, mut tooltip: ResMut<Tooltip>) {
    tooltip.pointer_move(moved.pointer_location.position);
}

pub(crate) fn tooltip_out(_out: On<Pointer<Out>>, mut tooltip: ResMut<Tooltip>) {
    tooltip.pointer_leave();
}

fn unmount_scene(
    mut commands: Commands,
    mut reveal: ResMut<RevealSignal>,
    mut tooltip: ResMut<Tooltip>,
) {
    commands.remove_resource::<SceneSequencer>();
    *reveal = RevealSignal::default();
    *tooltip = Tooltip::default();
}
