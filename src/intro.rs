// One-shot intro: the camera swings into place, then the marker cube drops
// into the studio while the camera zooms in, then the cube fades.
use bevy::math::curve::{Curve, EaseFunction};
use bevy::prelude::*;

use crate::landing::{IntroMarker, Opacity, SceneCamera};
use crate::loading::LoadingScreen;
use crate::pages::Page;
use crate::sequencer::SceneState;

pub struct IntroPlugin;

impl Plugin for IntroPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<IntroConfig>()
            .add_message::<IntroFinished>()
            .add_systems(OnEnter(SceneState::IntroPlaying), arm_intro)
            .add_systems(
                Update,
                (start_intro, advance_intro)
                    .chain()
                    .run_if(in_state(SceneState::IntroPlaying)),
            )
            .add_systems(
                Update,
                apply_intro_pose
                    .after(advance_intro)
                    .run_if(in_state(Page::Landing)),
            )
            .add_systems(OnExit(Page::Landing), release_intro);
    }
}

/// The point the scene camera keeps looking at.
pub const LOOK_TARGET: Vec3 = Vec3::new(0.0, 1.3, 0.0);

/// Everything the intro moves, sampled at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntroPose {
    pub camera_translation: Vec3,
    pub camera_zoom: f32,
    pub marker_translation: Vec3,
    pub marker_scale: Vec3,
    pub marker_opacity: f32,
}

#[derive(Resource, Debug, Clone)]
pub struct IntroConfig {
    pub dolly_secs: f32,
    pub main_secs: f32,
    pub fade_secs: f32,
    pub from: IntroPose,
    pub to: IntroPose,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            dolly_secs: 1.5,
            main_secs: 3.0,
            fade_secs: 0.3,
            from: IntroPose {
                camera_translation: Vec3::new(10.5, 3.5, 9.5),
                camera_zoom: 45.0,
                marker_translation: Vec3::new(0.0, 8.0, 0.0),
                marker_scale: Vec3::ONE,
                marker_opacity: 0.8,
            },
            to: IntroPose {
                camera_translation: Vec3::new(8.3, 7.9, 7.4),
                camera_zoom: 45.0 * 1.1,
                marker_translation: Vec3::new(0.0, 0.10, 0.0),
                marker_scale: Vec3::new(0.59, 0.47, 0.59),
                marker_opacity: 0.7,
            },
        }
    }
}

impl IntroConfig {
    pub fn total_secs(&self) -> f32 {
        self.dolly_secs + self.main_secs + self.fade_secs
    }

    /// Pose used when the intro is skipped: everything in its final place,
    /// the marker hidden.
    pub fn skipped_pose(&self) -> IntroPose {
        IntroPose {
            marker_opacity: 0.0,
            ..self.to
        }
    }

    fn pose_at(&self, elapsed: f32) -> IntroPose {
        let (from, to) = (&self.from, &self.to);
        let dolly = phase(elapsed, 0.0, self.dolly_secs, EaseFunction::QuadraticInOut);
        let main = phase(
            elapsed,
            self.dolly_secs,
            self.main_secs,
            EaseFunction::QuadraticInOut,
        );
        let fade = phase(
            elapsed,
            self.dolly_secs + self.main_secs,
            self.fade_secs,
            EaseFunction::CubicInOut,
        );

        IntroPose {
            camera_translation: from.camera_translation.lerp(to.camera_translation, dolly),
            camera_zoom: lerp(from.camera_zoom, to.camera_zoom, main),
            marker_translation: from.marker_translation.lerp(to.marker_translation, main),
            marker_scale: from.marker_scale.lerp(to.marker_scale, main),
            marker_opacity: lerp(from.marker_opacity, to.marker_opacity, fade),
        }
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Eased progress of a track that starts at `offset` and lasts `duration`.
fn phase(elapsed: f32, offset: f32, duration: f32, ease: EaseFunction) -> f32 {
    if duration <= 0.0 {
        return if elapsed >= offset { 1.0 } else { 0.0 };
    }
    ease.sample_clamped(((elapsed - offset) / duration).clamp(0.0, 1.0))
}

#[derive(Debug, Clone)]
pub struct Timeline {
    config: IntroConfig,
    elapsed: f32,
}

impl Timeline {
    fn new(config: IntroConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
        }
    }

    pub fn pose(&self) -> IntroPose {
        self.config.pose_at(self.elapsed)
    }

    fn finished(&self) -> bool {
        self.elapsed >= self.config.total_secs()
    }
}

/// Signals the end of the intro. Produced exactly once per controller.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntroFinished;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Camera or marker not spawned yet; try again next frame.
    TargetsMissing,
    /// Already running or finished.
    Ignored,
}

#[derive(Resource, Debug, Clone, Default)]
pub enum IntroAnimation {
    #[default]
    Idle,
    Running(Timeline),
    Completed(IntroPose),
}

impl IntroAnimation {
    pub fn start(&mut self, config: &IntroConfig, targets_attached: bool) -> StartOutcome {
        match self {
            IntroAnimation::Idle if targets_attached => {
                *self = IntroAnimation::Running(Timeline::new(config.clone()));
                StartOutcome::Started
            }
            IntroAnimation::Idle => StartOutcome::TargetsMissing,
            IntroAnimation::Running(_) | IntroAnimation::Completed(_) => StartOutcome::Ignored,
        }
    }

    pub fn advance(&mut self, dt: f32) -> Option<IntroFinished> {
        let IntroAnimation::Running(timeline) = self else {
            return None;
        };
        timeline.elapsed += dt;
        if !timeline.finished() {
            return None;
        }
        let final_pose = timeline.pose();
        *self = IntroAnimation::Completed(final_pose);
        Some(IntroFinished)
    }

    pub fn pose(&self) -> Option<IntroPose> {
        match self {
            IntroAnimation::Idle => None,
            IntroAnimation::Running(timeline) => Some(timeline.pose()),
            IntroAnimation::Completed(pose) => Some(*pose),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, IntroAnimation::Completed(_))
    }
}

fn arm_intro(mut commands: Commands) {
    commands.insert_resource(IntroAnimation::Idle);
}

fn start_intro(
    mut intro: ResMut<IntroAnimation>,
    config: Res<IntroConfig>,
    loading: Option<Res<LoadingScreen>>,
    camera: Query<(), With<SceneCamera>>,
    marker: Query<(), With<IntroMarker>>,
) {
    if !matches!(*intro, IntroAnimation::Idle) {
        return;
    }
    // Nothing to watch while the loading overlay covers the scene.
    let covered = loading.is_some_and(|screen| !screen.is_done());
    let attached = !covered && !camera.is_empty() && !marker.is_empty();
    match intro.start(&config, attached) {
        StartOutcome::Started => info!("intro started"),
        StartOutcome::TargetsMissing => debug!("intro targets not attached yet, retrying"),
        StartOutcome::Ignored => {}
    }
}

fn advance_intro(
    mut intro: ResMut<IntroAnimation>,
    time: Res<Time>,
    mut finished: MessageWriter<IntroFinished>,
) {
    if let Some(done) = intro.advance(time.delta_secs()) {
        info!("intro finished");
        finished.write(done);
    }
}

/// Holds camera and marker at the intro's current pose. Without a running or
/// finished intro the scene sits at the starting pose until it is revealed,
/// then at the skipped pose. Nothing moves while the mount is undecided.
fn apply_intro_pose(
    intro: Option<Res<IntroAnimation>>,
    config: Res<IntroConfig>,
    scene_state: Option<Res<State<SceneState>>>,
    mut camera: Query<(&mut Transform, &mut Projection), (With<SceneCamera>, Without<IntroMarker>)>,
    mut marker: Query<(&mut Transform, &mut Opacity), With<IntroMarker>>,
) {
    let state = scene_state.map(|s| *s.get());
    // Mount has not decided yet; leave the camera where the last visit put it.
    if state == Some(SceneState::Initializing) {
        return;
    }
    let ready = state == Some(SceneState::Ready);
    let pose = match intro.as_deref().and_then(IntroAnimation::pose) {
        Some(pose) => pose,
        None if ready => config.skipped_pose(),
        None => config.from,
    };

    for (mut transform, mut projection) in &mut camera {
        if transform.translation != pose.camera_translation {
            transform.translation = pose.camera_translation;
            transform.look_at(LOOK_TARGET, Vec3::Y);
        }
        if let Projection::Orthographic(ortho) = &mut *projection {
            let scale = 1.0 / pose.camera_zoom;
            if ortho.scale != scale {
                ortho.scale = scale;
            }
        }
    }

    for (mut transform, mut opacity) in &mut marker {
        if transform.translation != pose.marker_translation {
            transform.translation = pose.marker_translation;
        }
        if transform.scale != pose.marker_scale {
            transform.scale = pose.marker_scale;
        }
        if opacity.0 != pose.marker_opacity {
            opacity.0 = pose.marker_opacity;
        }
    }
}

fn release_intro(mut commands: Commands) {
    commands.remove_resource::<IntroAnimation>();
}
