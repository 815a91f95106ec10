// Background music: one looping stream for the whole tab, shared by every
// page, remembered across reloads through the session.
use bevy::audio::{AudioSinkPlayback, Volume};
use bevy::prelude::*;
use bevy::window::WindowOccluded;
use thiserror::Error;

use crate::session::{Session, SessionFlag};

pub struct MusicPlugin;

impl Plugin for MusicPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MusicConfig>()
            .init_resource::<BackgroundMusic>()
            .init_resource::<AudioUnlock>()
            .add_message::<ToggleMusic>()
            .add_message::<WindowOccluded>()
            .add_systems(Startup, init_music)
            .add_systems(
                Update,
                (
                    unlock_on_gesture,
                    toggle_music,
                    restore_music,
                    handle_visibility,
                )
                    .chain()
                    .in_set(MusicSystems),
            );
    }
}

#[derive(Resource, Debug, Clone)]
pub struct MusicConfig {
    pub track: String,
    pub volume: f32,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            track: "audio/ambient.ogg".to_owned(),
            volume: 0.6,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio stream is not ready yet")]
    NotReady,
    #[error("playback rejected: {0}")]
    Rejected(String),
}

/// Systems that act on [`ToggleMusic`]; writers run before this set.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct MusicSystems;

/// Browsers keep audio suspended until the page has seen a user gesture.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioUnlock {
    pub unlocked: bool,
}

impl Default for AudioUnlock {
    fn default() -> Self {
        Self {
            unlocked: !cfg!(target_arch = "wasm32"),
        }
    }
}

/// The playable stream behind [`BackgroundMusic`].
pub trait AudioBackend {
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
}

/// Production backend over the Bevy sink. The sink only exists once the
/// track has loaded, so an early play is rejected as not ready. Before the
/// first user gesture the browser would swallow playback silently, so that
/// is reported as a rejection.
pub struct SinkBackend<'a> {
    sink: Option<&'a AudioSink>,
    unlocked: bool,
}

impl<'a> SinkBackend<'a> {
    pub fn new(sink: Option<&'a AudioSink>, unlock: &AudioUnlock) -> Self {
        Self {
            sink,
            unlocked: unlock.unlocked,
        }
    }
}

impl AudioBackend for SinkBackend<'_> {
    fn play(&mut self) -> Result<(), AudioError> {
        if !self.unlocked {
            return Err(AudioError::Rejected("no user gesture yet".to_owned()));
        }
        let sink = self.sink.ok_or(AudioError::NotReady)?;
        sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = self.sink {
            sink.pause();
        }
    }

    fn is_paused(&self) -> bool {
        self.sink.is_none_or(|sink| sink.is_paused())
    }
}

/// Request from UI to flip the music on or off.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleMusic;

#[derive(Component)]
pub struct BackgroundTrack;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MusicState {
    #[default]
    Paused,
    Playing,
}

/// Application-wide owner of the one background stream.
#[derive(Resource, Debug, Default)]
pub struct BackgroundMusic {
    track: Option<Entity>,
    state: MusicState,
    restore_pending: bool,
}

impl BackgroundMusic {
    /// Spawns the looping track the first time; afterwards returns the
    /// existing entity.
    pub fn ensure_initialized(
        &mut self,
        commands: &mut Commands,
        config: &MusicConfig,
        asset_server: &AssetServer,
    ) -> Entity {
        if let Some(track) = self.track {
            return track;
        }
        let track = commands
            .spawn((
                BackgroundTrack,
                AudioPlayer::new(asset_server.load(config.track.clone())),
                PlaybackSettings::LOOP
                    .paused()
                    .with_volume(Volume::Linear(config.volume)),
            ))
            .id();
        info!("background music attached as {track}");
        self.track = Some(track);
        track
    }

    pub fn track(&self) -> Option<Entity> {
        self.track
    }

    pub fn is_playing(&self) -> bool {
        self.state == MusicState::Playing
    }

    /// Flips playback and returns whether music is now playing. A rejected
    /// start leaves everything paused.
    pub fn toggle_play(&mut self, backend: &mut impl AudioBackend, session: &Session) -> bool {
        // An explicit choice replaces any restore still waiting to happen.
        self.restore_pending = false;
        match self.state {
            MusicState::Playing => {
                backend.pause();
                self.set_state(MusicState::Paused, session);
            }
            MusicState::Paused => self.try_play(backend, session),
        }
        self.is_playing()
    }

    /// Tab went to the background. The paused flag is written before anything
    /// can look at visibility again, so a later foreground never resumes a
    /// stream paused here.
    pub fn pause_for_background(&mut self, backend: &mut impl AudioBackend, session: &Session) {
        backend.pause();
        self.set_state(MusicState::Paused, session);
    }

    /// Tab came back. Resumes only if the session still says playing.
    pub fn resume_from_foreground(
        &mut self,
        backend: &mut impl AudioBackend,
        session: &Session,
    ) -> bool {
        if self.is_playing() || !session.is_enabled(SessionFlag::AudioEnabled) {
            return self.is_playing();
        }
        self.try_play(backend, session);
        self.is_playing()
    }

    fn try_play(&mut self, backend: &mut impl AudioBackend, session: &Session) {
        match backend.play() {
            Ok(()) => self.set_state(MusicState::Playing, session),
            Err(err) => {
                warn!("background music did not start: {err}");
                backend.pause();
                self.set_state(MusicState::Paused, session);
            }
        }
    }

    fn set_state(&mut self, state: MusicState, session: &Session) {
        self.state = state;
        session.set(SessionFlag::AudioEnabled, state == MusicState::Playing);
    }
}

fn init_music(
    mut commands: Commands,
    mut music: ResMut<BackgroundMusic>,
    config: Res<MusicConfig>,
    asset_server: Res<AssetServer>,
    session: Res<Session>,
) {
    music.ensure_initialized(&mut commands, &config, &asset_server);
    // A reload in the same tab picks up where the music left off.
    music.restore_pending = session.is_enabled(SessionFlag::AudioEnabled);
}

fn unlock_on_gesture(
    mut unlock: ResMut<AudioUnlock>,
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    touches: Res<Touches>,
) {
    if unlock.unlocked {
        return;
    }
    if mouse.get_just_pressed().next().is_some()
        || keys.get_just_pressed().next().is_some()
        || touches.any_just_pressed()
    {
        unlock.unlocked = true;
        debug!("audio unlocked by user gesture");
    }
}

/// Until the browser allows playback the music stays paused; the stored
/// choice is kept so the restore can happen on the first gesture.
fn restore_music(
    mut music: ResMut<BackgroundMusic>,
    session: Res<Session>,
    unlock: Res<AudioUnlock>,
    sinks: Query<&AudioSink, With<BackgroundTrack>>,
) {
    if !music.restore_pending || !unlock.unlocked {
        return;
    }
    // Wait for the track to load.
    let Ok(sink) = sinks.single() else {
        return;
    };
    music.restore_pending = false;
    music.resume_from_foreground(&mut SinkBackend::new(Some(sink), &unlock), &session);
}

fn handle_visibility(
    mut occlusion: MessageReader<WindowOccluded>,
    mut music: ResMut<BackgroundMusic>,
    session: Res<Session>,
    unlock: Res<AudioUnlock>,
    sinks: Query<&AudioSink, With<BackgroundTrack>>,
) {
    for event in occlusion.read() {
        let mut backend = SinkBackend::new(sinks.single().ok(), &unlock);
        if event.occluded {
            music.pause_for_background(&mut backend, &session);
            debug!("tab hidden, music paused");
        } else if unlock.unlocked {
            music.resume_from_foreground(&mut backend, &session);
        }
    }
}

fn toggle_music(
    mut requests: MessageReader<ToggleMusic>,
    mut music: ResMut<BackgroundMusic>,
    session: Res<Session>,
    unlock: Res<AudioUnlock>,
    sinks: Query<&AudioSink, With<BackgroundTrack>>,
) {
    for _ in requests.read() {
        let mut backend = SinkBackend::new(sinks.single().ok(), &unlock);
        let playing = music.toggle_play(&mut backend, &session);
        info!("background music {}", if playing { "on" } else { "off" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::AssetPlugin;
    use bevy::input::mouse::MouseButtonInput;
    use bevy::input::{ButtonState, InputPlugin};

    use crate::session::UnavailableStore;

    #[derive(Default)]
    struct FakeStream {
        paused: bool,
        reject: bool,
        plays: usize,
    }

    impl FakeStream {
        fn rejecting() -> Self {
            Self {
                paused: true,
                reject: true,
                plays: 0,
            }
        }

        fn paused() -> Self {
            Self {
                paused: true,
                ..default()
            }
        }
    }

    impl AudioBackend for FakeStream {
        fn play(&mut self) -> Result<(), AudioError> {
            self.plays += 1;
            if self.reject {
                return Err(AudioError::Rejected("autoplay blocked".to_owned()));
            }
            self.paused = false;
            Ok(())
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }
    }

    #[test]
    fn test_toggle_plays_and_pauses() {
        let session = Session::in_memory();
        let mut music = BackgroundMusic::default();
        let mut stream = FakeStream::paused();

        assert!(music.toggle_play(&mut stream, &session));
        assert!(!stream.is_paused());
        assert_eq!(session.get(SessionFlag::AudioEnabled), Some(true));

        assert!(!music.toggle_play(&mut stream, &session));
        assert!(stream.is_paused());
        assert_eq!(session.get(SessionFlag::AudioEnabled), Some(false));
    }

    #[test]
    fn test_rejected_autoplay_stays_consistent() {
        let session = Session::in_memory();
        let mut music = BackgroundMusic::default();
        let mut stream = FakeStream::rejecting();

        assert!(!music.toggle_play(&mut stream, &session));
        assert!(!music.is_playing());
        assert!(stream.is_paused());
        assert_eq!(session.get(SessionFlag::AudioEnabled), Some(false));
    }

    #[test]
    fn test_hidden_tab_pauses_and_does_not_resume() {
        let session = Session::in_memory();
        let mut music = BackgroundMusic::default();
        let mut stream = FakeStream::paused();
        music.toggle_play(&mut stream, &session);

        music.pause_for_background(&mut stream, &session);
        assert!(stream.is_paused());
        assert!(!music.is_playing());
        assert_eq!(session.get(SessionFlag::AudioEnabled), Some(false));

        let plays_before = stream.plays;
        assert!(!music.resume_from_foreground(&mut stream, &session));
        assert_eq!(stream.plays, plays_before);
        assert!(stream.is_paused());
    }

    #[test]
    fn test_foreground_resumes_when_session_says_playing() {
        let session = Session::in_memory();
        session.set(SessionFlag::AudioEnabled, true);
        let mut music = BackgroundMusic::default();
        let mut stream = FakeStream::paused();
        assert!(music.resume_from_foreground(&mut stream, &session));
        assert!(!stream.is_paused());
    }

    #[test]
    fn test_not_ready_sink_is_rejected() {
        let session = Session::in_memory();
        let mut music = BackgroundMusic::default();
        let mut backend = SinkBackend::new(None, &AudioUnlock { unlocked: true });
        assert_eq!(backend.play(), Err(AudioError::NotReady));
        assert!(!music.toggle_play(&mut backend, &session));
        assert_eq!(session.get(SessionFlag::AudioEnabled), Some(false));
    }

    #[test]
    fn test_toggle_without_storage_still_plays() {
        let session = Session::new(UnavailableStore);
        let mut music = BackgroundMusic::default();
        let mut stream = FakeStream::paused();
        assert!(music.toggle_play(&mut stream, &session));
    }

    #[test]
    fn test_locked_sink_rejects_play() {
        let session = Session::in_memory();
        let mut music = BackgroundMusic::default();
        let mut backend = SinkBackend::new(None, &AudioUnlock { unlocked: false });
        assert!(matches!(backend.play(), Err(AudioError::Rejected(_))));
        assert!(!music.toggle_play(&mut backend, &session));
        assert!(!music.is_playing());
        assert_eq!(session.get(SessionFlag::AudioEnabled), Some(false));
    }

    #[test]
    fn test_toggle_replaces_pending_restore() {
        let session = Session::in_memory();
        session.set(SessionFlag::AudioEnabled, true);
        let mut music = BackgroundMusic {
            restore_pending: true,
            ..default()
        };
        let mut stream = FakeStream::paused();
        assert!(music.toggle_play(&mut stream, &session));
        assert!(!music.restore_pending);
    }

    fn music_app(session: Session) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, InputPlugin, AssetPlugin::default()))
            .init_asset::<AudioSource>()
            .insert_resource(session)
            .add_plugins(MusicPlugin);
        app
    }

    #[test]
    fn test_restore_waits_for_first_gesture() {
        let session = Session::in_memory();
        session.set(SessionFlag::AudioEnabled, true);
        let mut app = music_app(session);
        app.insert_resource(AudioUnlock { unlocked: false });
        app.update();
        app.update();

        let music = app.world().resource::<BackgroundMusic>();
        assert!(music.restore_pending);
        assert!(!music.is_playing());
        assert!(!app.world().resource::<AudioUnlock>().unlocked);

        app.world_mut().write_message(MouseButtonInput {
            button: MouseButton::Left,
            state: ButtonState::Pressed,
            window: Entity::PLACEHOLDER,
        });
        app.update();
        assert!(app.world().resource::<AudioUnlock>().unlocked);
    }

    #[test]
    fn test_single_track_per_app() {
        use bevy::ecs::system::RunSystemOnce;

        let mut app = music_app(Session::in_memory());
        app.update();

        let first = app.world().resource::<BackgroundMusic>().track();
        app.world_mut()
            .run_system_once(
                |mut commands: Commands,
                 mut music: ResMut<BackgroundMusic>,
                 config: Res<MusicConfig>,
                 asset_server: Res<AssetServer>| {
                    music.ensure_initialized(&mut commands, &config, &asset_server);
                },
            )
            .unwrap();
        app.update();

        let mut tracks = app
            .world_mut()
            .query_filtered::<Entity, With<BackgroundTrack>>();
        assert_eq!(tracks.iter(app.world()).count(), 1);
        assert_eq!(app.world().resource::<BackgroundMusic>().track(), first);
    }
}
