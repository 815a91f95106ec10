// Landing overlay shown while the studio model and the music load.
use std::time::Duration;

use bevy::asset::{LoadState, UntypedHandle};
use bevy::prelude::*;

use crate::audio::MusicConfig;
use crate::landing::STUDIO_MODEL_PATH;
use crate::pages::Page;

pub struct LoadingPlugin;

impl Plugin for LoadingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(Page::Landing), spawn_loading_screen)
            .add_systems(
                Update,
                track_loading.run_if(resource_exists::<LoadingScreen>),
            )
            .add_systems(OnExit(Page::Landing), |mut commands: Commands| {
                commands.remove_resource::<LoadingScreen>();
            });
    }
}

/// The overlay gives up waiting after this long.
const FALLBACK_SECS: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub settled: usize,
    pub total: usize,
}

impl LoadProgress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.settled as f32 / self.total as f32
    }

    pub fn is_complete(&self) -> bool {
        self.settled >= self.total
    }
}

/// A failed load still counts; the scene renders without that asset.
pub fn is_settled(state: &LoadState) -> bool {
    matches!(state, LoadState::Loaded | LoadState::Failed(_))
}

/// Present while the overlay is up.
#[derive(Resource, Debug)]
pub struct LoadingScreen {
    assets: Vec<UntypedHandle>,
    fallback: Timer,
    done: bool,
}

impl LoadingScreen {
    pub fn new(assets: Vec<UntypedHandle>) -> Self {
        Self {
            assets,
            fallback: Timer::from_seconds(FALLBACK_SECS, TimerMode::Once),
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Returns true on the tick the overlay should go away.
    pub fn tick(&mut self, progress: LoadProgress, delta: Duration) -> bool {
        if self.done {
            return false;
        }
        self.fallback.tick(delta);
        if progress.is_complete() {
            info!("landing assets ready");
            self.done = true;
        } else if self.fallback.is_finished() {
            warn!(
                "landing assets still loading after {FALLBACK_SECS}s ({}/{}), showing the scene anyway",
                progress.settled, progress.total
            );
            self.done = true;
        }
        self.done
    }
}

#[derive(Component)]
struct LoadingOverlay;

#[derive(Component)]
struct LoadingPercent;

#[derive(Component)]
struct LoadingBar;

fn progress_of(asset_server: &AssetServer, assets: &[UntypedHandle]) -> LoadProgress {
    LoadProgress {
        settled: assets
            .iter()
            .filter(|handle| is_settled(&asset_server.load_state(handle.id())))
            .count(),
        total: assets.len(),
    }
}

fn spawn_loading_screen(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    music: Res<MusicConfig>,
) {
    let assets = vec![
        asset_server
            .load::<Scene>(GltfAssetLabel::Scene(0).from_asset(STUDIO_MODEL_PATH))
            .untyped(),
        asset_server
            .load::<AudioSource>(music.track.clone())
            .untyped(),
    ];
    // Coming back to the landing page finds everything cached.
    if progress_of(&asset_server, &assets).is_complete() {
        return;
    }
    commands.insert_resource(LoadingScreen::new(assets));

    commands
        .spawn((
            LoadingOverlay,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(16.0),
                ..default()
            },
            BackgroundColor(Color::WHITE),
            GlobalZIndex(200),
            DespawnOnExit(Page::Landing),
        ))
        .with_children(|parent| {
            parent.spawn((
                LoadingPercent,
                Text::new("0%"),
                TextFont {
                    font_size: 40.0,
                    ..default()
                },
                TextColor(Color::srgb(0.2, 0.2, 0.2)),
            ));
            parent
                .spawn((
                    Node {
                        width: Val::Px(240.0),
                        height: Val::Px(4.0),
                        ..default()
                    },
                    BackgroundColor(Color::srgb(0.9, 0.9, 0.9)),
                ))
                .with_children(|track| {
                    track.spawn((
                        LoadingBar,
                        Node {
                            width: Val::Percent(0.0),
                            height: Val::Percent(100.0),
                            ..default()
                        },
                        BackgroundColor(Color::srgb(0.82, 0.36, 0.15)),
                    ));
                });
        });
}

fn track_loading(
    mut commands: Commands,
    time: Res<Time>,
    asset_server: Res<AssetServer>,
    mut screen: ResMut<LoadingScreen>,
    overlays: Query<Entity, With<LoadingOverlay>>,
    mut percent: Query<&mut Text, With<LoadingPercent>>,
    mut bar: Query<&mut Node, With<LoadingBar>>,
) {
    if screen.is_done() {
        return;
    }
    let progress = progress_of(&asset_server, &screen.assets);
    let shown = (progress.fraction() * 100.0).round();
    for mut text in &mut percent {
        **text = format!("{shown}%");
    }
    for mut node in &mut bar {
        node.width = Val::Percent(shown);
    }

    if screen.tick(progress, time.delta()) {
        for overlay in &overlays {
            commands.entity(overlay).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        let progress = LoadProgress {
            settled: 1,
            total: 2,
        };
        assert_eq!(progress.fraction(), 0.5);
        assert!(!progress.is_complete());
        let nothing = LoadProgress {
            settled: 0,
            total: 0,
        };
        assert_eq!(nothing.fraction(), 1.0);
        assert!(nothing.is_complete());
    }

    #[test]
    fn test_failed_loads_still_count() {
        assert!(is_settled(&LoadState::Loaded));
        assert!(!is_settled(&LoadState::Loading));
        assert!(!is_settled(&LoadState::NotLoaded));
    }

    #[test]
    fn test_overlay_closes_when_everything_settles() {
        let mut screen = LoadingScreen::new(Vec::new());
        let pending = LoadProgress {
            settled: 1,
            total: 2,
        };
        assert!(!screen.tick(pending, Duration::from_secs(1)));
        assert!(!screen.is_done());

        let settled = LoadProgress {
            settled: 2,
            total: 2,
        };
        assert!(screen.tick(settled, Duration::from_millis(16)));
        assert!(screen.is_done());
        // Only the closing tick reports true.
        assert!(!screen.tick(settled, Duration::from_millis(16)));
    }

    #[test]
    fn test_fallback_closes_a_stuck_overlay() {
        let mut screen = LoadingScreen::new(Vec::new());
        let stuck = LoadProgress {
            settled: 0,
            total: 2,
        };
        assert!(!screen.tick(stuck, Duration::from_secs(5)));
        assert!(screen.tick(stuck, Duration::from_secs(1)));
        assert!(screen.is_done());
    }
}
