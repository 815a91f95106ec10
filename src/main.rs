// Main
mod audio;
mod chrome;
mod intro;
mod landing;
mod loading;
mod nav;
mod pages;
mod sequencer;
mod session;
#[cfg(target_arch = "wasm32")]
mod web;

use audio::MusicPlugin;
use bevy::picking::mesh_picking::MeshPickingPlugin;
use bevy::prelude::*;
use bevy::window::CursorOptions;
use chrome::ChromePlugin;
use intro::IntroPlugin;
use landing::LandingPlugin;
use loading::LoadingPlugin;
use nav::NavPlugin;
use pages::PagesPlugin;
use sequencer::SequencerPlugin;
use session::SessionPlugin;

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Painting Wing | BIT Sindri".to_owned(),
                    fit_canvas_to_parent: true,
                    ..default()
                }),
                // Replaced by the orange cursor drawn in the UI.
                primary_cursor_options: Some(CursorOptions {
                    visible: false,
                    ..default()
                }),
                ..default()
            }),
            MeshPickingPlugin,
        ))
        .add_plugins((
            SessionPlugin,
            PagesPlugin,
            MusicPlugin,
            LandingPlugin,
            LoadingPlugin,
            SequencerPlugin,
            IntroPlugin,
            NavPlugin,
            ChromePlugin,
        ))
        .run();
}
