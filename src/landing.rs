// Landing scene: orthographic camera, floor grid, the hollow studio cube and
// the marker cube the intro drops into it.
use bevy::asset::RenderAssetUsages;
use bevy::camera::ScalingMode;
use bevy::mesh::PrimitiveTopology;
use bevy::picking::Pickable;
use bevy::prelude::*;

use crate::intro::{IntroConfig, LOOK_TARGET};
use crate::pages::Page;
use crate::sequencer::{RevealSignal, tooltip_move, tooltip_out, tooltip_over};

pub struct LandingPlugin;

impl Plugin for LandingPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::WHITE))
            .add_systems(Startup, spawn_scene_camera)
            .add_systems(OnEnter(Page::Landing), spawn_landing)
            .add_systems(OnExit(Page::Landing), exit_landing)
            .add_systems(
                Update,
                (reveal_studio_model, sync_opacity).run_if(in_state(Page::Landing)),
            );
    }
}

const GRID_SIZE: f32 = 100.0;
const GRID_DIVISIONS: u32 = 100;
const HOLLOW_CUBE_SIZE: f32 = 1.2;
const HOLLOW_CUBE_THICKNESS: f32 = 0.27;
pub(crate) const STUDIO_MODEL_PATH: &str = "models/art_studio.glb";
const STUDIO_MODEL_SCALE: f32 = 0.35;

pub const BRAND_ORANGE: Color = Color::srgb(0.82, 0.36, 0.15);

#[derive(Component)]
pub struct SceneCamera;

#[derive(Component)]
pub struct IntroMarker;

/// Hover target for the instructional tooltip.
#[derive(Component)]
pub struct StudioModel;

/// Alpha mirrored into the entity's material whenever it changes.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Opacity(pub f32);

fn spawn_scene_camera(mut commands: Commands, config: Res<IntroConfig>) {
    let start = config.from;
    commands.spawn((
        SceneCamera,
        Camera3d::default(),
        Projection::from(OrthographicProjection {
            scaling_mode: ScalingMode::WindowSize,
            scale: 1.0 / start.camera_zoom,
            near: 0.1,
            far: 1000.0,
            ..OrthographicProjection::default_3d()
        }),
        Transform::from_translation(start.camera_translation).looking_at(LOOK_TARGET, Vec3::Y),
    ));
}

fn spawn_landing(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    asset_server: Res<AssetServer>,
    config: Res<IntroConfig>,
) {
    commands.insert_resource(GlobalAmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
        affects_lightmapped_meshes: false,
    });

    commands.spawn((
        Mesh3d(meshes.add(grid_mesh(GRID_SIZE, GRID_DIVISIONS))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgba(0.0, 0.0, 0.0, 0.1),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        })),
        Transform::default(),
        Pickable::IGNORE,
        DespawnOnExit(Page::Landing),
    ));

    // Hollow studio cube: a light shell with a darker well inside.
    let inner = HOLLOW_CUBE_SIZE - HOLLOW_CUBE_THICKNESS * 1.8;
    commands
        .spawn((
            Transform::default(),
            Visibility::default(),
            DespawnOnExit(Page::Landing),
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(
                    HOLLOW_CUBE_SIZE,
                    HOLLOW_CUBE_SIZE * 0.3,
                    HOLLOW_CUBE_SIZE,
                ))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.69, 0.77, 0.87),
                    unlit: true,
                    cull_mode: None,
                    double_sided: true,
                    ..default()
                })),
                Pickable::IGNORE,
            ));
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(
                    inner - 0.015,
                    inner * 0.5 - 0.015,
                    inner - 0.015,
                ))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.5, 0.5, 0.5),
                    unlit: true,
                    ..default()
                })),
                Transform::from_xyz(0.0, 0.05, 0.0),
                Pickable::IGNORE,
            ));
        });

    let start = config.from;
    commands.spawn((
        IntroMarker,
        Opacity(start.marker_opacity),
        Mesh3d(meshes.add(Cuboid::new(1.0, 1.0, 1.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: BRAND_ORANGE.with_alpha(start.marker_opacity),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        })),
        Transform::from_translation(start.marker_translation).with_scale(start.marker_scale),
        Pickable::IGNORE,
        DespawnOnExit(Page::Landing),
    ));

    // A missing or broken model file simply leaves this entity empty.
    commands
        .spawn((
            StudioModel,
            SceneRoot(asset_server.load(GltfAssetLabel::Scene(0).from_asset(STUDIO_MODEL_PATH))),
            Transform::from_xyz(0.0, 0.2, 0.0).with_scale(Vec3::splat(STUDIO_MODEL_SCALE)),
            Visibility::Hidden,
            DespawnOnExit(Page::Landing),
        ))
        .observe(tooltip_over)
        .observe(tooltip_move)
        .observe(tooltip_out);
}

fn exit_landing(mut commands: Commands) {
    commands.insert_resource(GlobalAmbientLight::NONE);
}

/// Square grid of line segments on the XZ plane, centred on the origin.
pub fn grid_mesh(size: f32, divisions: u32) -> Mesh {
    let half = size / 2.0;
    let step = size / divisions as f32;
    let mut positions = Vec::with_capacity(((divisions + 1) * 4) as usize);
    for i in 0..=divisions {
        let offset = i as f32 * step - half;
        positions.push([-half, 0.0, offset]);
        positions.push([half, 0.0, offset]);
        positions.push([offset, 0.0, -half]);
        positions.push([offset, 0.0, half]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh
}

fn reveal_studio_model(
    reveal: Res<RevealSignal>,
    mut model: Query<&mut Visibility, With<StudioModel>>,
) {
    let wanted = if reveal.opacity > 0.0 {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut visibility in &mut model {
        if *visibility != wanted {
            *visibility = wanted;
        }
    }
}

fn sync_opacity(
    mut materials: ResMut<Assets<StandardMaterial>>,
    query: Query<(&Opacity, &MeshMaterial3d<StandardMaterial>), Changed<Opacity>>,
) {
    for (opacity, material) in &query {
        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color.set_alpha(opacity.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::mesh::VertexAttributeValues;

    #[test]
    fn test_grid_mesh_covers_square() {
        let mesh = grid_mesh(10.0, 10);
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("grid mesh has no positions");
        };
        // Two segments per division line, two vertices per segment.
        assert_eq!(positions.len(), 11 * 4);
        assert!(positions.iter().all(|p| p[1] == 0.0));
        assert!(
            positions
                .iter()
                .all(|p| p[0].abs() <= 5.0 && p[2].abs() <= 5.0)
        );
    }
}
