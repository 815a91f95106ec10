// Nav titles: eight invisible click surfaces laid out around the studio, each
// bound to one route.
use bevy::asset::RenderAssetUsages;
use bevy::mesh::PrimitiveTopology;
use bevy::picking::Pickable;
use bevy::prelude::*;
use strum::{EnumIter, IntoEnumIterator};

use crate::landing::{BRAND_ORANGE, Opacity, SceneCamera};
use crate::pages::{NavigateTo, Page};
use crate::sequencer::RevealSignal;

pub struct NavPlugin;

impl Plugin for NavPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(Page::Landing), spawn_nav_zones)
            .add_systems(
                Update,
                (update_zone_opacity, place_zone_labels).run_if(in_state(Page::Landing)),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum NavZoneId {
    AboutUs,
    Events,
    PostBearers,
    Alumni,
    Merchandise,
    BitSindri,
    Gallery,
    Induction,
}

impl NavZoneId {
    pub fn zone(self) -> &'static NavZone {
        &NAV_ZONES[self as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavZone {
    pub id: NavZoneId,
    pub label: &'static str,
    pub route: &'static str,
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub bounding_size: Vec2,
}

impl NavZone {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        ))
    }
}

/// Ordered like [`NavZoneId`].
pub const NAV_ZONES: [NavZone; 8] = [
    NavZone {
        id: NavZoneId::AboutUs,
        label: "ABOUT US",
        route: "/about-us",
        position: Vec3::new(-2.3, 0.0, -10.5),
        rotation: Vec3::new(4.71, 0.0, 1.57),
        bounding_size: Vec2::new(1.0, 3.5),
    },
    NavZone {
        id: NavZoneId::Events,
        label: "EVENTS",
        route: "/events",
        position: Vec3::new(-7.5, 0.0, -7.5),
        rotation: Vec3::new(1.57, 3.14, 0.0),
        bounding_size: Vec2::new(1.0, 3.0),
    },
    NavZone {
        id: NavZoneId::PostBearers,
        label: "POST BEARERS",
        route: "/members",
        position: Vec3::new(-6.5, 0.0, 8.5),
        rotation: Vec3::new(4.71, 0.0, 1.57),
        bounding_size: Vec2::new(1.0, 5.0),
    },
    NavZone {
        id: NavZoneId::Alumni,
        label: "ALUMNI",
        route: "/alumni",
        position: Vec3::new(0.5, 0.0, 9.5),
        rotation: Vec3::new(4.71, 0.0, 1.57),
        bounding_size: Vec2::new(1.0, 3.0),
    },
    NavZone {
        id: NavZoneId::Merchandise,
        label: "MERCHANDISE",
        route: "/merchandise",
        position: Vec3::new(8.5, 0.0, -1.2),
        rotation: Vec3::new(1.57, 0.0, 0.0),
        bounding_size: Vec2::new(1.0, 4.2),
    },
    NavZone {
        id: NavZoneId::BitSindri,
        label: "BIT SINDRI",
        route: "/bit-sindri",
        position: Vec3::new(-8.5, 0.0, 0.0),
        rotation: Vec3::new(1.57, 0.0, 0.0),
        bounding_size: Vec2::new(1.0, 3.9),
    },
    NavZone {
        id: NavZoneId::Gallery,
        label: "GALLERY",
        route: "/gallery",
        position: Vec3::new(5.5, 0.0, 7.2),
        rotation: Vec3::new(1.6, 3.1, 3.1),
        bounding_size: Vec2::new(1.0, 3.5),
    },
    NavZone {
        id: NavZoneId::Induction,
        label: "INDUCTION",
        route: "/modelviewer",
        position: Vec3::new(5.5, 0.0, -8.0),
        rotation: Vec3::new(4.7, 0.0, 0.0),
        bounding_size: Vec2::new(1.0, 3.5),
    },
];

const HOVER_OPACITY: f32 = 0.7;
const CORNER_SIZE: f32 = 0.2;
const LABEL_FONT_SIZE: f32 = 18.0;

/// Interaction state of one click surface.
#[derive(Component, Debug, Clone, Copy)]
pub struct HotZone {
    pub id: NavZoneId,
    pub hovered: bool,
    /// Set by the first accepted click so a double click navigates once.
    pub clicked: bool,
}

impl HotZone {
    pub fn new(id: NavZoneId) -> Self {
        Self {
            id,
            hovered: false,
            clicked: false,
        }
    }

    pub fn pointer_enter(&mut self) {
        self.hovered = true;
    }

    pub fn pointer_leave(&mut self) {
        self.hovered = false;
    }

    /// The route to visit, if this click should navigate at all.
    pub fn click(&mut self, revealed: bool) -> Option<&'static str> {
        if !revealed || self.clicked {
            return None;
        }
        self.clicked = true;
        Some(self.id.zone().route)
    }

    pub fn highlight_opacity(&self, revealed: bool) -> f32 {
        if revealed && self.hovered {
            HOVER_OPACITY
        } else {
            0.0
        }
    }
}

/// Corner brackets of a zone; fade with the reveal signal.
#[derive(Component)]
struct ZoneFrame;

#[derive(Component)]
struct ZoneLabel {
    anchor: Vec3,
}

fn spawn_nav_zones(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Every frame shares one material since they all fade together.
    let frame_material = materials.add(StandardMaterial {
        base_color: BRAND_ORANGE.with_alpha(0.0),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    for id in NavZoneId::iter() {
        let zone = id.zone();
        let size = zone.bounding_size;
        commands
            .spawn((zone.transform(), Visibility::default(), DespawnOnExit(Page::Landing)))
            .with_children(|parent| {
                parent
                    .spawn((
                        HotZone::new(id),
                        Opacity(0.0),
                        Mesh3d(meshes.add(Rectangle::new(size.x, size.y))),
                        MeshMaterial3d(materials.add(StandardMaterial {
                            base_color: BRAND_ORANGE.with_alpha(0.0),
                            alpha_mode: AlphaMode::Blend,
                            unlit: true,
                            cull_mode: None,
                            double_sided: true,
                            ..default()
                        })),
                        Transform::from_xyz(0.0, 0.0, 0.01),
                    ))
                    .observe(zone_over)
                    .observe(zone_out)
                    .observe(zone_click);

                parent.spawn((
                    ZoneFrame,
                    Opacity(0.0),
                    Mesh3d(meshes.add(corner_mesh(size, CORNER_SIZE))),
                    MeshMaterial3d(frame_material.clone()),
                    Transform::default(),
                    Pickable::IGNORE,
                ));
            });

        commands.spawn((
            ZoneLabel {
                anchor: zone.position,
            },
            Text::new(zone.label),
            TextFont {
                font_size: LABEL_FONT_SIZE,
                ..default()
            },
            TextColor(Color::BLACK.with_alpha(0.0)),
            Node {
                position_type: PositionType::Absolute,
                ..default()
            },
            Pickable::IGNORE,
            DespawnOnExit(Page::Landing),
        ));
    }
}

/// L-shaped brackets at the four corners of a `size` rectangle in the XY
/// plane, each arm `arm` long.
pub fn corner_mesh(size: Vec2, arm: f32) -> Mesh {
    let half = size / 2.0;
    let mut positions = Vec::with_capacity(16);
    for (sx, sy) in [(-1.0, 1.0), (1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
        let corner = [sx * half.x, sy * half.y, 0.0];
        // Arms point inward along both axes.
        positions.push(corner);
        positions.push([corner[0] - sx * arm, corner[1], 0.0]);
        positions.push(corner);
        positions.push([corner[0], corner[1] - sy * arm, 0.0]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh
}

fn zone_over(over: On<Pointer<Over>>, mut zones: Query<&mut HotZone>) {
    if let Ok(mut zone) = zones.get_mut(over.entity) {
        zone.pointer_enter();
    }
}

fn zone_out(out: On<Pointer<Out>>, mut zones: Query<&mut HotZone>) {
    if let Ok(mut zone) = zones.get_mut(out.entity) {
        zone.pointer_leave();
    }
}

fn zone_click(
    click: On<Pointer<Click>>,
    reveal: Res<RevealSignal>,
    mut zones: Query<&mut HotZone>,
    mut navigate: MessageWriter<NavigateTo>,
) {
    let Ok(mut zone) = zones.get_mut(click.entity) else {
        return;
    };
    match zone.click(reveal.is_revealed()) {
        Some(route) => {
            debug!("{:?} clicked", zone.id);
            navigate.write(NavigateTo(route.to_owned()));
        }
        None if !reveal.is_revealed() => debug!("{:?} clicked before reveal", zone.id),
        None => {}
    }
}

fn update_zone_opacity(
    reveal: Res<RevealSignal>,
    mut surfaces: Query<(&HotZone, &mut Opacity), Without<ZoneFrame>>,
    mut frames: Query<&mut Opacity, With<ZoneFrame>>,
    mut labels: Query<&mut TextColor, With<ZoneLabel>>,
) {
    let revealed = reveal.is_revealed();
    for (zone, mut opacity) in &mut surfaces {
        let wanted = zone.highlight_opacity(revealed);
        if opacity.0 != wanted {
            opacity.0 = wanted;
        }
    }
    for mut opacity in &mut frames {
        if opacity.0 != reveal.opacity {
            opacity.0 = reveal.opacity;
        }
    }
    for mut color in &mut labels {
        if color.0.alpha() != reveal.opacity {
            color.0.set_alpha(reveal.opacity);
        }
    }
}

fn place_zone_labels(
    camera: Query<(&Camera, &GlobalTransform), With<SceneCamera>>,
    mut labels: Query<(&ZoneLabel, &mut Node, &mut Visibility)>,
) {
    let Ok((camera, camera_global)) = camera.single() else {
        return;
    };
    for (label, mut node, mut visibility) in &mut labels {
        match camera.world_to_viewport(camera_global, label.anchor) {
            Ok(screen) => {
                node.left = Val::Px(screen.x);
                node.top = Val::Px(screen.y);
                *visibility = Visibility::Inherited;
            }
            Err(_) => *visibility = Visibility::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_is_ordered_by_id() {
        for id in NavZoneId::iter() {
            assert_eq!(id.zone().id, id);
        }
        assert_eq!(NavZoneId::iter().count(), NAV_ZONES.len());
    }

    #[test]
    fn test_each_zone_navigates_to_its_own_route() {
        let expected = [
            (NavZoneId::AboutUs, "/about-us"),
            (NavZoneId::Events, "/events"),
            (NavZoneId::PostBearers, "/members"),
            (NavZoneId::Alumni, "/alumni"),
            (NavZoneId::Merchandise, "/merchandise"),
            (NavZoneId::BitSindri, "/bit-sindri"),
            (NavZoneId::Gallery, "/gallery"),
            (NavZoneId::Induction, "/modelviewer"),
        ];
        for (id, route) in expected {
            let mut zone = HotZone::new(id);
            assert_eq!(zone.click(true), Some(route), "{id:?}");
        }

        let routes: HashSet<_> = NAV_ZONES.iter().map(|z| z.route).collect();
        assert_eq!(routes.len(), NAV_ZONES.len());
    }

    #[test]
    fn test_gallery_never_triggers_alumni() {
        let mut gallery = HotZone::new(NavZoneId::Gallery);
        assert_ne!(gallery.click(true), Some(NavZoneId::Alumni.zone().route));
    }

    #[test]
    fn test_every_route_has_a_page() {
        for zone in &NAV_ZONES {
            assert_ne!(Page::from_route(zone.route), Page::NotFound, "{}", zone.route);
        }
    }

    #[test]
    fn test_click_before_reveal_is_ignored() {
        let mut zone = HotZone::new(NavZoneId::Events);
        assert_eq!(zone.click(false), None);
        assert!(!zone.clicked);
        assert_eq!(zone.click(true), Some("/events"));
    }

    #[test]
    fn test_double_click_navigates_once() {
        let mut zone = HotZone::new(NavZoneId::Alumni);
        assert_eq!(zone.click(true), Some("/alumni"));
        assert_eq!(zone.click(true), None);
    }

    #[test]
    fn test_hover_highlight() {
        let mut zone = HotZone::new(NavZoneId::Gallery);
        assert_eq!(zone.highlight_opacity(true), 0.0);
        zone.pointer_enter();
        assert_eq!(zone.highlight_opacity(true), HOVER_OPACITY);
        assert_eq!(zone.highlight_opacity(false), 0.0);
        zone.pointer_leave();
        assert_eq!(zone.highlight_opacity(true), 0.0);
    }

    #[test]
    fn test_corner_mesh_has_eight_arms() {
        let mesh = corner_mesh(Vec2::new(1.0, 3.0), 0.2);
        assert_eq!(mesh.count_vertices(), 16);
    }

    mod clicks {
        use std::time::Duration;

        use bevy::asset::AssetPlugin;
        use bevy::camera::NormalizedRenderTarget;
        use bevy::ecs::message::Messages;
        use bevy::picking::backend::HitData;
        use bevy::picking::pointer::{Location, PointerButton, PointerId};
        use bevy::prelude::*;
        use bevy::state::app::StatesPlugin;

        use crate::nav::{HotZone, NavPlugin, NavZoneId};
        use crate::pages::{NavigateTo, PagesPlugin};
        use crate::sequencer::RevealSignal;

        fn nav_app(revealed: bool) -> App {
            let mut app = App::new();
            app.add_plugins((MinimalPlugins, StatesPlugin, AssetPlugin::default()))
                .init_asset::<Mesh>()
                .init_asset::<StandardMaterial>()
                .insert_resource(RevealSignal {
                    target: if revealed { 1.0 } else { 0.0 },
                    opacity: if revealed { 1.0 } else { 0.0 },
                })
                .add_plugins((PagesPlugin, NavPlugin));
            app.update();
            app
        }

        fn zones(app: &mut App) -> Vec<(Entity, NavZoneId)> {
            let mut query = app.world_mut().query::<(Entity, &HotZone)>();
            query
                .iter(app.world())
                .map(|(entity, zone)| (entity, zone.id))
                .collect()
        }

        /// Clicks `entity` and returns every navigation it asked for.
        fn click(app: &mut App, entity: Entity) -> Vec<NavigateTo> {
            let location = Location {
                target: NormalizedRenderTarget::None {
                    width: 800,
                    height: 600,
                },
                position: Vec2::new(400.0, 300.0),
            };
            let event = Click {
                button: PointerButton::Primary,
                hit: HitData::new(Entity::PLACEHOLDER, 1.0, None, None),
                duration: Duration::from_millis(80),
            };
            app.world_mut()
                .trigger(Pointer::new(PointerId::Mouse, location, event, entity));
            app.world_mut()
                .resource_mut::<Messages<NavigateTo>>()
                .drain()
                .collect()
        }

        #[test]
        fn test_clicking_each_zone_requests_its_route() {
            let mut app = nav_app(true);
            let zones = zones(&mut app);
            assert_eq!(zones.len(), 8);

            for (entity, id) in zones {
                let sent = click(&mut app, entity);
                assert_eq!(sent, vec![NavigateTo(id.zone().route.to_owned())], "{id:?}");
            }
        }

        #[test]
        fn test_gallery_click_goes_to_gallery() {
            let mut app = nav_app(true);
            let (gallery, _) = zones(&mut app)
                .into_iter()
                .find(|(_, id)| *id == NavZoneId::Gallery)
                .unwrap();
            let sent = click(&mut app, gallery);
            assert_eq!(sent, vec![NavigateTo("/gallery".to_owned())]);
        }

        #[test]
        fn test_second_click_is_swallowed() {
            let mut app = nav_app(true);
            let (entity, _) = zones(&mut app)[0];
            assert_eq!(click(&mut app, entity).len(), 1);
            assert!(click(&mut app, entity).is_empty());
        }

        #[test]
        fn test_click_before_reveal_sends_nothing() {
            let mut app = nav_app(false);
            for (entity, _) in zones(&mut app) {
                assert!(click(&mut app, entity).is_empty());
            }
        }
    }
}
