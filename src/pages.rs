/// Site pages, routing and the plain content pages behind the nav titles.
use bevy::prelude::*;
use strum::{EnumIter, IntoEnumIterator};

pub struct PagesPlugin;

impl Plugin for PagesPlugin {
    fn build(&self, app: &mut App) {
        app.insert_state(initial_page())
            .add_message::<NavigateTo>()
            .add_systems(Update, (route_requests, button_visuals, home_button));

        for page in Page::iter().filter(|p| *p != Page::Landing) {
            app.add_systems(OnEnter(page), move |commands: Commands| {
                spawn_content_page(commands, page)
            });
        }
        app.add_systems(Update, fade_page_title);

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Update, follow_browser_history.before(route_requests));
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States, EnumIter)]
pub enum Page {
    #[default]
    Landing,
    AboutUs,
    Events,
    Members,
    Alumni,
    Merchandise,
    BitSindri,
    Gallery,
    ModelViewer,
    NotFound,
}

impl Page {
    pub const fn route(self) -> &'static str {
        match self {
            Page::Landing => "/",
            Page::AboutUs => "/about-us",
            Page::Events => "/events",
            Page::Members => "/members",
            Page::Alumni => "/alumni",
            Page::Merchandise => "/merchandise",
            Page::BitSindri => "/bit-sindri",
            Page::Gallery => "/gallery",
            Page::ModelViewer => "/modelviewer",
            Page::NotFound => "/404",
        }
    }

    /// Unknown routes resolve to [`Page::NotFound`].
    pub fn from_route(route: &str) -> Page {
        let trimmed = route.trim_end_matches('/');
        let route = if trimmed.is_empty() { "/" } else { trimmed };
        Page::iter()
            .find(|page| *page != Page::NotFound && page.route() == route)
            .unwrap_or(Page::NotFound)
    }

    fn title(self) -> &'static str {
        match self {
            Page::Landing => "Painting Wing",
            Page::AboutUs => "About Us",
            Page::Events => "Events",
            Page::Members => "Post Bearers",
            Page::Alumni => "Alumni",
            Page::Merchandise => "Merchandise",
            Page::BitSindri => "BIT Sindri",
            Page::Gallery => "Gallery",
            Page::ModelViewer => "Induction Program",
            Page::NotFound => "404: Page not found",
        }
    }

    fn blurb(self) -> &'static str {
        match self {
            Page::Landing => "",
            Page::AboutUs => "The art club of BIT Sindri, painting since long before you got here.",
            Page::Events => "Workshops, exhibitions and the odd all-night mural.",
            Page::Members => "The people holding the brushes this year.",
            Page::Alumni => "Where our painters went next.",
            Page::Merchandise => "Wear the wing.",
            Page::BitSindri => "Departments and academics of BIT Sindri.",
            Page::Gallery => "Work from our members.",
            Page::ModelViewer => "Choose your best role, and apply for Induction.",
            Page::NotFound => "Nothing is painted here yet.",
        }
    }
}

/// Deep links open straight on their page.
#[cfg(target_arch = "wasm32")]
fn initial_page() -> Page {
    crate::web::current_route()
        .map(|route| Page::from_route(&route))
        .unwrap_or_default()
}

#[cfg(not(target_arch = "wasm32"))]
fn initial_page() -> Page {
    Page::default()
}

/// The page a browser Back or Forward landed on, when it is not the one
/// being shown.
#[cfg(any(target_arch = "wasm32", test))]
fn history_target(location: &str, current: Page) -> Option<Page> {
    let page = Page::from_route(location);
    (page != current).then_some(page)
}

/// Follows the address bar without pushing a new history entry.
#[cfg(target_arch = "wasm32")]
fn follow_browser_history(current: Res<State<Page>>, mut next_page: ResMut<NextState<Page>>) {
    let Some(location) = crate::web::current_route() else {
        return;
    };
    if let Some(page) = history_target(&location, **current) {
        debug!("history moved to {location}");
        next_page.set(page);
    }
}

/// Request to move to another route, e.g. from a nav title click.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct NavigateTo(pub String);

fn route_requests(
    mut requests: MessageReader<NavigateTo>,
    current: Res<State<Page>>,
    mut next_page: ResMut<NextState<Page>>,
) {
    // Last request in a frame wins.
    let Some(NavigateTo(route)) = requests.read().last() else {
        return;
    };
    let page = Page::from_route(route);
    if page == Page::NotFound {
        warn!("no page for route {route}");
    }
    if page == **current {
        return;
    }
    info!("navigating to {}", page.route());

    #[cfg(target_arch = "wasm32")]
    crate::web::push_route(page.route());

    next_page.set(page);
}

pub(crate) const NORMAL_BUTTON: Color = Color::srgb(0.82, 0.36, 0.15);
const HOVERED_BUTTON: Color = Color::srgb(0.91, 0.45, 0.35);
const PRESSED_BUTTON: Color = Color::srgb(0.64, 0.30, 0.14);
const PAGE_BACKGROUND: Color = Color::srgb(0.88, 0.86, 0.84);
const TITLE_FADE_IN: f32 = 0.6;

/// Marker for every button styled by [`button_visuals`].
#[derive(Component)]
pub(crate) struct SiteButton;

#[derive(Component)]
struct HomeButton;

#[derive(Component)]
struct PageTitle {
    elapsed: f32,
}

fn spawn_content_page(mut commands: Commands, page: Page) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(24.0),
                ..default()
            },
            BackgroundColor(PAGE_BACKGROUND),
            DespawnOnExit(page),
        ))
        .with_children(|parent| {
            parent.spawn((
                PageTitle { elapsed: 0.0 },
                Text::new(page.title().to_uppercase()),
                TextFont {
                    font_size: 64.0,
                    ..default()
                },
                TextColor(Color::srgba(0.2, 0.2, 0.2, 0.0)),
            ));
            parent.spawn((
                Text::new(page.blurb()),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(Color::srgb(0.35, 0.35, 0.35)),
            ));
            spawn_button(parent, "Home", HomeButton);
        });
}

pub(crate) fn spawn_button(parent: &mut ChildSpawnerCommands, label: &str, marker: impl Bundle) {
    parent
        .spawn((
            marker,
            SiteButton,
            Button,
            Node {
                width: Val::Px(160.0),
                height: Val::Px(44.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.3)),
            BackgroundColor(NORMAL_BUTTON),
        ))
        .with_children(|btn| {
            btn.spawn((
                Text::new(label),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

fn button_visuals(
    mut query: Query<
        (&Interaction, &mut BackgroundColor, &mut BorderColor),
        (Changed<Interaction>, With<SiteButton>),
    >,
) {
    for (interaction, mut bg, mut border) in &mut query {
        match *interaction {
            Interaction::Pressed => {
                *bg = PRESSED_BUTTON.into();
                *border = BorderColor::all(Color::WHITE);
            }
            Interaction::Hovered => {
                *bg = HOVERED_BUTTON.into();
                *border = BorderColor::all(Color::WHITE);
            }
            Interaction::None => {
                *bg = NORMAL_BUTTON.into();
                *border = BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.3));
            }
        }
    }
}

fn home_button(
    query: Query<&Interaction, (Changed<Interaction>, With<HomeButton>)>,
    mut navigate: MessageWriter<NavigateTo>,
) {
    for interaction in &query {
        if *interaction == Interaction::Pressed {
            navigate.write(NavigateTo(Page::Landing.route().to_owned()));
        }
    }
}

fn fade_page_title(time: Res<Time>, mut titles: Query<(&mut PageTitle, &mut TextColor)>) {
    for (mut title, mut color) in &mut titles {
        if title.elapsed >= TITLE_FADE_IN {
            continue;
        }
        title.elapsed += time.delta_secs();
        let alpha = (title.elapsed / TITLE_FADE_IN).min(1.0);
        color.0 = color.0.with_alpha(alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    #[test]
    fn test_every_route_round_trips() {
        for page in Page::iter().filter(|p| *p != Page::NotFound) {
            assert_eq!(Page::from_route(page.route()), page, "{page:?}");
        }
    }

    #[test]
    fn test_trailing_slash_and_unknown_routes() {
        assert_eq!(Page::from_route("/gallery/"), Page::Gallery);
        assert_eq!(Page::from_route(""), Page::Landing);
        assert_eq!(Page::from_route("/induction"), Page::NotFound);
        assert_eq!(Page::from_route("/404"), Page::NotFound);
    }

    #[test]
    fn test_history_moves_follow_the_address_bar() {
        assert_eq!(history_target("/", Page::Gallery), Some(Page::Landing));
        assert_eq!(history_target("/gallery/", Page::Landing), Some(Page::Gallery));
        assert_eq!(history_target("/gallery", Page::Gallery), None);
        // An unknown path already showing Not Found stays put.
        assert_eq!(history_target("/nowhere", Page::NotFound), None);
        assert_eq!(history_target("/nowhere", Page::Events), Some(Page::NotFound));
    }

    fn pages_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin, PagesPlugin));
        app.update();
        app
    }

    #[test]
    fn test_navigate_message_switches_page() {
        let mut app = pages_app();
        app.world_mut()
            .write_message(NavigateTo("/alumni".to_owned()));
        app.update();
        app.update();
        assert_eq!(*app.world().resource::<State<Page>>().get(), Page::Alumni);
    }

    #[test]
    fn test_unknown_route_lands_on_not_found() {
        let mut app = pages_app();
        app.world_mut()
            .write_message(NavigateTo("/nowhere".to_owned()));
        app.update();
        app.update();
        assert_eq!(
            *app.world().resource::<State<Page>>().get(),
            Page::NotFound
        );
    }
}
