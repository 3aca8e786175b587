use coleta_core::{
    location::ProbeState,
    model::{CollectionPoint, MapViewport},
    remote::{ListView, Remote},
};
use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap,
        canvas::{Canvas, Points},
    },
};

use crate::app::{App, HomeFocus, PointsFocus, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    // Title / header
    let header = Paragraph::new("coleta – find waste collection points near you")
        .block(Block::default().borders(Borders::ALL).title("Coleta"));
    frame.render_widget(header, *header_area);

    // Main screen
    match app.screen {
        Screen::Home => draw_home(frame, app, *content_area),
        Screen::Points => draw_points(frame, app, *content_area),
        Screen::Detail => draw_detail(frame, app, *content_area),
    }

    // Status bar
    let nav_hint = match app.screen {
        Screen::Home => {
            "Tab switch list · ↑/↓ move · Enter select · →/Enter on city open points · r reload · q quit"
        }
        Screen::Points => {
            "Tab switch pane · ←/→ category · Space toggle · ↑/↓ point · Enter details · Esc back · r reload · q quit"
        }
        Screen::Detail => "Esc/←/b back to points · q/Ctrl-C quit",
    };

    let status_text = if let Some(msg) = app.status_message() {
        format!("{msg} · {nav_hint}")
    } else if app.is_loading() {
        format!("Loading… · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.status_message().is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn list_placeholder<U>(remote: &Remote<Vec<U>>, idle: &str, empty: &str) -> Option<String> {
    match remote.view() {
        ListView::Idle => Some(idle.to_owned()),
        ListView::Loading => Some("Loading…".to_owned()),
        ListView::Empty => Some(empty.to_owned()),
        ListView::Failed => Some(format!(
            "Could not load: {}",
            remote.error().unwrap_or("unknown error")
        )),
        ListView::Populated(_) => None,
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    }
}

fn draw_home(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [states_area, cities_area] = chunks else {
        return;
    };

    let states = app.region.states();
    let selected_state = app.region.selected_state();
    let state_items = list_placeholder(states, "", "No states available").map_or_else(
        || {
            states
                .items()
                .iter()
                .map(|code| {
                    let marker = if Some(code) == selected_state { "● " } else { "  " };
                    ListItem::new(format!("{marker}{code}"))
                })
                .collect::<Vec<_>>()
        },
        |text| vec![ListItem::new(text)],
    );

    draw_list(
        frame,
        *states_area,
        state_items,
        "State (Enter to pick)",
        app.home_focus == HomeFocus::States,
        (!states.items().is_empty()).then_some(app.state_list_index),
    );

    let cities = app.region.cities();
    let selected_city = app.region.selected_city();
    let city_items = list_placeholder(cities, "Pick a state first", "No cities in this state")
        .map_or_else(
            || {
                cities
                    .items()
                    .iter()
                    .map(|name| {
                        let marker = if Some(name) == selected_city { "● " } else { "  " };
                        ListItem::new(format!("{marker}{name}"))
                    })
                    .collect::<Vec<_>>()
            },
            |text| vec![ListItem::new(text)],
        );

    let title = selected_state.map_or_else(
        || "City".to_owned(),
        |state| format!("City in {state} (Enter to open points)"),
    );
    draw_list(
        frame,
        *cities_area,
        city_items,
        &title,
        app.home_focus == HomeFocus::Cities,
        (!cities.items().is_empty()).then_some(app.city_list_index),
    );
}

fn draw_list(
    frame: &mut Frame<'_>,
    area: Rect,
    items: Vec<ListItem<'_>>,
    title: &str,
    focused: bool,
    selected: Option<usize>,
) {
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(focused))
                .title(title.to_owned()),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_points(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(controller) = app.points.as_ref() else {
        return;
    };

    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);
    let chunks = layout_chunks.as_ref();
    let [main_area, categories_area] = chunks else {
        return;
    };

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(*main_area);
    let main = main_chunks.as_ref();
    let [map_area, list_area] = main else {
        return;
    };

    let region = controller.region();
    let points = controller.points().items();
    let selected = points.get(app.point_index);

    // The map only exists once the device position resolved.
    match app.probe.viewport() {
        Some(viewport) => draw_map(frame, *map_area, viewport, points, selected),
        None => {
            let reason = match app.probe.state() {
                ProbeState::Unrequested | ProbeState::PermissionPending => {
                    "Waiting for location permission…".to_owned()
                }
                ProbeState::Resolving => "Locating…".to_owned(),
                ProbeState::Denied => {
                    "Location permission denied. Points are still listed on the right.".to_owned()
                }
                ProbeState::Unavailable(reason) => format!("Location unavailable: {reason}"),
                ProbeState::Resolved(_) => String::new(),
            };
            let paragraph = Paragraph::new(reason)
                .block(Block::default().borders(Borders::ALL).title("Map"))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, *map_area);
        }
    }

    let stale = if controller.points().is_stale() {
        " (stale)"
    } else {
        ""
    };
    let updated = app
        .refreshed_at
        .map(|at| format!(" · updated {}", at.format("%H:%M:%S")))
        .unwrap_or_default();
    let title = format!("Points in {}, {}{stale}{updated}", region.city, region.state);

    let focused = app.points_focus == PointsFocus::Points;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(focused))
        .title(title);

    if let Some(text) = list_placeholder(
        controller.points(),
        "",
        "No collection points match this filter",
    ) {
        let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, *list_area);
    } else {
        let rows = points.iter().map(|point| {
            Row::new(vec![
                Cell::from(point.id.to_string()),
                Cell::from(point.name.clone()),
                Cell::from(point.coordinate.to_string()),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(5),
                Constraint::Min(12),
                Constraint::Length(22),
            ],
        )
        .header(
            Row::new(vec!["#", "Name", "Position"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .row_highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(block)
        .column_spacing(1);

        let mut state = TableState::default();
        state.select(Some(app.point_index));
        frame.render_stateful_widget(table, *list_area, &mut state);
    }

    draw_categories(frame, app, *categories_area);
}

fn draw_map(
    frame: &mut Frame<'_>,
    area: Rect,
    viewport: MapViewport,
    points: &[CollectionPoint],
    selected: Option<&CollectionPoint>,
) {
    let center = viewport.center;
    let half_lat = viewport.latitude_delta / 2.0;
    let half_lon = viewport.longitude_delta / 2.0;

    let visible: Vec<&CollectionPoint> = points
        .iter()
        .filter(|point| viewport.contains(point.coordinate))
        .collect();
    let coords: Vec<(f64, f64)> = visible
        .iter()
        .map(|point| (point.coordinate.longitude(), point.coordinate.latitude()))
        .collect();

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Map around {center} · {} in view", visible.len())),
        )
        .x_bounds([center.longitude() - half_lon, center.longitude() + half_lon])
        .y_bounds([center.latitude() - half_lat, center.latitude() + half_lat])
        .paint(|ctx| {
            ctx.draw(&Points {
                coords: &[(center.longitude(), center.latitude())],
                color: Color::Blue,
            });
            ctx.draw(&Points {
                coords: &coords,
                color: Color::Green,
            });
            for point in &visible {
                let is_selected = selected.is_some_and(|current| current.id == point.id);
                let style = if is_selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Green)
                };
                ctx.print(
                    point.coordinate.longitude(),
                    point.coordinate.latitude(),
                    Span::styled(point.name.clone(), style),
                );
            }
        });

    frame.render_widget(canvas, area);
}

fn draw_categories(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(controller) = app.points.as_ref() else {
        return;
    };
    let categories = controller.categories();
    let focused = app.points_focus == PointsFocus::Categories;

    let line = list_placeholder(categories, "", "No categories available").map_or_else(
        || {
            let spans: Vec<Span<'_>> = categories
                .items()
                .iter()
                .enumerate()
                .flat_map(|(idx, category)| {
                    let checked = if controller.filter().contains(category.id) {
                        "[x]"
                    } else {
                        "[ ]"
                    };
                    let mut style = Style::default();
                    if controller.filter().contains(category.id) {
                        style = style.fg(Color::Green);
                    }
                    if focused && idx == app.category_index {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    [
                        Span::styled(format!("{checked} {}", category.label), style),
                        Span::raw("  "),
                    ]
                })
                .collect();
            Line::from(spans)
        },
        Line::from,
    );

    let title = if controller.filter().is_empty() {
        "Categories (all)".to_owned()
    } else {
        format!("Categories ({} selected)", controller.filter().len())
    };

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(focused))
            .title(title),
    );
    frame.render_widget(paragraph, area);
}

fn draw_detail(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Collection point (Esc/←/b to go back)");

    let remote = app.detail.remote();
    let Some(detail) = remote.value() else {
        let text = if remote.is_loading() {
            "Loading point…".to_owned()
        } else {
            format!(
                "Could not load point: {}",
                remote.error().unwrap_or("unknown error")
            )
        };
        let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let label = Style::default().add_modifier(Modifier::BOLD);
    let field = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(name, label), Span::raw(value)])
    };
    let lines = vec![
        Line::from(Span::styled(detail.name.clone(), label.fg(Color::Green))),
        Line::from(detail.items.join(", ")),
        Line::from(""),
        field("Address  ", format!("{}, {}", detail.city, detail.state)),
        field("E-mail   ", detail.email.clone()),
        field("WhatsApp ", detail.whatsapp.clone()),
        field("Photo    ", detail.image_uri.clone()),
    ];

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
