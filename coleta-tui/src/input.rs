use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, HomeFocus, PointsFocus, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Issue the city lookup for the highlighted state
    SelectState,
    /// Hand the selected region over to the points screen
    EnterPoints,
    /// Flip the highlighted category and refetch if the filter changed
    ToggleCategory,
    /// Open the detail screen for the highlighted point
    OpenDetail,
    /// Re-issue the current screen's lookups
    Reload,
    Back,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Char, Down, Enter, Esc, Left, Right, Tab, Up};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() {
        return Action::Quit;
    }
    if key.code == Char('r') && key.modifiers.is_empty() {
        return Action::Reload;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::Home => match (app.home_focus, key.code) {
            (_, Tab | BackTab) => {
                app.home_focus = match app.home_focus {
                    HomeFocus::States => HomeFocus::Cities,
                    HomeFocus::Cities => HomeFocus::States,
                };
            }
            (HomeFocus::States, Up | Char('k')) => {
                app.state_list_index = app.state_list_index.saturating_sub(1);
            }
            (HomeFocus::States, Down | Char('j')) => {
                if app.state_list_index + 1 < app.region.states().items().len() {
                    app.state_list_index += 1;
                }
            }
            (HomeFocus::States, Enter | Char(' ')) => {
                action = Action::SelectState;
            }
            (HomeFocus::Cities, Up | Char('k')) => {
                app.city_list_index = app.city_list_index.saturating_sub(1);
                app.select_current_city();
            }
            (HomeFocus::Cities, Down | Char('j')) => {
                if app.city_list_index + 1 < app.region.cities().items().len() {
                    app.city_list_index += 1;
                }
                app.select_current_city();
            }
            (HomeFocus::Cities, Left | Esc) => {
                app.home_focus = HomeFocus::States;
            }
            (HomeFocus::Cities, Enter | Right) => {
                app.select_current_city();
                action = Action::EnterPoints;
            }
            _ => {}
        },

        Screen::Points => match (app.points_focus, key.code) {
            (_, Tab | BackTab) => {
                app.points_focus = match app.points_focus {
                    PointsFocus::Categories => PointsFocus::Points,
                    PointsFocus::Points => PointsFocus::Categories,
                };
            }
            (_, Esc | Char('b')) => {
                action = Action::Back;
            }
            (PointsFocus::Categories, Left | Char('h')) => {
                app.category_index = app.category_index.saturating_sub(1);
            }
            (PointsFocus::Categories, Right | Char('l')) => {
                let count = app
                    .points
                    .as_ref()
                    .map_or(0, |points| points.categories().items().len());
                if app.category_index + 1 < count {
                    app.category_index += 1;
                }
            }
            (PointsFocus::Categories, Enter | Char(' ')) => {
                action = Action::ToggleCategory;
            }
            (PointsFocus::Points, Up | Char('k')) => {
                app.point_index = app.point_index.saturating_sub(1);
            }
            (PointsFocus::Points, Down | Char('j')) => {
                let count = app
                    .points
                    .as_ref()
                    .map_or(0, |points| points.points().items().len());
                if app.point_index + 1 < count {
                    app.point_index += 1;
                }
            }
            (PointsFocus::Points, Enter | Right) => {
                action = Action::OpenDetail;
            }
            _ => {}
        },

        Screen::Detail => match key.code {
            Left | Esc | Char('b') => {
                action = Action::Back;
            }
            _ => {}
        },
    }
    action
}

pub(crate) fn perform(action: Action, app: &mut App) {
    match action {
        Action::None | Action::Quit => {}
        Action::SelectState => app.select_current_state(),
        Action::EnterPoints => app.enter_points(),
        Action::ToggleCategory => app.toggle_current_category(),
        Action::OpenDetail => app.open_current_point(),
        Action::Back => app.back(),
        Action::Reload => match app.screen {
            Screen::Home => app.mount_home(),
            Screen::Points => app.reload_points(),
            Screen::Detail => {}
        },
    }
}
