//! Keyboard and mouse input handling for the terminal dashboard.
//!
//! Input events are first mapped to an [`Action`], then applied to the
//! [`App`]. Actions that need I/O come back as a [`Command`] for the worker.
//!
//! # Key Bindings
//!
//! | Key | Action |
//! |-----|--------|
//! | `q` / `Esc` | Quit |
//! | `m` / `h` / `d` | Minute, hour or day buckets |
//! | `1`-`9` | Select tank |
//! | `Tab` | Focus the other chart |
//! | `↑` / `↓` | Move the focused chart's high bar |
//! | `PgUp` / `PgDn` | Move the focused chart's low bar |
//! | `r` | Reload the sensor log |
//!
//! Mouse: press on a bar, drag, release anywhere.

use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};

use tankwatch_types::Granularity;

use super::app::App;
use super::messages::Command;

/// User actions triggered by input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    SetGranularity(Granularity),
    SelectTank(u32),
    NextFocus,
    /// Move a bar of the focused chart one step.
    NudgeBar { index: usize, up: bool },
    Reload,
    MouseDown { x: u16, y: u16 },
    MouseDrag { y: u16 },
    MouseUp,
    /// No action (unrecognized input).
    None,
}

/// Map a key code to an action.
pub fn handle_key(key: KeyCode) -> Action {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('m') => Action::SetGranularity(Granularity::Minute),
        KeyCode::Char('h') => Action::SetGranularity(Granularity::Hour),
        KeyCode::Char('d') => Action::SetGranularity(Granularity::Day),
        KeyCode::Char(c @ '1'..='9') => Action::SelectTank(u32::from(c) - u32::from('0')),
        KeyCode::Tab | KeyCode::BackTab => Action::NextFocus,
        KeyCode::Up => Action::NudgeBar { index: 1, up: true },
        KeyCode::Down => Action::NudgeBar {
            index: 1,
            up: false,
        },
        KeyCode::PageUp => Action::NudgeBar { index: 0, up: true },
        KeyCode::PageDown => Action::NudgeBar {
            index: 0,
            up: false,
        },
        KeyCode::Char('r') => Action::Reload,
        _ => Action::None,
    }
}

/// Map a mouse event to an action.
pub fn handle_mouse(event: MouseEvent) -> Action {
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Action::MouseDown {
            x: event.column,
            y: event.row,
        },
        MouseEventKind::Drag(MouseButton::Left) => Action::MouseDrag { y: event.row },
        MouseEventKind::Up(MouseButton::Left) => Action::MouseUp,
        _ => Action::None,
    }
}

/// Apply an action to the application state.
///
/// Returns `Some(Command)` if the worker has to do something.
pub fn apply_action(app: &mut App, action: Action) -> Option<Command> {
    match action {
        Action::Quit => {
            app.should_quit = true;
            None
        }
        Action::SetGranularity(granularity) => {
            app.set_granularity(granularity);
            None
        }
        Action::SelectTank(tank) => {
            app.set_tank(tank);
            None
        }
        Action::NextFocus => {
            app.cycle_focus();
            None
        }
        Action::NudgeBar { index, up } => {
            app.nudge_bar(index, up);
            None
        }
        Action::Reload => Some(Command::Reload),
        Action::MouseDown { x, y } => {
            app.mouse_down(x, y);
            None
        }
        Action::MouseDrag { y } => {
            app.mouse_drag(y);
            None
        }
        Action::MouseUp => {
            app.mouse_up();
            None
        }
        Action::None => None,
    }
}
