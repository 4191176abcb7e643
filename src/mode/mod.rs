use anyhow::Result;
use crossterm::event::KeyEvent;

pub mod confirm;
pub mod edit;
pub mod prompt;

use crate::editor::Session;

pub use confirm::ConfirmExitMode;
pub use edit::EditMode;
pub use prompt::{Prompt, PromptKind};

/// Editor mode states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Edit,
    Prompt(Prompt),
    ConfirmExit,
    Help,
}

/// Context passed to mode handlers
pub struct EditorContext<'a> {
    pub session: &'a mut Session,
    /// Rows moved by PageUp/PageDown
    pub page: usize,
}

/// Result of handling an input event
#[derive(Debug, PartialEq, Eq)]
pub enum InputResult {
    /// Input was handled, continue
    Handled,
    /// Request mode change
    ModeSwitch(Mode),
    /// Request quit
    Quit,
    /// Input not handled
    NotHandled,
}

/// Trait for mode-specific input handlers
pub trait ModeHandler {
    fn handle_key(&mut self, key: KeyEvent, ctx: EditorContext) -> Result<InputResult>;
}

/// Route a key to the handler for `mode`
pub fn dispatch(mode: &mut Mode, key: KeyEvent, ctx: EditorContext) -> Result<InputResult> {
    match mode {
        Mode::Edit => EditMode.handle_key(key, ctx),
        Mode::Prompt(prompt) => prompt.handle_key(key, ctx),
        Mode::ConfirmExit => ConfirmExitMode.handle_key(key, ctx),
        // Any key leaves the help screen
        Mode::Help => Ok(InputResult::ModeSwitch(Mode::Edit)),
    }
}
