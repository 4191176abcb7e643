use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};

use super::{EditorContext, InputResult, Mode, ModeHandler};

/// What the entered text is used for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    Find,
    /// Save under a name; `exit_after` quits once the write succeeds
    SaveAs { exit_after: bool },
}

/// One-line text entry on the message line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    label: String,
    pub input: String,
    /// Used when the entry is submitted empty
    default: Option<PathBuf>,
}

impl Prompt {
    /// Find prompt. The previous needle is shown so an empty entry can repeat it.
    pub fn find(previous: &str) -> Self {
        let label = if previous.is_empty() {
            "Find:".to_string()
        } else {
            format!("Find({}):", previous)
        };
        Self {
            kind: PromptKind::Find,
            label,
            input: String::new(),
            default: None,
        }
    }

    pub fn save_as(default: &Path, exit_after: bool) -> Self {
        Self {
            kind: PromptKind::SaveAs { exit_after },
            label: "File Name:".to_string(),
            input: default.display().to_string(),
            default: Some(default.to_path_buf()),
        }
    }

    /// Text shown on the message line
    pub fn line(&self) -> String {
        format!("{} {}", self.label, self.input)
    }

    fn submit(&self, ctx: EditorContext) -> InputResult {
        let session = ctx.session;
        match self.kind {
            PromptKind::Find => {
                let found = session.find(&self.input);
                session.report(found);
                InputResult::ModeSwitch(Mode::Edit)
            }
            PromptKind::SaveAs { exit_after } => {
                let dest = match (&self.default, self.input.trim()) {
                    (Some(default), "") => default.clone(),
                    (_, name) => PathBuf::from(name),
                };
                if dest.as_os_str().is_empty() {
                    session.set_status("Cancel");
                    return InputResult::ModeSwitch(Mode::Edit);
                }
                let saved = session.save_as(&dest);
                match session.report(saved) {
                    Some(_) if exit_after => InputResult::Quit,
                    _ => InputResult::ModeSwitch(Mode::Edit),
                }
            }
        }
    }
}

impl ModeHandler for Prompt {
    fn handle_key(&mut self, key: KeyEvent, ctx: EditorContext) -> Result<InputResult> {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                ctx.session.set_status("Cancel");
                Ok(InputResult::ModeSwitch(Mode::Edit))
            }

            (KeyCode::Enter, _) => Ok(self.submit(ctx)),

            (KeyCode::Backspace, _) => {
                self.input.pop();
                Ok(InputResult::Handled)
            }

            (KeyCode::Char(c), KeyModifiers::NONE) | (KeyCode::Char(c), KeyModifiers::SHIFT) => {
                self.input.push(c);
                Ok(InputResult::Handled)
            }

            _ => Ok(InputResult::NotHandled),
        }
    }
}
