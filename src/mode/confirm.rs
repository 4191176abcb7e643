use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{EditorContext, InputResult, Mode, ModeHandler, Prompt};

/// Asked on exit when the window holds unsaved edits
pub struct ConfirmExitMode;

impl ModeHandler for ConfirmExitMode {
    fn handle_key(&mut self, key: KeyEvent, ctx: EditorContext) -> Result<InputResult> {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => {
                let prompt = Prompt::save_as(ctx.session.document().path(), true);
                Ok(InputResult::ModeSwitch(Mode::Prompt(prompt)))
            }
            // Exit without saving
            (KeyCode::Char('x'), KeyModifiers::CONTROL) => Ok(InputResult::Quit),
            _ => {
                ctx.session.set_status("Cancel");
                Ok(InputResult::ModeSwitch(Mode::Edit))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::editor::Session;
    use crate::mode::PromptKind;
    use tempfile::tempdir;

    fn answer(session: &mut Session, code: KeyCode, modifiers: KeyModifiers) -> InputResult {
        let ctx = EditorContext { session, page: 10 };
        ConfirmExitMode
            .handle_key(KeyEvent::new(code, modifiers), ctx)
            .unwrap()
    }

    #[test]
    fn test_confirm_answers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.txt");
        let mut session = Session::open(&path, Config::default()).unwrap();

        match answer(&mut session, KeyCode::Enter, KeyModifiers::NONE) {
            InputResult::ModeSwitch(Mode::Prompt(prompt)) => {
                assert_eq!(prompt.kind, PromptKind::SaveAs { exit_after: true });
                assert_eq!(prompt.input, path.display().to_string());
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            answer(&mut session, KeyCode::Char('x'), KeyModifiers::CONTROL),
            InputResult::Quit
        );

        assert_eq!(
            answer(&mut session, KeyCode::Char('c'), KeyModifiers::CONTROL),
            InputResult::ModeSwitch(Mode::Edit)
        );
        assert_eq!(session.status(), "Cancel");
    }
}
