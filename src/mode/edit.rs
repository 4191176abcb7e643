use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{EditorContext, InputResult, Mode, ModeHandler, Prompt};
use crate::buffer::Motion;
use crate::editor::Session;

/// Edit mode handler - typing, motion and the control-key commands
pub struct EditMode;

impl ModeHandler for EditMode {
    fn handle_key(&mut self, key: KeyEvent, ctx: EditorContext) -> Result<InputResult> {
        let session = ctx.session;

        match (key.code, key.modifiers) {
            // Save
            (KeyCode::Char('o'), KeyModifiers::CONTROL) => {
                let saved = session.save();
                session.report(saved);
            }

            // Exit, asking first if there is something to lose
            (KeyCode::Char('x'), KeyModifiers::CONTROL) => {
                if session.has_unsaved_changes() {
                    return Ok(InputResult::ModeSwitch(Mode::ConfirmExit));
                }
                return Ok(InputResult::Quit);
            }

            (KeyCode::Char('f'), KeyModifiers::CONTROL) => {
                let prompt = Prompt::find(session.search().needle());
                return Ok(InputResult::ModeSwitch(Mode::Prompt(prompt)));
            }

            (KeyCode::Char('g'), KeyModifiers::CONTROL) => {
                return Ok(InputResult::ModeSwitch(Mode::Help));
            }

            // Cancel: stops a load in flight, otherwise just acknowledges
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                if !session.cancel_load() {
                    session.set_status("Cancel");
                }
            }

            (KeyCode::Up, _) => step(session, Motion::Up),
            (KeyCode::Down, _) => step(session, Motion::Down),
            (KeyCode::Left, _) => step(session, Motion::Left),
            (KeyCode::Right, _) => step(session, Motion::Right),
            (KeyCode::Home, _) => step(session, Motion::Home),
            (KeyCode::End, _) => step(session, Motion::End),
            (KeyCode::PageUp, _) => step(session, Motion::PageUp(ctx.page)),
            (KeyCode::PageDown, _) => step(session, Motion::PageDown(ctx.page)),

            (KeyCode::Backspace, _) => {
                let result = session.backspace();
                session.report(result);
            }
            (KeyCode::Delete, _) => {
                let result = session.delete_forward();
                session.report(result);
            }
            (KeyCode::Enter, _) => {
                let result = session.newline();
                session.report(result);
            }
            (KeyCode::Tab, _) => {
                let result = session.insert_char('\t');
                session.report(result);
            }
            (KeyCode::Char(c), KeyModifiers::NONE) | (KeyCode::Char(c), KeyModifiers::SHIFT) => {
                let result = session.insert_char(c);
                session.report(result);
            }

            _ => return Ok(InputResult::NotHandled),
        }

        Ok(InputResult::Handled)
    }
}

fn step(session: &mut Session, motion: Motion) {
    let moved = session.move_cursor(motion);
    session.report(moved);
}
