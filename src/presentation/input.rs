use crate::application::{App, AppMode};
use crate::infrastructure::clipboard_text;
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Form => Self::handle_form_mode(app, key, modifiers),
            AppMode::Help => Self::handle_help_mode(app, key),
        }
    }

    fn handle_form_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('b') => app.back(),
                KeyCode::Char('r') => app.clear_form(),
                KeyCode::Char('v') => match clipboard_text() {
                    Some(text) => app.paste(&text),
                    None => app.status_message = Some("Clipboard is empty".to_string()),
                },
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::F(1) => {
                app.mode = AppMode::Help;
                app.help_scroll = 0;
            }
            KeyCode::Tab | KeyCode::Down => app.focus_next(),
            KeyCode::BackTab | KeyCode::Up => app.focus_previous(),
            KeyCode::Left => app.cycle_option(false),
            KeyCode::Right => app.cycle_option(true),
            KeyCode::Enter => app.next(),
            KeyCode::Backspace => app.backspace(),
            KeyCode::Char(c) => app.type_char(c),
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') => {
                app.mode = AppMode::Form;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if app.help_scroll > 0 {
                    app.help_scroll -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{SubmissionBoundary, SubmissionError, Wizard};
    use crate::domain::job_application::*;
    use crate::domain::{DraftRecord, FieldValue};
    use crate::infrastructure::MemorySlot;
    use std::sync::Arc;

    struct NoopBoundary;

    impl SubmissionBoundary for NoopBoundary {
        fn submit(&self, _record: &DraftRecord) -> Result<(), SubmissionError> {
            Ok(())
        }
    }

    fn app() -> App {
        let wizard = Wizard::job_application(Box::new(MemorySlot::new())).unwrap();
        App::new(wizard, Arc::new(NoopBoundary))
    }

    fn press(app: &mut App, key: KeyCode) {
        InputHandler::handle_key_event(app, key, KeyModifiers::NONE);
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut app = app();

        press(&mut app, KeyCode::Char('I'));
        press(&mut app, KeyCode::Char('v'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.wizard.value(FIRST_NAME), &FieldValue::text("Iv"));
        assert_eq!(app.wizard.value(EMAIL), &FieldValue::text(""));
    }

    #[test]
    fn test_help_mode_toggle_and_scroll() {
        let mut app = app();

        press(&mut app, KeyCode::F(1));
        assert_eq!(app.mode, AppMode::Help);

        press(&mut app, KeyCode::PageDown);
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.help_scroll, 4);

        // 'q' closes help instead of reaching the form
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.mode, AppMode::Form);
        assert_eq!(app.wizard.value(FIRST_NAME), &FieldValue::Unset);
    }

    #[test]
    fn test_enter_on_invalid_step_stays() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.wizard.current_step(), 1);
        assert!(app.wizard.error_for(FIRST_NAME).is_some());
    }

    #[test]
    fn test_arrow_keys_cycle_select() {
        let mut app = app();
        press(&mut app, KeyCode::Up);
        assert_eq!(app.focused_field().unwrap().name, CITIZENSHIP);

        press(&mut app, KeyCode::Right);
        assert_eq!(app.wizard.value(CITIZENSHIP), &FieldValue::text("БЕЛАРУСЬ"));
        press(&mut app, KeyCode::Left);
        assert_eq!(app.wizard.value(CITIZENSHIP), &FieldValue::text("УКРАИНА"));
    }

    #[test]
    fn test_ctrl_shortcuts() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));

        // Ctrl+letter never types into the field
        InputHandler::handle_key_event(&mut app, KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(app.wizard.value(FIRST_NAME), &FieldValue::text("a"));

        InputHandler::handle_key_event(&mut app, KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(app.wizard.value(FIRST_NAME), &FieldValue::Unset);
        assert_eq!(app.status_message.as_deref(), Some("Form cleared"));

        InputHandler::handle_key_event(&mut app, KeyCode::Char('b'), KeyModifiers::CONTROL);
        assert_eq!(app.wizard.current_step(), 1);
    }
}
