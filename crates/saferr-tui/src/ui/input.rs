//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{
    can_add_count_char, can_add_login_char, can_add_product_char, App, AppState, LoginFocus, Page,
    ProductField, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::EnteringCount => {
            handle_count_input(app, key);
            return Ok(false);
        }
        AppState::CreatingProduct => {
            handle_product_form_input(app, key);
            return Ok(false);
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('L') => {
            app.logout();
            return Ok(false);
        }
        KeyCode::Char('u') => {
            app.refresh_current_page();
            return Ok(false);
        }
        KeyCode::Char(c @ '1'..='6') => {
            if let Some(page) = Page::from_digit(c) {
                app.switch_page(page);
            }
            return Ok(false);
        }
        KeyCode::Left => {
            app.switch_page(app.current_page.prev());
            return Ok(false);
        }
        KeyCode::Right => {
            app.switch_page(app.current_page.next());
            return Ok(false);
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        _ => handle_page_input(app, key),
    }
    Ok(false)
}

fn handle_page_input(app: &mut App, key: KeyEvent) {
    match app.current_page {
        Page::Codes => match key.code {
            KeyCode::Char('g') | KeyCode::Enter => {
                if app.selected_product().is_some() {
                    app.state = AppState::EnteringCount;
                } else {
                    app.status_message = Some("Select a product first".to_string());
                }
            }
            KeyCode::Char('J') => {
                let max = app.generated_codes.len().saturating_sub(1);
                app.code_scroll = (app.code_scroll + PAGE_SCROLL_SIZE).min(max);
            }
            KeyCode::Char('K') => {
                app.code_scroll = app.code_scroll.saturating_sub(PAGE_SCROLL_SIZE);
            }
            _ => {}
        },
        Page::Products => match key.code {
            KeyCode::Char('n') => app.start_create_product(),
            KeyCode::Enter => app.load_product_detail(),
            _ => {}
        },
        Page::Trends => match key.code {
            KeyCode::Char('[') => app.shift_trend_window(true),
            KeyCode::Char(']') => app.shift_trend_window(false),
            _ => {}
        },
        Page::Suspicious => match key.code {
            KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_suspicious_limit(true),
            KeyCode::Char('-') => app.adjust_suspicious_limit(false),
            _ => {}
        },
        Page::Dashboard | Page::Brand => {}
    }
}

fn handle_count_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Enter => {
            app.generate_codes();
        }
        KeyCode::Backspace => {
            app.code_count_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_count_char(app.code_count_input.len(), c) {
                app.code_count_input.push(c);
            }
        }
        _ => {}
    }
}

fn focused_product_field(app: &mut App) -> Option<&mut String> {
    match app.product_field {
        ProductField::Name => Some(&mut app.new_product_name),
        ProductField::Description => Some(&mut app.new_product_description),
        ProductField::Identifier => Some(&mut app.new_product_identifier),
        ProductField::Button => None,
    }
}

fn handle_product_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.product_field = app.product_field.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.product_field = app.product_field.prev();
        }
        KeyCode::Enter => {
            if app.product_field == ProductField::Button {
                app.submit_product();
            } else {
                app.product_field = app.product_field.next();
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = focused_product_field(app) {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            let focus = app.product_field;
            if let Some(field) = focused_product_field(app) {
                if can_add_product_char(focus, field.chars().count(), c) {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
}

fn focused_field(app: &mut App) -> Option<&mut String> {
    match app.login_focus {
        LoginFocus::Username => Some(&mut app.login_username),
        LoginFocus::Email => Some(&mut app.login_email),
        LoginFocus::Password => Some(&mut app.login_password),
        LoginFocus::BrandName => Some(&mut app.login_brand_name),
        LoginFocus::Button => None,
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_login_mode();
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next(app.login_mode);
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev(app.login_mode);
        }
        KeyCode::Enter => {
            if app.login_focus == LoginFocus::Button {
                app.submit_login().await;
            } else {
                app.login_focus = app.login_focus.next(app.login_mode);
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = focused_field(app) {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            let focus = app.login_focus;
            if let Some(field) = focused_field(app) {
                if can_add_login_char(focus, field.chars().count(), c) {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_product_form_input(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_new_product_form_fills_fields_in_order() {
        let mut app = App::for_tests();
        app.current_page = Page::Products;
        handle_page_input(&mut app, key(KeyCode::Char('n')));
        assert_eq!(app.state, AppState::CreatingProduct);

        type_text(&mut app, "Serum");
        handle_product_form_input(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "Night serum");
        handle_product_form_input(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "SKU-9x");
        handle_product_form_input(&mut app, key(KeyCode::Backspace));

        assert_eq!(app.new_product_name, "Serum");
        assert_eq!(app.new_product_description, "Night serum");
        assert_eq!(app.new_product_identifier, "SKU-9");
        assert_eq!(app.product_field, ProductField::Identifier);

        handle_product_form_input(&mut app, key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_new_product_only_from_products_page() {
        let mut app = App::for_tests();
        app.current_page = Page::Dashboard;
        handle_page_input(&mut app, key(KeyCode::Char('n')));
        assert_eq!(app.state, AppState::Normal);
    }
}
