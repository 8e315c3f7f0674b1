use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use saferr_core::auth::Guarded;

use crate::app::{App, AppState, LoginFocus, LoginMode, Page, ProductField};

use super::styles;
use super::tabs::{brand, codes, dashboard, products, suspicious, trends};

const LOGO: [&str; 3] = [
    "╔═╗╔═╗╔═╗╔═╗╦═╗╦═╗",
    "╚═╗╠═╣╠╣ ║╣ ╠╦╝╠╦╝",
    "╚═╝╩ ╩╚  ╚═╝╩╚═╩╚═",
];

/// Visible width of login form fields
const FIELD_WIDTH: usize = 22;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Page tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::CreatingProduct => render_product_form_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  SAFERR Brand Console";
    let identity = app
        .session()
        .map(|s| format!("{} @ {}   ", s.username, s.brand_name))
        .unwrap_or_default();
    let help_hint = "[?] Help";
    let used = title.chars().count() + identity.chars().count() + help_hint.len() + 4;

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(identity, styles::highlight_style()),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, page.title());
        spans.push(Span::styled(label, styles::tab_style(*page == app.current_page)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

/// Every page is protected: content only renders for a valid session
fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.guard().render(|| None, |session| Some(session.clone())) {
        Guarded::Placeholder(_) => render_notice(frame, "Checking session...", area),
        Guarded::Redirect | Guarded::Content(None) => {
            render_notice(frame, "Sign in to continue", area)
        }
        Guarded::Content(Some(session)) => match app.current_page {
            Page::Dashboard => dashboard::render(frame, app, &session, area),
            Page::Brand => brand::render(frame, app, &session, area),
            Page::Products => products::render(frame, app, area),
            Page::Codes => codes::render(frame, app, area),
            Page::Trends => trends::render(frame, app, area),
            Page::Suspicious => suspicious::render(frame, app, area),
        },
    }
}

fn render_notice(frame: &mut Frame, text: &str, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let paragraph = Paragraph::new(Line::from(Span::styled(format!(" {}", text), styles::muted_style())))
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[u]pdate | [L]ogout | [q]uit";

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if let Some(session) = app.session() {
        format!(" Session expires in {} min ", session.minutes_until_expiry())
    } else {
        " Not signed in ".to_string()
    };
    let left_text = if app.is_loading() {
        format!("{}… ", left_text.trim_end())
    } else {
        left_text
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn logo_lines(indent: usize) -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|row| {
            Line::from(Span::styled(
                format!("{}{}", " ".repeat(indent), row),
                styles::title_style(),
            ))
        })
        .collect()
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 28, frame.area());
    frame.render_widget(Clear, area);

    let mut help_text = logo_lines(15);
    help_text.push(Line::from(Span::styled(
        format!("              version {}", env!("CARGO_PKG_VERSION")),
        styles::muted_style(),
    )));
    help_text.extend([
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-6", "Switch pages"),
        help_line("←/→", "Previous/next page"),
        help_line("↑/↓", "Navigate list"),
        help_line("PgUp/PgDn", "Scroll a page at a time"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("u", "Reload the current page"),
        help_line("n", "New product (Products page)"),
        help_line("Enter", "Product details (Products page)"),
        help_line("g", "Generate codes (Codes page)"),
        help_line("[ / ]", "Earlier/later window (Trends)"),
        help_line("+ / -", "More/fewer results (Suspicious)"),
        help_line("L", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Show the tail of a value so the cursor end stays visible
fn field_text(value: &str, masked: bool) -> String {
    let shown: String = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let len = shown.chars().count();
    let tail: String = shown.chars().skip(len.saturating_sub(FIELD_WIDTH)).collect();
    format!("{:<width$}", tail, width = FIELD_WIDTH)
}

fn field_line(focused: bool, masked: bool, label: &'static str, value: &str) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(format!("{:<10}[", label), styles::muted_style()),
        Span::styled(
            format!("{}{}", field_text(value, masked), cursor),
            style,
        ),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let registering = app.login_mode == LoginMode::Register;
    let mut height = if registering { 15 } else { 13 };
    if app.login_error.is_some() {
        height += 2;
    }
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines(12);
    lines.push(Line::from(""));

    let focus = app.login_focus;
    lines.push(field_line(focus == LoginFocus::Username, false, "Username:", &app.login_username));
    if registering {
        lines.push(field_line(focus == LoginFocus::Email, false, "Email:", &app.login_email));
    }
    lines.push(field_line(focus == LoginFocus::Password, true, "Password:", &app.login_password));
    if registering {
        lines.push(field_line(focus == LoginFocus::BrandName, false, "Brand:", &app.login_brand_name));
    }

    let action = if registering { "Register" } else { "Sign in" };
    lines.push(Line::from(""));
    lines.push(button_line(action, focus == LoginFocus::Button));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    lines.push(Line::from(""));
    let other = if registering { "sign in" } else { "register" };
    lines.push(Line::from(vec![
        Span::styled(" Ctrl+R", styles::help_key_style()),
        Span::styled(format!(" {}   ", other), styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" quit", styles::muted_style()),
    ]));

    let title = if registering { " Create account " } else { " Sign in " };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn button_line(action: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let label = if focused {
        format!(" ▶ {} ◀ ", action)
    } else {
        format!("   {}   ", action)
    };
    Line::from(vec![
        Span::raw(" ".repeat(21usize.saturating_sub(label.chars().count() / 2))),
        Span::raw("["),
        Span::styled(label, style),
        Span::raw("]"),
    ])
}

fn render_product_form_overlay(frame: &mut Frame, app: &App) {
    let height = if app.product_form_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let brand = app.session().map(|s| s.brand_name).unwrap_or_default();
    let field = app.product_field;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("   Brand:    ", styles::muted_style()),
            Span::styled(brand, styles::highlight_style()),
        ]),
        Line::from(""),
        field_line(field == ProductField::Name, false, "Name:", &app.new_product_name),
        field_line(field == ProductField::Description, false, "About:", &app.new_product_description),
        field_line(field == ProductField::Identifier, false, "SKU/GTIN:", &app.new_product_identifier),
        Line::from(""),
        button_line("Create", field == ProductField::Button),
    ];

    if let Some(ref error) = app.product_form_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(" New Product ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 9, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines(12);
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use ratatui::{backend::TestBackend, Terminal};
    use saferr_core::auth::Session;

    fn main_content_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_main_content(frame, app, area);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn session(expires_in: Duration) -> Session {
        Session {
            token: "xyz".to_string(),
            expiration: Utc::now() + expires_in,
            user_id: "u1".to_string(),
            username: "brand1".to_string(),
            brand_id: "5f0c1a2b-0000-4000-8000-000000000001".to_string(),
            brand_name: "Acme".to_string(),
        }
    }

    #[test]
    fn test_main_content_follows_guard_state() {
        let app = App::for_tests();
        let state = app.store.api().auth_state().clone();

        // Startup check still running
        let text = main_content_text(&app);
        assert!(text.contains("Checking session..."));
        assert!(!text.contains("Welcome"));

        state.finish_initializing(None);
        let text = main_content_text(&app);
        assert!(text.contains("Sign in to continue"));
        assert!(!text.contains("Welcome"));

        state.set_session(session(Duration::hours(1)));
        let text = main_content_text(&app);
        assert!(text.contains("Welcome, brand1 (Acme)"));
        assert!(!text.contains("Sign in to continue"));

        // Expired in place: redirect without any server call
        state.set_session(session(-Duration::minutes(1)));
        let text = main_content_text(&app);
        assert!(text.contains("Sign in to continue"));
    }

    #[test]
    fn test_brand_page_renders_for_session() {
        let mut app = App::for_tests();
        app.restore_session(session(Duration::hours(1)));
        app.current_page = Page::Brand;
        let text = main_content_text(&app);
        assert!(text.contains("My Brand"));
        assert!(text.contains("Acme"));
    }

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(46, 10, outer), Rect::new(27, 15, 46, 10));
        // Clamped to the available area
        let small = Rect::new(0, 0, 30, 5);
        assert_eq!(centered_rect_fixed(46, 10, small), Rect::new(0, 0, 30, 5));
    }

    #[test]
    fn test_field_text_masks_and_keeps_tail() {
        assert_eq!(field_text("pw", true).trim_end(), "**");
        let long = "a".repeat(30) + "XYZ";
        let shown = field_text(&long, false);
        assert_eq!(shown.chars().count(), FIELD_WIDTH);
        assert!(shown.ends_with("XYZ"));
    }
}
