use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saferr_core::api::MAX_CODES_PER_REQUEST;

use crate::app::{App, AppState};
use crate::ui::styles;

use super::products::render_product_list;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let entering = app.state == AppState::EnteringCount;
    render_product_list(frame, app, chunks[0], !entering);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(chunks[1]);

    render_count_entry(frame, app, right[0], entering);
    render_generated(frame, app, right[1]);
}

fn render_count_entry(frame: &mut Frame, app: &App, area: Rect, entering: bool) {
    let product = app
        .selected_product()
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "no product selected".to_string());

    let field_style = if entering {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if entering { "▌" } else { " " };

    let lines = vec![
        Line::from(vec![
            Span::styled("Product: ", styles::muted_style()),
            Span::styled(product, styles::highlight_style()),
        ]),
        Line::from(vec![
            Span::styled("Count:   [", styles::muted_style()),
            Span::styled(format!("{:<6}{}", app.code_count_input, cursor), field_style),
            Span::styled("]", styles::muted_style()),
            Span::styled(format!("  1-{}", MAX_CODES_PER_REQUEST), styles::muted_style()),
        ]),
        if entering {
            Line::from(vec![
                Span::styled("Enter", styles::help_key_style()),
                Span::styled(" generate  ", styles::muted_style()),
                Span::styled("Esc", styles::help_key_style()),
                Span::styled(" cancel", styles::muted_style()),
            ])
        } else {
            Line::from(vec![
                Span::styled("g", styles::help_key_style()),
                Span::styled(" enter a count and generate", styles::muted_style()),
            ])
        },
    ];

    let block = Block::default()
        .title(" Generate Codes ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(entering));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_generated(frame: &mut Frame, app: &App, area: Rect) {
    let product_name = app.generated_for.as_ref().and_then(|id| {
        app.products
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.name.clone())
    });

    let visible = area.height.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = app
        .generated_codes
        .iter()
        .enumerate()
        .skip(app.code_scroll)
        .take(visible)
        .map(|(i, code)| {
            Line::from(vec![
                Span::styled(format!("{:>6}  ", i + 1), styles::muted_style()),
                Span::raw(code.clone()),
            ])
        })
        .collect();

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No codes generated in this session",
            styles::muted_style(),
        )));
    }

    let title = match product_name {
        Some(name) => format!(" {} codes for {} ", app.generated_codes.len(), name),
        None => format!(" Codes ({}) ", app.generated_codes.len()),
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
