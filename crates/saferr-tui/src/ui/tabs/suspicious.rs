use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use saferr_core::utils::{format_count, format_date, truncate};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Suspicious Activity (top {})  +/- to adjust ", app.suspicious_limit);
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.suspicious.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No suspicious codes. Codes verified more than once show up here.",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec!["Code", "Product", "Checks", "First seen", "Last seen"])
        .style(styles::highlight_style())
        .bottom_margin(1);

    let rows: Vec<Row> = app
        .suspicious
        .iter()
        .map(|item| {
            Row::new(vec![
                Cell::from(item.code.clone()),
                Cell::from(truncate(&item.product_name, 24)),
                Cell::from(Span::styled(
                    format_count(item.verification_count),
                    styles::verification_risk_style(item.verification_count),
                )),
                Cell::from(format_date(&item.first_verification)),
                Cell::from(format_date(&item.last_verification)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Min(16),
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.suspicious_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
