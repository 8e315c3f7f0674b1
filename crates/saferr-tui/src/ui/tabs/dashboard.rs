use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saferr_core::auth::Session;
use saferr_core::utils::{format_count, truncate};

use crate::app::App;
use crate::ui::styles;

/// Width of the share bar in characters
const BAR_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App, session: &Session, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(5)])
        .split(area);

    render_summary(frame, app, session, chunks[0]);
    render_distribution(frame, app, chunks[1]);
}

fn render_summary(frame: &mut Frame, app: &App, session: &Session, area: Rect) {
    let mut lines = vec![Line::from(vec![
        Span::styled("Welcome, ", styles::muted_style()),
        Span::styled(session.username.clone(), styles::highlight_style()),
        Span::styled(format!(" ({})", session.brand_name), styles::muted_style()),
    ])];
    lines.push(Line::from(""));

    match app.distribution {
        Some(ref dist) => {
            lines.push(Line::from(vec![
                Span::styled("Products:      ", styles::muted_style()),
                Span::raw(format_count(dist.total_products)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Verifications: ", styles::muted_style()),
                Span::raw(format_count(dist.total_verifications())),
                Span::styled(" (top products)", styles::muted_style()),
            ]));
        }
        None => lines.push(Line::from(Span::styled("Loading...", styles::muted_style()))),
    }

    let block = Block::default()
        .title(" Overview ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_distribution(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];

    if let Some(ref dist) = app.distribution {
        for (product, share) in dist.shares() {
            let filled = share_bar_len(share);
            lines.push(Line::from(vec![
                Span::raw(format!("{:<28}", truncate(&product.product_name, 28))),
                Span::styled("█".repeat(filled), styles::share_style(share)),
                Span::styled("░".repeat(BAR_WIDTH - filled), styles::muted_style()),
                Span::raw(format!(" {:>5.1}%", share)),
                Span::styled(
                    format!("  {}", format_count(product.verification_count)),
                    styles::muted_style(),
                ),
            ]));
        }
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No verifications recorded yet",
            styles::muted_style(),
        )));
    }

    let block = Block::default()
        .title(" Verifications by Product ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn share_bar_len(percent: f64) -> usize {
    ((percent / 100.0) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_bar_len() {
        assert_eq!(share_bar_len(0.0), 0);
        assert_eq!(share_bar_len(50.0), 12);
        assert_eq!(share_bar_len(100.0), BAR_WIDTH);
        assert_eq!(share_bar_len(250.0), BAR_WIDTH);
    }
}
