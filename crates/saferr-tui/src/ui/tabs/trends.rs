use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};
use saferr_core::utils::{format_count, format_date};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(8)])
        .split(area);

    render_summary(frame, app, chunks[0]);
    render_chart(frame, app, chunks[1]);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let (start, end) = app.trend_window;
    let mut lines = vec![Line::from(vec![
        Span::styled("Window: ", styles::muted_style()),
        Span::raw(format!("{} to {}", start.format("%b %d, %Y"), end.format("%b %d, %Y"))),
        Span::styled("   [ / ] to move", styles::muted_style()),
    ])];

    match app.trend {
        Some(ref trend) => {
            let mut summary = vec![
                Span::styled("Total:  ", styles::muted_style()),
                Span::styled(format_count(trend.total_verifications), styles::highlight_style()),
            ];
            if let Some(peak) = trend.peak_day() {
                summary.push(Span::styled("   Peak: ", styles::muted_style()));
                summary.push(Span::raw(format!(
                    "{} ({})",
                    format_date(peak.day()),
                    format_count(peak.count)
                )));
            }
            lines.push(Line::from(summary));
        }
        None => lines.push(Line::from(Span::styled("Loading...", styles::muted_style()))),
    }

    let block = Block::default()
        .title(" Verification Trends ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Daily Verifications ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let trend = match app.trend {
        Some(ref t) if !t.daily_counts.is_empty() => t,
        _ => {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No verifications in this window",
                styles::muted_style(),
            )))
            .block(block);
            frame.render_widget(empty, area);
            return;
        }
    };

    let bars: Vec<Bar> = trend
        .daily_counts
        .iter()
        .map(|day| {
            // Day-of-month label keeps 30 bars readable
            let label = day.day().get(8..10).unwrap_or("").to_string();
            Bar::default()
                .value(day.count)
                .label(Line::from(label))
                .style(styles::trend_bar_style())
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(2)
        .bar_gap(1)
        .max(trend.max_count().max(1))
        .value_style(styles::highlight_style());

    frame.render_widget(chart, area);
}
