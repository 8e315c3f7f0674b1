use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use saferr_core::auth::Session;
use saferr_core::models::BrandSubscription;
use saferr_core::utils::{format_count, format_date, format_money};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, session: &Session, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_brand(frame, app, session, chunks[0]);
    render_subscription(frame, app, chunks[1]);
}

fn label(text: &'static str) -> Span<'static> {
    Span::styled(format!("{:<15}", text), styles::muted_style())
}

fn render_brand(frame: &mut Frame, app: &App, session: &Session, area: Rect) {
    let lines = match app.brand {
        Some(ref brand) => vec![
            Line::from(Span::styled(brand.name.clone(), styles::highlight_style())),
            Line::from(""),
            Line::from(vec![label("Contact:"), Span::raw(brand.contact_display())]),
            Line::from(vec![label("Brand ID:"), Span::styled(brand.id.clone(), styles::muted_style())]),
            Line::from(""),
            Line::from(Span::raw(
                brand.description.clone().unwrap_or_else(|| "No description".to_string()),
            )),
        ],
        None => vec![
            Line::from(Span::styled(session.brand_name.clone(), styles::highlight_style())),
            Line::from(""),
            Line::from(Span::styled("Loading brand...", styles::muted_style())),
        ],
    };

    let block = Block::default()
        .title(" My Brand ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn subscription_lines(sub: &BrandSubscription) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(sub.plan_name().to_string(), styles::highlight_style()),
            Span::raw("  "),
            Span::styled(sub.status.display_name(), styles::subscription_status_style(sub.status)),
        ]),
        Line::from(""),
        Line::from(vec![label("Started:"), Span::raw(format_date(&sub.start_date.to_rfc3339()))]),
        Line::from(vec![
            label("Ends:"),
            Span::raw(
                sub.end_date
                    .map(|d| format_date(&d.to_rfc3339()))
                    .unwrap_or_else(|| "Open-ended".to_string()),
            ),
        ]),
        Line::from(vec![label("Paid:"), Span::raw(format_money(sub.amount_paid))]),
        Line::from(""),
    ];

    match sub.subscription_plan {
        Some(ref plan) => {
            lines.push(Line::from(vec![
                label("Codes:"),
                Span::styled(
                    format!("{} / {}", format_count(sub.codes_generated), plan.code_limit().display()),
                    styles::quota_style(sub.codes_generated, plan.code_limit()),
                ),
            ]));
            lines.push(Line::from(vec![
                label("Verifications:"),
                Span::styled(
                    format!(
                        "{} / {}",
                        format_count(sub.verifications_received),
                        plan.verification_limit().display()
                    ),
                    styles::quota_style(sub.verifications_received, plan.verification_limit()),
                ),
            ]));
            if let Some(remaining) = sub.remaining_codes() {
                lines.push(Line::from(vec![
                    label("Codes left:"),
                    Span::styled(format_count(remaining), styles::highlight_style()),
                ]));
            }
        }
        None => {
            lines.push(Line::from(vec![label("Codes:"), Span::raw(format_count(sub.codes_generated))]));
            lines.push(Line::from(vec![
                label("Verifications:"),
                Span::raw(format_count(sub.verifications_received)),
            ]));
        }
    }

    lines
}

fn render_subscription(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match (&app.brand, &app.subscription) {
        (_, Some(sub)) => subscription_lines(sub),
        (Some(_), None) => vec![Line::from(Span::styled(
            "No active subscription",
            styles::muted_style(),
        ))],
        (None, None) => vec![Line::from(Span::styled("Loading...", styles::muted_style()))],
    };

    let block = Block::default()
        .title(" Subscription ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
