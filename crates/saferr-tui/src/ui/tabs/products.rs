use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use saferr_core::models::Product;
use saferr_core::utils::truncate;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_product_list(frame, app, chunks[0], true);
    render_product_detail(frame, app, chunks[1]);
}

/// Product list shared with the Codes page
pub fn render_product_list(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let items: Vec<ListItem> = app
        .products
        .iter()
        .enumerate()
        .map(|(i, product)| {
            let identifier = product.identifier.as_deref().unwrap_or("-");
            let line = Line::from(format!(
                "{:<24} {}",
                truncate(&product.name, 24),
                truncate(identifier, 14)
            ));

            let style = if i == app.product_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            ListItem::new(line).style(style)
        })
        .collect();

    let block = Block::default()
        .title(format!(" Products ({}) ", app.products.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let list = List::new(items).block(block);

    let mut state = ListState::default();
    if !app.products.is_empty() {
        state.select(Some(app.product_selection));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn key_hint(key: &'static str, action: &'static str) -> Vec<Span<'static>> {
    vec![
        Span::styled("Press ", styles::muted_style()),
        Span::styled(key, styles::help_key_style()),
        Span::styled(action, styles::muted_style()),
    ]
}

fn detail_lines(app: &App, product: &Product) -> Vec<Line<'static>> {
    // Prefer the server's copy once it has been loaded for this product
    let detail = app
        .product_detail
        .as_ref()
        .filter(|d| d.product.id == product.id);
    let product = detail.map(|d| &d.product).unwrap_or(product);

    let mut lines = vec![
        Line::from(Span::styled(product.name.clone(), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Identifier: ", styles::muted_style()),
            Span::raw(product.identifier.clone().unwrap_or_else(|| "None".to_string())),
        ]),
        Line::from(vec![
            Span::styled("Product ID: ", styles::muted_style()),
            Span::styled(product.id.clone(), styles::muted_style()),
        ]),
    ];

    match detail {
        Some(d) => {
            let brand = d
                .brand
                .as_ref()
                .map(|b| format!("{} ({})", b.name, b.contact_display()))
                .unwrap_or_else(|| "Unavailable".to_string());
            lines.push(Line::from(vec![
                Span::styled("Brand:      ", styles::muted_style()),
                Span::raw(brand),
            ]));
        }
        None => lines.push(Line::from(key_hint("Enter", " to load full details"))),
    }

    lines.extend([
        Line::from(""),
        Line::from(Span::raw(
            product
                .description
                .clone()
                .unwrap_or_else(|| "No description".to_string()),
        )),
        Line::from(""),
        Line::from(key_hint("4", " to generate codes for this product")),
        Line::from(key_hint("n", " to add a new product")),
    ]);
    lines
}

fn render_product_detail(frame: &mut Frame, app: &App, area: Rect) {
    let (title, content) = match app.selected_product() {
        Some(product) => (" Details ".to_string(), detail_lines(app, product)),
        None => (
            " No Product Selected ".to_string(),
            vec![
                Line::from(Span::styled(
                    if app.products.is_empty() {
                        "This brand has no products yet"
                    } else {
                        "Select a product from the list"
                    },
                    styles::muted_style(),
                )),
                Line::from(""),
                Line::from(key_hint("n", " to add a new product")),
            ],
        ),
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
