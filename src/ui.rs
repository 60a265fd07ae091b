use crate::app::{App, BoundaryState};
use crate::braille::BrailleCanvas;
use crate::map::{BrailleAdapter, MapLayers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};
use visitmap::{Rgb, VisitTier};

fn rgb(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Visit Map ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &app.boundaries {
        BoundaryState::Loading => {
            render_notice(frame, inner, "Loading country boundaries...", Color::Yellow);
            return;
        }
        BoundaryState::Failed(message) => {
            render_notice(
                frame,
                inner,
                &format!("Failed to load boundaries: {}", message),
                Color::Red,
            );
            return;
        }
        BoundaryState::Ready(_) => {}
    }

    // Canvas follows the viewport, which only picks up a new size once
    // resizing settles
    let width = (app.viewport.width / 2).min(inner.width as usize);
    let height = (app.viewport.height / 4).min(inner.height as usize);
    let mut adapter = BrailleAdapter::new(&app.viewport, &app.settings, width, height);
    app.scene.render(app.world(), &mut adapter);

    frame.render_widget(MapWidget { layers: adapter.finish() }, inner);

    if app.settings.show_legend {
        render_legend(frame, inner);
    }
    if let Some(lines) = app.hover_tooltip() {
        render_tooltip(frame, inner, app.mouse_pos, &lines);
    }
}

fn render_notice(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);
    let notice = Paragraph::new(Span::styled(text.to_string(), Style::default().fg(color)))
        .alignment(Alignment::Center);
    frame.render_widget(notice, rows[1]);
}

/// Visit-count legend in the bottom-right corner
fn render_legend(frame: &mut Frame, area: Rect) {
    let width = 16;
    let height = VisitTier::LEGEND.len() as u16 + 2;
    if area.width < width + 2 || area.height < height + 2 {
        return;
    }
    let rect = Rect::new(
        area.x + area.width - width - 1,
        area.y + area.height - height - 1,
        width,
        height,
    );

    let lines: Vec<Line> = VisitTier::LEGEND
        .iter()
        .rev()
        .map(|tier| {
            Line::from(vec![
                Span::styled("██ ", Style::default().fg(rgb(tier.color()))),
                Span::raw(tier.label()),
            ])
        })
        .collect();

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Visits "),
        ),
        rect,
    );
}

/// Hover box next to the mouse, kept inside the map area
fn render_tooltip(frame: &mut Frame, area: Rect, mouse: Option<(u16, u16)>, lines: &[String]) {
    let Some((col, row)) = mouse else {
        return;
    };
    let text_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
    let width = (text_width + 2).min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);

    let right = area.x + area.width;
    let bottom = area.y + area.height;
    let x = if col + 2 + width <= right { col + 2 } else { col.saturating_sub(width + 1).max(area.x) };
    let y = if row + 1 + height <= bottom { row + 1 } else { bottom.saturating_sub(height) };
    let rect = Rect::new(x, y, width, height);

    let text: Vec<Line> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let style = if i == 0 {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(Span::styled(l.clone(), style))
        })
        .collect();

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Gray)),
        ),
        rect,
    );
}

/// Widget that renders braille map layers with labels overlaid
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        if canvas.is_blank() {
            return;
        }
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: filled countries, borders, routes, markers
        for (tier, canvas) in &self.layers.fills {
            self.render_layer(canvas, rgb(tier.color()), area, buf);
        }
        self.render_layer(&self.layers.outlines, Color::DarkGray, area, buf);
        for (color, canvas) in &self.layers.routes {
            self.render_layer(canvas, rgb(*color), area, buf);
        }
        for (tier, canvas) in &self.layers.markers {
            self.render_layer(canvas, rgb(tier.color()), area, buf);
        }

        let label_style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let y = area.y + *ly;
            for (i, ch) in text.chars().enumerate() {
                let x = area.x + *lx + i as u16;
                if x < area.x + area.width {
                    buf[(x, y)].set_char(ch).set_style(label_style);
                }
            }
        }
    }
}

fn toggle_span(on: bool, label_on: &'static str, label_off: &'static str) -> Span<'static> {
    Span::styled(
        if on { label_on } else { label_off },
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.settings;
    let selected = app
        .selected
        .borrow()
        .clone()
        .unwrap_or_else(|| "-".to_string());

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:?}", app.fit_state()),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        toggle_span(settings.show_regions, "[B]fill ", "[b]fill "),
        toggle_span(settings.show_routes, "[T]routes ", "[t]routes "),
        toggle_span(settings.show_clusters, "[C]lusters ", "[c]lusters "),
        toggle_span(settings.show_labels, "[L]abels ", "[L]abels "),
        toggle_span(settings.show_legend, "[G]legend ", "[g]legend "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | Selected: ", Style::default().fg(Color::DarkGray)),
        Span::styled(selected, Style::default().fg(Color::White)),
        Span::styled(
            " | hjkl:pan +/-:zoom r:refit q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::mpsc;
    use visitmap::{CoordinateResolver, MapConfig};

    fn status_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(200, 1)).unwrap();
        terminal
            .draw(|frame| render_status_bar(frame, app, frame.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_label_toggle_shows_its_key_in_both_states() {
        let config = MapConfig::default();
        let resolver = CoordinateResolver::new(config.fallback);
        let (_tx, rx) = mpsc::channel();
        let mut app = App::new(config, resolver, data::demo_data(), rx, 82, 27);

        assert!(status_text(&app).contains("[L]abels"));
        app.settings.show_labels = false;
        let text = status_text(&app);
        assert!(text.contains("[L]abels"));
        assert!(!text.contains("[l]abels"));
    }
}
