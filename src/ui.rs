use crate::app::{App, SEARCH_HEIGHT};
use crate::braille::BrailleCanvas;
use crate::map::MapLayers;
use crate::search::match_range;
use crate::visa::{VisaKind, NEUTRAL};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(SEARCH_HEIGHT), // Search box
            Constraint::Min(3),                // Map
            Constraint::Length(1),             // Status bar
        ])
        .split(area);

    render_search(frame, app, chunks[0]);
    render_map(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Popups go last so they sit over the map
    render_tooltip(frame, app, chunks[1]);
    render_suggestions(frame, app, chunks[0], chunks[1]);
}

fn render_search(frame: &mut Frame, app: &App, area: Rect) {
    let border = if app.search.focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            " Passport ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let line = if app.search.query.is_empty() && !app.search.focused {
        Line::from(Span::styled(
            "press / to search for a country",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut spans = vec![Span::raw(app.search.query.clone())];
        if app.search.focused {
            spans.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_suggestions(frame: &mut Frame, app: &App, search_area: Rect, map_area: Rect) {
    let suggestions = app.search.suggestions();
    if !app.search.focused || suggestions.is_empty() {
        return;
    }

    let width = suggestions
        .iter()
        .filter_map(|&i| app.countries.get(i))
        .map(|c| c.name.chars().count() as u16 + 2)
        .max()
        .unwrap_or(0)
        .max(20);
    let height = (suggestions.len() as u16 + 2).min(map_area.height);
    let popup = Rect {
        x: search_area.x + 1,
        y: search_area.y + search_area.height.saturating_sub(1),
        width,
        height,
    }
    .intersection(frame.area());
    if popup.is_empty() {
        return;
    }

    let lines: Vec<Line> = suggestions
        .iter()
        .enumerate()
        .filter_map(|(pos, &i)| app.countries.get(i).map(|c| (pos, c)))
        .map(|(pos, country)| {
            let base = if pos == app.search.cursor() {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            highlight_match(&country.name, &app.search.query, base)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// Suggestion line with the matched part of the name in bold
fn highlight_match(name: &str, query: &str, base: Style) -> Line<'static> {
    match match_range(name, query) {
        Some(range) => Line::from(vec![
            Span::styled(name[..range.start].to_string(), base),
            Span::styled(name[range.clone()].to_string(), base.add_modifier(Modifier::BOLD)),
            Span::styled(name[range.end..].to_string(), base),
        ]),
        None => Line::from(Span::styled(name.to_string(), base)),
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.passport_name() {
        Some(name) => format!(" Visa requirements for {} passports ", name),
        None => " World Map ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app
        .map_renderer
        .render(inner.width as usize, inner.height as usize, &viewport, app.hovered);

    let map_widget = MapWidget {
        layers,
        show_legend: app.map_renderer.settings.show_legend,
    };
    frame.render_widget(map_widget, inner);
}

/// Custom widget that renders the braille map with a legend overlaid
struct MapWidget {
    layers: MapLayers,
    show_legend: bool,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for_each_dot(canvas, area, |x, y, ch| {
            buf[(x, y)].set_char(ch).set_fg(color);
        });
    }

    /// Outlines keep the fill underneath as the cell background
    fn render_outlines(&self, area: Rect, buf: &mut Buffer) {
        for_each_dot(&self.layers.outlines, area, |x, y, ch| {
            let cell = &mut buf[(x, y)];
            if cell.symbol() == " " {
                cell.set_char(ch).set_fg(Color::DarkGray);
            } else {
                let fill = cell.fg;
                cell.set_char(ch).set_bg(fill).set_fg(Color::Black);
            }
        });
    }

    fn render_legend(&self, area: Rect, buf: &mut Buffer) {
        let entries: Vec<(Color, &str)> = VisaKind::ALL
            .iter()
            .map(|kind| (kind.color(), kind.label()))
            .chain(std::iter::once((NEUTRAL, "selected / no data")))
            .collect();

        let height = entries.len() as u16;
        if area.height < height + 1 || area.width < 22 {
            return;
        }

        let top = area.y + area.height - height;
        for (row, (color, label)) in entries.into_iter().enumerate() {
            let y = top + row as u16;
            buf.set_string(area.x + 1, y, "■", Style::default().fg(color));
            buf.set_string(area.x + 3, y, label, Style::default().fg(Color::Gray));
        }
    }
}

/// Visit every non-empty braille character of a canvas within `area`
fn for_each_dot(canvas: &BrailleCanvas, area: Rect, mut f: impl FnMut(u16, u16, char)) {
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
            f(area.x + col_idx as u16, y, ch);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fills back to front, hovered country on top, then outlines
        for (color, canvas) in &self.layers.fills {
            self.render_layer(canvas, *color, area, buf);
        }

        if let Some((color, canvas)) = &self.layers.hovered {
            self.render_layer(canvas, *color, area, buf);
        }

        self.render_outlines(area, buf);

        if self.show_legend {
            self.render_legend(area, buf);
        }
    }
}

fn render_tooltip(frame: &mut Frame, app: &App, map_area: Rect) {
    let (Some(text), Some((col, row))) = (app.tooltip(), app.mouse_pos) else {
        return;
    };

    let width = (text.chars().count() as u16 + 2).min(map_area.width);
    let height = 1;

    // Right of the cursor, flipped left when it would run off the map
    let mut x = col.saturating_add(2);
    if x + width > map_area.x + map_area.width {
        x = col.saturating_sub(width + 1).max(map_area.x);
    }
    let y = row.min(map_area.y + map_area.height.saturating_sub(1));

    let rect = Rect { x, y, width, height }.intersection(frame.area());
    let style = Style::default().fg(Color::Black).bg(Color::White);
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(format!(" {} ", text)).style(style), rect);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" Passport: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.passport.clone().unwrap_or_else(|| "-".to_string()),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(" "),
        Span::styled(
            if settings.show_outlines { "[O]utline " } else { "[o]utline " },
            Style::default().fg(if settings.show_outlines {
                Color::Green
            } else {
                Color::DarkGray
            }),
        ),
        Span::styled(
            if settings.show_legend { "[G]legend " } else { "[g]legend " },
            Style::default().fg(if settings.show_legend { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];

    if let Some(message) = &app.message {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::Red)));
    }

    spans.push(Span::styled(
        " | /:search hjkl:pan +/-:zoom r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Atlas, Country};
    use crate::visa::Dataset;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn app(width: u16, height: u16) -> App {
        let atlas = Atlas {
            countries: vec![
                Country {
                    code: "FR".into(),
                    name: "France".into(),
                },
                Country {
                    code: "FI".into(),
                    name: "Finland".into(),
                },
            ],
            shapes: Vec::new(),
            dataset: Dataset::from_blobs([("FR", ""), ("FI", "")]),
        };
        App::new(atlas, width as usize, height as usize)
    }

    #[test]
    fn test_suggestions_fit_narrow_terminal() {
        let mut app = app(15, 20);
        app.search.focus();
        app.search.push_char('f', &app.countries);
        assert!(!app.search.suggestions().is_empty());

        let mut terminal = Terminal::new(TestBackend::new(15, 20)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let row: String = (0..15).map(|x| buffer[(x, 3)].symbol()).collect();
        assert!(row.contains("Fr") || row.contains("Fi"), "row was {row:?}");
    }

    #[test]
    fn test_highlight_match_splits_name() {
        let line = highlight_match("Canada", "nad", Style::default());
        let parts: Vec<&str> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(parts, ["Ca", "nad", "a"]);
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_highlight_without_match() {
        let line = highlight_match("Canada", "xyz", Style::default());
        assert_eq!(line.spans.len(), 1);
    }

    #[test]
    fn test_outline_keeps_fill_as_background() {
        let area = Rect::new(0, 0, 1, 1);
        let mut buf = Buffer::empty(area);
        let mut fill = BrailleCanvas::new(1, 1);
        fill.fill_span(0, 0, 1);
        let mut outlines = BrailleCanvas::new(1, 1);
        outlines.set_pixel(0, 0);

        let widget = MapWidget {
            layers: MapLayers {
                fills: vec![(Color::Red, fill)],
                hovered: None,
                outlines,
            },
            show_legend: false,
        };
        widget.render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "⠁");
        assert_eq!(cell.bg, Color::Red);
        assert_eq!(cell.fg, Color::Black);
    }
}
