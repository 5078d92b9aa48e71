use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::terminal::state::{AppState, Focus};

/// `#rrggbb` or a color name; anything else falls back to blue.
fn label_color(color: &str) -> Color {
    color.parse::<Color>().unwrap_or(Color::Blue)
}

fn label_span(text: &str, color: &str) -> Span<'static> {
    Span::styled(
        format!(" {text} "),
        Style::default().fg(Color::White).bg(label_color(color)),
    )
}

pub fn render(f: &mut Frame, state: &AppState) {
    let [main, footer] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(f.area());
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .margin(1)
            .areas(main);

    let border = |focus: Focus| {
        if state.focus == focus {
            Color::Yellow
        } else {
            Color::DarkGray
        }
    };

    // LEFT: rules
    let rules_block = Block::default()
        .title(format!(" Rules ({}) ", state.rules.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border(Focus::Rules)));

    if state.rules.is_empty() {
        let p = Paragraph::new("No rules found. Add one with: rs_mail_labeler rules add")
            .block(rules_block)
            .wrap(Wrap { trim: true });
        f.render_widget(p, left);
    } else {
        let items: Vec<ListItem> = state
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let title = Line::from(vec![
                    Span::styled("● ", Style::default().fg(label_color(&rule.color))),
                    Span::styled(
                        format!("Rule {}: {}", i + 1, rule.label),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]);
                let mut lines = vec![title];
                lines.extend(rule.describe_conditions().into_iter().map(|c| {
                    Line::from(Span::styled(format!("  {c}"), Style::default().fg(Color::Gray)))
                }));
                ListItem::new(Text::from(lines))
            })
            .collect();

        let list = List::new(items)
            .block(rules_block)
            .highlight_symbol("➜ ")
            .highlight_style(Style::default().fg(Color::Green));

        f.render_stateful_widget(list, left, &mut state.list_state.clone());
    }

    // RIGHT: inbox preview
    let preview_block = Block::default()
        .title(" Inbox preview ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border(Focus::Preview)));

    let preview_text = if state.preview.is_empty() {
        Text::from("No inbox snapshot found.\nCreate one with: rs_mail_labeler inbox from-eml <dir>")
    } else {
        let mut lines = Vec::new();
        for row in &state.preview {
            let mut spans = vec![
                Span::styled(
                    row.sender.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::raw(row.subject.clone()),
                Span::raw(" "),
            ];
            for (label, color) in &row.labels {
                spans.push(label_span(label, color));
                spans.push(Span::raw(" "));
            }
            lines.push(Line::from(spans));
        }
        Text::from(lines)
    };

    let p = Paragraph::new(preview_text)
        .block(preview_block)
        .wrap(Wrap { trim: false })
        .scroll((state.preview_scroll, 0));
    f.render_widget(p, right);

    let mut hint = vec![
        Span::styled("j/k", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" move  "),
        Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" focus  "),
        Span::styled("d", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" delete  "),
        Span::styled("r", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" reload  "),
        Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" quit"),
    ];
    if let Some(status) = &state.status {
        hint.push(Span::raw("   "));
        hint.push(Span::styled(status.clone(), Style::default().fg(Color::Cyan)));
    }
    f.render_widget(Paragraph::new(Line::from(hint)), footer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_named_colors() {
        assert_eq!(label_color("#4285f4"), Color::Rgb(0x42, 0x85, 0xf4));
        assert_eq!(label_color("red"), Color::Red);
        assert_eq!(label_color("not a color"), Color::Blue);
    }
}
