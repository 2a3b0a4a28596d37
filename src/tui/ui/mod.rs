//! UI module: View components for the TUI.

pub mod inference;
pub mod patient;

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

pub fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            "AI Heart Disease Prediction",
            MedicalTheme::title(),
        )),
        Line::from(Span::styled(
            "Enter patient details to predict the risk of heart disease.",
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// Predict action plus key hints.
pub fn render_actions(f: &mut Frame, area: Rect, error: Option<&str>) {
    let mut spans = vec![
        Span::styled(" Predict Heart Disease Risk [Enter] ", MedicalTheme::button()),
        Span::raw("  "),
    ];
    for (key, desc) in [
        ("[↑↓/Tab]", "Field "),
        ("[←→/-+]", "Adjust "),
        ("[Ctrl+R]", "Reset "),
        ("[Esc]", "Quit"),
    ] {
        spans.push(Span::styled(format!("{key} "), MedicalTheme::key_hint()));
        spans.push(Span::styled(desc, MedicalTheme::key_desc()));
    }

    let mut lines = vec![Line::from(spans)];
    if let Some(message) = error {
        lines.push(Line::from(Span::styled(message.to_string(), MedicalTheme::danger())));
    }

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![Line::from(vec![Span::styled(
        "For educational and demonstration purposes only. Not a substitute for professional medical advice.",
        MedicalTheme::text_muted(),
    )])];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
