//! Prediction result view.

use ratatui::{
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::{Diagnosis, RiskLevel};
use crate::tui::styles::MedicalTheme;

/// Inference state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InferenceState {
    /// No prediction yet, or the form was reset
    #[default]
    Idle,
    /// Completed with result
    Complete { diagnosis: Diagnosis },
    /// Error occurred
    Error { message: String },
}

/// Render the result block
pub fn render_inference(f: &mut Frame, area: Rect, state: &InferenceState) {
    match state {
        InferenceState::Idle => render_idle(f, area),
        InferenceState::Complete { diagnosis } => render_result(f, area, diagnosis),
        InferenceState::Error { message } => render_error(f, area, message),
    }
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(Line::from(vec![
        Span::styled("Press ", MedicalTheme::text_muted()),
        Span::styled("[Enter]", MedicalTheme::key_hint()),
        Span::styled(" to predict heart disease risk", MedicalTheme::text_muted()),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_result(f: &mut Frame, area: Rect, diagnosis: &Diagnosis) {
    let risk_style = MedicalTheme::risk_level(diagnosis.risk_level);
    let icon = match diagnosis.risk_level {
        RiskLevel::High => "!",
        RiskLevel::Low => "OK",
    };

    let block = Block::default()
        .title(Span::styled(" Prediction Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(risk_style);

    let content = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{icon} {}", diagnosis.headline()),
            risk_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(diagnosis.advice(), MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(block);

    f.render_widget(content, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(Span::styled("! Prediction failed", MedicalTheme::danger())),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}
