//! Patient data input form.
//!
//! Every control is bounded: numeric edits are clamped to the feature range
//! when committed, and select boxes only cycle through their fixed labels.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{Feature, FieldKind, PatientFeatures};
use crate::tui::styles::MedicalTheme;

/// Longest numeric edit buffer accepted.
const MAX_EDIT_LEN: usize = 8;

/// Fields shown in the left column; the rest go right.
const LEFT_COLUMN_LEN: usize = 6;

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Current input of one control.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    /// Committed value plus the text being typed, if any
    Numeric { value: f64, edit: Option<String> },
    /// Index into the feature's option labels
    Choice { selected: usize },
}

/// One form control bound to a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub feature: Feature,
    pub input: FieldInput,
}

impl FormField {
    /// Control initialised to the feature's default.
    #[must_use]
    pub fn new(feature: Feature) -> Self {
        let input = match feature.spec().kind {
            FieldKind::Numeric { default, .. } => FieldInput::Numeric {
                value: default,
                edit: None,
            },
            FieldKind::Choice { default, .. } => FieldInput::Choice { selected: default },
        };
        Self { feature, input }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.feature.spec().label
    }

    /// Range or option hint shown next to the value.
    #[must_use]
    pub fn hint(&self) -> String {
        match self.feature.spec().kind {
            FieldKind::Numeric {
                min, max, decimals, ..
            } => format!("[{min:.decimals$}-{max:.decimals$}]"),
            FieldKind::Choice { options, .. } => options.join("/"),
        }
    }

    /// Text currently displayed for the control.
    #[must_use]
    pub fn display(&self) -> String {
        match (&self.input, self.feature.spec().kind) {
            (FieldInput::Numeric { edit: Some(buf), .. }, _) => buf.clone(),
            (FieldInput::Numeric { value, .. }, FieldKind::Numeric { decimals, .. }) => {
                format!("{value:.decimals$}")
            }
            (FieldInput::Choice { selected }, FieldKind::Choice { options, .. }) => {
                format!("◀ {} ▶", options.get(*selected).copied().unwrap_or("?"))
            }
            _ => String::new(),
        }
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        matches!(self.input, FieldInput::Numeric { edit: Some(_), .. })
    }

    /// Apply a pending edit: parse, clamp to the range, round to the step.
    ///
    /// Text that does not parse reverts to the last committed value.
    pub fn commit(&mut self) {
        let kind = self.feature.spec().kind;
        if let (
            FieldInput::Numeric { value, edit },
            FieldKind::Numeric {
                min, max, decimals, ..
            },
        ) = (&mut self.input, kind)
        {
            if let Some(buf) = edit.take() {
                if let Ok(parsed) = buf.trim().parse::<f64>() {
                    if parsed.is_finite() {
                        *value = round_to(parsed.clamp(min, max), decimals);
                    }
                }
            }
        }
    }

    /// Move the control one step up (`up == true`) or down.
    pub fn step(&mut self, up: bool) {
        self.commit();
        match (&mut self.input, self.feature.spec().kind) {
            (
                FieldInput::Numeric { value, .. },
                FieldKind::Numeric {
                    min,
                    max,
                    step,
                    decimals,
                    ..
                },
            ) => {
                let next = if up { *value + step } else { *value - step };
                *value = round_to(next.clamp(min, max), decimals);
            }
            (FieldInput::Choice { selected }, FieldKind::Choice { options, .. }) => {
                let n = options.len();
                *selected = if up {
                    (*selected + 1) % n
                } else {
                    (*selected + n - 1) % n
                };
            }
            _ => {}
        }
    }

    /// Type a character into the control.
    pub fn input_char(&mut self, c: char) {
        match (&mut self.input, self.feature.spec().kind) {
            (FieldInput::Numeric { edit, .. }, FieldKind::Numeric { decimals, .. }) => {
                let has_point = edit.as_deref().is_some_and(|b| b.contains('.'));
                let accepted = c.is_ascii_digit() || (c == '.' && decimals > 0 && !has_point);
                if !accepted {
                    return;
                }
                let buf = edit.get_or_insert_with(String::new);
                if buf.len() < MAX_EDIT_LEN {
                    buf.push(c);
                }
            }
            (FieldInput::Choice { selected }, FieldKind::Choice { options, .. }) => {
                // Jump to the option starting with the typed letter
                let starts_with =
                    |o: &&str| o.chars().next().is_some_and(|f| f.eq_ignore_ascii_case(&c));
                if let Some(i) = options.iter().position(starts_with) {
                    *selected = i;
                }
            }
            _ => {}
        }
    }

    /// Delete the last typed character.
    pub fn delete_char(&mut self) {
        let display = self.display();
        if let FieldInput::Numeric { edit, .. } = &mut self.input {
            edit.get_or_insert(display).pop();
        }
    }

    /// Start an empty edit.
    pub fn clear(&mut self) {
        if let FieldInput::Numeric { edit, .. } = &mut self.input {
            *edit = Some(String::new());
        }
    }

    /// Committed model value of this control.
    ///
    /// # Errors
    /// Returns an error if a choice label has no encoding for this feature.
    pub fn encoded(&self) -> Result<f64, String> {
        match (&self.input, self.feature.spec().kind) {
            (FieldInput::Numeric { value, .. }, _) => Ok(*value),
            (FieldInput::Choice { selected }, FieldKind::Choice { options, .. }) => options
                .get(*selected)
                .and_then(|label| self.feature.encode_choice(label))
                .ok_or_else(|| format!("{}: Invalid selection", self.label())),
            (FieldInput::Choice { .. }, FieldKind::Numeric { .. }) => {
                Err(format!("{}: Invalid selection", self.label()))
            }
        }
    }
}

/// Patient form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        Self {
            fields: Feature::ALL.iter().map(|f| FormField::new(*f)).collect(),
            selected_field: 0,
            error_message: None,
        }
    }
}

impl PatientFormState {
    fn current(&mut self) -> &mut FormField {
        &mut self.fields[self.selected_field]
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.current().commit();
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        self.current().commit();
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    pub fn increment(&mut self) {
        self.current().step(true);
        self.error_message = None;
    }

    pub fn decrement(&mut self) {
        self.current().step(false);
        self.error_message = None;
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        self.current().input_char(c);
        self.error_message = None;
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.current().delete_char();
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        self.current().clear();
    }

    /// Commit every pending edit.
    pub fn commit_all(&mut self) {
        self.fields.iter_mut().for_each(FormField::commit);
    }

    /// Commit pending edits and encode the form into patient features.
    ///
    /// # Errors
    /// Returns a message naming the first field that cannot be encoded.
    pub fn to_patient_features(&mut self) -> Result<PatientFeatures, String> {
        self.commit_all();
        let values = self
            .fields
            .iter()
            .map(FormField::encoded)
            .collect::<Result<Vec<f64>, String>>()?;
        PatientFeatures::from_encoded(&values)
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mid = LEFT_COLUMN_LEN.min(state.fields.len());

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let field_height = 3;
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(field_height))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label()), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![
            Span::raw(" "),
            Span::styled(field.display(), MedicalTheme::text()),
        ];
        if is_selected && field.is_editing() {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }
        spans.push(Span::styled(
            format!("  {}", field.hint()),
            MedicalTheme::text_muted(),
        ));

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}
