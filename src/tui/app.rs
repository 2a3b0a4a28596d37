//! Main TUI application state machine.
//!
//! Handles:
//! - Input event handling
//! - Form submission through the inference service
//! - One-page layout

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use crate::adapters::sklearn::{LogisticRegression, StandardScaler};
use crate::application::InferenceService;
use crate::config::AppConfig;
use crate::ports::{Classifier, Scaler};

use super::ui::{
    inference::{render_inference, InferenceState},
    patient::{render_patient_form, PatientFormState},
    render_actions, render_disclaimer, render_header,
};

/// Main application state
pub struct App<S = StandardScaler, C = LogisticRegression>
where
    S: Scaler,
    C: Classifier,
{
    /// Whether the app should quit
    should_quit: bool,

    inference_service: InferenceService<S, C>,

    /// Patient form state
    patient_form_state: PatientFormState,

    /// Last prediction, kept until the next predict or reset
    inference_state: InferenceState,
}

impl App {
    /// Create a new application instance from the exported artifacts.
    ///
    /// # Errors
    /// Returns error if the artifacts cannot be loaded or verified.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let loader = config.artifact_loader()?;
        // Refuse to start without a usable model.
        let artifacts = loader
            .load()
            .map_err(|e| anyhow!("Failed to load artifacts from {:?}: {}", loader.dir(), e))?;

        tracing::info!("Artifacts ready ({:?})", artifacts.verification);

        Ok(Self::with_service(InferenceService::new(
            Arc::new(artifacts.scaler),
            Arc::new(artifacts.classifier),
        )))
    }
}

impl<S, C> App<S, C>
where
    S: Scaler,
    C: Classifier,
{
    /// Create application with an injected inference service.
    pub fn with_service(inference_service: InferenceService<S, C>) -> Self {
        Self {
            should_quit: false,
            inference_service,
            patient_form_state: PatientFormState::default(),
            inference_state: InferenceState::default(),
        }
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[must_use]
    pub fn inference_state(&self) -> &InferenceState {
        &self.inference_state
    }

    #[must_use]
    pub fn patient_form_state(&self) -> &PatientFormState {
        &self.patient_form_state
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Draw the whole page.
    pub fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Form
                Constraint::Length(2), // Predict action
                Constraint::Length(4), // Result
                Constraint::Length(2), // Disclaimer
            ])
            .split(f.area());

        render_header(f, chunks[0]);
        render_patient_form(f, chunks[1], &self.patient_form_state);
        render_actions(
            f,
            chunks[2],
            self.patient_form_state.error_message.as_deref(),
        );
        render_inference(f, chunks[3], &self.inference_state);
        render_disclaimer(f, chunks[4]);
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('r') => self.reset(),
                _ => {}
            }
            return;
        }

        let form = &mut self.patient_form_state;
        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::BackTab => form.prev_field(),
            KeyCode::Down | KeyCode::Tab => form.next_field(),
            KeyCode::Left | KeyCode::Char('-') => form.decrement(),
            KeyCode::Right | KeyCode::Char('+') => form.increment(),
            KeyCode::Char(c) => form.input_char(c),
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Delete => form.clear_field(),
            KeyCode::Enter => self.submit_patient_form(),
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.patient_form_state = PatientFormState::default();
        self.inference_state = InferenceState::Idle;
    }

    fn submit_patient_form(&mut self) {
        let features = match self.patient_form_state.to_patient_features() {
            Ok(features) => features,
            Err(e) => {
                self.patient_form_state.error_message = Some(e);
                return;
            }
        };
        self.patient_form_state.error_message = None;

        self.inference_state = match self.inference_service.predict(&features) {
            Ok(diagnosis) => InferenceState::Complete { diagnosis },
            Err(e) => {
                // The message may quote patient values; it is shown, not logged.
                tracing::error!(kind = e.kind(), "Prediction failed");
                InferenceState::Error {
                    message: e.to_string(),
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelError, RiskLevel, FEATURE_COUNT};
    use crate::tui::ui::patient::FieldInput;
    use ratatui::backend::TestBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Log sink shared with a test subscriber.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("log lock")).into_owned()
        }
    }

    struct CountingScaler {
        features: usize,
        calls: AtomicUsize,
    }

    impl CountingScaler {
        fn new(features: usize) -> Self {
            Self {
                features,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Scaler for CountingScaler {
        fn n_features(&self) -> usize {
            self.features
        }

        fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ModelError::check_shape(self.features, row.len())?;
            Ok(row.to_vec())
        }
    }

    /// High risk whenever age (first column) is above 50.
    struct AgeThreshold;

    impl Classifier for AgeThreshold {
        fn n_features(&self) -> usize {
            FEATURE_COUNT
        }

        fn predict(&self, row: &[f64]) -> Result<u8, ModelError> {
            Ok(u8::from(row[0] > 50.0))
        }

        fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ModelError> {
            let p = row[0] / 100.0;
            Ok([1.0 - p, p])
        }
    }

    fn app_with(scaler: Arc<CountingScaler>) -> App<CountingScaler, AgeThreshold> {
        App::with_service(InferenceService::new(scaler, Arc::new(AgeThreshold)))
    }

    fn press(app: &mut App<CountingScaler, AgeThreshold>, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    fn diagnosis_of(app: &App<CountingScaler, AgeThreshold>) -> crate::Diagnosis {
        match app.inference_state() {
            InferenceState::Complete { diagnosis } => *diagnosis,
            other => panic!("expected a result, got {other:?}"),
        }
    }

    #[test]
    fn test_nothing_runs_until_enter() {
        let scaler = Arc::new(CountingScaler::new(FEATURE_COUNT));
        let mut app = app_with(scaler.clone());

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        assert_eq!(scaler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(*app.inference_state(), InferenceState::Idle);

        press(&mut app, KeyCode::Enter);
        assert_eq!(scaler.calls.load(Ordering::SeqCst), 1);

        let diagnosis = diagnosis_of(&app);
        assert_eq!(diagnosis.risk_level, RiskLevel::Low);
        assert_eq!(
            diagnosis.headline(),
            "Low Risk of Heart Disease (Probability: 45.00%)"
        );
    }

    #[test]
    fn test_typed_age_drives_prediction() {
        let mut app = app_with(Arc::new(CountingScaler::new(FEATURE_COUNT)));

        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::Char('6'));
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Enter);

        let diagnosis = diagnosis_of(&app);
        assert_eq!(diagnosis.prediction, 1);
        assert_eq!(
            diagnosis.headline(),
            "High Risk of Heart Disease! (Probability: 63.00%)"
        );
        assert_eq!(
            diagnosis.advice(),
            "Please consult a cardiologist for further medical evaluation."
        );
    }

    #[test]
    fn test_result_persists_until_reset() {
        let mut app = app_with(Arc::new(CountingScaler::new(FEATURE_COUNT)));
        press(&mut app, KeyCode::Enter);
        let first = diagnosis_of(&app);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        assert_eq!(diagnosis_of(&app), first);

        press(&mut app, KeyCode::Right);
        assert_eq!(diagnosis_of(&app), first);

        app.handle_key(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(*app.inference_state(), InferenceState::Idle);
        assert_eq!(app.patient_form_state().selected_field, 0);
    }

    #[test]
    fn test_model_failure_is_shown() {
        let mut app = app_with(Arc::new(CountingScaler::new(9)));
        press(&mut app, KeyCode::Enter);
        match app.inference_state() {
            InferenceState::Error { message } => {
                assert!(message.contains("expected 9"), "{message}");
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejected_values_are_shown_but_not_logged() {
        let scaler = Arc::new(CountingScaler::new(FEATURE_COUNT));
        let mut app = app_with(scaler.clone());
        // Bypass the form clamp to reach the service check
        app.patient_form_state.fields[0].input = FieldInput::Numeric {
            value: 121.0,
            edit: None,
        };

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, || press(&mut app, KeyCode::Enter));

        match app.inference_state() {
            InferenceState::Error { message } => assert!(message.contains("121"), "{message}"),
            other => panic!("expected an error, got {other:?}"),
        }
        assert_eq!(scaler.calls.load(Ordering::SeqCst), 0);

        let logged = logs.contents();
        assert!(logged.contains("Prediction failed"), "{logged}");
        assert!(logged.contains("validation"), "{logged}");
        assert!(!logged.contains("121"), "{logged}");
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with(Arc::new(CountingScaler::new(FEATURE_COUNT)));
        assert!(!app.should_quit());
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit());

        let mut app = app_with(Arc::new(CountingScaler::new(FEATURE_COUNT)));
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit());
    }

    #[test]
    fn test_draw_full_page() {
        let mut app = app_with(Arc::new(CountingScaler::new(FEATURE_COUNT)));
        press(&mut app, KeyCode::Enter);

        let mut terminal = Terminal::new(TestBackend::new(140, 40)).expect("terminal");
        terminal.draw(|f| app.draw(f)).expect("draw");
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();

        assert!(text.contains("AI Heart Disease Prediction"));
        assert!(text.contains("Serum Cholesterol (mg/dl)"));
        assert!(text.contains("Thalassemia (0-3)"));
        assert!(text.contains("Predict Heart Disease Risk"));
        assert!(text.contains("Low Risk of Heart Disease (Probability: 45.00%)"));
        assert!(text.contains("For educational and demonstration purposes only"));
    }
}
