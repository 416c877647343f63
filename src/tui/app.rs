//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation between the form and the result
//! - Input event handling
//! - Running the screening pipeline on submit

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::{ArtifactStore, BinaryForest, StageForest};
use crate::application::DiagnosisPipeline;
use crate::config::{AppConfig, ARTIFACT_DIR_ENV};

use super::ui::{
    form::{render_clinical_form, ClinicalFormState},
    render_caption,
    result::{render_result, ResultState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    Result,
}

type ForestPipeline = DiagnosisPipeline<BinaryForest, StageForest>;

/// Main application state
pub struct App {
    /// Current screen
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    pipeline: ForestPipeline,

    form_state: ClinicalFormState,

    result_state: ResultState,
}

impl App {
    /// Load artifacts from the configured directory and build the app.
    ///
    /// # Errors
    /// Returns error if any artifact is missing, corrupt, fails its
    /// manifest digest or does not fit its feature layout. The app does
    /// not start with partial artifacts.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let store = ArtifactStore::open(&config.artifact_dir, config.require_manifest)
            .with_context(|| {
                format!(
                    "Cannot open artifact directory {:?}. Set {} to a directory containing the exported scalers and models.",
                    config.artifact_dir, ARTIFACT_DIR_ENV
                )
            })?;

        let pipeline = DiagnosisPipeline::from_store(&store)
            .with_context(|| format!("Failed to load models from {:?}", store.dir()))?;

        if store.is_verified() {
            tracing::info!("Artifacts verified against manifest");
        }

        Ok(Self::with_pipeline(pipeline))
    }

    /// Create the application around a wired pipeline (Composition Root
    /// pattern).
    #[must_use]
    pub fn with_pipeline(pipeline: ForestPipeline) -> Self {
        Self {
            screen: Screen::Form,
            should_quit: false,
            pipeline,
            form_state: ClinicalFormState::default(),
            result_state: ResultState::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match self.screen {
                    Screen::Form => render_clinical_form(f, chunks[0], &self.form_state),
                    Screen::Result => render_result(f, chunks[0], &self.result_state),
                }

                render_caption(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.form_state.reset();
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.form_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.form_state.next_field();
            }
            KeyCode::Left => {
                self.form_state.step(false);
            }
            KeyCode::Right => {
                self.form_state.step(true);
            }
            KeyCode::Char(' ') => {
                self.form_state.toggle();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.form_state.load_sample_data();
            }
            KeyCode::Char(c) => {
                self.form_state.input_char(c);
            }
            KeyCode::Backspace => {
                self.form_state.delete_char();
            }
            KeyCode::Delete => {
                self.form_state.clear_field();
            }
            KeyCode::Enter => {
                self.submit_form();
            }
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Esc => {
                self.screen = Screen::Form;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.form_state.reset();
                self.result_state = ResultState::Idle;
                self.screen = Screen::Form;
            }
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let input = match self.form_state.to_clinical_input() {
            Ok(input) => input,
            Err(e) => {
                self.form_state.error_message = Some(e);
                return;
            }
        };

        self.result_state = match self.pipeline.run_traced(&input) {
            Ok(run) => ResultState::Complete { run },
            Err(e) => {
                tracing::error!("Prediction failed: {}", e);
                ResultState::Error {
                    message: e.to_string(),
                }
            }
        };
        self.screen = Screen::Result;
    }
}
