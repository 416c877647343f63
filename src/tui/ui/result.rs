//! Prediction result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::application::{PipelineRun, PipelineStage};
use crate::domain::Diagnosis;
use crate::tui::styles::ClinicalTheme;

/// Result screen state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    #[default]
    Idle,
    Complete {
        run: PipelineRun,
    },
    Error {
        message: String,
    },
}

/// Render the result view
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0]);

    let content_area = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(15),
            Constraint::Percentage(70),
            Constraint::Percentage(15),
        ])
        .split(chunks[1])[1];

    match state {
        ResultState::Idle => render_idle(f, content_area),
        ResultState::Complete { run } => render_run(f, content_area, run),
        ResultState::Error { message } => render_error(f, content_area, message),
    }

    render_result_footer(f, chunks[2], state);
}

fn render_result_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled("Prediction Result", ClinicalTheme::title()),
        Span::styled(" │ Diabetes Detection System", ClinicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No prediction yet",
            ClinicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Fill in the form and press Enter to predict.",
            ClinicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_run(f: &mut Frame, area: Rect, run: &PipelineRun) {
    let diagnosis = &run.diagnosis;
    let outcome_style = ClinicalTheme::outcome(diagnosis.is_positive());

    let block = Block::default()
        .title(Span::styled(" Prediction Result ", ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Headline
            Constraint::Length(3), // Probability
            Constraint::Length(5), // Diabetes type
            Constraint::Min(0),    // Trace
        ])
        .margin(1)
        .split(inner);

    let headline = Paragraph::new(vec![
        Line::from(Span::styled(
            diagnosis.headline(),
            outcome_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            diagnosis.probability_line(),
            ClinicalTheme::text(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(headline, chunks[0]);

    let probability = diagnosis.prediction.outcome_probability().clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(ClinicalTheme::border()),
        )
        .gauge_style(outcome_style)
        .ratio(probability)
        .label(crate::domain::format_percent(probability));
    f.render_widget(gauge, chunks[1]);

    if let Some(type_line) = diagnosis.type_line() {
        render_type_section(f, chunks[2], &type_line);
    }

    render_trace(f, chunks[3], diagnosis, &run.trace);
}

fn render_type_section(f: &mut Frame, area: Rect, type_line: &str) {
    let section = Paragraph::new(Line::from(Span::styled(
        type_line,
        ClinicalTheme::success().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title(Span::styled(
                " Diabetes Type Prediction ",
                ClinicalTheme::subtitle(),
            ))
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::success()),
    );
    f.render_widget(section, area);
}

fn render_trace(f: &mut Frame, area: Rect, diagnosis: &Diagnosis, trace: &[PipelineStage]) {
    let path = trace
        .iter()
        .map(|stage| format!("{stage:?}"))
        .collect::<Vec<_>>()
        .join(" → ");

    let details = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("Computed: ", ClinicalTheme::text_secondary()),
            Span::styled(
                diagnosis.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                ClinicalTheme::text(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Pipeline: ", ClinicalTheme::text_secondary()),
            Span::styled(path, ClinicalTheme::text_muted()),
        ]),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(details, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Prediction failed", ClinicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, ClinicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Error { .. } => Line::from(vec![
            Span::styled("[Enter] ", ClinicalTheme::key_hint()),
            Span::styled("Back to Form ", ClinicalTheme::key_desc()),
            Span::styled("[Ctrl+Q] ", ClinicalTheme::key_hint()),
            Span::styled("Quit", ClinicalTheme::key_desc()),
        ]),
        _ => Line::from(vec![
            Span::styled("[Enter] ", ClinicalTheme::key_hint()),
            Span::styled("Edit Values ", ClinicalTheme::key_desc()),
            Span::styled("[N] ", ClinicalTheme::key_hint()),
            Span::styled("New Patient ", ClinicalTheme::key_desc()),
            Span::styled("[Ctrl+Q] ", ClinicalTheme::key_hint()),
            Span::styled("Quit", ClinicalTheme::key_desc()),
        ]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(footer, area);
}
