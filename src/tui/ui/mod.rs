//! UI module: View components for the TUI.

pub mod form;
pub mod result;

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::ClinicalTheme;

/// Footer caption shown under every screen.
pub fn render_caption(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            "Model: Random Forest – Binary Classification",
            ClinicalTheme::text_muted(),
        )),
        Line::from(Span::styled(
            "This system is intended for educational purposes only.",
            ClinicalTheme::text_muted(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(ClinicalTheme::border());

    let p = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
