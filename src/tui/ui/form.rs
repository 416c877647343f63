//! Clinical data input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{bounds, ClinicalInput, YesNo};
use crate::tui::styles::ClinicalTheme;

/// Identity of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    Hba1c,
    GlucoseFasting,
    InsulinLevel,
    GlucosePostprandial,
    Triglycerides,
    FamilyHistory,
    Hypertension,
    Age,
    Bmi,
}

/// Value type and bounds of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Number {
        min: f64,
        max: f64,
        step: f64,
        integer: bool,
    },
    Choice,
}

impl FieldKind {
    const fn float((min, max): (f64, f64)) -> Self {
        Self::Number {
            min,
            max,
            step: 0.1,
            integer: false,
        }
    }

    const fn integer((min, max): (f64, f64)) -> Self {
        Self::Number {
            min,
            max,
            step: 1.0,
            integer: true,
        }
    }
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub id: FieldId,
    pub label: &'static str,
    pub hint: &'static str,
    pub kind: FieldKind,
    pub value: String,
}

impl FormField {
    fn new(id: FieldId, label: &'static str, hint: &'static str, kind: FieldKind) -> Self {
        let mut field = Self {
            id,
            label,
            hint,
            kind,
            value: String::new(),
        };
        field.reset();
        field
    }

    /// Restore the initial value: the lower bound, or "No".
    fn reset(&mut self) {
        self.value = match self.kind {
            FieldKind::Number { min, integer, .. } => format_number(min, integer),
            FieldKind::Choice => YesNo::No.to_string(),
        };
    }

    /// Parse and bound-check a numeric field.
    fn number(&self) -> Result<f64, String> {
        let FieldKind::Number {
            min, max, integer, ..
        } = self.kind
        else {
            return Err(format!("{}: Not a numeric field", self.label));
        };

        let value: f64 = self
            .value
            .trim()
            .parse()
            .map_err(|_| format!("{}: Invalid number", self.label))?;

        if !value.is_finite() {
            return Err(format!("{}: Invalid number", self.label));
        }
        if integer && value.fract() != 0.0 {
            return Err(format!("{}: Must be a whole number", self.label));
        }
        if value < min || value > max {
            return Err(format!(
                "{}: Value must be between {} and {}",
                self.label,
                format_number(min, integer),
                format_number(max, integer)
            ));
        }
        Ok(value)
    }

    fn choice(&self) -> Result<YesNo, String> {
        YesNo::from_label(&self.value).ok_or_else(|| format!("{}: Select Yes or No", self.label))
    }
}

fn format_number(value: f64, integer: bool) -> String {
    if integer {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Number of fields in the "Clinical Information" group; the rest are
/// "Demographic Information".
const CLINICAL_FIELDS: usize = 5;

/// Clinical form state
pub struct ClinicalFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
    /// Set when a field gains focus; the next typed character replaces
    /// the shown value instead of extending it.
    replace_on_input: bool,
}

impl Default for ClinicalFormState {
    fn default() -> Self {
        Self {
            fields: vec![
                FormField::new(
                    FieldId::Hba1c,
                    "HbA1c (%)",
                    "4.0-12.0",
                    FieldKind::float(bounds::HBA1C),
                ),
                FormField::new(
                    FieldId::GlucoseFasting,
                    "Fasting Glucose (mg/dL)",
                    "60-200",
                    FieldKind::integer(bounds::GLUCOSE_FASTING),
                ),
                FormField::new(
                    FieldId::InsulinLevel,
                    "Insulin Level",
                    "2.0-40.0",
                    FieldKind::float(bounds::INSULIN_LEVEL),
                ),
                FormField::new(
                    FieldId::GlucosePostprandial,
                    "Postprandial Glucose (mg/dL)",
                    "70-300",
                    FieldKind::integer(bounds::GLUCOSE_POSTPRANDIAL),
                ),
                FormField::new(
                    FieldId::Triglycerides,
                    "Triglycerides (mg/dL)",
                    "30-400",
                    FieldKind::integer(bounds::TRIGLYCERIDES),
                ),
                FormField::new(
                    FieldId::FamilyHistory,
                    "Family History of Diabetes",
                    "Yes/No",
                    FieldKind::Choice,
                ),
                FormField::new(
                    FieldId::Hypertension,
                    "History of Hypertension",
                    "Yes/No",
                    FieldKind::Choice,
                ),
                FormField::new(
                    FieldId::Age,
                    "Age (years)",
                    "18-100",
                    FieldKind::integer(bounds::AGE),
                ),
                FormField::new(
                    FieldId::Bmi,
                    "Body Mass Index (BMI)",
                    "10.0-60.0",
                    FieldKind::float(bounds::BMI),
                ),
            ],
            selected_field: 0,
            error_message: None,
            replace_on_input: true,
        }
    }
}

impl ClinicalFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
        self.replace_on_input = true;
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
        self.replace_on_input = true;
    }

    fn current(&mut self) -> &mut FormField {
        &mut self.fields[self.selected_field]
    }

    /// Type a character into the current field.
    ///
    /// Numeric fields accept digits and a decimal point; Yes/No fields
    /// accept `y` / `n`.
    pub fn input_char(&mut self, c: char) {
        let replace = self.replace_on_input;
        let field = self.current();
        match field.kind {
            FieldKind::Number { integer, .. } => {
                if replace && (c.is_ascii_digit() || (c == '.' && !integer)) {
                    field.value.zeroize();
                }
                if c.is_ascii_digit() || (c == '.' && !integer && !field.value.contains('.')) {
                    field.value.push(c);
                } else {
                    return;
                }
            }
            FieldKind::Choice => match c.to_ascii_lowercase() {
                'y' => field.value = YesNo::Yes.to_string(),
                'n' => field.value = YesNo::No.to_string(),
                _ => return,
            },
        }
        self.replace_on_input = false;
        self.error_message = None;
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        let field = self.current();
        if matches!(field.kind, FieldKind::Number { .. }) {
            field.value.pop();
        }
        self.replace_on_input = false;
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        let field = self.current();
        match field.kind {
            FieldKind::Number { .. } => field.value.clear(),
            FieldKind::Choice => field.reset(),
        }
        self.replace_on_input = false;
    }

    /// Step the current field: numeric fields move by their step within
    /// bounds, Yes/No fields toggle.
    pub fn step(&mut self, up: bool) {
        let field = self.current();
        match field.kind {
            FieldKind::Number {
                min,
                max,
                step,
                integer,
            } => {
                let current = field.value.trim().parse::<f64>().unwrap_or(min);
                let delta = if up { step } else { -step };
                // Round to the step's precision to avoid drift (4.0 + 0.1 * 3).
                let next = ((current + delta) / step).round() * step;
                field.value = format_number(next.clamp(min, max), integer);
            }
            FieldKind::Choice => {
                let answer = field.choice().unwrap_or_default().toggled();
                field.value = answer.to_string();
            }
        }
        self.replace_on_input = false;
        self.error_message = None;
    }

    /// Toggle the current field if it is a Yes/No field.
    pub fn toggle(&mut self) {
        if matches!(self.current().kind, FieldKind::Choice) {
            self.step(true);
        }
    }

    /// Restore every field to its initial value, wiping entered values.
    pub fn reset(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
            field.reset();
        }
        self.error_message = None;
        self.selected_field = 0;
        self.replace_on_input = true;
    }

    fn field(&self, id: FieldId) -> Result<&FormField, String> {
        self.fields
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| format!("Missing form field {id:?}"))
    }

    fn number(&self, id: FieldId) -> Result<f64, String> {
        self.field(id)?.number()
    }

    fn whole(&self, id: FieldId) -> Result<u32, String> {
        // number() has already rejected fractions and out-of-range values.
        self.number(id).map(|v| v as u32)
    }

    fn choice(&self, id: FieldId) -> Result<YesNo, String> {
        self.field(id)?.choice()
    }

    /// Validate bounds and convert to a clinical input record.
    pub fn to_clinical_input(&self) -> Result<ClinicalInput, String> {
        Ok(ClinicalInput {
            hba1c: self.number(FieldId::Hba1c)?,
            glucose_fasting: self.whole(FieldId::GlucoseFasting)?,
            glucose_postprandial: self.whole(FieldId::GlucosePostprandial)?,
            insulin_level: self.number(FieldId::InsulinLevel)?,
            triglycerides: self.whole(FieldId::Triglycerides)?,
            family_history_diabetes: self.choice(FieldId::FamilyHistory)?,
            hypertension_history: self.choice(FieldId::Hypertension)?,
            age: self.whole(FieldId::Age)?,
            bmi: self.number(FieldId::Bmi)?,
        })
    }

    /// Load sample data (typical type 2 presentation).
    pub fn load_sample_data(&mut self) {
        let sample = [
            (FieldId::Hba1c, "9.0"),
            (FieldId::GlucoseFasting, "180"),
            (FieldId::InsulinLevel, "22.0"),
            (FieldId::GlucosePostprandial, "260"),
            (FieldId::Triglycerides, "250"),
            (FieldId::FamilyHistory, "Yes"),
            (FieldId::Hypertension, "Yes"),
            (FieldId::Age, "58"),
            (FieldId::Bmi, "34.0"),
        ];
        for (id, value) in sample {
            if let Some(field) = self.fields.iter_mut().find(|f| f.id == id) {
                field.value = value.to_string();
            }
        }
        self.replace_on_input = true;
        self.error_message = None;
    }
}

/// Render the clinical data input form
pub fn render_clinical_form(f: &mut Frame, area: Rect, state: &ClinicalFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(" ", ClinicalTheme::text()),
            Span::styled("Diabetes Detection System", ClinicalTheme::title()),
        ]),
        Line::from(Span::styled(
            " A machine learning-based system to predict whether a person is diagnosed with diabetes based on clinical and demographic data.",
            ClinicalTheme::text_secondary(),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &ClinicalFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    render_field_group(
        f,
        columns[0],
        "Clinical Information",
        &state.fields[..CLINICAL_FIELDS],
        0,
        state.selected_field,
    );
    render_field_group(
        f,
        columns[1],
        "Demographic Information",
        &state.fields[CLINICAL_FIELDS..],
        CLINICAL_FIELDS,
        state.selected_field,
    );
}

fn render_field_group(
    f: &mut Frame,
    area: Rect,
    title: &str,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let group = Block::default()
        .title(Span::styled(format!(" {title} "), ClinicalTheme::subtitle()))
        .borders(Borders::TOP)
        .border_style(ClinicalTheme::border());
    let inner = group.inner(area);
    f.render_widget(group, area);

    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (ClinicalTheme::border_focused(), ClinicalTheme::focused())
        } else {
            (ClinicalTheme::border(), ClinicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        if field.value.is_empty() {
            spans.push(Span::styled(field.hint, ClinicalTheme::text_muted()));
        } else if matches!(field.kind, FieldKind::Choice) {
            spans.push(Span::styled("◂ ", ClinicalTheme::text_muted()));
            spans.push(Span::styled(field.value.as_str(), ClinicalTheme::text()));
            spans.push(Span::styled(" ▸", ClinicalTheme::text_muted()));
        } else {
            spans.push(Span::styled(field.value.as_str(), ClinicalTheme::text()));
        }
        if is_selected {
            spans.push(Span::styled("▌", ClinicalTheme::cursor()));
        }
        spans.push(Span::styled(
            format!("  {}", field.hint),
            ClinicalTheme::text_muted(),
        ));

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &ClinicalFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", ClinicalTheme::danger()),
            Span::styled(err.clone(), ClinicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", ClinicalTheme::key_hint()),
            Span::styled("Navigate ", ClinicalTheme::key_desc()),
            Span::styled("[←→] ", ClinicalTheme::key_hint()),
            Span::styled("Adjust ", ClinicalTheme::key_desc()),
            Span::styled("[Enter] ", ClinicalTheme::key_hint()),
            Span::styled("Predict Diabetes Status ", ClinicalTheme::key_desc()),
            Span::styled("[S] ", ClinicalTheme::key_hint()),
            Span::styled("Sample Data ", ClinicalTheme::key_desc()),
            Span::styled("[Esc] ", ClinicalTheme::key_hint()),
            Span::styled("Reset ", ClinicalTheme::key_desc()),
            Span::styled("[Ctrl+Q] ", ClinicalTheme::key_hint()),
            Span::styled("Quit", ClinicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(footer, area);
}
