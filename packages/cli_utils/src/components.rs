//! Stateless text renderers for the planner and analytics pages.
//!
//! Each component owns the data it shows and renders to a `String`; none of
//! them hold state between renders. Styling goes through `console`, which
//! drops colours automatically when stdout is not a terminal.

use std::fmt::Write as _;

use console::{Style, style};
use dialoguer::Select;

/// Colour used for a card's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Accent {
    #[default]
    Blue,
    Green,
    Purple,
    Amber,
    Red,
}

impl Accent {
    fn style(self) -> Style {
        let style = Style::new().bold();
        match self {
            Self::Blue => style.blue(),
            Self::Green => style.green(),
            Self::Purple => style.magenta(),
            Self::Amber => style.yellow(),
            Self::Red => style.red(),
        }
    }
}

/// A headline number with a label and optional helper text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCard {
    label: String,
    value: String,
    suffix: String,
    helper: Option<String>,
    accent: Accent,
}

impl MetricCard {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            suffix: String::new(),
            helper: None,
            accent: Accent::default(),
        }
    }

    /// Unit appended to the value (e.g. `"%"`).
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn helper(mut self, helper: impl Into<String>) -> Self {
        self.helper = Some(helper.into());
        self
    }

    #[must_use]
    pub const fn accent(mut self, accent: Accent) -> Self {
        self.accent = accent;
        self
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "{}\n  {}{}",
            style(&self.label).dim(),
            self.accent.style().apply_to(&self.value),
            self.suffix
        );
        if let Some(helper) = &self.helper {
            let _ = write!(out, "\n  {}", style(helper).italic());
        }
        out
    }
}

/// A titled block wrapping already-rendered content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCard {
    title: String,
    description: Option<String>,
    body: String,
}

impl SectionCard {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            body: String::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn render(&self) -> String {
        let rule = "─".repeat(self.title.chars().count().max(24));
        let mut out = format!("{}\n{}", style(&self.title).bold().cyan(), style(rule).dim());
        if let Some(description) = &self.description {
            let _ = write!(out, "\n{}", style(description).dim());
        }
        if !self.body.is_empty() {
            out.push('\n');
            for line in self.body.lines() {
                let _ = write!(out, "\n  {line}");
            }
        }
        out
    }
}

/// A labelled choice over `(value, label)` options.
///
/// Renders the current choice, or the placeholder when nothing is selected
/// or there are no options. Disabled fields never prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectField {
    label: String,
    options: Vec<(String, String)>,
    selected: Option<String>,
    placeholder: String,
    disabled: bool,
}

impl SelectField {
    #[must_use]
    pub fn new(label: impl Into<String>, options: Vec<(String, String)>) -> Self {
        Self {
            label: label.into(),
            options,
            selected: None,
            placeholder: "Select an option".to_string(),
            disabled: false,
        }
    }

    /// Marks the option with this value as selected. Empty means none.
    #[must_use]
    pub fn selected(mut self, value: &str) -> Self {
        self.selected = Some(value.to_string()).filter(|v| !v.is_empty());
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_deref()?;
        self.options.iter().position(|(value, _)| value == selected)
    }

    /// Whether the field can be interacted with.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.disabled && !self.options.is_empty()
    }

    #[must_use]
    pub fn render(&self) -> String {
        let shown = self
            .selected_index()
            .map(|i| style(self.options[i].1.as_str()).bold().to_string())
            .unwrap_or_else(|| style(self.placeholder.as_str()).dim().to_string());
        let mut out = format!("{}: {shown}", self.label);
        if self.disabled {
            let _ = write!(out, " {}", style("(disabled)").dim());
        }
        out
    }

    /// Prompts for a choice and returns the chosen value.
    ///
    /// Returns `Ok(None)` without prompting when the field is disabled or
    /// empty, and when the prompt is dismissed.
    ///
    /// # Errors
    ///
    /// Returns [`dialoguer::Error`] if the terminal cannot be read.
    pub fn prompt(&self) -> Result<Option<String>, dialoguer::Error> {
        if !self.is_enabled() {
            println!("{}", self.render());
            return Ok(None);
        }

        let labels: Vec<&str> = self.options.iter().map(|(_, l)| l.as_str()).collect();

        let idx = Select::new()
            .with_prompt(&self.label)
            .items(&labels)
            .default(self.selected_index().unwrap_or(0))
            .interact_opt()?;

        Ok(idx.map(|i| self.options[i].0.clone()))
    }
}

/// A bulleted list with a message for the empty case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBlock {
    title: String,
    items: Vec<String>,
    empty_text: String,
}

impl ListBlock {
    #[must_use]
    pub fn new(title: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            title: title.into(),
            items,
            empty_text: "Nothing to show yet.".to_string(),
        }
    }

    #[must_use]
    pub fn empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = text.into();
        self
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = style(&self.title).bold().to_string();
        if self.items.is_empty() {
            let _ = write!(out, "\n  {}", style(&self.empty_text).dim());
        }
        for item in &self.items {
            let _ = write!(out, "\n  • {item}");
        }
        out
    }
}

/// Aligned `term  value` rows, used for weather, places, and traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionList {
    title: String,
    rows: Vec<(String, String)>,
    note: Option<String>,
    empty_text: String,
}

impl DefinitionList {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
            note: None,
            empty_text: "No data available".to_string(),
        }
    }

    #[must_use]
    pub fn row(mut self, term: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push((term.into(), value.into()));
        self
    }

    /// Footnote shown under the rows (e.g. the data source).
    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = text.into();
        self
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = style(&self.title).bold().to_string();
        if self.rows.is_empty() {
            let _ = write!(out, "\n  {}", style(&self.empty_text).dim());
        }

        let width = self
            .rows
            .iter()
            .map(|(term, _)| term.chars().count())
            .max()
            .unwrap_or(0);

        for (term, value) in &self.rows {
            let pad = " ".repeat(width - term.chars().count());
            let _ = write!(out, "\n  {}{pad}  {value}", style(term).dim());
        }

        if let Some(note) = &self.note {
            let _ = write!(out, "\n  {}", style(note).italic().dim());
        }
        out
    }
}

/// Severity of a [`Banner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Warning,
    Info,
}

/// A one-line notice shown above a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    kind: BannerKind,
    message: String,
}

impl Banner {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> BannerKind {
        self.kind
    }

    #[must_use]
    pub fn render(&self) -> String {
        let (marker, style) = match self.kind {
            BannerKind::Error => ("✗", Style::new().red().bold()),
            BannerKind::Warning => ("!", Style::new().yellow().bold()),
            BannerKind::Info => ("i", Style::new().blue()),
        };
        format!("{} {}", style.apply_to(marker), style.apply_to(&self.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<(String, String)> {
        vec![
            ("manchester".to_string(), "Manchester".to_string()),
            ("london".to_string(), "London".to_string()),
        ]
    }

    #[test]
    fn metric_card_shows_value_suffix_and_helper() {
        let card = MetricCard::new("Audience Match", "76")
            .suffix("%")
            .helper("How closely the area matches your campaign demographic")
            .accent(Accent::Purple)
            .render();

        assert!(card.contains("Audience Match"));
        assert!(card.contains("76"));
        assert!(card.contains('%'));
        assert!(card.contains("campaign demographic"));
    }

    #[test]
    fn metric_card_without_helper_is_two_lines() {
        let card = MetricCard::new("Impressions / Hour", "--").render();
        assert_eq!(card.lines().count(), 2);
    }

    #[test]
    fn section_card_indents_body() {
        let card = SectionCard::new("Step 2 · Choose Location")
            .description("Pick a city and area.")
            .body("City: Manchester\nArea: Albert Square")
            .render();

        assert!(card.contains("Pick a city and area."));
        assert!(card.contains("\n  City: Manchester"));
        assert!(card.contains("\n  Area: Albert Square"));
    }

    #[test]
    fn select_field_shows_selected_label() {
        let field = SelectField::new("City", options()).selected("london");
        assert!(field.render().contains("London"));
        assert!(field.is_enabled());
    }

    #[test]
    fn select_field_falls_back_to_placeholder() {
        let field = SelectField::new("Area", Vec::new()).placeholder("Select a city first");
        assert!(field.render().contains("Select a city first"));
        assert!(!field.is_enabled());
        assert_eq!(field.prompt().unwrap(), None);

        let field = SelectField::new("City", options()).selected("paris");
        assert!(field.render().contains("Select an option"));
    }

    #[test]
    fn disabled_select_field_never_prompts() {
        let field = SelectField::new("City", options())
            .selected("manchester")
            .disabled(true);
        assert!(field.render().contains("(disabled)"));
        assert_eq!(field.prompt().unwrap(), None);
    }

    #[test]
    fn list_block_renders_bullets_or_empty_text() {
        let list = ListBlock::new("Key Reasons", vec!["Transport hub".to_string()]).render();
        assert!(list.contains("• Transport hub"));

        let empty = ListBlock::new("Tactics", Vec::new())
            .empty_text("Run an analysis to see tactics.")
            .render();
        assert!(empty.contains("Run an analysis to see tactics."));
        assert!(!empty.contains('•'));
    }

    #[test]
    fn definition_list_aligns_values() {
        let list = DefinitionList::new("Weather")
            .row("Condition", "Light rain")
            .row("Wind", "18 kph")
            .note("Typical conditions")
            .render();

        assert!(list.contains("Light rain"));
        assert!(list.contains("Typical conditions"));
        let rows: Vec<&str> = list
            .lines()
            .filter(|l| l.contains("kph") || l.contains("rain"))
            .collect();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn empty_definition_list_says_so() {
        let list = DefinitionList::new("Traffic").render();
        assert!(list.contains("No data available"));
    }

    #[test]
    fn banner_carries_message() {
        let banner = Banner::error("Select a city and area before running the analysis.");
        assert_eq!(banner.kind(), BannerKind::Error);
        assert!(banner.render().contains("Select a city and area"));
    }
}
