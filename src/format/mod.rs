pub mod field;
pub mod template;

use chrono::{DateTime, Utc};

use crate::domain::Entry;

pub use field::{Field, DEFAULT_TIME_FORMAT, FIELD_NAMES};
pub use template::TemplateStyle;

/// Renders entries through one fixed template.
#[derive(Debug, Clone)]
pub struct Formatter {
    template: String,
    time_format: String,
    style: TemplateStyle,
}

impl Formatter {
    pub fn new(template: impl Into<String>, time_format: impl Into<String>) -> Self {
        let template = template.into();
        let style = TemplateStyle::detect(&template);

        Self {
            template,
            time_format: time_format.into(),
            style,
        }
    }

    /// Build a printf-style template showing `fields` separated by two
    /// spaces. Descriptions start on their own line; with `heading` each
    /// field except `timestamp` is prefixed by its capitalised name.
    pub fn from_fields<S: AsRef<str>>(fields: &[S], time_format: impl Into<String>, heading: bool) -> Self {
        let parts: Vec<String> = fields
            .iter()
            .map(|field| {
                let field = field.as_ref();
                let new_line = if matches!(field, "desc" | "description") { "\n" } else { "" };

                if heading && field != "timestamp" {
                    format!("{}{}: %({})s", new_line, capitalize(field), field)
                } else {
                    format!("{}%({})s", new_line, field)
                }
            })
            .collect();

        Self::new(format!("{}\n", parts.join("  ")), time_format)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn time_format(&self) -> &str {
        &self.time_format
    }

    pub fn style(&self) -> TemplateStyle {
        self.style
    }

    pub fn format(&self, entry: &Entry) -> String {
        self.format_at(entry, Utc::now())
    }

    /// Like [`Formatter::format`] with an explicit value for `timestamp`.
    pub fn format_at(&self, entry: &Entry, now: DateTime<Utc>) -> String {
        let lookup = |name: &str| field::resolve(name, entry, &self.time_format, now);

        match self.style {
            TemplateStyle::Printf => template::render_printf(&self.template, lookup),
            TemplateStyle::Brace => template::render_brace(&self.template, lookup),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::from_fields(&["title"], DEFAULT_TIME_FORMAT, false)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
