//! The two placeholder grammars an output template may use.
//!
//! * printf style: `%(title)s`, `%(title)-30s`, `%(title)10.5s`, `%%`
//! * brace style: `{title}`, `{title:<30}`, `{pubdate:^20}`, `{{`, `}}`
//!
//! Only the directives that affect string layout (alignment, fill, width,
//! precision) are honoured; other flags are accepted and ignored.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static BRACE_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]*\}").unwrap());
static PRINTF_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\([^\(]*\)[^ ]*s").unwrap());
static PRINTF_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%(?:%|\((?P<name>[^)]*)\)(?P<flags>[-+ #0]*)(?P<width>\d*)(?:\.(?P<prec>\d*))?s)")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateStyle {
    Printf,
    Brace,
}

impl TemplateStyle {
    /// Pick the grammar of `template` by counting placeholders of each kind.
    ///
    /// Legacy-compatible rule, kept exactly: brace style wins only with a
    /// strictly higher count, so a tie (including a template with no
    /// placeholders at all) is printf style. The printf pattern is greedy
    /// up to the next space, so `%(a)s%(b)s` counts once.
    pub fn detect(template: &str) -> Self {
        let brace = BRACE_COUNT.find_iter(template).count();
        let printf = PRINTF_COUNT.find_iter(template).count();

        if brace > printf {
            TemplateStyle::Brace
        } else {
            TemplateStyle::Printf
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    fill: char,
    align: Align,
    width: usize,
    precision: Option<usize>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: Align::Left,
            width: 0,
            precision: None,
        }
    }
}

impl Layout {
    fn apply(&self, value: &str) -> String {
        let value: String = match self.precision {
            Some(p) => value.chars().take(p).collect(),
            None => value.to_string(),
        };

        let len = value.chars().count();
        if len >= self.width {
            return value;
        }

        let pad = self.width - len;
        let (left, right) = match self.align {
            Align::Left => (0, pad),
            Align::Right => (pad, 0),
            Align::Center => (pad / 2, pad - pad / 2),
        };

        let fill = |n: usize| std::iter::repeat(self.fill).take(n).collect::<String>();
        format!("{}{}{}", fill(left), value, fill(right))
    }

    /// Parse a brace format spec: `[[fill]align][sign][#][0][width][,][.precision][type]`.
    fn from_brace_spec(spec: &str) -> Self {
        let chars: Vec<char> = spec.chars().collect();
        let mut layout = Layout::default();
        let mut i = 0;
        let mut explicit_fill = false;

        let align_of = |c: char| match c {
            '<' => Some(Align::Left),
            '>' | '=' => Some(Align::Right),
            '^' => Some(Align::Center),
            _ => None,
        };

        if chars.len() >= 2 {
            if let Some(align) = align_of(chars[1]) {
                layout.fill = chars[0];
                layout.align = align;
                explicit_fill = true;
                i = 2;
            }
        }
        if i == 0 {
            if let Some(align) = chars.first().copied().and_then(align_of) {
                layout.align = align;
                i = 1;
            }
        }

        if matches!(chars.get(i), Some('+' | '-' | ' ')) {
            i += 1;
        }
        if chars.get(i) == Some(&'#') {
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            if !explicit_fill {
                layout.fill = '0';
            }
            i += 1;
        }

        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        layout.width = chars[start..i].iter().collect::<String>().parse().unwrap_or(0);

        if matches!(chars.get(i), Some(',' | '_')) {
            i += 1;
        }
        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            layout.precision = Some(chars[start..i].iter().collect::<String>().parse().unwrap_or(0));
        }

        layout
    }
}

/// Substitute `%(name)…s` placeholders. `%%` becomes `%`; any other `%` is
/// left untouched.
pub fn render_printf<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> String,
{
    PRINTF_PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let Some(name) = caps.name("name") else {
                return "%".to_string();
            };

            let flags = caps.name("flags").map_or("", |m| m.as_str());
            let layout = Layout {
                fill: ' ',
                align: if flags.contains('-') {
                    Align::Left
                } else {
                    Align::Right
                },
                width: caps
                    .name("width")
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0),
                precision: caps
                    .name("prec")
                    .map(|m| m.as_str().parse().unwrap_or(0)),
            };

            layout.apply(&lookup(name.as_str()))
        })
        .into_owned()
}

/// Substitute `{name[:spec]}` placeholders. `{{` and `}}` are escapes; an
/// unterminated `{` is copied through verbatim.
pub fn render_brace<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
        } else {
            match tail.find('}') {
                Some(end) => {
                    let inner = &tail[1..end];
                    let (head, spec) = inner.split_once(':').unwrap_or((inner, ""));
                    // `!r` / `!s` conversions do not change a string value
                    let name = head.split('!').next().unwrap_or("");
                    out.push_str(&Layout::from_brace_spec(spec).apply(&lookup(name)));
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        }
    }

    out.push_str(rest);
    out
}
