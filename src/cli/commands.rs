use std::io::BufRead;
use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::Parser;

use crate::config::{
    parse_interval, parse_newer, OutputConfig, OutputStyle, PollConfig, DEFAULT_INTERVAL,
    DEFAULT_TIMEOUT_SECS,
};
use crate::errors::TailResult;
use crate::format::{DEFAULT_TIME_FORMAT, FIELD_NAMES};
use crate::services::read_opml_urls;

#[derive(Parser, Debug)]
#[command(name = "feedtail")]
#[command(about = "Tail one or more RSS, Atom or JSON feeds")]
#[command(version)]
pub struct Cli {
    /// Feed URLs or file paths to tail (default: one per line from stdin)
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Time between polls: 60, 60s, 5m or 1h
    #[arg(short, long, env = "FEEDTAIL_INTERVAL", default_value = DEFAULT_INTERVAL)]
    pub interval: String,

    /// Number of times to poll before quitting (0 polls forever)
    #[arg(short = 'N', long, default_value_t = 0)]
    pub iterations: u32,

    /// Number of entries to show on the first poll of each feed (default: all)
    #[arg(short = 'I', long)]
    pub initial: Option<usize>,

    /// Only show entries published after this date
    #[arg(short, long, value_name = "DATE")]
    pub newer: Option<String>,

    /// Entry field to display, repeatable (default: title)
    #[arg(
        short,
        long,
        value_name = "FIELD",
        value_parser = PossibleValuesParser::new(FIELD_NAMES.iter().copied())
    )]
    pub show: Vec<String>,

    /// strftime format for date fields
    #[arg(short, long, value_name = "FORMAT", default_value = DEFAULT_TIME_FORMAT)]
    pub time_format: String,

    /// Output template, overriding --show and --heading. Accepts
    /// %(field)s or {field} placeholders; a literal \n is a newline
    #[arg(short = 'F', long)]
    pub format: Option<String>,

    /// Remember feed state in this file across runs (*.json for JSON, SQLite otherwise)
    #[arg(short, long, env = "FEEDTAIL_CACHE", value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Also tail every feed listed in this OPML file
    #[arg(long, value_name = "FILE")]
    pub opml: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "FEEDTAIL_TIMEOUT", value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Show entries in reverse order
    #[arg(short, long)]
    pub reverse: bool,

    /// Exit on the first error
    #[arg(short, long)]
    pub fail: bool,

    /// Skip entries already shown
    #[arg(short, long)]
    pub unique: bool,

    /// Show field headings
    #[arg(short = 'H', long)]
    pub heading: bool,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Feed URLs in polling order: arguments, then the OPML list. With
    /// neither, one URL per non-blank line of `stdin`.
    pub fn gather_urls<R: BufRead>(&self, stdin: Option<R>) -> TailResult<Vec<String>> {
        let mut urls = self.urls.clone();

        if let Some(path) = &self.opml {
            let content = std::fs::read_to_string(path)?;
            urls.extend(read_opml_urls(&content)?);
        }

        if urls.is_empty() {
            if let Some(stdin) = stdin {
                for line in stdin.lines() {
                    let line = line?;
                    let line = line.trim();
                    if !line.is_empty() {
                        urls.push(line.to_string());
                    }
                }
            }
        }

        Ok(urls)
    }

    pub fn into_config(self, urls: Vec<String>) -> TailResult<PollConfig> {
        let style = match self.format {
            Some(template) => OutputStyle::Template(template.replace("\\n", "\n")),
            None => OutputStyle::Fields {
                fields: if self.show.is_empty() {
                    vec!["title".to_string()]
                } else {
                    self.show
                },
                heading: self.heading,
            },
        };

        let config = PollConfig {
            urls,
            interval: parse_interval(&self.interval)?,
            iterations: (self.iterations > 0).then_some(self.iterations),
            initial: self.initial,
            newer: self.newer.as_deref().map(parse_newer).transpose()?,
            reverse: self.reverse,
            unique: self.unique,
            fail_fast: self.fail,
            output: OutputConfig {
                style,
                time_format: self.time_format,
            },
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TailError;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("feedtail").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["feed.xml"]).into_config(vec!["feed.xml".to_string()]).unwrap();

        assert_eq!(config.interval, Duration::from_secs(300));
        assert_eq!(config.iterations, None);
        assert_eq!(config.output, OutputConfig::default());
        assert!(!config.unique && !config.reverse && !config.fail_fast);
    }

    #[test]
    fn test_show_and_heading() {
        let cli = parse(&["-s", "title", "-s", "url", "-H", "-N", "2", "-i", "5m"]);
        let config = cli.into_config(vec!["feed.xml".to_string()]).unwrap();

        assert_eq!(config.iterations, Some(2));
        assert_eq!(config.interval, Duration::from_secs(300));
        assert_eq!(
            config.output.style,
            OutputStyle::Fields {
                fields: vec!["title".to_string(), "url".to_string()],
                heading: true,
            }
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = Cli::try_parse_from(["feedtail", "-s", "colour", "feed.xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_format_unescapes_newlines() {
        let cli = parse(&["-F", "{title}\\n"]);
        let config = cli.into_config(vec!["feed.xml".to_string()]).unwrap();

        assert_eq!(config.output.style, OutputStyle::Template("{title}\n".to_string()));
    }

    #[test]
    fn test_newer_parsed() {
        let cli = parse(&["--newer", "2012/01/04 11:00:00"]);
        let config = cli.into_config(vec!["feed.xml".to_string()]).unwrap();

        assert_eq!(
            config.newer,
            Some(Utc.with_ymd_and_hms(2012, 1, 4, 11, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let urls = vec!["feed.xml".to_string()];

        let result = parse(&["--newer", "$#@!@#"]).into_config(urls.clone());
        assert!(matches!(result, Err(TailError::InvalidDate(_))));

        let result = parse(&["-i", "soon"]).into_config(urls.clone());
        assert!(matches!(result, Err(TailError::InvalidInterval(_))));

        let result = parse(&["-t", "%Q"]).into_config(urls);
        assert!(matches!(result, Err(TailError::Config(_))));
    }

    #[test]
    fn test_urls_from_stdin_only_without_args() {
        let stdin = || Some(Cursor::new("feed-a.xml\n\n  feed-b.xml  \n"));

        let urls = parse(&[]).gather_urls(stdin()).unwrap();
        assert_eq!(urls, vec!["feed-a.xml", "feed-b.xml"]);

        let urls = parse(&["feed-c.xml"]).gather_urls(stdin()).unwrap();
        assert_eq!(urls, vec!["feed-c.xml"]);
    }

    #[test]
    fn test_urls_from_opml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("subs.opml");
        std::fs::write(
            &path,
            r#"<opml version="2.0"><head/><body>
<outline text="A" xmlUrl="https://a.example.com/feed"/>
</body></opml>"#,
        )
        .unwrap();

        let cli = parse(&["feed.xml", "--opml", path.to_str().unwrap()]);
        let urls = cli.gather_urls(None::<Cursor<&str>>).unwrap();

        assert_eq!(urls, vec!["feed.xml", "https://a.example.com/feed"]);
    }
}
