use bytesize::ByteSize;
use chrono::{DateTime, Local};
use console::{Emoji, Style, Term};
use std::fmt::Display;
use std::io::Write;
use std::sync::Mutex;

use crate::config::RunConfig;
use crate::publish::PublishOutcome;
use crate::source::SourceItem;

static OK: Emoji<'_, '_> = Emoji("✔", "+");
static FAIL: Emoji<'_, '_> = Emoji("✖", "x");

/// Human-readable run output, on stdout unless another writer is given.
///
/// Write errors are ignored: reporting never fails a run.
pub struct Reporter {
    out: Mutex<Box<dyn Write + Send>>,
    verbose: bool,
}

impl Reporter {
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(Box::new(Term::stdout()), verbose)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, verbose: bool) -> Self {
        Self {
            out: Mutex::new(out),
            verbose,
        }
    }

    fn line(&self, text: impl AsRef<str>) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", text.as_ref());
        }
    }

    pub fn banner(&self, started: DateTime<Local>) {
        let title = concat!("contentsync-rs ", env!("CARGO_PKG_VERSION"));
        self.line(format!(
            "{}  {}",
            Style::new().bold().apply_to(title),
            Style::new().dim().apply_to(started.format("%Y-%m-%d %H:%M:%S"))
        ));
        self.line("");
    }

    pub fn config_table(&self, config: &RunConfig) {
        let rows = config_rows(config);
        self.table(&rows);
        self.line("");
    }

    /// One line for a pipeline step, with a success or failure glyph.
    pub fn step(&self, ok: bool, message: impl Display) {
        let glyph = if ok {
            Style::new().green().apply_to(OK)
        } else {
            Style::new().red().apply_to(FAIL)
        };
        self.line(format!("{} {}", glyph, message));
    }

    /// Underlying error details, printed only in verbose mode.
    pub fn detail(&self, error: impl Display) {
        if self.verbose {
            self.line(format!("    {}", Style::new().dim().apply_to(error)));
        }
    }

    pub fn step_result<T, E: Display>(&self, result: &Result<T, E>, message: impl Display) {
        self.step(result.is_ok(), message);
        if let Err(e) = result {
            self.detail(e);
        }
    }

    pub fn item_table(&self, items: &[SourceItem]) {
        self.line("");
        let rows: Vec<(String, String)> = std::iter::once(("ID".to_string(), "NAME".to_string()))
            .chain(items.iter().map(|item| {
                (
                    item.id.clone(),
                    item.display_name().unwrap_or("-").to_string(),
                )
            }))
            .collect();
        self.table(&rows);
        self.line("");
    }

    pub fn publish_summary(&self, index: &str, outcome: &PublishOutcome) {
        self.step(
            outcome.is_success(),
            format!(
                "Published {}/{} documents to {} ({}), {} failed",
                outcome.succeeded(),
                outcome.attempted,
                index,
                ByteSize(outcome.bytes),
                outcome.failed
            ),
        );
    }

    fn table(&self, rows: &[(String, String)]) {
        let width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        for (key, value) in rows {
            self.line(format!(
                "  {:<width$}  {}",
                Style::new().bold().apply_to(key),
                value,
                width = width
            ));
        }
    }
}

fn config_rows(config: &RunConfig) -> Vec<(String, String)> {
    let or_unset = |v: Option<&str>| v.filter(|s| !s.is_empty()).unwrap_or("(unset)").to_string();
    vec![
        ("Content type".into(), config.content_type.clone()),
        ("Environment".into(), config.environment.clone()),
        ("Index".into(), config.index_name.clone()),
        ("Locale".into(), or_unset(config.locale.as_deref())),
        ("Space".into(), or_unset(config.source.space_id.as_deref())),
        ("Contentful host".into(), config.source.host.clone()),
        ("Elasticsearch".into(), config.destination.url.to_string()),
        ("Create index".into(), config.create_index.to_string()),
        ("Reset index".into(), config.reset.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::resolve_config;
    use clap::Parser;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn failed_check(verbose: bool) -> String {
        let captured = Captured::default();
        let reporter = Reporter::with_writer(Box::new(captured.clone()), verbose);
        let result: Result<(), String> = Err("connection refused".into());
        reporter.step_result(&result, "Contentful space reachable");
        captured.text()
    }

    #[test]
    fn test_error_detail_shown_when_verbose() {
        let out = failed_check(true);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2, "step and detail lines: {:?}", lines);
        assert!(lines[0].ends_with("Contentful space reachable"));
        assert!(lines[1].starts_with("    "));
        assert!(lines[1].contains("connection refused"));
    }

    #[test]
    fn test_error_detail_hidden_when_quiet() {
        let out = failed_check(false);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 1, "only the step line: {:?}", lines);
        assert!(lines[0].ends_with("Contentful space reachable"));
        assert!(!out.contains("connection refused"));
    }

    #[test]
    fn test_successful_step_has_no_detail() {
        let captured = Captured::default();
        let reporter = Reporter::with_writer(Box::new(captured.clone()), true);
        let result: Result<&str, String> = Ok("green");
        reporter.step_result(&result, "Elasticsearch reachable");
        assert_eq!(captured.text().lines().count(), 1);
    }

    #[test]
    fn test_item_table() {
        let captured = Captured::default();
        let reporter = Reporter::with_writer(Box::new(captured.clone()), false);
        let items = vec![
            SourceItem::from_entry(serde_json::json!({ "sys": { "id": "a" }, "fields": { "name": "Foo" } }))
                .unwrap(),
            SourceItem::from_entry(serde_json::json!({ "sys": { "id": "b" }, "fields": {} })).unwrap(),
        ];
        reporter.item_table(&items);

        let out = captured.text();
        assert!(out.contains("ID") && out.contains("NAME"));
        assert!(out.lines().any(|l| l.contains('a') && l.contains("Foo")));
        assert!(out.lines().any(|l| l.trim_end().ends_with('-') && l.contains('b')));
    }

    #[test]
    fn test_config_rows() {
        let cli = Cli::try_parse_from(["contentsync-rs", "-e", "staging", "-i", "news", "article"])
            .unwrap();
        let mut config = resolve_config(cli).unwrap();
        config.source.space_id = None;
        config.locale = None;

        let rows = config_rows(&config);
        let get = |k: &str| rows.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("Content type"), Some("article"));
        assert_eq!(get("Environment"), Some("staging"));
        assert_eq!(get("Index"), Some("news"));
        assert_eq!(get("Space"), Some("(unset)"));
        assert_eq!(get("Create index"), Some("true"));
    }
}
