//! Diagnostic rendering. With the source text at hand, spans are
//! shown in context through ariadne; otherwise a plain line is printed.

use std::io::Cursor;

use anyhow::Result;
use ariadne::{Config, Label, Report, ReportKind, Source};
use lgx::Diagnostic;

pub fn render(diagnostic: &Diagnostic, filename: &str, source: Option<&str>) -> Result<String> {
    let (Some(source), Some(span)) = (source, diagnostic.span) else {
        return Ok(format!("warning: {diagnostic}"));
    };
    let range = span.into_range();
    let mut bytes = Cursor::new(Vec::new());
    Report::build(ReportKind::Warning, (filename, range.clone()))
        .with_config(Config::default().with_color(false))
        .with_message(diagnostic.kind.to_string())
        .with_label(Label::new((filename, range)).with_message(&diagnostic.message))
        .finish()
        .write((filename, Source::from(source)), &mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes.into_inner()).into_owned())
}

pub fn print_all(diagnostics: &[Diagnostic], filename: &str, source: Option<&str>) -> Result<()> {
    for diagnostic in diagnostics {
        eprintln!("{}", render(diagnostic, filename, source)?);
    }
    Ok(())
}
