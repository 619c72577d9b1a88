//! Uniform error reports for support triage.
//!
//! Anything that fails in the background (a sweep, a renderer, a
//! collaborator) reports through [`report_error`], so every failure in the
//! log has the same start/end markers and can be copied out whole.

use std::fmt::Write;

const START: &str = "<-- Start -->";
const TRACE: &str = "<-- Stack trace -->";
const END: &str = "<-- End -->";

/// Build the report text for `message` and an optional cause chain.
pub fn format_report(message: &str, cause: Option<&anyhow::Error>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{START}");
    let _ = writeln!(
        out,
        "[{} v{}] {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        message
    );
    let _ = writeln!(
        out,
        "If you've decided to post this error message, please include everything \
         between the \"Start\" and \"End\" tag PLUS your configuration file"
    );
    let _ = writeln!(out, "{TRACE}");
    match cause {
        // `{:?}` on anyhow prints the full cause chain (and backtrace if captured).
        Some(e) => {
            let _ = writeln!(out, "{e:?}");
        }
        None => {
            let _ = writeln!(out, "None provided");
        }
    }
    out.push_str(END);
    out
}

/// Log a formatted report at error level.
pub fn report_error(message: &str, cause: Option<&anyhow::Error>) {
    tracing::error!("{}", format_report(message, cause));
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn report_has_markers_and_header() {
        let report = format_report("Something broke", None);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], START);
        assert_eq!(
            lines[1],
            format!("[breaker-server v{}] Something broke", env!("CARGO_PKG_VERSION"))
        );
        assert!(lines.contains(&TRACE));
        assert!(lines.contains(&"None provided"));
        assert_eq!(*lines.last().unwrap(), END);
    }

    #[test]
    fn report_includes_cause_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("socket closed"));
        let err = err.context("sending crack packet").unwrap_err();
        let report = format_report("Error occurred when broadcasting block cracks", Some(&err));

        assert!(report.contains("sending crack packet"));
        assert!(report.contains("socket closed"));
        assert!(!report.contains("None provided"));
        assert!(report.ends_with(END));
    }
}
