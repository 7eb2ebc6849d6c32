//! Errors from building pass programs, and the source listing attached to
//! them.
//!
//! Pack shaders are usually long, so a compile failure carries the stage
//! source with line numbers and a `>` marker on every line the driver log
//! cites.

use std::collections::BTreeSet;
use thiserror::Error;

/// A pass program could not be built from its pack sources.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    /// A stage failed to compile.
    #[error("{stage} stage failed to compile:\n{log}")]
    Compile {
        /// `"vertex"` or `"fragment"`.
        stage: String,
        /// Annotated source listing followed by the driver log.
        log: String,
    },
    #[error("program failed to link:\n{0}")]
    Link(String),
}

/// Line numbers cited by a driver log.
///
/// Understands the `0:12:` form (Mesa, ANGLE, most desktop drivers) and the
/// `0(12)` form (NVIDIA).
fn cited_lines(log: &str) -> BTreeSet<usize> {
    let mut lines = BTreeSet::new();
    for entry in log.lines() {
        let Some(start) = entry.find(|c: char| c.is_ascii_digit()) else {
            continue;
        };
        let rest = &entry[start..];
        let Some(sep) = rest.find([':', '(']) else {
            continue;
        };
        if rest[..sep].parse::<usize>().is_err() {
            continue;
        }
        let tail = &rest[sep + 1..];
        let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
        if let Ok(line) = digits.parse::<usize>() {
            lines.insert(line);
        }
    }
    lines
}

/// Lists `source` with right-aligned line numbers, marks the lines `log`
/// cites, and appends `log`. Either input may be empty.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let cited = cited_lines(log);
    let source_lines: Vec<&str> = source.lines().collect();
    let width = source_lines.len().max(1).to_string().len();

    let listing = source_lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let marker = if cited.contains(&(i + 1)) { '>' } else { ' ' };
            format!("{marker}{:>width$}: {line}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n");

    match (listing.is_empty(), log.is_empty()) {
        (true, _) => log.to_string(),
        (false, true) => listing,
        (false, false) => format!("{listing}\n\n{log}"),
    }
}
