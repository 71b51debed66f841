//! File-level operations produced by actions.

use std::fs;

use anyhow::{Context, Result};
use colored::Colorize;

/// One source line before and after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedLine {
    /// 1-based line number. Casts never add lines, so it is the same on both sides.
    pub line: usize,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Replace the whole contents of a file.
    RewriteFile {
        file_path: String,
        contents: String,
        /// Number of fixes folded into `contents`.
        fixes: usize,
        changed_lines: Vec<ChangedLine>,
    },
}

impl Operation {
    pub fn file_path(&self) -> &str {
        match self {
            Operation::RewriteFile { file_path, .. } => file_path,
        }
    }

    pub fn fixes(&self) -> usize {
        match self {
            Operation::RewriteFile { fixes, .. } => *fixes,
        }
    }

    pub fn execute(&self) -> Result<()> {
        match self {
            Operation::RewriteFile {
                file_path,
                contents,
                ..
            } => fs::write(file_path, contents)
                .with_context(|| format!("Failed to write {}", file_path)),
        }
    }

    /// Print the changed lines, diff-style.
    pub fn preview(&self) {
        match self {
            Operation::RewriteFile {
                file_path,
                changed_lines,
                ..
            } => {
                let width = changed_lines
                    .iter()
                    .map(|c| c.line.to_string().len())
                    .max()
                    .unwrap_or(1);
                println!("  {} {}", "-->".blue(), file_path);
                for change in changed_lines {
                    println!(
                        "{:>width$} {} {}",
                        change.line.to_string().blue(),
                        "-".red(),
                        change.before.red()
                    );
                    println!(
                        "{:>width$} {} {}",
                        "",
                        "+".green(),
                        change.after.green()
                    );
                }
                println!();
            }
        }
    }
}

/// Lines that differ between `before` and `after`, which must have the same
/// number of lines.
pub fn changed_lines(before: &str, after: &str) -> Vec<ChangedLine> {
    before
        .lines()
        .zip(after.lines())
        .enumerate()
        .filter(|(_, (old, new))| old != new)
        .map(|(i, (old, new))| ChangedLine {
            line: i + 1,
            before: old.to_string(),
            after: new.to_string(),
        })
        .collect()
}
