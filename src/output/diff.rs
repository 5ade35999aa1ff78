//! Diff output formatter for showing changes
//!
//! This module provides:
//! - Line-by-line diff of each updated dependency file against the fetched one
//! - Unified diff style headers and hunks

use crate::domain::RunSummary;
use crate::output::SummaryFormatter;
use colored::Colorize;
use std::io::Write;

/// Lines of unchanged context printed around each change
const CONTEXT_LINES: usize = 2;

/// A single line of a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine<'a> {
    /// Line present in both versions
    Same(&'a str),
    /// Line only in the fetched version
    Removed(&'a str),
    /// Line only in the updated version
    Added(&'a str),
}

/// Diff formatter for showing file changes
pub struct DiffFormatter {
    color: bool,
}

impl DiffFormatter {
    /// Create a new diff formatter
    pub fn new() -> Self {
        Self { color: false }
    }

    /// Create a new diff formatter with color option
    pub fn with_color(color: bool) -> Self {
        Self { color }
    }

    fn write_line(&self, line: &DiffLine<'_>, writer: &mut dyn Write) -> std::io::Result<()> {
        match line {
            DiffLine::Same(text) => writeln!(writer, " {}", text),
            DiffLine::Removed(text) if self.color => {
                writeln!(writer, "{}", format!("-{}", text).red())
            }
            DiffLine::Removed(text) => writeln!(writer, "-{}", text),
            DiffLine::Added(text) if self.color => {
                writeln!(writer, "{}", format!("+{}", text).green())
            }
            DiffLine::Added(text) => writeln!(writer, "+{}", text),
        }
    }
}

impl Default for DiffFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes a line diff from the longest common subsequence of both texts
pub fn diff_lines<'a>(old: &'a str, new: &'a str) -> Vec<DiffLine<'a>> {
    let old: Vec<&str> = old.lines().collect();
    let new: Vec<&str> = new.lines().collect();

    // lcs[i][j] = LCS length of old[i..] and new[j..]
    let mut lcs = vec![vec![0usize; new.len() + 1]; old.len() + 1];
    for i in (0..old.len()).rev() {
        for j in (0..new.len()).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut lines = Vec::with_capacity(old.len().max(new.len()));
    let (mut i, mut j) = (0, 0);
    while i < old.len() && j < new.len() {
        if old[i] == new[j] {
            lines.push(DiffLine::Same(old[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            lines.push(DiffLine::Removed(old[i]));
            i += 1;
        } else {
            lines.push(DiffLine::Added(new[j]));
            j += 1;
        }
    }
    lines.extend(old[i..].iter().map(|l| DiffLine::Removed(l)));
    lines.extend(new[j..].iter().map(|l| DiffLine::Added(l)));
    lines
}

/// Returns the index ranges of the diff to print, with context merged
fn hunk_ranges(lines: &[DiffLine<'_>]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if matches!(line, DiffLine::Same(_)) {
            continue;
        }
        let start = idx.saturating_sub(CONTEXT_LINES);
        let end = (idx + CONTEXT_LINES + 1).min(lines.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => ranges.push((start, end)),
        }
    }
    ranges
}

impl SummaryFormatter for DiffFormatter {
    fn format(&self, summary: &RunSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        for updated in &summary.updated_files {
            let original = summary
                .original_file(updated)
                .map(|f| f.content.as_str())
                .unwrap_or("");
            let lines = diff_lines(original, &updated.content);
            let ranges = hunk_ranges(&lines);
            if ranges.is_empty() {
                continue;
            }

            let path = updated.repo_path();
            writeln!(writer, "--- a/{}", path)?;
            writeln!(writer, "+++ b/{}", path)?;
            for (start, end) in ranges {
                writeln!(writer, "@@ {} @@", updated.name)?;
                for line in &lines[start..end] {
                    self.write_line(line, writer)?;
                }
            }
        }
        Ok(())
    }
}
