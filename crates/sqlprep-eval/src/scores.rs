//! Locating the score table in evaluator output

use once_cell::sync::Lazy;
use regex::Regex;

static SCORE_HEADER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*easy\s+medium\s+hard\s+extra\s+all\s*$").unwrap());

/// True for the `easy medium hard extra all` column header line
pub fn is_score_header(line: &str) -> bool {
    SCORE_HEADER_REGEX.is_match(line)
}

/// Lines of `output` starting at the first score header, or `None`
pub fn lines_from_header(output: &str) -> Option<Vec<&str>> {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.iter().position(|line| is_score_header(line))?;
    Some(lines[start..].to_vec())
}
