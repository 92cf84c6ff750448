use serde::{Deserialize, Serialize};

use crate::record::Record;

// ---------------------------------------------------------------------------
// CategoryCounts
// ---------------------------------------------------------------------------

/// File count per issue category, kept in first-discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    entries: Vec<(String, u64)>,
}

impl CategoryCounts {
    fn increment(&mut self, category: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == category) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((category.to_string(), 1)),
        }
    }

    /// Entries in the order their category first appeared in the input.
    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    /// Entries sorted by descending count. Ties keep discovery order.
    pub fn sorted_by_count_desc(&self) -> Vec<(String, u64)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }

    pub fn get(&self, category: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AggregateSummary
// ---------------------------------------------------------------------------

/// Totals shared by every report format. Computed fresh for each render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub total_files: u64,
    pub total_issues: u64,
    pub total_code_lines: u64,
    /// Issues per thousand code lines; `0.0` when there are no code lines.
    pub issue_density: f64,
    pub categories: CategoryCounts,
}

impl AggregateSummary {
    /// Density rounded half-up to two decimals, e.g. `"50.00"`, `"0.13"` for
    /// `0.125`.
    pub fn density_display(&self) -> String {
        round_half_up_2(self.issue_density)
    }
}

/// Rounds the shortest decimal form of `value` half-up to two places.
/// `{:.2}` rounds the binary value half-to-even, which turns `0.125` into
/// `"0.12"`.
fn round_half_up_2(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value:.2}");
    }
    let shortest = value.abs().to_string();
    let (int_part, frac_part) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().chain(std::iter::repeat(b'0')).take(2))
        .map(|b| b - b'0')
        .collect();

    if frac_part.as_bytes().get(2).is_some_and(|d| *d >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let split = digits.len() - 2;
    let mut out = String::with_capacity(digits.len() + 2);
    if value.is_sign_negative() && digits.iter().any(|d| *d != 0) {
        out.push('-');
    }
    out.extend(digits[..split].iter().map(|d| char::from(b'0' + d)));
    out.push('.');
    out.extend(digits[split..].iter().map(|d| char::from(b'0' + d)));
    out
}

/// Summarize a record sequence. Absent counts contribute zero; records with
/// an absent or empty issue type are left out of the category counts.
pub fn summarize(records: &[Record]) -> AggregateSummary {
    let mut total_issues = 0u64;
    let mut total_code_lines = 0u64;
    let mut categories = CategoryCounts::default();

    for record in records {
        total_issues += record.issues_or_zero();
        total_code_lines += record.code_lines_or_zero();
        if let Some(category) = record.category() {
            categories.increment(category);
        }
    }

    AggregateSummary {
        total_files: records.len() as u64,
        total_issues,
        total_code_lines,
        issue_density: issue_density(total_issues, total_code_lines),
        categories,
    }
}

fn issue_density(total_issues: u64, total_code_lines: u64) -> f64 {
    if total_code_lines == 0 {
        return 0.0;
    }
    total_issues as f64 / total_code_lines as f64 * 1000.0
}
