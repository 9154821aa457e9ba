/// Threshold classification of formatted metric strings
///
/// Metric fields are display strings such as `"85%"`, `"3.20GB/7.80GB (41.03%)"`
/// or `"20G/50G (40%)"`. The value compared against the thresholds is the last
/// number inside the last parenthesized group, or the leading number of the
/// whole field when there is no group. Anything unreadable is green.

use regex::Regex;
use std::sync::OnceLock;

use crate::utils::{THRESHOLD_RED, THRESHOLD_YELLOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Green,
    Yellow,
    Red,
}

impl Severity {
    pub fn from_value(value: f64) -> Self {
        if value > THRESHOLD_RED {
            Severity::Red
        } else if value > THRESHOLD_YELLOW {
            Severity::Yellow
        } else {
            Severity::Green
        }
    }
}

fn number_regex() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(r"[-+]?(?:\d+\.?\d*|\.\d+)").expect("number pattern is valid"))
}

fn leading_number_regex() -> &'static Regex {
    static LEADING: OnceLock<Regex> = OnceLock::new();
    LEADING.get_or_init(|| Regex::new(r"^\s*([-+]?(?:\d+\.?\d*|\.\d+))").expect("leading number pattern is valid"))
}

/// Extract the value the thresholds apply to
pub fn extract_value(field: &str) -> Option<f64> {
    let text = match field.rfind('(') {
        Some(open) => {
            let group = &field[open + 1..];
            let group = group.find(')').map_or(group, |close| &group[..close]);
            number_regex().find_iter(group).last()?.as_str()
        }
        None => leading_number_regex().captures(field)?.get(1)?.as_str(),
    };

    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Classify a metric field, failing open to green
pub fn classify(field: &str) -> Severity {
    extract_value(field).map_or(Severity::Green, Severity::from_value)
}
