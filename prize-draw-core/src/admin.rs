//! Parsing of operator-entered admin fields.
//!
//! Anything that does not parse to a finite number is "no change": the
//! parsers return `None` and callers leave the current value alone.
use crate::config::ParamsPatch;
use crate::numbers::floor_f64_to_i64;
use crate::prize_map::{PrizeMap, Weights};

/// Parse a finite real.
#[must_use]
pub fn parse_real(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a count, flooring fractional input.
#[must_use]
pub fn parse_count(text: &str) -> Option<i64> {
    parse_real(text).and_then(floor_f64_to_i64)
}

/// Split a comma-separated list of prize names, dropping blanks.
#[must_use]
pub fn parse_name_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Stock deltas from `(prize, text)` fields; unparseable and zero fields are skipped.
pub fn parse_stock_delta<'a>(
    fields: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> PrizeMap<i64> {
    fields
        .into_iter()
        .filter_map(|(name, text)| {
            parse_count(text)
                .filter(|delta| *delta != 0)
                .map(|delta| (name, delta))
        })
        .collect()
}

/// Boost parameter fields. A threshold must be a non-negative integer.
#[must_use]
pub fn parse_params(threshold: &str, beta: &str, mcap: &str) -> ParamsPatch {
    ParamsPatch {
        threshold: parse_count(threshold).and_then(|n| u32::try_from(n).ok()),
        beta: parse_real(beta),
        mcap: parse_real(mcap),
    }
}

/// Apply weight fields over the current weights. Fields that do not parse
/// keep the current weight; new prizes are appended.
pub fn parse_weights<'a>(
    current: &Weights,
    fields: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Weights {
    let mut next = current.clone();
    for (name, text) in fields {
        if let Some(weight) = parse_real(text) {
            next.insert(name, weight);
        }
    }
    next
}

/// Replace the weights with the submitted fields. A field that does not parse
/// keeps that prize's current weight; prizes not submitted are dropped and
/// read as zero.
pub fn replace_weights<'a>(
    current: &Weights,
    fields: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Weights {
    fields
        .into_iter()
        .filter_map(|(name, text)| {
            parse_real(text)
                .or_else(|| current.get(name).copied())
                .map(|weight| (name, weight))
        })
        .collect()
}

/// Parse `name=value` pairs as typed on a command line or in a form dump.
#[must_use]
pub fn split_assignments(pairs: &[String]) -> Vec<(&str, &str)> {
    pairs
        .iter()
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}
