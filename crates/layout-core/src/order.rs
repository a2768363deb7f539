//! Deterministic ordering of record keys inside a month bucket.
//!
//! Keys sort by capture time, then by sidecar name. Names are compared in
//! natural order (`img2` before `img10`) with the exporter's duplicate index
//! markers taken out first, so `a.jpg.json` always precedes its twin
//! `a.jpg(1).json`. Dedup and linking both walk buckets in this order: the
//! first key at a timestamp, or at an output name, is the one that is kept.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

use crate::index::Bucket;
use crate::media::RecordKey;

// `(n)` right before `.json` or before the media extension: `a.jpg(1).json`, `a(1).jpg.json`
static DUPLICATE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)((?:\.[^.()]+)?\.json)$").unwrap());

/// Bucket keys in processing order. Never iterate a bucket directly.
pub fn ordered_keys(bucket: &Bucket) -> Vec<RecordKey> {
    let mut keys: Vec<RecordKey> = bucket.keys().cloned().collect();
    keys.sort_by(compare_keys);
    keys
}

pub fn compare_keys(a: &RecordKey, b: &RecordKey) -> Ordering {
    a.captured_at
        .cmp(&b.captured_at)
        .then_with(|| compare_sidecar_names(&a.sidecar_name, &b.sidecar_name))
}

pub fn compare_sidecar_names(a: &str, b: &str) -> Ordering {
    let a_base = DUPLICATE_MARKER_RE.replace(a, "${2}");
    let b_base = DUPLICATE_MARKER_RE.replace(b, "${2}");
    natural_cmp(&a_base, &b_base)
        .then_with(|| duplicate_marker(a).cmp(&duplicate_marker(b)))
        .then_with(|| natural_cmp(a, b))
        .then_with(|| a.cmp(b))
}

fn duplicate_marker(name: &str) -> Option<u64> {
    DUPLICATE_MARKER_RE
        .captures(name)
        .map(|c| c[1].parse().unwrap_or(u64::MAX))
}

/// Compare strings treating each run of ASCII digits as one number.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x_run = take_digits(&mut a);
                let y_run = take_digits(&mut b);
                let ord = compare_digit_runs(&x_run, &y_run);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

// Compare by value without parsing, so arbitrarily long runs work.
fn compare_digit_runs(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}
