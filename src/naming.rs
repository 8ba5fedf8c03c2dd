//! Index-name template rendering
//!
//! Rule templates carry strftime-style tokens that are substituted from a
//! UTC timestamp when a rollover is attempted:
//!
//! | Token | Meaning                        |
//! |-------|--------------------------------|
//! | `%Y`  | full year                      |
//! | `%m`  | month, 2-digit zero-padded     |
//! | `%d`  | day, 2-digit zero-padded       |
//! | `%H`  | hour, 2-digit zero-padded      |
//! | `%M`  | minute, 2-digit zero-padded    |
//! | `%s`  | second, 2-digit zero-padded    |
//!
//! Anything else, including unrecognized `%x` sequences, passes through
//! untouched. Pure function of template + time.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fmt::Write;

/// Render a concrete index name from `template` at time `at`.
pub fn render(template: &str, at: DateTime<Utc>) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('Y') => {
                chars.next();
                let _ = write!(out, "{}", at.year());
            }
            Some('m') => {
                chars.next();
                let _ = write!(out, "{:02}", at.month());
            }
            Some('d') => {
                chars.next();
                let _ = write!(out, "{:02}", at.day());
            }
            Some('H') => {
                chars.next();
                let _ = write!(out, "{:02}", at.hour());
            }
            Some('M') => {
                chars.next();
                let _ = write!(out, "{:02}", at.minute());
            }
            Some('s') => {
                chars.next();
                let _ = write!(out, "{:02}", at.second());
            }
            _ => out.push('%'),
        }
    }

    out
}
