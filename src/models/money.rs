// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decimal coercion for loosely-typed JSON amounts.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Coerce a JSON amount (number or numeric string) to a `Decimal`.
///
/// Numbers go through their textual form so `3.50` stays `3.50` rather
/// than picking up binary floating point noise.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal_str(s.trim()),
        Value::Number(n) => parse_decimal_str(&n.to_string()),
        _ => None,
    }
}

fn parse_decimal_str(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
