// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Condition evaluation
//!
//! Steps may carry an `if` expression that gates their execution. A
//! condition is interpolated first, then evaluated to a boolean. Conditions
//! never fail the pipeline: anything malformed simply evaluates to false.

use regex::Regex;

use crate::vars::{interpolate, RuntimeContext};

/// Binary operators in scan priority order.
///
/// The first operator *by this order* that occurs anywhere in the string
/// wins, not the leftmost one. `a^=b==c` therefore splits on `==` (into
/// `a^=b` / `c`), which surprises people whose operand values contain
/// operator-like substrings. Existing build files rely on this, so it stays.
const OPERATORS: [&str; 6] = ["==", "!=", "^=", "$=", "*=", "~="];

/// Evaluate a condition template against a runtime context.
///
/// An empty condition is true. Without any operator, the interpolated and
/// trimmed string must case-insensitively equal "true".
pub fn evaluate(condition: &str, ctx: &RuntimeContext) -> bool {
    if condition.is_empty() {
        return true;
    }

    let interpolated = interpolate(condition, ctx);
    let interpolated = interpolated.trim();

    for op in OPERATORS {
        if let Some((left, right)) = interpolated.split_once(op) {
            let left = left.trim();
            let right = right.trim();

            return match op {
                "==" => left == right,
                "!=" => left != right,
                "^=" => left.starts_with(right),
                "$=" => left.ends_with(right),
                "*=" => left.contains(right),
                "~=" => match Regex::new(right) {
                    Ok(re) => re.is_match(left),
                    Err(_) => false,
                },
                _ => unreachable!(),
            };
        }
    }

    interpolated.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ctx() -> RuntimeContext {
        let mut user_vars = HashMap::new();
        user_vars.insert("ENV".to_string(), "production".to_string());

        RuntimeContext {
            extension: ".rs".into(),
            basename: "main".into(),
            user_vars,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_condition_is_true() {
        assert!(evaluate("", &ctx()));
    }

    #[test]
    fn test_equality() {
        assert!(evaluate("$ENV == production", &ctx()));
        assert!(!evaluate("$ENV == staging", &ctx()));
    }

    #[test]
    fn test_inequality() {
        assert!(evaluate("$ENV != staging", &ctx()));
        assert!(!evaluate("$ENV != production", &ctx()));
    }

    #[test]
    fn test_prefix_suffix_substring() {
        assert!(evaluate("$ENV ^= prod", &ctx()));
        assert!(!evaluate("$ENV ^= uction", &ctx()));
        assert!(evaluate("$ENV $= uction", &ctx()));
        assert!(evaluate("$ENV *= oduct", &ctx()));
        assert!(!evaluate("$ENV *= xyz", &ctx()));
    }

    #[test]
    fn test_regex_match() {
        assert!(evaluate("$EXT ~= \\.(rs|toml)$", &ctx()));
        assert!(!evaluate("$BASENAME ~= ^test_", &ctx()));
    }

    #[test]
    fn test_regex_compile_failure_is_false() {
        assert!(!evaluate("$ENV ~= [unclosed", &ctx()));
    }

    #[test]
    fn test_bare_true_fallback() {
        assert!(evaluate("true", &ctx()));
        assert!(evaluate("  TRUE  ", &ctx()));
        assert!(!evaluate("false", &ctx()));
        assert!(!evaluate("yes", &ctx()));
        assert!(!evaluate("production", &ctx()));
    }

    #[test]
    fn test_operator_priority_not_leftmost() {
        // "==" is scanned before "^=", so this splits into "a^=b" / "c".
        assert!(!evaluate("a^=b==c", &ctx()));
        assert!(evaluate("a^=b==a^=b", &ctx()));
    }

    #[test]
    fn test_malformed_condition_is_false_not_error() {
        assert!(!evaluate("== dangling", &ctx()));
        assert!(!evaluate("!@#$%", &ctx()));
    }
}
