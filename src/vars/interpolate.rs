// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Token interpolation
//!
//! Rewrites `$TOKEN` and `${TOKEN}` occurrences in command and condition
//! templates. Resolution order: builtin context field, then user-defined
//! variable, then pass-through. Unrecognized tokens are left verbatim so
//! shell-native `$VAR` usage in commands is not corrupted.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::vars::RuntimeContext;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("token regex is valid"));

/// Replace every recognized token in `input` with its context value.
///
/// Single pass: replacement values are never re-scanned, so a variable whose
/// value contains `$FILE` does not get substituted again.
pub fn interpolate(input: &str, ctx: &RuntimeContext) -> String {
    TOKEN_RE
        .replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();

            if let Some(value) = ctx.builtin(name) {
                return value.to_string();
            }
            if let Some(value) = ctx.user_vars.get(name) {
                return value.clone();
            }

            // Unknown token: keep the original text, braces and all.
            caps[0].to_string()
        })
        .to_string()
}
