// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Typed access to environment variables.
//!
//! Reads never fail: a missing, empty, or unparsable value yields the caller's fallback. Writes
//! are validated and return an [`EnvError`] when the key or value is rejected, leaving the
//! environment untouched.
//!
//! The accessors are provided methods of [`Environment`], so code can take a `&dyn Environment`
//! and tests can hand it an isolated [`MapEnvironment`]. The free functions of this crate run the
//! same operations against the process environment.

mod env_file;
mod map;
mod system;

pub use env_file::EnvFileProcessing;
pub use map::MapEnvironment;
pub use system::SystemEnvironment;

use tracing::debug;

/// Number of fractional digits written by [`Environment::set_f32`].
pub const DEFAULT_FLOAT_PRECISION: usize = 2;

pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key` as is.
    ///
    /// This bypasses the key and value checks, so an empty key or a value containing `"` is
    /// stored without complaint. Use [`Environment::set_string`] (or one of the typed setters)
    /// unless the pair has already been validated.
    fn set(&self, key: &str, value: &str);

    fn get_string(&self, key: &str, fallback: &str) -> String {
        self.get(key).unwrap_or_else(|| fallback.to_string())
    }

    fn get_int(&self, key: &str, fallback: i64) -> i64 {
        parse_non_empty(self, key, fallback, |raw| raw.parse().ok())
    }

    /// Case-insensitive "true" or "false". Anything else yields `fallback`.
    fn get_bool(&self, key: &str, fallback: bool) -> bool {
        parse_non_empty(self, key, fallback, |raw| match raw.to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    }

    fn get_f32(&self, key: &str, fallback: f32) -> f32 {
        parse_non_empty(self, key, fallback, parse_f32)
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), EnvError> {
        validate(key, value)?;
        self.set(key, value);
        debug!(key, "Set environment variable");
        Ok(())
    }

    fn set_int(&self, key: &str, value: i64) -> Result<(), EnvError> {
        self.set_string(key, &value.to_string())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), EnvError> {
        self.set_string(key, if value { "true" } else { "false" })
    }

    fn set_f32(&self, key: &str, value: f32) -> Result<(), EnvError> {
        self.set_f32_with_precision(key, value, DEFAULT_FLOAT_PRECISION)
    }

    /// Write `value` in fixed-point notation with `precision` digits after the decimal point.
    fn set_f32_with_precision(
        &self,
        key: &str,
        value: f32,
        precision: usize,
    ) -> Result<(), EnvError> {
        self.set_string(key, &format_fixed(value, precision))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EnvError {
    #[error(
        "Invalid environment variable key '{key}'. Keys must be non-empty and must not contain '\"', '=' or NUL"
    )]
    InvalidKey { key: String },

    #[error("Invalid value for environment variable {key}. Values must not contain '\"' or NUL")]
    InvalidValue { key: String, value: String },
}

// The quote checks run before the empty-key check, so `("", "\"")` reports the value.
fn validate(key: &str, value: &str) -> Result<(), EnvError> {
    let invalid_key = || EnvError::InvalidKey {
        key: key.to_string(),
    };
    let invalid_value = || EnvError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };

    if key.contains('"') {
        return Err(invalid_key());
    }
    if value.contains('"') {
        return Err(invalid_value());
    }
    if key.is_empty() || key.contains(['=', '\0']) {
        return Err(invalid_key());
    }
    if value.contains('\0') {
        return Err(invalid_value());
    }

    Ok(())
}

/// The exact decimal expansion of any `f32` has at most this many fractional digits.
const MAX_EXACT_F32_FRACTION_DIGITS: usize = 149;

// `format!` rejects precisions beyond `u16::MAX`, so digits past the exact expansion (all zeros)
// are appended by hand
fn format_fixed(value: f32, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let exact_digits = precision.min(MAX_EXACT_F32_FRACTION_DIGITS);
    let mut formatted = format!("{value:.exact_digits$}");
    formatted.extend(std::iter::repeat_n('0', precision - exact_digits));
    formatted
}

/// An absent key and an empty value are treated alike.
fn parse_non_empty<E, T>(
    env: &E,
    key: &str,
    fallback: T,
    parse: impl FnOnce(&str) -> Option<T>,
) -> T
where
    E: Environment + ?Sized,
{
    let raw = env.get_string(key, "");
    if raw.is_empty() {
        return fallback;
    }

    parse(&raw).unwrap_or_else(|| {
        debug!(key, "Could not parse environment variable, using the fallback");
        fallback
    })
}

fn parse_f32(raw: &str) -> Option<f32> {
    let value: f32 = raw.parse().ok()?;

    // A finite literal beyond f32::MAX is out of range rather than infinite
    if value.is_infinite() && !is_infinity_literal(raw) {
        return None;
    }

    Some(value)
}

fn is_infinity_literal(raw: &str) -> bool {
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

pub fn get_string(key: &str, fallback: &str) -> String {
    SystemEnvironment.get_string(key, fallback)
}

pub fn get_int(key: &str, fallback: i64) -> i64 {
    SystemEnvironment.get_int(key, fallback)
}

pub fn get_bool(key: &str, fallback: bool) -> bool {
    SystemEnvironment.get_bool(key, fallback)
}

pub fn get_f32(key: &str, fallback: f32) -> f32 {
    SystemEnvironment.get_f32(key, fallback)
}

pub fn set_string(key: &str, value: &str) -> Result<(), EnvError> {
    SystemEnvironment.set_string(key, value)
}

pub fn set_int(key: &str, value: i64) -> Result<(), EnvError> {
    SystemEnvironment.set_int(key, value)
}

pub fn set_bool(key: &str, value: bool) -> Result<(), EnvError> {
    SystemEnvironment.set_bool(key, value)
}

pub fn set_f32(key: &str, value: f32) -> Result<(), EnvError> {
    SystemEnvironment.set_f32(key, value)
}

pub fn set_f32_with_precision(key: &str, value: f32, precision: usize) -> Result<(), EnvError> {
    SystemEnvironment.set_f32_with_precision(key, value, precision)
}
