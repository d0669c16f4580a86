// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate number format checks

use regex::Regex;
use serde::Serialize;

/// Outcome of checking a plate number against the configured format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Uppercase alphanumeric form the pattern was matched against
    pub normalized: String,
}

/// Checks recognised text against a plate format regex
#[derive(Debug, Clone)]
pub struct PlateValidator {
    pattern: Regex,
}

impl PlateValidator {
    /// Compile a validator; the pattern is anchored to the whole plate
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let anchored = format!("^(?:{})$", pattern);
        Ok(Self {
            pattern: Regex::new(&anchored)?,
        })
    }

    pub fn validate(&self, plate_number: &str) -> ValidationResult {
        let normalized = normalize(plate_number);
        ValidationResult {
            valid: !normalized.is_empty() && self.pattern.is_match(&normalized),
            normalized,
        }
    }
}

/// Uppercase and drop everything that is not a letter or digit
pub fn normalize(plate_number: &str) -> String {
    plate_number
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}
