use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use thiserror::Error;

use crate::legend::{PaletteColor, legend_lines};

pub const MAX_CLASS_NAME_LEN: usize = 100;
pub const MAX_LEGEND_ENTRIES: usize = 1000;

static DISALLOWED_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassColorEntry {
    pub class_name: String,
    pub color: Option<PaletteColor>,
}

/// A legend that passed validation, with names and colors normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassColorConfig {
    pub entries: Vec<ClassColorEntry>,
}

impl ClassColorConfig {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn custom_color_count(&self) -> usize {
        self.entries.iter().filter(|e| e.color.is_some()).count()
    }

    pub fn default_color_count(&self) -> usize {
        self.len() - self.custom_color_count()
    }

    pub fn summary(&self) -> String {
        format!("Valid configuration with {} classes", self.len())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LegendError {
    #[error("No valid class entries found in file")]
    NoEntries,
    #[error("Validation errors: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl LegendError {
    /// One message per violated rule.
    pub fn messages(&self) -> Vec<String> {
        match self {
            LegendError::NoEntries => vec![self.to_string()],
            LegendError::Invalid(messages) => messages.clone(),
        }
    }
}

fn normalize_class_name(line: usize, raw: &str, errors: &mut Vec<String>) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.push(format!("line {}: class name cannot be empty", line));
        return None;
    }
    if trimmed.chars().count() > MAX_CLASS_NAME_LEN {
        errors.push(format!(
            "line {}: class name must be at most {} characters",
            line, MAX_CLASS_NAME_LEN
        ));
        return None;
    }
    let cleaned = DISALLOWED_NAME_CHARS.replace_all(trimmed, "").into_owned();
    if cleaned.is_empty() {
        errors.push(format!(
            "line {}: class name '{}' must contain valid characters",
            line, trimmed
        ));
        return None;
    }
    Some(cleaned)
}

fn normalize_color(line: usize, raw: &str, errors: &mut Vec<String>) -> Option<PaletteColor> {
    match raw.parse::<PaletteColor>() {
        Ok(color) => Some(color),
        Err(_) => {
            errors.push(format!(
                "line {}: Invalid color: {}. Valid colors are: {}",
                line,
                raw,
                PaletteColor::names()
            ));
            None
        }
    }
}

/// Parse and check legend text.
///
/// Every rule is checked before returning so the caller can show all problems
/// at once.
pub fn validate_legend(content: &str) -> Result<ClassColorConfig, LegendError> {
    let lines = legend_lines(content);
    if lines.is_empty() {
        return Err(LegendError::NoEntries);
    }

    let mut errors = Vec::new();
    let mut entries = Vec::with_capacity(lines.len());
    for line in &lines {
        let class_name = normalize_class_name(line.line, &line.class_name, &mut errors);
        let color = match &line.color {
            Some(raw) => normalize_color(line.line, raw, &mut errors),
            None => None,
        };
        if let Some(class_name) = class_name {
            entries.push(ClassColorEntry { class_name, color });
        }
    }

    if lines.len() > MAX_LEGEND_ENTRIES {
        errors.push(format!(
            "legend has {} entries, at most {} are allowed",
            lines.len(),
            MAX_LEGEND_ENTRIES
        ));
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut duplicates = Vec::new();
    for entry in &entries {
        let count = seen.entry(entry.class_name.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(entry.class_name.as_str());
        }
    }
    if !duplicates.is_empty() {
        errors.push(format!(
            "Duplicate class names found: {}",
            duplicates.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(ClassColorConfig { entries })
    } else {
        Err(LegendError::Invalid(errors))
    }
}
