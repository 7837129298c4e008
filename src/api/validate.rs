use std::collections::HashMap;

use crate::api::models::{CampInput, SpeakerInput, TalkInput};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Required fields must be present
    Create,
    /// Only fields present in the body are checked
    Update,
}

pub trait Validate {
    fn validate(&self, mode: ValidationMode) -> Result<(), ApiError>;
}

/// Collects per-field failures; the first message for a field wins
#[derive(Debug)]
pub struct Rules {
    mode: ValidationMode,
    errors: HashMap<String, String>,
}

impl Rules {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            errors: HashMap::new(),
        }
    }

    fn fail(&mut self, field: &str, message: String) {
        self.errors.entry(field.to_string()).or_insert(message);
    }

    pub fn required<T>(&mut self, field: &str, value: &Option<T>) -> &mut Self {
        if self.mode == ValidationMode::Create && value.is_none() {
            self.fail(field, format!("The {} field is required.", field));
        }
        self
    }

    pub fn length(&mut self, field: &str, value: &Option<String>, min: usize, max: usize) -> &mut Self {
        if let Some(value) = value {
            let len = value.chars().count();
            if len < min || len > max {
                self.fail(
                    field,
                    format!("The field {} must be a string with a length between {} and {}.", field, min, max),
                );
            }
        }
        self
    }

    pub fn range(&mut self, field: &str, value: Option<i32>, min: i32, max: i32) -> &mut Self {
        if let Some(value) = value {
            if value < min || value > max {
                self.fail(field, format!("The field {} must be between {} and {}.", field, min, max));
            }
        }
        self
    }

    pub fn check(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.fail(field, message.to_string());
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error(
                "The request body is invalid",
                Some(std::mem::take(&mut self.errors)),
            ))
        }
    }
}

pub const MONIKER_MAX: usize = 20;

pub fn is_valid_moniker(moniker: &str) -> bool {
    !moniker.is_empty()
        && moniker.chars().count() <= MONIKER_MAX
        && moniker.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl Validate for CampInput {
    fn validate(&self, mode: ValidationMode) -> Result<(), ApiError> {
        let moniker_ok = self.moniker.as_deref().map_or(true, is_valid_moniker);
        Rules::new(mode)
            .required("moniker", &self.moniker)
            .check(
                "moniker",
                moniker_ok,
                "The moniker must be 1 to 20 letters, digits, '-' or '_'.",
            )
            .required("name", &self.name)
            .length("name", &self.name, 5, 100)
            .required("description", &self.description)
            .length("description", &self.description, 25, 4096)
            .range("length", self.length, 1, i32::MAX)
            .finish()
    }
}

impl Validate for SpeakerInput {
    fn validate(&self, mode: ValidationMode) -> Result<(), ApiError> {
        Rules::new(mode)
            .required("name", &self.name)
            .length("name", &self.name, 5, 255)
            .length("bio", &self.bio, 0, 4096)
            .finish()
    }
}

impl Validate for TalkInput {
    fn validate(&self, mode: ValidationMode) -> Result<(), ApiError> {
        Rules::new(mode)
            .required("title", &self.title)
            .length("title", &self.title, 5, 100)
            .required("abstract", &self.abstract_text)
            .length("abstract", &self.abstract_text, 15, 4096)
            .required("level", &self.level)
            .range("level", self.level, 100, 400)
            .finish()
    }
}
