//! Customer Details

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

const PHONE_MIN_CHARS: usize = 6;
const PHONE_MAX_CHARS: usize = 20;

/// Contact and delivery details collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    /// Given name.
    pub first_name: String,

    /// Family name.
    pub last_name: String,

    /// Phone number.
    pub phone: String,

    /// Delivery address.
    pub address: String,
}

impl CustomerDetails {
    /// Check every field, returning a trimmed copy when all are valid.
    ///
    /// All four fields are required after trimming. The phone number may only
    /// contain digits, spaces, `+`, `(`, `)` and `-`, and must be 6 to 20
    /// characters long.
    ///
    /// # Errors
    ///
    /// Returns every failing field, in form order.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        let trimmed = Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
        };

        let mut problems = Vec::new();

        for (field, value) in [
            (CustomerField::FirstName, &trimmed.first_name),
            (CustomerField::LastName, &trimmed.last_name),
            (CustomerField::Phone, &trimmed.phone),
            (CustomerField::Address, &trimmed.address),
        ] {
            if value.is_empty() {
                problems.push((field, FieldProblem::Required));
            } else if field == CustomerField::Phone && !is_plausible_phone(value) {
                problems.push((field, FieldProblem::Invalid));
            }
        }

        if problems.is_empty() {
            Ok(trimmed)
        } else {
            Err(ValidationError { problems })
        }
    }
}

fn is_plausible_phone(phone: &str) -> bool {
    let length = phone.chars().count();

    (PHONE_MIN_CHARS..=PHONE_MAX_CHARS).contains(&length)
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '(' | ')' | '-'))
}

/// A field of [`CustomerDetails`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerField {
    /// [`CustomerDetails::first_name`]
    FirstName,

    /// [`CustomerDetails::last_name`]
    LastName,

    /// [`CustomerDetails::phone`]
    Phone,

    /// [`CustomerDetails::address`]
    Address,
}

impl CustomerField {
    /// Human-readable field label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Phone => "Phone number",
            Self::Address => "Address",
        }
    }
}

/// What is wrong with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    /// Blank after trimming.
    Required,

    /// Present but malformed.
    Invalid,
}

/// Customer details failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    problems: Vec<(CustomerField, FieldProblem)>,
}

impl ValidationError {
    /// Every failing field with its problem, in form order.
    pub fn problems(&self) -> &[(CustomerField, FieldProblem)] {
        &self.problems
    }

    /// Problem with `field`, if any.
    pub fn problem(&self, field: CustomerField) -> Option<FieldProblem> {
        self.problems
            .iter()
            .find(|(failing, _)| *failing == field)
            .map(|(_, problem)| *problem)
    }

    /// Inline message for `field`, e.g. `"Phone number is required"`.
    pub fn message(&self, field: CustomerField) -> Option<String> {
        self.problem(field).map(|problem| match problem {
            FieldProblem::Required => format!("{} is required", field.label()),
            FieldProblem::Invalid => format!("{} is invalid", field.label()),
        })
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("invalid customer details: ")?;

        let messages: Vec<String> = self
            .problems
            .iter()
            .filter_map(|(field, _)| self.message(*field))
            .collect();

        f.write_str(&messages.join(", "))
    }
}

impl std::error::Error for ValidationError {}
