//! Postal code, e-mail and phone rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tax_id::only_digits;

/// An 8-digit CEP, the key for address lookups. Stored values are parsed
/// on read, so a short code never gets this far.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    pub const DIGITS: usize = 8;

    /// Strip separators and require exactly eight digits.
    pub fn parse(value: &str) -> Option<Self> {
        let digits = only_digits(value);
        (digits.len() == Self::DIGITS).then_some(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `#####-###`
    pub fn formatted(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl TryFrom<String> for PostalCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("'{}' is not an 8-digit postal code", value))
    }
}

impl From<PostalCode> for String {
    fn from(postal_code: PostalCode) -> Self {
        postal_code.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Basic e-mail shape: a single `@`, a non-empty local part and a dotted
/// domain without empty labels.
pub fn validate_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// Brazilian phone numbers: area code plus 8 (landline) or 9 (mobile) digits.
pub fn validate_phone(value: &str) -> bool {
    matches!(only_digits(value).len(), 10 | 11)
}
