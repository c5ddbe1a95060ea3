use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ATC drug class whose sales are tracked as a column in every sales file.
///
/// The set is fixed by the source data:
/// - M01AB / M01AE: anti-inflammatory and antirheumatic products
/// - N02BA / N02BE: analgesics (salicylic acid derivatives, pyrazolones and anilides)
/// - N05B / N05C: anxiolytics, hypnotics and sedatives
/// - R03 / R06: obstructive airway drugs, antihistamines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrugClass {
    M01AB,
    M01AE,
    N02BA,
    N02BE,
    N05B,
    N05C,
    R03,
    R06,
}

impl DrugClass {
    /// Every tracked class, in the column order of the source files.
    pub const ALL: [DrugClass; 8] = [
        DrugClass::M01AB,
        DrugClass::M01AE,
        DrugClass::N02BA,
        DrugClass::N02BE,
        DrugClass::N05B,
        DrugClass::N05C,
        DrugClass::R03,
        DrugClass::R06,
    ];

    /// Returns the ATC code used as the CSV column header.
    pub fn code(&self) -> &'static str {
        match self {
            DrugClass::M01AB => "M01AB",
            DrugClass::M01AE => "M01AE",
            DrugClass::N02BA => "N02BA",
            DrugClass::N02BE => "N02BE",
            DrugClass::N05B => "N05B",
            DrugClass::N05C => "N05C",
            DrugClass::R03 => "R03",
            DrugClass::R06 => "R06",
        }
    }
}

impl fmt::Display for DrugClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for DrugClass {
    type Err = DrugClassError;

    /// Parses a column header into a drug class.
    ///
    /// Surrounding whitespace is ignored; the code itself is case sensitive,
    /// matching the headers of the source files.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let code = value.trim();
        if code.is_empty() {
            return Err(DrugClassError::EmptyCode);
        }

        DrugClass::ALL
            .iter()
            .copied()
            .find(|class| class.code() == code)
            .ok_or_else(|| DrugClassError::UnknownCode(code.to_string()))
    }
}

/// Errors that can occur when parsing a drug class code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrugClassError {
    /// The code is empty
    EmptyCode,
    /// The code is not one of the tracked classes
    UnknownCode(String),
}

impl fmt::Display for DrugClassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrugClassError::EmptyCode => write!(f, "Drug class code cannot be empty"),
            DrugClassError::UnknownCode(code) => write!(f, "Unknown drug class code: {}", code),
        }
    }
}

impl std::error::Error for DrugClassError {}
