//! Answer labels and per-sheet answer sequences.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::GradeError;

/// Number of questions on every sheet.
pub const QUESTION_COUNT: usize = 26;

/// Largest supported number of choices per question (A through Z).
pub const MAX_CHOICES: u8 = 26;

/// A choice letter, assigned by column index (A = column 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChoiceLabel(u8);

impl ChoiceLabel {
    /// Returns the label for a zero-based column index, if it is within A..=Z.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .filter(|&i| i < MAX_CHOICES)
            .map(Self)
    }

    /// Parses a single letter, case-insensitive.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Some(Self(upper as u8 - b'A'))
        } else {
            None
        }
    }

    /// Zero-based column index.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Upper-case letter for this label.
    #[must_use]
    pub fn letter(self) -> char {
        char::from(b'A' + self.0)
    }
}

impl fmt::Display for ChoiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl Serialize for ChoiceLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChoiceLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_letter(c)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid choice label '{s}'"))),
            _ => Err(serde::de::Error::custom(format!(
                "invalid choice label '{s}'"
            ))),
        }
    }
}

/// Detected answers for one sheet, one slot per question.
///
/// Always exactly [`QUESTION_COUNT`] long; `None` means "no answer".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerSequence(Vec<Option<ChoiceLabel>>);

impl AnswerSequence {
    /// Wraps a detected answer vector.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::GridSize`] if the vector is not exactly
    /// [`QUESTION_COUNT`] long.
    pub fn new(answers: Vec<Option<ChoiceLabel>>) -> Result<Self, GradeError> {
        if answers.len() == QUESTION_COUNT {
            Ok(Self(answers))
        } else {
            Err(GradeError::GridSize {
                expected: QUESTION_COUNT,
                actual: answers.len(),
            })
        }
    }

    /// Returns the answer slots in question order.
    #[must_use]
    pub fn as_slice(&self) -> &[Option<ChoiceLabel>] {
        &self.0
    }

    /// Iterates over the answer slots in question order.
    pub fn iter(&self) -> impl Iterator<Item = Option<ChoiceLabel>> + '_ {
        self.0.iter().copied()
    }

    /// Number of answer slots (always [`QUESTION_COUNT`]).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a sequence holds [`QUESTION_COUNT`] slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of questions with a detected answer.
    #[must_use]
    pub fn answered(&self) -> usize {
        self.0.iter().filter(|a| a.is_some()).count()
    }
}

impl<'de> Deserialize<'de> for AnswerSequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let answers = Vec::<Option<ChoiceLabel>>::deserialize(deserializer)?;
        Self::new(answers).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for AnswerSequence {
    /// Compact form, one character per question, `-` for no answer.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for answer in &self.0 {
            match answer {
                Some(label) => write!(f, "{label}")?,
                None => f.write_str("-")?,
            }
        }
        Ok(())
    }
}
