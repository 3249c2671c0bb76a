use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DifficultyError {
    #[error("difficulty cannot be empty")]
    Empty,

    #[error("unknown difficulty: {0}")]
    Unknown(String),

    #[error("unknown interview level: {0}")]
    UnknownLevel(String),

    #[error("unsupported language: {0}")]
    UnknownLanguage(String),
}

//
// ─── INTERVIEW LEVEL ───────────────────────────────────────────────────────────
//

/// Seniority targeted by a whole interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewLevel {
    Junior,
    #[default]
    Mid,
    Senior,
}

impl InterviewLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewLevel::Junior => "junior",
            InterviewLevel::Mid => "mid",
            InterviewLevel::Senior => "senior",
        }
    }
}

impl FromStr for InterviewLevel {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "junior" => Ok(InterviewLevel::Junior),
            "mid" | "middle" | "intermediate" => Ok(InterviewLevel::Mid),
            "senior" => Ok(InterviewLevel::Senior),
            "" => Err(DifficultyError::Empty),
            other => Err(DifficultyError::UnknownLevel(other.to_string())),
        }
    }
}

impl fmt::Display for InterviewLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── QUESTION DIFFICULTY ───────────────────────────────────────────────────────
//

/// Difficulty of a single question. Distinct vocabulary from `InterviewLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Every accepted spelling, compared after trimming and lowercasing.
const DIFFICULTY_SYNONYMS: &[(&str, QuestionDifficulty)] = &[
    ("easy", QuestionDifficulty::Easy),
    ("junior", QuestionDifficulty::Easy),
    ("beginner", QuestionDifficulty::Easy),
    ("basic", QuestionDifficulty::Easy),
    ("fácil", QuestionDifficulty::Easy),
    ("facil", QuestionDifficulty::Easy),
    ("básico", QuestionDifficulty::Easy),
    ("basico", QuestionDifficulty::Easy),
    ("facile", QuestionDifficulty::Easy),
    ("einfach", QuestionDifficulty::Easy),
    ("medium", QuestionDifficulty::Medium),
    ("mid", QuestionDifficulty::Medium),
    ("middle", QuestionDifficulty::Medium),
    ("intermediate", QuestionDifficulty::Medium),
    ("media", QuestionDifficulty::Medium),
    ("medio", QuestionDifficulty::Medium),
    ("intermedio", QuestionDifficulty::Medium),
    ("moyen", QuestionDifficulty::Medium),
    ("mittel", QuestionDifficulty::Medium),
    ("médio", QuestionDifficulty::Medium),
    ("hard", QuestionDifficulty::Hard),
    ("senior", QuestionDifficulty::Hard),
    ("advanced", QuestionDifficulty::Hard),
    ("difficult", QuestionDifficulty::Hard),
    ("difícil", QuestionDifficulty::Hard),
    ("dificil", QuestionDifficulty::Hard),
    ("avanzado", QuestionDifficulty::Hard),
    ("difficile", QuestionDifficulty::Hard),
    ("schwer", QuestionDifficulty::Hard),
    ("avançado", QuestionDifficulty::Hard),
];

impl QuestionDifficulty {
    /// Maps any known spelling (including localized and interview-level terms)
    /// onto the canonical three values.
    ///
    /// # Errors
    ///
    /// Returns `DifficultyError::Empty` for blank input and
    /// `DifficultyError::Unknown` for spellings outside the synonym table.
    pub fn normalize(raw: &str) -> Result<Self, DifficultyError> {
        let key = raw.trim().to_lowercase();
        if key.is_empty() {
            return Err(DifficultyError::Empty);
        }
        DIFFICULTY_SYNONYMS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, difficulty)| *difficulty)
            .ok_or(DifficultyError::Unknown(key))
    }

    /// Normalizes an optional value; a missing difficulty is `Medium`.
    ///
    /// # Errors
    ///
    /// Same as [`QuestionDifficulty::normalize`] for present values.
    pub fn normalize_optional(raw: Option<&str>) -> Result<Self, DifficultyError> {
        match raw {
            None => Ok(Self::default()),
            Some(value) => Self::normalize(value),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionDifficulty::Easy => "easy",
            QuestionDifficulty::Medium => "medium",
            QuestionDifficulty::Hard => "hard",
        }
    }
}

impl From<InterviewLevel> for QuestionDifficulty {
    fn from(level: InterviewLevel) -> Self {
        match level {
            InterviewLevel::Junior => QuestionDifficulty::Easy,
            InterviewLevel::Mid => QuestionDifficulty::Medium,
            InterviewLevel::Senior => QuestionDifficulty::Hard,
        }
    }
}

impl FromStr for QuestionDifficulty {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl fmt::Display for QuestionDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── LANGUAGE ──────────────────────────────────────────────────────────────────
//

/// Interview and profile languages supported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    Pt,
    It,
    Ja,
    Zh,
}

impl Language {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Pt => "pt",
            Language::It => "it",
            Language::Ja => "ja",
            Language::Zh => "zh",
        }
    }

    /// English name, used when prompting the generation collaborator.
    #[must_use]
    pub fn english_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
            Language::Pt => "Portuguese",
            Language::It => "Italian",
            Language::Ja => "Japanese",
            Language::Zh => "Chinese",
        }
    }
}

impl FromStr for Language {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            "de" => Ok(Language::De),
            "pt" => Ok(Language::Pt),
            "it" => Ok(Language::It),
            "ja" => Ok(Language::Ja),
            "zh" => Ok(Language::Zh),
            other => Err(DifficultyError::UnknownLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
