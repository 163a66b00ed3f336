//! Evaluation records as returned by the intra API

use crate::error::MalformedRecordError;
use serde::{Deserialize, Serialize};

/// A participant reference inside a record.
///
/// The API normally sends `{"login": "..."}` but replaces participants it
/// hides from the caller with a bare string such as `"invisible"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Participant {
    User {
        #[serde(default)]
        login: Option<String>,
    },
    Hidden(String),
}

impl Participant {
    pub fn new(login: impl Into<String>) -> Self {
        Participant::User {
            login: Some(login.into()),
        }
    }

    /// Login of the participant, if the API disclosed one
    pub fn login(&self) -> Option<&str> {
        match self {
            Participant::User { login } => login.as_deref(),
            Participant::Hidden(_) => None,
        }
    }
}

/// One peer evaluation ("scale team")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub corrector: Option<Participant>,

    #[serde(default)]
    pub correcteds: Option<Vec<Participant>>,
}

impl Record {
    /// Build a record from plain logins
    pub fn new(corrector: &str, correcteds: &[&str]) -> Self {
        Self {
            id: None,
            corrector: Some(Participant::new(corrector)),
            correcteds: Some(correcteds.iter().map(|login| Participant::new(*login)).collect()),
        }
    }

    /// Login of the evaluator
    pub fn corrector_login(&self, index: usize) -> Result<&str, MalformedRecordError> {
        let corrector = self
            .corrector
            .as_ref()
            .ok_or_else(|| self.malformed(index, "corrector"))?;

        corrector
            .login()
            .ok_or_else(|| self.malformed(index, "corrector.login"))
    }

    /// Logins of the evaluated participants, in record order
    pub fn corrected_logins(&self, index: usize) -> Result<Vec<&str>, MalformedRecordError> {
        let correcteds = self
            .correcteds
            .as_ref()
            .ok_or_else(|| self.malformed(index, "correcteds"))?;

        correcteds
            .iter()
            .enumerate()
            .map(|(i, participant)| {
                participant
                    .login()
                    .ok_or_else(|| self.malformed(index, &format!("correcteds[{i}].login")))
            })
            .collect()
    }

    fn malformed(&self, index: usize, field: &str) -> MalformedRecordError {
        MalformedRecordError {
            index,
            id: self.id,
            field: field.to_string(),
        }
    }
}
