//! Dialog state model.
//!
//! A dialog is a typed multi-step conversation. Its position (which dialog,
//! which step) is persisted as two strings, and the values collected so far
//! as a tagged JSON union, so the schema survives process restarts while
//! decoding stays strict: any unknown or mismatched combination surfaces as
//! [`AppError::UnknownDialog`] and is self-healed by the engine instead of
//! crashing the turn.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::core::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DialogType {
    ChooseContest,
    Registration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ChooseContestStep {
    Zero,
    Choice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RegistrationStep {
    Zero,
    Name,
    School,
    Contacts,
    Languages,
}

/// A (dialog type, dialog step) pair. Only pairs that actually exist are
/// representable; a persisted pair outside this set fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogPosition {
    ChooseContest(ChooseContestStep),
    Registration(RegistrationStep),
}

impl DialogPosition {
    pub fn dialog_type(&self) -> DialogType {
        match self {
            DialogPosition::ChooseContest(_) => DialogType::ChooseContest,
            DialogPosition::Registration(_) => DialogType::Registration,
        }
    }

    /// The persisted step name, e.g. `"school"`.
    pub fn step_name(&self) -> String {
        match self {
            DialogPosition::ChooseContest(step) => step.to_string(),
            DialogPosition::Registration(step) => step.to_string(),
        }
    }

    /// Decodes a persisted (type, step) string pair.
    pub fn decode(dialog_type: &str, dialog_step: &str) -> AppResult<Self> {
        let unknown = || AppError::UnknownDialog {
            dialog_type: dialog_type.to_string(),
            dialog_step: dialog_step.to_string(),
        };

        match DialogType::from_str(dialog_type).map_err(|_| unknown())? {
            DialogType::ChooseContest => ChooseContestStep::from_str(dialog_step)
                .map(DialogPosition::ChooseContest)
                .map_err(|_| unknown()),
            DialogType::Registration => RegistrationStep::from_str(dialog_step)
                .map(DialogPosition::Registration)
                .map_err(|_| unknown()),
        }
    }
}

/// Values accumulated by the registration dialog so far. The contest id is
/// carried over from contest selection; the remaining fields fill in one
/// step at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationValues {
    pub contest_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacts: Option<String>,
}

impl RegistrationValues {
    pub fn for_contest(contest_id: i64) -> Self {
        Self {
            contest_id,
            ..Self::default()
        }
    }
}

/// Per-dialog value union. Every step's required fields are statically
/// known; there is no free-form map to mistype a key into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dialog", rename_all = "snake_case")]
pub enum DialogValues {
    ChooseContest,
    Registration(RegistrationValues),
}

impl DialogValues {
    pub fn dialog_type(&self) -> DialogType {
        match self {
            DialogValues::ChooseContest => DialogType::ChooseContest,
            DialogValues::Registration(_) => DialogType::Registration,
        }
    }

    pub fn registration(&self) -> Option<&RegistrationValues> {
        match self {
            DialogValues::Registration(values) => Some(values),
            DialogValues::ChooseContest => None,
        }
    }

    pub fn registration_mut(&mut self) -> Option<&mut RegistrationValues> {
        match self {
            DialogValues::Registration(values) => Some(values),
            DialogValues::ChooseContest => None,
        }
    }
}

/// One participant's open conversation. Created when a dialog-initiating
/// command fires, mutated in place by step handlers, deleted on completion,
/// cancellation or self-healing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogState {
    pub participant_id: String,
    pub position: DialogPosition,
    pub values: DialogValues,
}

impl DialogState {
    /// Fresh state at the opening step of the given dialog.
    pub fn opening(participant_id: impl Into<String>, dialog: DialogType) -> Self {
        let (position, values) = match dialog {
            DialogType::ChooseContest => (
                DialogPosition::ChooseContest(ChooseContestStep::Zero),
                DialogValues::ChooseContest,
            ),
            DialogType::Registration => (
                DialogPosition::Registration(RegistrationStep::Zero),
                DialogValues::Registration(RegistrationValues::default()),
            ),
        };
        Self {
            participant_id: participant_id.into(),
            position,
            values,
        }
    }

    /// Decodes a persisted row. A value union whose tag disagrees with the
    /// persisted dialog type counts as corrupted state too.
    pub fn decode(
        participant_id: &str,
        dialog_type: &str,
        dialog_step: &str,
        values_json: &str,
    ) -> AppResult<Self> {
        let position = DialogPosition::decode(dialog_type, dialog_step)?;
        let values: DialogValues = serde_json::from_str(values_json).map_err(|_| AppError::UnknownDialog {
            dialog_type: dialog_type.to_string(),
            dialog_step: dialog_step.to_string(),
        })?;
        if values.dialog_type() != position.dialog_type() {
            return Err(AppError::UnknownDialog {
                dialog_type: dialog_type.to_string(),
                dialog_step: dialog_step.to_string(),
            });
        }
        Ok(Self {
            participant_id: participant_id.to_string(),
            position,
            values,
        })
    }

    /// Serializes the value union for persistence.
    pub fn encode_values(&self) -> AppResult<String> {
        Ok(serde_json::to_string(&self.values)?)
    }
}
