//! Step-table dispatch.
//!
//! A fixed mapping, built once at startup, from a dialog position to the
//! handler for that step. A lookup miss is a first-class error
//! ([`AppError::UnknownDialog`]), never a panic: the engine self-heals by
//! deleting the offending state.

use futures_util::future::BoxFuture;
use std::collections::HashMap;

use super::engine::{DialogEngine, StepOutcome};
use super::state::{ChooseContestStep, DialogPosition, DialogState, RegistrationStep};
use super::InboundMessage;
use crate::core::error::{AppError, AppResult};
use crate::dialog::{choose_contest, registration};

/// One step of one dialog. Handlers send their own replies through the
/// engine's transport and report the turn's outcome.
pub type StepHandler =
    for<'a> fn(&'a DialogEngine, &'a InboundMessage, &'a mut DialogState) -> BoxFuture<'a, StepOutcome>;

pub struct DialogRegistry {
    steps: HashMap<DialogPosition, StepHandler>,
}

impl DialogRegistry {
    /// An empty table; useful only as a building block and in tests.
    pub fn new() -> Self {
        Self { steps: HashMap::new() }
    }

    /// The production table: both dialogs, every step.
    pub fn standard() -> Self {
        let mut registry = Self::new();

        registry.register(
            DialogPosition::ChooseContest(ChooseContestStep::Zero),
            choose_contest::zero,
        );
        registry.register(
            DialogPosition::ChooseContest(ChooseContestStep::Choice),
            choose_contest::choice,
        );

        registry.register(DialogPosition::Registration(RegistrationStep::Zero), registration::zero);
        registry.register(DialogPosition::Registration(RegistrationStep::Name), registration::name);
        registry.register(
            DialogPosition::Registration(RegistrationStep::School),
            registration::school,
        );
        registry.register(
            DialogPosition::Registration(RegistrationStep::Contacts),
            registration::contacts,
        );
        registry.register(
            DialogPosition::Registration(RegistrationStep::Languages),
            registration::languages,
        );

        registry
    }

    pub fn register(&mut self, position: DialogPosition, handler: StepHandler) {
        self.steps.insert(position, handler);
    }

    /// Looks up the handler bound to the given position.
    pub fn resolve(&self, position: DialogPosition) -> AppResult<StepHandler> {
        self.steps.get(&position).copied().ok_or_else(|| AppError::UnknownDialog {
            dialog_type: position.dialog_type().to_string(),
            dialog_step: position.step_name(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for DialogRegistry {
    fn default() -> Self {
        Self::new()
    }
}
