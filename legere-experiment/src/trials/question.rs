use legere_core::{Signal, TrialError, TrialKind};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::SessionContext;
use crate::event_loop::wait_for_signal;
use crate::station::{Screen, Station};
use crate::trial::{Trial, TrialCore};

/// The two keys a yes/no question listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseKeys {
    pub yes: char,
    pub no: char,
}

impl Default for ResponseKeys {
    fn default() -> Self {
        Self { yes: 'j', no: 'f' }
    }
}

impl ResponseKeys {
    fn accepts(&self, key: char) -> bool {
        self.answer(key).is_some()
    }

    /// Canonical answer for a yes/no key. Letter case is ignored on both
    /// sides.
    pub fn answer(&self, key: char) -> Option<&'static str> {
        let key = key.to_ascii_lowercase();
        if key == self.yes.to_ascii_lowercase() {
            Some("yes")
        } else if key == self.no.to_ascii_lowercase() {
            Some("no")
        } else {
            None
        }
    }
}

fn await_key(ctx: &SessionContext, station: &mut Station, keys: ResponseKeys) -> Result<char, TrialError> {
    wait_for_signal(ctx, station, |s| match s {
        Signal::Key(c) if keys.accepts(*c) => Some(*c),
        _ => None,
    })
}

fn violation(kind: TrialKind, key: char) -> TrialError {
    TrialError::ProtocolViolation {
        trial_type: kind.name(),
        detail: format!("key {key:?} is not a response key"),
    }
}

/// Question answered with one of two keys.
#[derive(Debug, Clone)]
pub struct YesNoQuestionTrial {
    core: TrialCore,
    question: String,
    keys: ResponseKeys,
}

impl YesNoQuestionTrial {
    pub fn new(item_id: u32, condition: impl Into<String>, question: impl Into<String>, keys: ResponseKeys) -> Self {
        let question = question.into();
        let mut core = TrialCore::new(TrialKind::YesNoQuestionTrial);
        let fields = core.fields();
        fields.item_id = Some(item_id);
        fields.condition = Some(condition.into());
        fields.stimulus = Some(question.clone());
        Self {
            core,
            question,
            keys,
        }
    }
}

impl Trial for YesNoQuestionTrial {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn prelude(&mut self, _ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        station.surface.show(&Screen::Question {
            text: self.question.clone(),
            hint: format!(
                "[{}] key for “no” — [{}] key for “yes”",
                self.keys.no, self.keys.yes
            ),
        })?;
        station.surface.refresh()
    }

    fn wait(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        let key = await_key(ctx, station, self.keys)?;
        let answer = self
            .keys
            .answer(key)
            .ok_or_else(|| violation(self.kind(), key))?;
        self.core.fields().response = Some(answer.to_string());
        Ok(())
    }
}

/// Statement plus question, answered by picking the left or right option.
/// Which side shows "yes" is shuffled for every presentation.
#[derive(Debug, Clone)]
pub struct ComprehensionTrial {
    core: TrialCore,
    statement: String,
    question: String,
    keys: ResponseKeys,
    options: [&'static str; 2],
}

impl ComprehensionTrial {
    pub fn new<R: Rng + ?Sized>(
        item_id: u32,
        condition: impl Into<String>,
        statement: impl Into<String>,
        question: impl Into<String>,
        keys: ResponseKeys,
        rng: &mut R,
    ) -> Self {
        let statement = statement.into();
        let question = question.into();
        let mut options = ["yes", "no"];
        options.shuffle(rng);

        let mut core = TrialCore::new(TrialKind::ComprehensionTrial);
        let fields = core.fields();
        fields.item_id = Some(item_id);
        fields.condition = Some(condition.into());
        fields.stimulus = Some(format!("{statement} : {question}"));
        fields.metadata1 = Some(options.join("|"));
        Self {
            core,
            statement,
            question,
            keys,
            options,
        }
    }

    /// Options in on-screen order, left first.
    pub fn options(&self) -> [&'static str; 2] {
        self.options
    }
}

impl Trial for ComprehensionTrial {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn prelude(&mut self, _ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        station.surface.show(&Screen::Choice {
            statement: self.statement.clone(),
            question: self.question.clone(),
            options: self.options.map(str::to_string),
            hint: format!("[{}] left — [{}] right", self.keys.no, self.keys.yes),
        })?;
        station.surface.refresh()
    }

    fn wait(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        let key = await_key(ctx, station, self.keys)?;
        let side = match self.keys.answer(key) {
            Some("no") => 0,
            Some("yes") => 1,
            _ => return Err(violation(self.kind(), key)),
        };
        self.core.fields().response = Some(self.options[side].to_string());
        Ok(())
    }
}
