//! Assembles the standard reading session from an allocated list.

use legere_core::StimulusItem;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ExperimentConfig;
use crate::trial::Trial;
use crate::trials::{
    ComprehensionTrial, GazeCalibration, GazeContingentReadingTrial, Instructions, Message,
    ReadingTrial, ResponseKeys, SubjectIdPage, YesNoQuestionTrial,
};

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub welcome: String,
    pub consent: Option<String>,
    pub thanks: String,
    /// Gaze-contingent reading with a calibration page up front.
    pub gaze: bool,
    /// Ask comprehension trials (statement + question) instead of bare
    /// yes/no questions.
    pub comprehension: bool,
    pub question_probability: f64,
    pub keys: ResponseKeys,
    pub preview_chars: usize,
}

impl PlanOptions {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            welcome: "Welcome to this study!".into(),
            consent: None,
            thanks: "Thank you for your participation!".into(),
            gaze: false,
            comprehension: false,
            question_probability: config.question_probability,
            keys: ResponseKeys {
                yes: config.yes_key,
                no: config.no_key,
            },
            preview_chars: config.instruction_preview_chars,
        }
    }
}

/// Session layout: start note, welcome, optional consent, participant ID,
/// optional calibration, practice block, shuffled list plus fillers, thanks,
/// end note. Practice sentences are always followed by a question; the rest
/// get one with `question_probability`.
pub fn build_session<R: Rng + ?Sized>(
    list: &[StimulusItem],
    fillers: &[StimulusItem],
    practice: &[StimulusItem],
    options: &PlanOptions,
    rng: &mut R,
) -> Vec<Box<dyn Trial>> {
    let page = |text: &str| -> Box<dyn Trial> {
        Box::new(Instructions::new(text).with_preview(options.preview_chars))
    };

    let mut trials: Vec<Box<dyn Trial>> = Vec::new();
    trials.push(Box::new(Message::new("Start of session")));
    trials.push(page(&options.welcome));
    if let Some(consent) = &options.consent {
        trials.push(Box::new(
            Instructions::consent(consent.as_str()).with_preview(options.preview_chars),
        ));
    }
    trials.push(Box::new(SubjectIdPage::new()));

    if options.gaze {
        trials.push(page("Before we start, we calibrate the eye-tracker."));
        trials.push(Box::new(GazeCalibration::new()));
    }

    if !practice.is_empty() {
        trials.push(page("First some practice sentences!"));
        for item in practice {
            push_item(&mut trials, item, true, options, rng);
        }
        trials.push(page("Now, on to the real experiment!"));
    }

    let mut stimuli: Vec<StimulusItem> = list.iter().chain(fillers).cloned().collect();
    stimuli.shuffle(rng);
    for item in &stimuli {
        let ask = rng.random_bool(options.question_probability.clamp(0.0, 1.0));
        push_item(&mut trials, item, ask, options, rng);
    }

    trials.push(page(&options.thanks));
    trials.push(Box::new(Message::new("End of session")));
    trials
}

fn push_item<R: Rng + ?Sized>(
    trials: &mut Vec<Box<dyn Trial>>,
    item: &StimulusItem,
    ask: bool,
    options: &PlanOptions,
    rng: &mut R,
) {
    if options.gaze {
        trials.push(Box::new(GazeContingentReadingTrial::from_item(item)));
    } else {
        trials.push(Box::new(ReadingTrial::from_item(item)));
    }
    if ask {
        if options.comprehension {
            trials.push(Box::new(ComprehensionTrial::new(
                item.item_id,
                item.condition.clone(),
                item.text.clone(),
                item.question.clone(),
                options.keys,
                rng,
            )));
        } else {
            trials.push(Box::new(YesNoQuestionTrial::new(
                item.item_id,
                item.condition.clone(),
                item.question.clone(),
                options.keys,
            )));
        }
    }
    if options.gaze {
        trials.push(Box::new(Instructions::next()));
    }
}
