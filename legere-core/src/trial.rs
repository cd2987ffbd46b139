use serde::{Deserialize, Serialize};

/// Response recorded when a trial is ended locally with Escape.
pub const ABORTED: &str = "ABORTED";

/// Column order of the session log.
pub const LOG_COLUMNS: [&str; 11] = [
    "pno",
    "type",
    "starttime",
    "endtime",
    "item",
    "condition",
    "stimulus",
    "response",
    "screenshot",
    "metadata1",
    "metadata2",
];

/// Concrete screen kinds; the name is what lands in the `type` column.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrialKind {
    Message,
    Instructions,
    ConsentForm,
    Next,
    ReadingTrial,
    YesNoQuestionTrial,
    ComprehensionTrial,
    SubjectIdPage,
    GazeCalibration,
    GazeContingentReadingTrial,
}

impl TrialKind {
    pub fn name(&self) -> &'static str {
        match self {
            TrialKind::Message => "Message",
            TrialKind::Instructions => "Instructions",
            TrialKind::ConsentForm => "ConsentForm",
            TrialKind::Next => "Next",
            TrialKind::ReadingTrial => "ReadingTrial",
            TrialKind::YesNoQuestionTrial => "YesNoQuestionTrial",
            TrialKind::ComprehensionTrial => "ComprehensionTrial",
            TrialKind::SubjectIdPage => "SubjectIDPage",
            TrialKind::GazeCalibration => "GazeCalibration",
            TrialKind::GazeContingentReadingTrial => "GazeContingentReadingTrial",
        }
    }

    /// Messages are bookkeeping only and never move the progress bar.
    pub fn counts_progress(&self) -> bool {
        !matches!(self, TrialKind::Message)
    }

    /// Navigation pages are presented but left out of the session log.
    pub fn is_navigation(&self) -> bool {
        matches!(self, TrialKind::Next)
    }

    /// Trials bound to a design item; these get screenshots.
    pub fn is_experimental(&self) -> bool {
        matches!(
            self,
            TrialKind::ReadingTrial
                | TrialKind::YesNoQuestionTrial
                | TrialKind::ComprehensionTrial
                | TrialKind::GazeContingentReadingTrial
        )
    }
}

impl std::fmt::Display for TrialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result row of one trial. Times are seconds since session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub pno: Option<usize>,
    pub trial_type: TrialKind,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub item_id: Option<u32>,
    pub condition: Option<String>,
    pub stimulus: Option<String>,
    pub response: Option<String>,
    pub screenshot: Option<String>,
    pub metadata1: Option<String>,
    pub metadata2: Option<String>,
}

impl TrialRecord {
    pub fn new(trial_type: TrialKind) -> Self {
        Self {
            pno: None,
            trial_type,
            start_time: None,
            end_time: None,
            item_id: None,
            condition: None,
            stimulus: None,
            response: None,
            screenshot: None,
            metadata1: None,
            metadata2: None,
        }
    }

    /// Log row in `LOG_COLUMNS` order; absent values become empty strings.
    pub fn to_row(&self) -> Vec<String> {
        fn text(v: &Option<String>) -> String {
            v.clone().unwrap_or_default()
        }
        fn secs(v: Option<f64>) -> String {
            v.map(|s| format!("{s:.3}")).unwrap_or_default()
        }
        vec![
            self.pno.map(|p| p.to_string()).unwrap_or_default(),
            self.trial_type.name().to_string(),
            secs(self.start_time),
            secs(self.end_time),
            self.item_id.map(|i| i.to_string()).unwrap_or_default(),
            text(&self.condition),
            text(&self.stimulus),
            text(&self.response),
            text(&self.screenshot),
            text(&self.metadata1),
            text(&self.metadata2),
        ]
    }

    pub fn was_aborted(&self) -> bool {
        self.response.as_deref() == Some(ABORTED)
    }
}
