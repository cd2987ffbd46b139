mod calibration;
mod gaze_reading;
mod instructions;
mod message;
mod question;
mod reading;
mod subject_id;

pub use calibration::GazeCalibration;
pub use gaze_reading::GazeContingentReadingTrial;
pub use instructions::Instructions;
pub use message::Message;
pub use question::{ComprehensionTrial, ResponseKeys, YesNoQuestionTrial};
pub use reading::{blink_schedule, ReadingTrial};
pub use subject_id::SubjectIdPage;
