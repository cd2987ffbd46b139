/// Discrete input delivered by the input source on a poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Space bar / continue.
    Confirm,
    /// Escape: ends the current trial with the `ABORTED` sentinel where the
    /// trial allows it, ignored otherwise.
    Cancel,
    /// A designated response key.
    Key(char),
    /// Free-text entry committed with Return.
    Submit(String),
    /// Window closed or session interrupted; always ends the whole run.
    Close,
}

impl Signal {
    pub fn is_close(&self) -> bool {
        matches!(self, Signal::Close)
    }
}
