use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DesignError;

/// One sentence of the design: an item in one condition, with its
/// comprehension question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StimulusItem {
    pub item_id: u32,
    pub condition: String,
    pub text: String,
    pub question: String,
}

impl StimulusItem {
    pub fn new(
        item_id: u32,
        condition: impl Into<String>,
        text: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            item_id,
            condition: condition.into(),
            text: text.into(),
            question: question.into(),
        }
    }
}

/// Reads a tab-separated design: `item_id, condition, text, question`.
pub fn load_stimuli(path: impl AsRef<Path>) -> Result<Vec<StimulusItem>, DesignError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| DesignError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_stimuli(&raw)
}

pub fn parse_stimuli(raw: &str) -> Result<Vec<StimulusItem>, DesignError> {
    let mut items = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() != 4 {
            return Err(DesignError::MalformedRow {
                line: line_no,
                reason: format!("expected 4 columns, found {}", cols.len()),
            });
        }
        let item_id = cols[0].trim().parse::<u32>().map_err(|_| DesignError::MalformedRow {
            line: line_no,
            reason: format!("item id {:?} is not an integer", cols[0]),
        })?;
        for (name, value) in [("condition", cols[1]), ("text", cols[2]), ("question", cols[3])] {
            if value.is_empty() {
                return Err(DesignError::MalformedRow {
                    line: line_no,
                    reason: format!("empty {name}"),
                });
            }
        }
        items.push(StimulusItem::new(item_id, cols[1], cols[2], cols[3]));
    }
    Ok(items)
}
