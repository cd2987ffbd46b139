//! Latin-square list allocation with a usage ledger shared across sessions.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use legere_core::{DesignError, StimulusItem};
use thiserror::Error;
use tracing::{debug, info};

/// One counterbalanced list per condition label.
pub type CounterbalancedLists = BTreeMap<String, Vec<StimulusItem>>;

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error(transparent)]
    Design(#[from] DesignError),

    #[error("Ledger {path} failed: {source}")]
    Ledger {
        path: String,
        source: std::io::Error,
    },
}

/// Checks that `design` is a balanced Latin square and returns the sorted
/// item ids and condition labels.
pub fn validate(design: &[StimulusItem]) -> Result<(Vec<u32>, Vec<String>), DesignError> {
    let grouped = group_by_item(design);
    let mut iter = grouped.iter();
    let Some((&first_item, first)) = iter.next() else {
        return Err(DesignError::Empty);
    };

    for (&item, entries) in &grouped {
        if entries.len() != first.len() {
            return Err(DesignError::UnequalItemSizes {
                item,
                found: entries.len(),
                reference: first_item,
                expected: first.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for entry in entries {
            if !seen.insert(entry.condition.as_str()) {
                return Err(DesignError::DuplicateCondition {
                    item,
                    condition: entry.condition.clone(),
                });
            }
        }
    }

    let expected = conditions_of(first);
    for (&item, entries) in iter {
        let found = conditions_of(entries);
        if found != expected {
            return Err(DesignError::UnbalancedConditions {
                item,
                found,
                expected,
            });
        }
    }

    Ok((grouped.keys().copied().collect(), expected))
}

/// Partitions `design` into one list per condition by rotation: the list at
/// index `l` takes, from the item at sorted position `k`, its entry at
/// `(l + k) % conditions`.
pub fn build_lists(design: &[StimulusItem]) -> Result<CounterbalancedLists, DesignError> {
    let (_, conditions) = validate(design)?;
    let n = conditions.len();

    let mut lists: Vec<Vec<StimulusItem>> = vec![Vec::new(); n];
    for (k, entries) in group_by_item(design).into_values().enumerate() {
        for (l, list) in lists.iter_mut().enumerate() {
            list.push(entries[(l + k) % n].clone());
        }
    }
    Ok(conditions.into_iter().zip(lists).collect())
}

/// Items grouped by id, each group sorted by condition label.
fn group_by_item(design: &[StimulusItem]) -> BTreeMap<u32, Vec<StimulusItem>> {
    let mut grouped: BTreeMap<u32, Vec<StimulusItem>> = BTreeMap::new();
    for item in design {
        grouped.entry(item.item_id).or_default().push(item.clone());
    }
    for entries in grouped.values_mut() {
        entries.sort_by(|a, b| a.condition.cmp(&b.condition));
    }
    grouped
}

fn conditions_of(entries: &[StimulusItem]) -> Vec<String> {
    entries.iter().map(|e| e.condition.clone()).collect()
}

/// Append-only file of list labels, one per completed session.
#[derive(Debug, Clone)]
pub struct UsageLedger {
    path: PathBuf,
}

impl UsageLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Labels recorded so far; a missing file is an empty ledger.
    pub fn read(&self) -> Result<Vec<String>, AllocationError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(raw
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    pub fn append(&self, label: &str) -> Result<(), AllocationError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{label}").map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> AllocationError {
        AllocationError::Ledger {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Picks the least-used counterbalanced list for the next participant.
#[derive(Debug, Clone)]
pub struct StimulusAllocator {
    ledger: UsageLedger,
}

impl StimulusAllocator {
    pub fn new(ledger: UsageLedger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Least-used label so far, ties going to the earlier label. Greedy: each
    /// session only looks at the history, never ahead.
    pub fn next_list_label(&self, design: &[StimulusItem]) -> Result<String, AllocationError> {
        let (_, conditions) = validate(design)?;
        let history = self.ledger.read()?;

        let mut best: Option<(&String, usize)> = None;
        for label in &conditions {
            let used = history.iter().filter(|h| *h == label).count();
            debug!(label = %label, used, "ledger usage");
            if best.map_or(true, |(_, min)| used < min) {
                best = Some((label, used));
            }
        }
        // validate() guarantees at least one condition
        let (label, _) = best.ok_or(DesignError::Empty)?;
        Ok(label.clone())
    }

    /// Label and items of the next list. Nothing is recorded until `commit`.
    pub fn next_list(
        &self,
        design: &[StimulusItem],
    ) -> Result<(String, Vec<StimulusItem>), AllocationError> {
        let label = self.next_list_label(design)?;
        let mut lists = build_lists(design)?;
        let list = lists
            .remove(&label)
            .ok_or_else(|| DesignError::UnknownList(label.clone()))?;
        info!("Next Latin square list: {label}");
        Ok((label, list))
    }

    /// Records that a session using `label` finished normally.
    pub fn commit(&self, label: &str) -> Result<(), AllocationError> {
        self.ledger.append(label)?;
        info!(label, ledger = %self.ledger.path.display(), "ledger updated");
        Ok(())
    }
}
