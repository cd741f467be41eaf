use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt::Display,
};

use itertools::Itertools;
use log::{debug, trace};

use crate::provider::DomainRecord;

/// A single change to apply to the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Create a new record with this value
    Create(String),
    /// Rewrite an existing record to hold a new value, keeping its id and status
    Update { record: DomainRecord, value: String },
    /// Delete an existing record
    Delete(DomainRecord),
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create(value) => write!(f, "create {}", value),
            Action::Update { record, value } => {
                write!(f, "update {} -> {}", record, value)
            }
            Action::Delete(record) => write!(f, "delete {}", record),
        }
    }
}

/// The set of changes needed to bring the records of one name and type to a desired state.
///
/// Plans are computed from a snapshot of the existing records and are meant to be applied right away.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    /// Actions in the order they should be applied
    pub actions: Vec<Action>,
    /// Existing records that already hold a desired value
    pub unchanged: Vec<DomainRecord>,
}

impl Plan {
    /// Generate a plan that converges `existing` to exactly the values in `desired`.
    ///
    /// Records whose value is still desired are left alone. Stale records are rewritten with the values that are
    /// still missing, first stale record (in listing order) with the first missing value (in `desired` order).
    /// Stale records left over after that are deleted, missing values left over are created.
    ///
    /// Empty values are skipped and repeated values are only considered once.
    /// If several existing records share a value, only the last one listed is considered.
    /// A `desired` list without any non-empty value yields an empty plan, it never means "delete everything".
    pub fn generate(existing: &[DomainRecord], desired: &[String]) -> Plan {
        let mut plan = Plan::default();
        if desired.iter().all(String::is_empty) {
            return plan;
        }

        let mut remaining = index_by_value(existing);
        let mut seen: HashSet<&str> = HashSet::new();
        let mut to_create: VecDeque<&str> = VecDeque::new();

        for value in desired.iter().map(String::as_str) {
            if value.is_empty() || !seen.insert(value) {
                continue;
            }
            match remaining.remove(value) {
                Some(i) => {
                    trace!("Keeping {}", existing[i]);
                    plan.unchanged.push(existing[i].clone());
                }
                None => to_create.push_back(value),
            }
        }

        // Whatever is left over is no longer desired. Reuse those records before creating new ones
        for i in remaining.into_values().sorted() {
            let record = existing[i].clone();
            match to_create.pop_front() {
                Some(value) => plan.actions.push(Action::Update {
                    record,
                    value: value.to_owned(),
                }),
                None => plan.actions.push(Action::Delete(record)),
            }
        }
        plan.actions
            .extend(to_create.into_iter().map(|v| Action::Create(v.to_owned())));

        debug!(
            "Generated plan with {} action(s), {} record(s) unchanged",
            plan.actions.len(),
            plan.unchanged.len()
        );
        plan
    }

    /// Generate a plan that deletes the records holding any of the given values.
    /// Values without a matching record are ignored.
    pub fn removal(existing: &[DomainRecord], values: &[String]) -> Plan {
        let by_value = index_by_value(existing);
        let actions = values
            .iter()
            .filter(|v| !v.is_empty())
            .unique()
            .filter_map(|v| by_value.get(v.as_str()))
            .map(|&i| Action::Delete(existing[i].clone()))
            .collect_vec();
        Plan {
            actions,
            unchanged: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// Map each value to the position of the last record holding it
fn index_by_value(records: &[DomainRecord]) -> HashMap<&str, usize> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.value.as_str(), i))
        .collect()
}
