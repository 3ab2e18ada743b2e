use std::collections::BTreeMap;

use dlg_core::{HistoryEntry, PathCounterRecord};

/// Append-only history plus the departure counters derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PathTracker {
    history: Vec<HistoryEntry>,
    by_node: BTreeMap<String, BTreeMap<Option<usize>, u32>>,
    by_index: BTreeMap<usize, u32>,
}

impl PathTracker {
    pub(crate) fn new() -> Self {
        Self {
            history: vec![HistoryEntry::root()],
            by_node: BTreeMap::new(),
            by_index: BTreeMap::new(),
        }
    }

    pub(crate) fn restore(
        history: Vec<HistoryEntry>,
        records: Vec<PathCounterRecord>,
        by_index: BTreeMap<usize, u32>,
    ) -> Self {
        let mut by_node: BTreeMap<String, BTreeMap<Option<usize>, u32>> = BTreeMap::new();
        for record in records {
            *by_node
                .entry(record.node_id)
                .or_default()
                .entry(record.choice_index)
                .or_insert(0) += record.count;
        }
        Self {
            history,
            by_node,
            by_index,
        }
    }

    pub(crate) fn push_root(&mut self) {
        self.history.push(HistoryEntry::root());
    }

    /// Back-fills the departing entry, bumps both counters and opens the target's entry.
    pub(crate) fn record_departure(
        &mut self,
        origin_index: usize,
        origin_id: &str,
        choice_index: Option<usize>,
        target_index: usize,
    ) {
        if let Some(last) = self.history.last_mut() {
            last.choice_index = choice_index;
        }

        let by_index = self.by_index.entry(origin_index).or_insert(0);
        *by_index = by_index.saturating_add(1);

        let by_choice = self
            .by_node
            .entry(origin_id.to_string())
            .or_default()
            .entry(choice_index)
            .or_insert(0);
        *by_choice = by_choice.saturating_add(1);

        self.history.push(HistoryEntry {
            node_index: target_index,
            choice_index: None,
        });
    }

    pub(crate) fn current(&self) -> HistoryEntry {
        self.history
            .last()
            .copied()
            .unwrap_or_else(HistoryEntry::root)
    }

    pub(crate) fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub(crate) fn departures_from(&self, node_index: usize) -> u32 {
        self.by_index.get(&node_index).copied().unwrap_or(0)
    }

    /// `name` is a departed node id, or `name$choice` with that choice taken at least once.
    pub(crate) fn exists(&self, name: &str) -> bool {
        if self.by_node.contains_key(name) {
            return true;
        }
        let Some((node_id, choice)) = split_choice_key(name) else {
            return false;
        };
        self.by_node
            .get(node_id)
            .map(|choices| choices.contains_key(&Some(choice)))
            .unwrap_or(false)
    }

    pub(crate) fn count(&self, name: &str) -> u32 {
        if let Some(choices) = self.by_node.get(name) {
            return choices.values().copied().fold(0u32, u32::saturating_add);
        }
        let Some((node_id, choice)) = split_choice_key(name) else {
            return 0;
        };
        self.by_node
            .get(node_id)
            .and_then(|choices| choices.get(&Some(choice)))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn records(&self) -> Vec<PathCounterRecord> {
        self.by_node
            .iter()
            .flat_map(|(node_id, choices)| {
                choices.iter().map(move |(choice_index, count)| PathCounterRecord {
                    node_id: node_id.clone(),
                    choice_index: *choice_index,
                    count: *count,
                })
            })
            .collect()
    }

    pub(crate) fn node_counters(&self) -> BTreeMap<usize, u32> {
        self.by_index.clone()
    }
}

fn split_choice_key(name: &str) -> Option<(&str, usize)> {
    if !name.contains('$') {
        return None;
    }
    let mut parts = name.split('$');
    let node_id = parts.next()?;
    let choice = parts.last()?.trim().parse::<usize>().ok()?;
    Some((node_id, choice))
}
