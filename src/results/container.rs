//! Fan-in container collecting provider segments in a fixed order

use super::types::*;
use crate::search::AggregatedResponse;
use std::sync::{Arc, RwLock};

/// Outcome recorded for one provider slot
#[derive(Debug, Clone)]
enum SlotState {
    Pending,
    Done {
        results: Vec<SearchResult>,
        more: bool,
    },
    Failed(ProviderFailure),
}

/// Container for collecting results from concurrently searched providers.
///
/// Each provider owns a slot reserved up front, so the merged output follows
/// slot order no matter which provider finishes first.
#[derive(Debug, Clone)]
pub struct ResultContainer {
    /// Provider names, one per slot
    providers: Arc<Vec<String>>,
    /// Per-slot outcomes
    slots: Arc<RwLock<Vec<SlotState>>>,
}

impl Default for ResultContainer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ResultContainer {
    /// Create a container with one slot per provider, in merge order
    pub fn new(providers: Vec<String>) -> Self {
        let slots = vec![SlotState::Pending; providers.len()];
        Self {
            providers: Arc::new(providers),
            slots: Arc::new(RwLock::new(slots)),
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Record a provider page in its slot
    pub fn add_page(&self, slot: usize, results: Vec<SearchResult>, more: bool) {
        if let Some(state) = self.slots.write().unwrap().get_mut(slot) {
            *state = SlotState::Done { results, more };
        }
    }

    /// Record a provider failure in its slot
    pub fn add_unresponsive(&self, slot: usize, failure: ProviderFailure) {
        if let Some(state) = self.slots.write().unwrap().get_mut(slot) {
            *state = SlotState::Failed(failure);
        }
    }

    /// All results, concatenated in slot order
    pub fn get_ordered_results(&self) -> Vec<SearchResult> {
        self.slots
            .read()
            .unwrap()
            .iter()
            .flat_map(|state| match state {
                SlotState::Done { results, .. } => results.clone(),
                _ => Vec::new(),
            })
            .collect()
    }

    /// True when any provider that answered reported a further page
    pub fn has_more(&self) -> bool {
        self.slots
            .read()
            .unwrap()
            .iter()
            .any(|state| matches!(state, SlotState::Done { more: true, .. }))
    }

    /// Failures recorded so far, in slot order
    pub fn get_unresponsive(&self) -> Vec<ProviderFailure> {
        self.slots
            .read()
            .unwrap()
            .iter()
            .filter_map(|state| match state {
                SlotState::Failed(failure) => Some(failure.clone()),
                _ => None,
            })
            .collect()
    }

    /// Total number of collected results
    pub fn result_count(&self) -> usize {
        self.slots
            .read()
            .unwrap()
            .iter()
            .map(|state| match state {
                SlotState::Done { results, .. } => results.len(),
                _ => 0,
            })
            .sum()
    }

    /// Compose the final response
    pub fn to_response(&self) -> AggregatedResponse {
        AggregatedResponse {
            results: self.get_ordered_results(),
            has_more: self.has_more(),
        }
    }
}
