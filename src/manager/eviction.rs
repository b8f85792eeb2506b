//! Priority-aware LRU eviction planning.
//!
//! Candidates are unreferenced residents ordered lowest priority first,
//! then least recently used, then by identifier. The plan is greedy: it
//! takes candidates in order and stops as soon as enough is free.

use std::cmp::Reverse;

use tokio::time::Instant;

use super::resident::ResidentEntry;
use crate::models::PriorityClass;

/// Snapshot of one eviction candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub cost_mb: u64,
    pub priority: PriorityClass,
    pub last_used: Instant,
}

/// Unreferenced entries in eviction order.
pub fn candidates<'a, H: 'a>(
    entries: impl IntoIterator<Item = &'a ResidentEntry<H>>,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = entries
        .into_iter()
        .filter(|e| e.is_evictable())
        .map(|e| Candidate {
            id: e.id.clone(),
            cost_mb: e.cost_mb,
            priority: e.priority,
            last_used: e.last_used,
        })
        .collect();
    candidates.sort_by(|a, b| {
        (Reverse(a.priority), a.last_used, &a.id).cmp(&(Reverse(b.priority), b.last_used, &b.id))
    });
    candidates
}

/// Pick victims, in order, until `free_mb + freed >= needed_mb`.
///
/// Returns `None` when even evicting every candidate would not be enough;
/// nothing should be evicted in that case.
pub fn plan(candidates: &[Candidate], free_mb: u64, needed_mb: u64) -> Option<Vec<Candidate>> {
    let mut freed = free_mb;
    let mut victims = Vec::new();
    for candidate in candidates {
        if freed >= needed_mb {
            break;
        }
        freed += candidate.cost_mb;
        victims.push(candidate.clone());
    }
    (freed >= needed_mb).then_some(victims)
}
