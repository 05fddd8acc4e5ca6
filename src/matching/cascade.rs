//! Cascading Address Matching
//!
//! This module runs the fixed sequence of exact-key passes over two prepared sources.
//!
//! **Exclusion:** every record claimed by a pass is removed from the candidate pool
//! before the next pass runs, so each Source-A and Source-B record belongs to at most
//! one pass. The pool is an explicit [`Remaining`] value handed from pass to pass.
//!
//! **Missing components:** passes 2-4 are skipped, not failed, when either source does
//! not define a component of their key (e.g. no corpus column in the open-data extract).
//! Pass 1 only needs street and house; there an undefined corpus or liter joins as "",
//! so a record with no corpus links to a source without a corpus column.
//!
//! **Cardinality:** within a key group every A record is paired with every B record,
//! exactly like a relational equi-join. Groups that are many-to-many on both sides are
//! counted and logged but not capped.

use crate::matching::{LinkedPair, MatchPass, Remaining, sort_pairs_by_id};
use crate::models::{ComponentSet, RecordId};
use crate::normalize::{KeyTuple, NormalizedSource};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

fn default_true() -> bool {
    true
}

/// Configuration for a cascade run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Shard each pass's join across rayon workers by key group.
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Keep records whose street or house key is empty out of every join.
    /// Off by default: blank keys join like any other value.
    #[serde(default)]
    pub skip_blank_street_house: bool,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            skip_blank_street_house: false,
        }
    }
}

/// Status of a cascade pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassStatus {
    Completed,
    Skipped(String), // reason
}

impl std::fmt::Display for PassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed"),
            Self::Skipped(reason) => write!(f, "Skipped: {}", reason),
        }
    }
}

/// Result entry for one pass of the cascade
#[derive(Debug, Clone)]
pub struct PassEntry {
    pub pass: MatchPass,
    pub status: PassStatus,
    pub pair_count: usize,
    pub source_a_records: usize,
    pub source_b_records: usize,
    pub many_to_many_groups: usize,
}

impl PassEntry {
    fn skipped(pass: MatchPass, reason: String) -> Self {
        Self {
            pass,
            status: PassStatus::Skipped(reason),
            pair_count: 0,
            source_a_records: 0,
            source_b_records: 0,
            many_to_many_groups: 0,
        }
    }
}

/// Pairs emitted by one pass plus the pool the next pass starts from.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub pairs: Vec<LinkedPair>,
    pub remaining: Remaining,
    pub many_to_many_groups: usize,
}

/// Full cascade result: linked pairs in pass order, per-pass entries and the residual ids.
#[derive(Debug, Clone)]
pub struct CascadeResult {
    pub pairs: Vec<LinkedPair>,
    pub entries: Vec<PassEntry>,
    pub residual_a: Vec<RecordId>,
    pub residual_b: Vec<RecordId>,
    pub total_duration_ms: u64,
}

impl CascadeResult {
    pub fn entry(&self, pass: MatchPass) -> Option<&PassEntry> {
        self.entries.iter().find(|e| e.pass == pass)
    }

    pub fn pairs_for(&self, pass: MatchPass) -> impl Iterator<Item = &LinkedPair> {
        self.pairs.iter().filter(move |p| p.pass == pass)
    }
}

fn join_key(
    keys: &KeyTuple,
    defined: ComponentSet,
    pass: MatchPass,
    cfg: &CascadeConfig,
) -> Option<String> {
    if cfg.skip_blank_street_house && (keys.street.is_empty() || keys.house.is_empty()) {
        return None;
    }
    // Keys hold only letters and digits, so '|' cannot collide with key content.
    // A component the source does not define joins as "".
    let parts: Vec<&str> = pass
        .components()
        .iter()
        .map(|c| if defined.contains(*c) { keys.get(*c) } else { "" })
        .collect();
    Some(parts.join("|"))
}

fn group_by_key(
    ids: &BTreeSet<RecordId>,
    source: &NormalizedSource,
    pass: MatchPass,
    cfg: &CascadeConfig,
) -> HashMap<String, Vec<RecordId>> {
    let mut groups: HashMap<String, Vec<RecordId>> = HashMap::new();
    for &id in ids {
        let Some(keys) = source.keys.get(id) else {
            continue;
        };
        if let Some(key) = join_key(keys, source.components, pass, cfg) {
            groups.entry(key).or_default().push(id);
        }
    }
    groups
}

fn emit_group(ids_a: &[RecordId], ids_b: &[RecordId], pass: MatchPass) -> Vec<LinkedPair> {
    let mut out = Vec::with_capacity(ids_a.len() * ids_b.len());
    for &a in ids_a {
        for &b in ids_b {
            out.push(LinkedPair { a, b, pass });
        }
    }
    out
}

/// Run one pass over the still-unmatched records.
///
/// All pairs are computed before the pool is touched; the returned `remaining`
/// is the input pool minus every identifier this pass emitted.
pub fn run_pass(
    pass: MatchPass,
    a: &NormalizedSource,
    b: &NormalizedSource,
    remaining: &Remaining,
    cfg: &CascadeConfig,
) -> PassOutcome {
    let groups_a = group_by_key(remaining.a(), a, pass, cfg);
    let groups_b = group_by_key(remaining.b(), b, pass, cfg);

    let shared: Vec<(&str, &[RecordId], &[RecordId])> = groups_a
        .iter()
        .filter_map(|(key, ids_a)| {
            groups_b
                .get(key)
                .map(|ids_b| (key.as_str(), ids_a.as_slice(), ids_b.as_slice()))
        })
        .collect();

    let mut pairs: Vec<LinkedPair> = if cfg.parallel {
        shared
            .par_iter()
            .flat_map_iter(|(_, ids_a, ids_b)| emit_group(ids_a, ids_b, pass))
            .collect()
    } else {
        shared
            .iter()
            .flat_map(|(_, ids_a, ids_b)| emit_group(ids_a, ids_b, pass))
            .collect()
    };
    // Shard order is arbitrary; sorting makes the pass output deterministic
    sort_pairs_by_id(&mut pairs);

    let mut many_to_many_groups = 0usize;
    for (key, ids_a, ids_b) in &shared {
        if ids_a.len() > 1 && ids_b.len() > 1 {
            many_to_many_groups += 1;
            log::debug!(
                "{}: key '{}' joins {} A records with {} B records",
                pass,
                key,
                ids_a.len(),
                ids_b.len()
            );
        }
    }

    PassOutcome {
        remaining: remaining.without(&pairs),
        pairs,
        many_to_many_groups,
    }
}

/// Run all passes in cascade order and collect the residual identifiers.
pub fn run_cascade(
    a: &NormalizedSource,
    b: &NormalizedSource,
    cfg: &CascadeConfig,
) -> CascadeResult {
    let start = Instant::now();
    log::info!(
        "Starting cascade run: '{}' ({} records) vs '{}' ({} records)",
        a.label,
        a.len(),
        b.label,
        b.len()
    );

    let mut remaining = Remaining::initial(a.len(), b.len());
    let mut pairs: Vec<LinkedPair> = Vec::new();
    let mut entries: Vec<PassEntry> = Vec::with_capacity(MatchPass::CASCADE.len());

    for pass in MatchPass::CASCADE {
        if let Err(reason) = pass.can_run(a.components, b.components) {
            log::warn!("Skipping {}: {}", pass.description(), reason);
            entries.push(PassEntry::skipped(pass, reason));
            continue;
        }

        log::info!("Running {}", pass.description());
        let outcome = run_pass(pass, a, b, &remaining, cfg);
        let source_a_records = outcome
            .pairs
            .iter()
            .map(|p| p.a)
            .collect::<BTreeSet<_>>()
            .len();
        let source_b_records = outcome
            .pairs
            .iter()
            .map(|p| p.b)
            .collect::<BTreeSet<_>>()
            .len();

        if outcome.many_to_many_groups > 0 {
            log::info!(
                "Pass {}: {} key groups are shared by several records on both sides; all combinations emitted",
                pass.number(),
                outcome.many_to_many_groups
            );
        }
        log::info!(
            "Pass {} complete: {} pairs ({} A records, {} B records); {} of {} remain in A, {} of {} in B",
            pass.number(),
            outcome.pairs.len(),
            source_a_records,
            source_b_records,
            outcome.remaining.a().len(),
            a.len(),
            outcome.remaining.b().len(),
            b.len()
        );

        entries.push(PassEntry {
            pass,
            status: PassStatus::Completed,
            pair_count: outcome.pairs.len(),
            source_a_records,
            source_b_records,
            many_to_many_groups: outcome.many_to_many_groups,
        });
        pairs.extend(outcome.pairs);
        remaining = outcome.remaining;
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    log::info!(
        "Cascade complete: {} pairs, {} unmatched in '{}', {} unmatched in '{}' ({:.2}s)",
        pairs.len(),
        remaining.a().len(),
        a.label,
        remaining.b().len(),
        b.label,
        duration_ms as f64 / 1000.0
    );

    CascadeResult {
        pairs,
        entries,
        residual_a: remaining.a().iter().copied().collect(),
        residual_b: remaining.b().iter().copied().collect(),
        total_duration_ms: duration_ms,
    }
}
