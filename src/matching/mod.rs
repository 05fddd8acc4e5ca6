use crate::models::{AddressComponent, ComponentSet, RecordId};
use std::collections::BTreeSet;

// Cascade matching workflow (passes 1-4, sequential with exclusion)
pub mod cascade;

// One-sided rows for records no pass linked
pub mod residual;

/// One equi-join strategy of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchPass {
    // Exact: street, house, corpus, liter
    AllFields,
    // Exact: street, house
    StreetHouse,
    // Exact: street, house, corpus
    StreetHouseCorpus,
    // Exact: street, house, liter
    StreetHouseLiter,
}

impl MatchPass {
    /// Cascade order; strictly most specific key first.
    pub const CASCADE: [MatchPass; 4] = [
        MatchPass::AllFields,
        MatchPass::StreetHouse,
        MatchPass::StreetHouseCorpus,
        MatchPass::StreetHouseLiter,
    ];

    pub fn number(&self) -> u8 {
        match self {
            Self::AllFields => 1,
            Self::StreetHouse => 2,
            Self::StreetHouseCorpus => 3,
            Self::StreetHouseLiter => 4,
        }
    }

    pub fn components(&self) -> &'static [AddressComponent] {
        use AddressComponent::*;
        match self {
            Self::AllFields => &[Street, House, Corpus, Liter],
            Self::StreetHouse => &[Street, House],
            Self::StreetHouseCorpus => &[Street, House, Corpus],
            Self::StreetHouseLiter => &[Street, House, Liter],
        }
    }

    /// Stable tag written to the merge-type column.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AllFields => "all_fields",
            Self::StreetHouse => "street_house",
            Self::StreetHouseCorpus => "street_house_corpus",
            Self::StreetHouseLiter => "street_house_liter",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AllFields => "Pass 1: Exact Match (Street + House + Corpus + Liter)",
            Self::StreetHouse => "Pass 2: Exact Match (Street + House)",
            Self::StreetHouseCorpus => "Pass 3: Exact Match (Street + House + Corpus)",
            Self::StreetHouseLiter => "Pass 4: Exact Match (Street + House + Liter)",
        }
    }

    /// Components both sources must define for the pass to run. Pass 1 needs only
    /// street and house; a corpus or liter column a source lacks joins as "".
    pub fn required_components(&self) -> &'static [AddressComponent] {
        use AddressComponent::*;
        match self {
            Self::AllFields => &[Street, House],
            other => other.components(),
        }
    }

    /// Check whether both sources define every component this pass requires.
    pub fn can_run(&self, a: ComponentSet, b: ComponentSet) -> Result<(), String> {
        let missing: Vec<String> = self
            .required_components()
            .iter()
            .filter(|c| !(a.contains(**c) && b.contains(**c)))
            .map(|c| c.name().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Missing required component: {}", missing.join(", ")))
        }
    }
}

impl std::fmt::Display for MatchPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One Source-A record bound to one Source-B record by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkedPair {
    pub a: RecordId,
    pub b: RecordId,
    pub pass: MatchPass,
}

/// Identifiers not yet claimed by any pass. Each pass consumes one value and
/// returns the next; the value itself is never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Remaining {
    a: BTreeSet<RecordId>,
    b: BTreeSet<RecordId>,
}

impl Remaining {
    pub fn initial(len_a: usize, len_b: usize) -> Self {
        Self {
            a: (0..len_a).collect(),
            b: (0..len_b).collect(),
        }
    }

    pub fn a(&self) -> &BTreeSet<RecordId> {
        &self.a
    }

    pub fn b(&self) -> &BTreeSet<RecordId> {
        &self.b
    }

    /// Remaining set after removing every identifier that appears in `pairs`.
    pub fn without(&self, pairs: &[LinkedPair]) -> Self {
        let claimed_a: BTreeSet<RecordId> = pairs.iter().map(|p| p.a).collect();
        let claimed_b: BTreeSet<RecordId> = pairs.iter().map(|p| p.b).collect();
        Self {
            a: self.a.difference(&claimed_a).copied().collect(),
            b: self.b.difference(&claimed_b).copied().collect(),
        }
    }
}

/// Sort pairs by (a, b) so output is identical however a pass was sharded.
pub fn sort_pairs_by_id(pairs: &mut [LinkedPair]) {
    pairs.sort_by(|x, y| x.a.cmp(&y.a).then(x.b.cmp(&y.b)));
}
