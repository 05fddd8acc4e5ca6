//! Unified record assembly.
//!
//! Linked pairs come first (in pass order), then Source-A residuals, then Source-B
//! residuals. Every row carries the same columns: coalesced address fields, the
//! synthesized display address, the merge tag, and the namespaced fields of both
//! sources (null where a source did not contribute).

use crate::matching::cascade::{CascadeResult, PassStatus};
use crate::matching::residual::{ResidualRecord, partition_residuals};
use crate::matching::{LinkedPair, MatchPass};
use crate::models::{Address, AddressComponent, RecordId, SourceRecord, SourceSide, SourceTable};
use crate::normalize::display_qualifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed leading columns of the unified table.
pub const ADDRESS_COLUMNS: [&str; 6] = [
    "merge_type",
    "street",
    "house",
    "corpus",
    "liter",
    "normalized_address",
];

pub const SOURCE_A_JSON_COLUMN: &str = "source_a_json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeType {
    Linked(MatchPass),
    SourceAOnly,
    SourceBOnly,
}

impl MergeType {
    pub fn tag(&self, label_a: &str, label_b: &str) -> String {
        match self {
            Self::Linked(pass) => pass.label().to_string(),
            Self::SourceAOnly => format!("{}_only", label_a),
            Self::SourceBOnly => format!("{}_only", label_b),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembleOptions {
    /// Attach the Source-A fields as a JSON object to every row linked to Source A.
    pub source_a_json: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            source_a_json: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnifiedRecord {
    pub merge_type: MergeType,
    pub source_a_id: Option<RecordId>,
    pub source_b_id: Option<RecordId>,
    pub address: Address,
    pub normalized_address: String,
    pub fields: BTreeMap<String, Option<String>>,
    pub source_a_json: Option<String>,
}

impl UnifiedRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct PassStats {
    pub pass: MatchPass,
    pub status: PassStatus,
    pub pairs: usize,
    pub source_a_records: usize,
    pub source_b_records: usize,
    /// Key groups shared by more than one record on both sides.
    pub many_to_many_groups: usize,
}

/// Counters describing one linkage run.
#[derive(Debug, Clone, Default)]
pub struct LinkageStats {
    pub label_a: String,
    pub label_b: String,
    pub source_a_total: usize,
    pub source_b_total: usize,
    pub total_rows: usize,
    pub passes: Vec<PassStats>,
    pub source_a_only: usize,
    pub source_b_only: usize,
}

impl LinkageStats {
    pub fn pass(&self, pass: MatchPass) -> Option<&PassStats> {
        self.passes.iter().find(|p| p.pass == pass)
    }

    pub fn pairs_for(&self, pass: MatchPass) -> usize {
        self.pass(pass).map(|p| p.pairs).unwrap_or(0)
    }

    pub fn linked_rows(&self) -> usize {
        self.passes.iter().map(|p| p.pairs).sum()
    }

    pub fn many_to_many_groups(&self) -> usize {
        self.passes.iter().map(|p| p.many_to_many_groups).sum()
    }
}

impl std::fmt::Display for LinkageStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total records after linkage: {}", self.total_rows)?;
        writeln!(
            f,
            "Loaded: {} from '{}', {} from '{}'",
            self.source_a_total, self.label_a, self.source_b_total, self.label_b
        )?;
        for p in &self.passes {
            match &p.status {
                PassStatus::Completed => writeln!(
                    f,
                    "{}: {} pairs ({} / {} records, {} many-to-many key groups)",
                    p.pass.description(),
                    p.pairs,
                    p.source_a_records,
                    p.source_b_records,
                    p.many_to_many_groups
                )?,
                status => writeln!(f, "{}: {}", p.pass.description(), status)?,
            }
        }
        writeln!(f, "Only in '{}': {}", self.label_a, self.source_a_only)?;
        write!(f, "Only in '{}': {}", self.label_b, self.source_b_only)
    }
}

#[derive(Debug, Clone)]
pub struct UnifiedTable {
    pub label_a: String,
    pub label_b: String,
    /// Namespaced field columns: Source-A fields first, then Source-B fields.
    pub field_columns: Vec<String>,
    pub records: Vec<UnifiedRecord>,
    pub stats: LinkageStats,
}

impl UnifiedTable {
    pub fn header(&self) -> Vec<String> {
        let mut h: Vec<String> = ADDRESS_COLUMNS.iter().map(|s| s.to_string()).collect();
        h.extend(self.field_columns.iter().cloned());
        h.push(SOURCE_A_JSON_COLUMN.to_string());
        h
    }

    /// Cell values of one record in header order; nulls are `None`.
    pub fn row<'r>(&self, r: &'r UnifiedRecord) -> Vec<Option<std::borrow::Cow<'r, str>>> {
        use std::borrow::Cow;
        let mut out: Vec<Option<Cow<'r, str>>> = Vec::with_capacity(self.field_columns.len() + 7);
        out.push(Some(Cow::Owned(r.merge_type.tag(&self.label_a, &self.label_b))));
        for c in AddressComponent::ALL {
            out.push(Some(Cow::Borrowed(r.address.get(c))));
        }
        out.push(Some(Cow::Borrowed(r.normalized_address.as_str())));
        for col in &self.field_columns {
            out.push(r.field(col).map(Cow::Borrowed));
        }
        out.push(r.source_a_json.as_deref().map(Cow::Borrowed));
        out
    }
}

/// Source-A value when non-empty, otherwise the Source-B value.
pub fn coalesce<'v>(a: &'v str, b: &'v str) -> &'v str {
    if a.trim().is_empty() { b } else { a }
}

pub fn coalesce_address(a: Option<&Address>, b: Option<&Address>) -> Address {
    let empty = Address::default();
    let a = a.unwrap_or(&empty);
    let b = b.unwrap_or(&empty);
    let mut out = Address::default();
    for c in AddressComponent::ALL {
        out.set(c, coalesce(a.get(c), b.get(c)).to_string());
    }
    out
}

/// `"{street}, {house}[ лит.{liter}][ корп.{corpus}]"`
pub fn display_address(addr: &Address) -> String {
    let mut s = format!("{}, {}", addr.street, addr.house);
    let liter = display_qualifier(&addr.liter);
    if !liter.is_empty() {
        s.push_str(" лит.");
        s.push_str(&liter);
    }
    let corpus = display_qualifier(&addr.corpus);
    if !corpus.is_empty() {
        s.push_str(" корп.");
        s.push_str(&corpus);
    }
    s.trim().to_string()
}

fn namespaced_fields(table: &SourceTable, record: &SourceRecord) -> BTreeMap<String, Option<String>> {
    table
        .columns
        .iter()
        .map(|c| (table.namespaced(c), record.fields.get(c).cloned().flatten()))
        .collect()
}

fn source_a_blob(a: &SourceTable, fields: &BTreeMap<String, Option<String>>) -> Option<String> {
    let present: BTreeMap<String, &str> = a
        .namespaced_columns()
        .into_iter()
        .filter_map(|name| {
            let value = fields.get(&name)?.as_deref()?;
            Some((name, value))
        })
        .collect();
    if present.is_empty() {
        return None;
    }
    match serde_json::to_string(&present) {
        Ok(s) => Some(s),
        Err(e) => {
            log::warn!("Failed to serialize '{}' fields: {}", a.label, e);
            None
        }
    }
}

fn linked_record(
    pair: &LinkedPair,
    a: &SourceTable,
    b: &SourceTable,
    opts: &AssembleOptions,
) -> Option<UnifiedRecord> {
    let ra = a.record(pair.a)?;
    let rb = b.record(pair.b)?;
    let mut fields = namespaced_fields(a, ra);
    fields.extend(namespaced_fields(b, rb));
    let address = coalesce_address(Some(&ra.address), Some(&rb.address));
    let source_a_json = if opts.source_a_json {
        source_a_blob(a, &fields)
    } else {
        None
    };
    Some(UnifiedRecord {
        merge_type: MergeType::Linked(pair.pass),
        source_a_id: Some(pair.a),
        source_b_id: Some(pair.b),
        normalized_address: display_address(&address),
        address,
        fields,
        source_a_json,
    })
}

fn residual_record(
    residual: ResidualRecord,
    a: &SourceTable,
    b: &SourceTable,
    opts: &AssembleOptions,
) -> Option<UnifiedRecord> {
    let (merge_type, own) = match residual.side {
        SourceSide::A => (MergeType::SourceAOnly, a.record(residual.id)?),
        SourceSide::B => (MergeType::SourceBOnly, b.record(residual.id)?),
    };
    let address = coalesce_address(Some(&own.address), None);
    let source_a_json = if opts.source_a_json && residual.side == SourceSide::A {
        source_a_blob(a, &residual.fields)
    } else {
        None
    };
    Some(UnifiedRecord {
        merge_type,
        source_a_id: (residual.side == SourceSide::A).then_some(residual.id),
        source_b_id: (residual.side == SourceSide::B).then_some(residual.id),
        normalized_address: display_address(&address),
        address,
        fields: residual.fields,
        source_a_json,
    })
}

/// Union linked pairs and residuals of both sources into one uniform table.
pub fn assemble(
    a: &SourceTable,
    b: &SourceTable,
    cascade: &CascadeResult,
    opts: &AssembleOptions,
) -> UnifiedTable {
    let mut field_columns = a.namespaced_columns();
    field_columns.extend(b.namespaced_columns());

    let mut records: Vec<UnifiedRecord> = cascade
        .pairs
        .iter()
        .filter_map(|p| linked_record(p, a, b, opts))
        .collect();

    let only_a = partition_residuals(SourceSide::A, &cascade.residual_a, a, b);
    let only_b = partition_residuals(SourceSide::B, &cascade.residual_b, b, a);
    let (source_a_only, source_b_only) = (only_a.len(), only_b.len());
    records.extend(
        only_a
            .into_iter()
            .chain(only_b)
            .filter_map(|r| residual_record(r, a, b, opts)),
    );

    let stats = LinkageStats {
        label_a: a.label.clone(),
        label_b: b.label.clone(),
        source_a_total: a.len(),
        source_b_total: b.len(),
        total_rows: records.len(),
        passes: cascade
            .entries
            .iter()
            .map(|e| PassStats {
                pass: e.pass,
                status: e.status.clone(),
                pairs: e.pair_count,
                source_a_records: e.source_a_records,
                source_b_records: e.source_b_records,
                many_to_many_groups: e.many_to_many_groups,
            })
            .collect(),
        source_a_only,
        source_b_only,
    };

    UnifiedTable {
        label_a: a.label.clone(),
        label_b: b.label.clone(),
        field_columns,
        records,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::cascade::{CascadeConfig, run_cascade};
    use crate::models::ComponentSet;
    use crate::normalize::normalize_source;

    fn table(
        label: &str,
        components: ComponentSet,
        columns: &[&str],
        rows: &[(Address, &[Option<&str>])],
    ) -> SourceTable {
        SourceTable {
            label: label.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            components,
            records: rows
                .iter()
                .enumerate()
                .map(|(id, (address, values))| SourceRecord {
                    id,
                    fields: columns
                        .iter()
                        .zip(values.iter())
                        .map(|(c, v)| (c.to_string(), v.map(|s| s.to_string())))
                        .collect(),
                    address: address.clone(),
                })
                .collect(),
        }
    }

    fn link(a: &SourceTable, b: &SourceTable) -> UnifiedTable {
        let cascade = run_cascade(
            &normalize_source(a),
            &normalize_source(b),
            &CascadeConfig::default(),
        );
        assemble(a, b, &cascade, &AssembleOptions::default())
    }

    #[test]
    fn display_address_clauses() {
        assert_eq!(
            display_address(&Address::new("Садовая", "1", "", "")),
            "Садовая, 1"
        );
        assert_eq!(
            display_address(&Address::new("Кирочная", "12", "2", "а")),
            "Кирочная, 12 лит.А корп.2"
        );
        assert_eq!(
            display_address(&Address::new("Мира", "3", "1", "")),
            "Мира, 3 корп.1"
        );
        assert_eq!(display_address(&Address::default()), ",");
    }

    #[test]
    fn coalesce_prefers_non_empty_a() {
        assert_eq!(coalesce("Садовая", "садовая ул"), "Садовая");
        assert_eq!(coalesce("", "садовая ул"), "садовая ул");
        assert_eq!(coalesce("  ", "x"), "x");
    }

    #[test]
    fn source_a_only_row_for_empty_b() {
        let a = table(
            "citywalls",
            ComponentSet::all(),
            &["Улица", "Дом"],
            &[(Address::new("Садовая", "1", "", ""), &[Some("Садовая"), Some("1")])],
        );
        let b = table("opendata", ComponentSet::all(), &["Улица", "Год"], &[]);
        let t = link(&a, &b);
        assert_eq!(t.records.len(), 1);
        let r = &t.records[0];
        assert_eq!(r.merge_type, MergeType::SourceAOnly);
        assert_eq!(r.normalized_address, "Садовая, 1");
        assert_eq!(r.field("Год_opendata"), None);
        assert!(r.fields.contains_key("Год_opendata"));
        assert_eq!(t.stats.source_a_only, 1);
        assert_eq!(t.stats.source_b_only, 0);
        assert_eq!(t.stats.linked_rows(), 0);
        assert_eq!(
            r.merge_type.tag(&t.label_a, &t.label_b),
            "citywalls_only"
        );
    }

    #[test]
    fn linked_row_coalesces_and_keeps_both_sides() {
        let a = table(
            "citywalls",
            ComponentSet::all(),
            &["Улица", "Дом", "Архитектор"],
            &[(
                Address::new("Невский пр.", "10", "", ""),
                &[Some("Невский пр."), Some("10"), Some("Иванов")],
            )],
        );
        let b = table(
            "opendata",
            ComponentSet::all(),
            &["Улица", "Дом", "Литера", "Год"],
            &[(
                Address::new("невский пр", "10", "", "А"),
                &[Some("невский пр"), Some("10"), Some("А"), Some("1900")],
            )],
        );
        let t = link(&a, &b);
        // liter differs ("" vs "а"), so the link comes from street + house
        assert_eq!(t.records.len(), 1);
        let r = &t.records[0];
        assert_eq!(r.merge_type, MergeType::Linked(MatchPass::StreetHouse));
        assert_eq!(r.address.street, "Невский пр.");
        assert_eq!(r.address.liter, "А");
        assert_eq!(r.normalized_address, "Невский пр., 10 лит.А");
        assert_eq!(r.field("Архитектор_citywalls"), Some("Иванов"));
        assert_eq!(r.field("Год_opendata"), Some("1900"));
        assert_eq!(r.source_a_id, Some(0));
        assert_eq!(r.source_b_id, Some(0));

        let blob: BTreeMap<String, String> =
            serde_json::from_str(r.source_a_json.as_deref().unwrap()).unwrap();
        assert_eq!(blob.get("Архитектор_citywalls").map(String::as_str), Some("Иванов"));
        assert!(!blob.contains_key("Год_opendata"));
    }

    #[test]
    fn stats_and_schema_are_uniform() {
        let a = table(
            "a",
            ComponentSet::all(),
            &["n"],
            &[
                (Address::new("Мира", "1", "", ""), &[Some("a0")]),
                (Address::new("Мира", "2", "", ""), &[Some("a1")]),
            ],
        );
        let b = table(
            "b",
            ComponentSet::all(),
            &["m"],
            &[
                (Address::new("мира", "1", "", ""), &[Some("b0")]),
                (Address::new("Ленина", "9", "", ""), &[None]),
            ],
        );
        let t = link(&a, &b);
        assert_eq!(t.stats.total_rows, 3);
        assert_eq!(t.stats.pairs_for(MatchPass::AllFields), 1);
        assert_eq!(t.stats.source_a_only, 1);
        assert_eq!(t.stats.source_b_only, 1);
        assert_eq!(
            t.header(),
            vec![
                "merge_type",
                "street",
                "house",
                "corpus",
                "liter",
                "normalized_address",
                "n_a",
                "m_b",
                "source_a_json"
            ]
        );
        for r in &t.records {
            assert_eq!(t.row(r).len(), t.header().len());
            assert!(r.fields.contains_key("n_a") && r.fields.contains_key("m_b"));
        }
        let b_only = t
            .records
            .iter()
            .find(|r| r.merge_type == MergeType::SourceBOnly)
            .unwrap();
        assert!(b_only.source_a_json.is_none());
        assert_eq!(b_only.normalized_address, "Ленина, 9");
        let text = t.stats.to_string();
        assert!(text.contains("Only in 'a': 1"));
    }

    #[test]
    fn many_to_many_groups_reach_stats() {
        let a = table(
            "a",
            ComponentSet::all(),
            &["n"],
            &[
                (Address::new("Мира", "1", "", ""), &[Some("a0")]),
                (Address::new("мира", "1", "", ""), &[Some("a1")]),
            ],
        );
        let b = table(
            "b",
            ComponentSet::all(),
            &["m"],
            &[
                (Address::new("Мира", "1", "", ""), &[Some("b0")]),
                (Address::new("МИРА", "1", "", ""), &[Some("b1")]),
            ],
        );
        let t = link(&a, &b);
        assert_eq!(t.stats.pairs_for(MatchPass::AllFields), 4);
        assert_eq!(
            t.stats.pass(MatchPass::AllFields).unwrap().many_to_many_groups,
            1
        );
        assert_eq!(t.stats.many_to_many_groups(), 1);
        assert!(t.stats.to_string().contains("1 many-to-many key groups"));
    }

    #[test]
    fn json_blob_can_be_disabled() {
        let a = table(
            "a",
            ComponentSet::all(),
            &["n"],
            &[(Address::new("Мира", "1", "", ""), &[Some("a0")])],
        );
        let b = table("b", ComponentSet::all(), &["m"], &[]);
        let cascade = run_cascade(
            &normalize_source(&a),
            &normalize_source(&b),
            &CascadeConfig::default(),
        );
        let t = assemble(
            &a,
            &b,
            &cascade,
            &AssembleOptions {
                source_a_json: false,
            },
        );
        assert!(t.records[0].source_a_json.is_none());
    }

    #[test]
    fn assembling_twice_is_identical() {
        let a = table(
            "a",
            ComponentSet::all(),
            &["n"],
            &[
                (Address::new("Мира", "1", "", ""), &[Some("a0")]),
                (Address::new("Мира", "1", "", ""), &[Some("a1")]),
            ],
        );
        let b = table(
            "b",
            ComponentSet::all(),
            &["m"],
            &[(Address::new("мира", "1", "", ""), &[Some("b0")])],
        );
        let first = link(&a, &b);
        let second = link(&a, &b);
        let tags = |t: &UnifiedTable| {
            t.records
                .iter()
                .map(|r| (r.merge_type, r.source_a_id, r.source_b_id))
                .collect::<Vec<_>>()
        };
        assert_eq!(tags(&first), tags(&second));
        assert_eq!(first.stats.total_rows, 2);
    }
}
