//! One-sided rows for records that no pass linked.

use crate::models::{RecordId, SourceSide, SourceTable};
use std::collections::BTreeMap;

/// A record from one source with its fields namespaced and null placeholders for
/// every field of the counterpart source.
#[derive(Debug, Clone)]
pub struct ResidualRecord {
    pub side: SourceSide,
    pub id: RecordId,
    pub fields: BTreeMap<String, Option<String>>,
}

pub fn partition_residuals(
    side: SourceSide,
    ids: &[RecordId],
    own: &SourceTable,
    counterpart: &SourceTable,
) -> Vec<ResidualRecord> {
    let placeholders = counterpart.namespaced_columns();
    ids.iter()
        .filter_map(|&id| {
            let Some(record) = own.record(id) else {
                log::warn!("Residual id {} not found in source '{}'", id, own.label);
                return None;
            };
            let mut fields: BTreeMap<String, Option<String>> = own
                .columns
                .iter()
                .map(|c| (own.namespaced(c), record.fields.get(c).cloned().flatten()))
                .collect();
            for name in &placeholders {
                fields.entry(name.clone()).or_insert(None);
            }
            Some(ResidualRecord { side, id, fields })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, SourceRecord};

    fn table(label: &str, columns: &[&str], values: &[&[Option<&str>]]) -> SourceTable {
        SourceTable {
            label: label.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            components: Default::default(),
            records: values
                .iter()
                .enumerate()
                .map(|(id, row)| SourceRecord {
                    id,
                    fields: columns
                        .iter()
                        .zip(row.iter())
                        .map(|(c, v)| (c.to_string(), v.map(|s| s.to_string())))
                        .collect(),
                    address: Address::default(),
                })
                .collect(),
        }
    }

    #[test]
    fn residual_rows_carry_namespaced_fields_and_placeholders() {
        let a = table(
            "citywalls",
            &["Улица", "Название"],
            &[&[Some("Садовая"), Some("Дом")], &[Some("Мира"), None]],
        );
        let b = table("opendata", &["Улица", "Год"], &[]);
        let rows = partition_residuals(SourceSide::A, &[1], &a, &b);
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.id, 1);
        assert_eq!(r.side, SourceSide::A);
        assert_eq!(r.fields.get("Улица_citywalls"), Some(&Some("Мира".to_string())));
        assert_eq!(r.fields.get("Название_citywalls"), Some(&None));
        assert_eq!(r.fields.get("Улица_opendata"), Some(&None));
        assert_eq!(r.fields.get("Год_opendata"), Some(&None));
        assert_eq!(r.fields.len(), 4);
    }

    #[test]
    fn unknown_ids_are_dropped() {
        let a = table("a", &["x"], &[&[Some("1")]]);
        let b = table("b", &["y"], &[]);
        assert!(partition_residuals(SourceSide::A, &[5], &a, &b).is_empty());
    }
}
