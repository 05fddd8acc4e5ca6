//! Turns a raw table into a [`SourceTable`]: resolves the mapped address columns,
//! falls back to parsing the full-address column where the profile says so, and
//! cleans the address components used for matching and display.

use crate::address::AddressParser;
use crate::models::{
    Address, AddressComponent, ColumnMapping, ComponentSet, RawTable, SourceRecord, SourceTable,
};
use crate::normalize::display_component;
use std::collections::BTreeMap;

fn header_index(headers: &[String], name: Option<&str>) -> Option<usize> {
    let name = name?.trim();
    if name.is_empty() {
        return None;
    }
    headers.iter().position(|h| h.trim() == name)
}

pub fn prepare_source(raw: RawTable, mapping: &ColumnMapping, parser: &AddressParser) -> SourceTable {
    let RawTable {
        label,
        headers,
        rows,
    } = raw;

    let mut native_idx: [Option<usize>; 4] = [None; 4];
    let mut native = ComponentSet::default();
    for (slot, component) in AddressComponent::ALL.into_iter().enumerate() {
        native_idx[slot] = header_index(&headers, mapping.column_for(component));
        if native_idx[slot].is_some() {
            native.insert(component);
        }
    }
    let full_idx = header_index(&headers, mapping.full_address.as_deref());
    let parse = full_idx.is_some() && parser.fallback().applies(native);

    let mut components = native;
    let mut columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    if parse {
        for component in native.missing() {
            components.insert(component);
            let name = mapping.output_name(component);
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
        log::info!(
            "Source '{}': parsing '{}' to derive {:?}",
            label,
            mapping.full_address.as_deref().unwrap_or_default(),
            native.missing()
        );
    } else if components.missing().len() == AddressComponent::ALL.len() {
        log::warn!(
            "Source '{}' has no address columns and no full-address column; all address components stay empty",
            label
        );
    }

    let records = rows
        .into_iter()
        .enumerate()
        .map(|(id, row)| {
            let mut fields: BTreeMap<String, Option<String>> = BTreeMap::new();
            for (col, name) in columns.iter().take(headers.len()).enumerate() {
                fields.insert(name.clone(), row.get(col).cloned().flatten());
            }

            let parsed = match (parse, full_idx) {
                (true, Some(i)) => parser.parse(row.get(i).and_then(|v| v.as_deref())),
                _ => Address::default(),
            };

            let mut address = Address::default();
            for (slot, component) in AddressComponent::ALL.into_iter().enumerate() {
                let (name, value) = match native_idx[slot] {
                    Some(i) => (
                        columns[i].clone(),
                        display_component(component, row.get(i).and_then(|v| v.as_deref())),
                    ),
                    None if parse => (
                        mapping.output_name(component),
                        display_component(component, Some(parsed.get(component))),
                    ),
                    None => continue,
                };
                let stored = if value.is_empty() {
                    None
                } else {
                    Some(value.clone())
                };
                fields.insert(name, stored);
                address.set(component, value);
            }

            SourceRecord {
                id,
                fields,
                address,
            }
        })
        .collect::<Vec<_>>();

    log::info!(
        "Prepared source '{}': {} records, address components {:?}",
        label,
        records.len(),
        components
    );

    SourceTable {
        label,
        columns,
        components,
        records,
    }
}
