use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordinal position of a record within its source, assigned at load time.
pub type RecordId = usize;

/// Which side of the linkage a table plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSide {
    /// Richer scraped catalogue
    A,
    /// Structured open-data extract
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressComponent {
    Street,
    House,
    Corpus,
    Liter,
}

impl AddressComponent {
    pub const ALL: [AddressComponent; 4] = [
        AddressComponent::Street,
        AddressComponent::House,
        AddressComponent::Corpus,
        AddressComponent::Liter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Street => "street",
            Self::House => "house",
            Self::Corpus => "corpus",
            Self::Liter => "liter",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub house: String,
    pub corpus: String,
    pub liter: String,
}

impl Address {
    pub fn new(street: &str, house: &str, corpus: &str, liter: &str) -> Self {
        Self {
            street: street.to_string(),
            house: house.to_string(),
            corpus: corpus.to_string(),
            liter: liter.to_string(),
        }
    }

    pub fn get(&self, component: AddressComponent) -> &str {
        match component {
            AddressComponent::Street => &self.street,
            AddressComponent::House => &self.house,
            AddressComponent::Corpus => &self.corpus,
            AddressComponent::Liter => &self.liter,
        }
    }

    pub fn set(&mut self, component: AddressComponent, value: String) {
        match component {
            AddressComponent::Street => self.street = value,
            AddressComponent::House => self.house = value,
            AddressComponent::Corpus => self.corpus = value,
            AddressComponent::Liter => self.liter = value,
        }
    }
}

/// Address components a source defines as columns (natively or through parsing).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentSet {
    pub street: bool,
    pub house: bool,
    pub corpus: bool,
    pub liter: bool,
}

impl ComponentSet {
    pub fn all() -> Self {
        Self {
            street: true,
            house: true,
            corpus: true,
            liter: true,
        }
    }

    pub fn contains(&self, component: AddressComponent) -> bool {
        match component {
            AddressComponent::Street => self.street,
            AddressComponent::House => self.house,
            AddressComponent::Corpus => self.corpus,
            AddressComponent::Liter => self.liter,
        }
    }

    pub fn insert(&mut self, component: AddressComponent) {
        match component {
            AddressComponent::Street => self.street = true,
            AddressComponent::House => self.house = true,
            AddressComponent::Corpus => self.corpus = true,
            AddressComponent::Liter => self.liter = true,
        }
    }

    pub fn with(mut self, component: AddressComponent) -> Self {
        self.insert(component);
        self
    }

    pub fn missing(&self) -> Vec<AddressComponent> {
        AddressComponent::ALL
            .into_iter()
            .filter(|c| !self.contains(*c))
            .collect()
    }
}

/// A loaded table before address preparation: header names plus rows of nullable cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub label: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn empty(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub id: RecordId,
    pub fields: BTreeMap<String, Option<String>>,
    pub address: Address,
}

impl SourceRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }
}

/// A prepared source: records indexed by their id, the ordered field names and the
/// address components available for matching.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub label: String,
    pub columns: Vec<String>,
    pub components: ComponentSet,
    pub records: Vec<SourceRecord>,
}

impl SourceTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, id: RecordId) -> Option<&SourceRecord> {
        self.records.get(id)
    }

    /// Output column name for one of this source's fields.
    pub fn namespaced(&self, field: &str) -> String {
        namespaced_field(field, &self.label)
    }

    pub fn namespaced_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| self.namespaced(c)).collect()
    }
}

pub fn namespaced_field(field: &str, label: &str) -> String {
    format!("{}_{}", field, label)
}

// Column mapping for source tables; names are resolved once when the source is prepared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub street: Option<String>,
    pub house: Option<String>,
    pub corpus: Option<String>,
    pub liter: Option<String>,
    pub full_address: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            street: Some("Улица".into()),
            house: Some("Дом".into()),
            corpus: Some("Корпус".into()),
            liter: Some("Литера".into()),
            full_address: Some("Адрес".into()),
        }
    }
}

impl ColumnMapping {
    pub fn column_for(&self, component: AddressComponent) -> Option<&str> {
        match component {
            AddressComponent::Street => self.street.as_deref(),
            AddressComponent::House => self.house.as_deref(),
            AddressComponent::Corpus => self.corpus.as_deref(),
            AddressComponent::Liter => self.liter.as_deref(),
        }
    }

    /// Field name under which a parsed component is stored when the source lacks the column.
    pub fn output_name(&self, component: AddressComponent) -> String {
        self.column_for(component)
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| component.name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_set_missing() {
        let s = ComponentSet::default()
            .with(AddressComponent::Street)
            .with(AddressComponent::House);
        assert_eq!(
            s.missing(),
            vec![AddressComponent::Corpus, AddressComponent::Liter]
        );
        assert!(ComponentSet::all().missing().is_empty());
    }

    #[test]
    fn output_name_falls_back_to_component() {
        let m = ColumnMapping {
            corpus: None,
            ..Default::default()
        };
        assert_eq!(m.output_name(AddressComponent::Street), "Улица");
        assert_eq!(m.output_name(AddressComponent::Corpus), "corpus");
    }

    #[test]
    fn namespacing() {
        let t = SourceTable {
            label: "citywalls".into(),
            columns: vec!["Название".into(), "Улица".into()],
            ..Default::default()
        };
        assert_eq!(
            t.namespaced_columns(),
            vec!["Название_citywalls".to_string(), "Улица_citywalls".to_string()]
        );
    }
}
