use crate::models::{Address, AddressComponent, ComponentSet, SourceTable};
use rayon::prelude::*;
use unicode_normalization::UnicodeNormalization;

/// Canonical comparison key for one address component: lower-cased with every
/// character that is not a letter or digit removed. Absent input yields "".
pub fn canonical_key(input: Option<&str>) -> String {
    let Some(s) = input else {
        return String::new();
    };
    // Compose first so a decomposed "й" survives the alphanumeric filter as one letter
    s.trim()
        .nfc()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Trimmed value of a raw cell; absent input yields "".
pub fn clean_component(input: Option<&str>) -> String {
    input.map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Display form of corpus and liter qualifiers.
pub fn display_qualifier(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Prepared display value of a component: trimmed, qualifiers upper-cased.
pub fn display_component(component: AddressComponent, input: Option<&str>) -> String {
    let cleaned = clean_component(input);
    match component {
        AddressComponent::Corpus | AddressComponent::Liter => display_qualifier(&cleaned),
        AddressComponent::Street | AddressComponent::House => cleaned,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyTuple {
    pub street: String,
    pub house: String,
    pub corpus: String,
    pub liter: String,
}

impl KeyTuple {
    pub fn from_address(a: &Address) -> Self {
        Self {
            street: canonical_key(Some(&a.street)),
            house: canonical_key(Some(&a.house)),
            corpus: canonical_key(Some(&a.corpus)),
            liter: canonical_key(Some(&a.liter)),
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
}

/// Key tuples of a prepared source, indexed by record id.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSource {
    pub label: String,
    pub components: ComponentSet,
    pub keys: Vec<KeyTuple>,
}

impl NormalizedSource {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub fn normalize_source(table: &SourceTable) -> NormalizedSource {
    NormalizedSource {
        label: table.label.clone(),
        components: table.components,
        keys: table
            .records
            .par_iter()
            .map(|r| KeyTuple::from_address(&r.address))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key_strips_punctuation_and_case() {
        assert_eq!(canonical_key(Some("Невский пр.")), "невскийпр");
        assert_eq!(canonical_key(Some("  невский пр ")), "невскийпр");
        assert_eq!(canonical_key(Some("10/2-А")), "102а");
        assert_eq!(canonical_key(None), "");
        assert_eq!(canonical_key(Some("")), "");
    }

    #[test]
    fn test_full_strings_collapse() {
        assert_eq!(
            canonical_key(Some("Невский пр., 10")),
            canonical_key(Some("невский пр 10"))
        );
    }

    #[test]
    fn test_canonical_key_keeps_any_alphabet() {
        assert_eq!(canonical_key(Some("Main St. #5")), "mainst5");
        assert_eq!(canonical_key(Some("Ёлочная")), "ёлочная");
    }

    #[test]
    fn test_decomposed_letters_compose() {
        // "й" written as "и" + combining breve
        let decomposed = "Майская".replace('й', "и\u{0306}");
        assert_eq!(canonical_key(Some(&decomposed)), "майская");
    }

    #[test]
    fn test_display_component_uppercases_qualifiers() {
        assert_eq!(display_component(AddressComponent::Liter, Some(" а ")), "А");
        assert_eq!(display_component(AddressComponent::Corpus, Some("2б")), "2Б");
        assert_eq!(
            display_component(AddressComponent::Street, Some(" Садовая ")),
            "Садовая"
        );
        assert_eq!(display_component(AddressComponent::House, None), "");
    }

    #[test]
    fn test_key_tuple_from_address() {
        let k = KeyTuple::from_address(&Address::new("Ленина ул.", "5", "", "А"));
        assert_eq!(k.street, "ленинаул");
        assert_eq!(k.house, "5");
        assert_eq!(k.corpus, "");
        assert_eq!(k.liter, "а");
        assert_eq!(k.get(AddressComponent::Liter), "а");
    }
}
