//! Free-text address parsing.
//!
//! Splits a raw address such as `"Санкт-Петербург, Невский пр., 10 лит. А"` into
//! street, house, corpus and liter. Everything source-specific (which city prefixes
//! to strip, when to fall back to parsing at all) lives in a [`ParserProfile`].

use crate::error::ConfigError;
use crate::models::{Address, AddressComponent, ComponentSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// City prefixes the open-data extract puts in front of its addresses.
pub const CITY_PREFIX_PATTERNS: [&str; 6] = [
    r"г\.",
    "город",
    r"г\s+",
    r"санкт-петербург,\s*",
    r"\s*спб\s*,\s*",
    r"нп в составе спб\s*",
];

/// When the full-address column is parsed for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFallback {
    /// Parse only when the street or house column is missing.
    #[default]
    StreetOrHouseMissing,
    /// Parse whenever any of the four component columns is missing.
    AnyMissing,
}

impl AddressFallback {
    pub fn applies(&self, native: ComponentSet) -> bool {
        match self {
            Self::StreetOrHouseMissing => !(native.street && native.house),
            Self::AnyMissing => !native.missing().is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserProfile {
    /// Regex fragments matched case-insensitively at the start of the address and removed.
    #[serde(default)]
    pub prefix_patterns: Vec<String>,
    #[serde(default)]
    pub fallback: AddressFallback,
}

impl ParserProfile {
    /// Profile for the open-data extract: strip city prefixes, fill any missing component.
    pub fn open_data() -> Self {
        Self {
            prefix_patterns: CITY_PREFIX_PATTERNS.iter().map(|s| s.to_string()).collect(),
            fallback: AddressFallback::AnyMissing,
        }
    }

    pub fn compile(&self) -> Result<AddressParser, ConfigError> {
        let prefix = if self.prefix_patterns.is_empty() {
            None
        } else {
            let alternation = self
                .prefix_patterns
                .iter()
                .map(|p| format!("(?:{})", p))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!("^(?i:{})", alternation)).map_err(|e| {
                ConfigError::InvalidValue {
                    field: "parser.prefix_patterns",
                    reason: e.to_string(),
                }
            })?;
            Some(re)
        };
        Ok(AddressParser {
            prefix,
            fallback: self.fallback,
        })
    }
}

fn split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A comma, or a whitespace run directly followed by a digit
    RE.get_or_init(|| Regex::new(r"(,\s*)|(\s+)\d").expect("valid split regex"))
}

fn house_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:дом\s*|д\.\s*)?(\d+[\w/\-]*)").expect("valid house regex")
    })
}

fn liter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:литера?|лит\.?|л\.?)\s*([а-яёА-ЯЁ\d]+)").expect("valid liter regex")
    })
}

fn corpus_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:корпус|корп\.?|к\.?)\s*([а-яёА-ЯЁ\d]+)").expect("valid corpus regex")
    })
}

/// Split into the street segment and the optional house part.
fn split_street(text: &str) -> (&str, Option<&str>) {
    match split_re().captures(text) {
        Some(caps) => {
            if let Some(comma) = caps.get(1) {
                (&text[..comma.start()], Some(&text[comma.end()..]))
            } else if let Some(ws) = caps.get(2) {
                (&text[..ws.start()], Some(&text[ws.end()..]))
            } else {
                (text, None)
            }
        }
        None => (text, None),
    }
}

fn first_group(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Compiled form of a [`ParserProfile`].
#[derive(Debug, Clone)]
pub struct AddressParser {
    prefix: Option<Regex>,
    fallback: AddressFallback,
}

impl Default for AddressParser {
    fn default() -> Self {
        Self {
            prefix: None,
            fallback: AddressFallback::default(),
        }
    }
}

impl AddressParser {
    pub fn fallback(&self) -> AddressFallback {
        self.fallback
    }

    /// Parse a free-text address. Missing or unparseable parts come back as "".
    pub fn parse(&self, raw: Option<&str>) -> Address {
        let Some(raw) = raw else {
            return Address::default();
        };
        let mut text = raw.trim();
        if text.is_empty() {
            return Address::default();
        }
        if let Some(prefix) = &self.prefix {
            if let Some(m) = prefix.find(text) {
                text = text[m.end()..].trim();
            }
        }

        let (street, house_part) = split_street(text);
        let mut out = Address {
            street: street.trim().to_string(),
            ..Default::default()
        };
        if let Some(house_part) = house_part {
            let house_part = house_part.trim();
            out.set(AddressComponent::House, first_group(house_re(), house_part));
            out.set(AddressComponent::Liter, first_group(liter_re(), house_part));
            out.set(AddressComponent::Corpus, first_group(corpus_re(), house_part));
        }
        out
    }
}
