//! # Localized Values
//!
//! Task metadata and message values carry text keyed by locale. A map may be
//! locale-aware (`{"en": …, "it": …}`), locale-unaware (`{"default": …}`),
//! or both. Resolution picks one entry deterministically:
//!
//! 1. the entry for the requested locale, when present
//! 2. the `"default"` entry, when present
//! 3. the first entry in lexicographic key order
//!
//! An empty map cannot be resolved and fails with
//! [`L10nError::NoLocalizationAvailable`]; callers must surface that instead
//! of inventing a value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key of the locale-unaware entry.
pub const DEFAULT_LOCALE_KEY: &str = "default";

/// A value keyed by locale, with an optional `"default"` entry.
///
/// Backed by a `BTreeMap` so that iteration order, and therefore the final
/// fallback step of [`localize`], is stable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localized<T>(BTreeMap<String, T>);

impl<T> Localized<T> {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// A map holding only the locale-unaware `"default"` entry.
    pub fn unaware(value: T) -> Self {
        let mut map = BTreeMap::new();
        map.insert(DEFAULT_LOCALE_KEY.to_string(), value);
        Self(map)
    }

    /// Builder-style insertion, useful for fixtures.
    pub fn with(mut self, locale: impl Into<String>, value: T) -> Self {
        self.0.insert(locale.into(), value);
        self
    }

    pub fn insert(&mut self, locale: impl Into<String>, value: T) -> Option<T> {
        self.0.insert(locale.into(), value)
    }

    pub fn get(&self, locale: &str) -> Option<&T> {
        self.0.get(locale)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Locale keys in lexicographic order.
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Resolves this map against `locale`. See [`localize`].
    pub fn resolve(&self, locale: &str) -> L10nResult<&T> {
        localize(self, locale)
    }
}

impl<T> FromIterator<(String, T)> for Localized<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum L10nError {
    #[error("no localization available")]
    NoLocalizationAvailable,
}

pub type L10nResult<T> = Result<T, L10nError>;

/// Resolves `localized` against `locale`.
///
/// The requested locale wins over the `"default"` entry, which wins over the
/// first key in lexicographic order. An empty map is an error, never a
/// silent fallback.
pub fn localize<'a, T>(localized: &'a Localized<T>, locale: &str) -> L10nResult<&'a T> {
    if let Some(value) = localized.0.get(locale) {
        return Ok(value);
    }
    if let Some(value) = localized.0.get(DEFAULT_LOCALE_KEY) {
        return Ok(value);
    }
    localized
        .0
        .values()
        .next()
        .ok_or(L10nError::NoLocalizationAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exact_locale_wins() {
        let map = Localized::unaware("fallback")
            .with("en", "english")
            .with("it", "italiano");
        assert_eq!(localize(&map, "it"), Ok(&"italiano"));
    }

    #[test]
    fn test_default_beats_other_locales() {
        let map = Localized::new().with("default", "fallback").with("it", "italiano");
        assert_eq!(localize(&map, "en"), Ok(&"fallback"));
    }

    #[test]
    fn test_first_key_in_sort_order_as_last_resort() {
        let map = Localized::new().with("it", "italiano").with("de", "deutsch");
        assert_eq!(localize(&map, "en"), Ok(&"deutsch"));
    }

    #[test]
    fn test_empty_map_fails() {
        let map: Localized<String> = Localized::new();
        assert_eq!(
            localize(&map, "en"),
            Err(L10nError::NoLocalizationAvailable)
        );
    }

    #[test]
    fn test_serde_is_a_plain_map() {
        let map = Localized::unaware("x".to_string()).with("en", "y".to_string());
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"default":"x","en":"y"}"#);
        let back: Localized<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
