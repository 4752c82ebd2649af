//! Language bit-mask encoding.
//!
//! Every registered language owns one bit in a 64-bit mask. Bit 0 is reserved
//! for the "always available" flag and is never assigned to a real language,
//! which leaves room for 63 languages per store.

use serde::{Deserialize, Serialize};

/// Reserved bit 0: the row is served to any requester regardless of language.
pub const ALWAYS_AVAILABLE: u64 = 1;

const LANGUAGE_BITS: u64 = !ALWAYS_AVAILABLE;

/// Errors surfaced by mask construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LanguageError {
    #[error("[ST520] language capacity exhausted (63 languages per store)")]
    LanguageLimit,
    #[error("[ST521] language id {0:#x} is not a single non-reserved bit")]
    InvalidLanguageId(u64),
    #[error("[ST522] unknown language code '{0}'")]
    UnknownLanguage(String),
}

/// A single language's bit. Always exactly one bit in positions 1..=63.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageId(u64);

impl LanguageId {
    pub fn new(raw: u64) -> Result<Self, LanguageError> {
        if raw.count_ones() == 1 && raw & ALWAYS_AVAILABLE == 0 {
            Ok(Self(raw))
        } else {
            Err(LanguageError::InvalidLanguageId(raw))
        }
    }

    /// The id for the `n`th registered language (1-based). `n` above 63 is
    /// the capacity error callers must surface.
    pub fn from_position(n: u32) -> Result<Self, LanguageError> {
        if n == 0 || n > 63 {
            return Err(LanguageError::LanguageLimit);
        }
        Ok(Self(1u64 << n))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Bit field describing which languages a row serves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageMask(u64);

impl LanguageMask {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Single-language indicator, optionally OR'd with the reserved bit.
    pub fn indicator(language: LanguageId, always_available: bool) -> Self {
        let mut mask = language.raw();
        if always_available {
            mask |= ALWAYS_AVAILABLE;
        }
        Self(mask)
    }

    pub fn from_languages<I>(languages: I, always_available: bool) -> Self
    where
        I: IntoIterator<Item = LanguageId>,
    {
        let mut mask = if always_available { ALWAYS_AVAILABLE } else { 0 };
        for language in languages {
            mask |= language.raw();
        }
        Self(mask)
    }

    pub fn always_available(self) -> bool {
        self.0 & ALWAYS_AVAILABLE != 0
    }

    pub fn with_always_available(self, on: bool) -> Self {
        if on {
            Self(self.0 | ALWAYS_AVAILABLE)
        } else {
            Self(self.0 & !ALWAYS_AVAILABLE)
        }
    }

    pub fn contains(self, language: LanguageId) -> bool {
        self.0 & language.raw() != 0
    }

    pub fn intersects(self, other: LanguageMask) -> bool {
        self.0 & other.0 & LANGUAGE_BITS != 0
    }

    pub fn insert(self, language: LanguageId) -> Self {
        Self(self.0 | language.raw())
    }

    /// Clears one language bit. The reserved bit is untouched.
    pub fn remove(self, language: LanguageId) -> Self {
        Self(self.0 & !language.raw())
    }

    /// The mask without the reserved bit.
    pub fn language_bits(self) -> u64 {
        self.0 & LANGUAGE_BITS
    }

    /// True when no real language bit remains (the reserved bit may be set).
    pub fn is_empty_of_languages(self) -> bool {
        self.language_bits() == 0
    }

    /// Whether removing `language` would leave the row serving another
    /// language. This is the archive-vs-remove decision rule.
    pub fn serves_other_languages(self, language: LanguageId) -> bool {
        self.remove(language).language_bits() != 0
    }

    pub fn languages(self) -> impl Iterator<Item = LanguageId> {
        let bits = self.language_bits();
        (1..64u32).filter_map(move |n| {
            let bit = 1u64 << n;
            (bits & bit != 0).then_some(LanguageId(bit))
        })
    }
}

/// Decoded mask: the set of languages plus the always-available flag. This is
/// what crosses the public API boundary instead of raw integers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSet {
    pub languages: Vec<LanguageId>,
    pub always_available: bool,
}

impl LanguageSet {
    pub fn decode(mask: LanguageMask) -> Self {
        Self {
            languages: mask.languages().collect(),
            always_available: mask.always_available(),
        }
    }

    pub fn encode(&self) -> LanguageMask {
        LanguageMask::from_languages(self.languages.iter().copied(), self.always_available)
    }
}

/// Shared translation-fallback policy: pick the candidate matching the
/// highest-priority requested language, falling back to the first candidate
/// carrying the always-available bit. URL resolution and content loading must
/// agree on this, so both go through here.
pub fn pick_best_translation(
    priority: &[LanguageId],
    candidates: &[LanguageMask],
) -> Option<usize> {
    for language in priority {
        if let Some(index) = candidates.iter().position(|mask| mask.contains(*language)) {
            return Some(index);
        }
    }
    candidates.iter().position(|mask| mask.always_available())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_bit_is_never_a_language() {
        assert_eq!(
            LanguageId::new(ALWAYS_AVAILABLE),
            Err(LanguageError::InvalidLanguageId(1))
        );
        assert_eq!(LanguageId::new(6), Err(LanguageError::InvalidLanguageId(6)));
        assert_eq!(LanguageId::new(2).unwrap().raw(), 2);
    }

    #[test]
    fn position_boundary_is_sixty_three() {
        assert_eq!(LanguageId::from_position(1).unwrap().raw(), 2);
        assert_eq!(LanguageId::from_position(63).unwrap().raw(), 1u64 << 63);
        assert_eq!(
            LanguageId::from_position(64),
            Err(LanguageError::LanguageLimit)
        );
        assert_eq!(
            LanguageId::from_position(0),
            Err(LanguageError::LanguageLimit)
        );
    }

    #[test]
    fn indicator_sets_reserved_bit() {
        let lang = LanguageId::new(4).unwrap();
        assert_eq!(LanguageMask::indicator(lang, false).raw(), 4);
        assert_eq!(LanguageMask::indicator(lang, true).raw(), 5);
    }

    #[test]
    fn remove_keeps_reserved_bit() {
        let eng = LanguageId::new(2).unwrap();
        let ger = LanguageId::new(4).unwrap();
        let mask = LanguageMask::from_languages([eng, ger], true);
        let stripped = mask.remove(eng);
        assert!(stripped.always_available());
        assert!(stripped.contains(ger));
        assert!(!stripped.contains(eng));
        assert!(mask.serves_other_languages(eng));
        assert!(!stripped.serves_other_languages(ger));
    }

    #[test]
    fn set_round_trips_highest_bit() {
        let top = LanguageId::from_position(63).unwrap();
        let set = LanguageSet {
            languages: vec![top],
            always_available: true,
        };
        assert_eq!(LanguageSet::decode(set.encode()), set);
    }

    #[test]
    fn fallback_prefers_priority_order_then_always_available() {
        let eng = LanguageId::new(2).unwrap();
        let ger = LanguageId::new(4).unwrap();
        let nor = LanguageId::new(8).unwrap();
        let candidates = vec![
            LanguageMask::indicator(ger, false),
            LanguageMask::indicator(eng, false),
            LanguageMask::indicator(nor, true),
        ];
        assert_eq!(pick_best_translation(&[eng, ger], &candidates), Some(1));
        assert_eq!(pick_best_translation(&[ger], &candidates), Some(0));
        // No requested language matches: the always-available row wins.
        let cro = LanguageId::new(16).unwrap();
        assert_eq!(pick_best_translation(&[cro], &candidates), Some(2));
        let no_fallback = vec![LanguageMask::indicator(ger, false)];
        assert_eq!(pick_best_translation(&[cro], &no_fallback), None);
    }
}
