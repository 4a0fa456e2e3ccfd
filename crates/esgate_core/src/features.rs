//! The Feature Registry.
//!
//! A [`FeatureSet`] maps each grammar [`Feature`] to a boolean for one parse
//! call.  A feature that was never mentioned reads as disabled, but the set
//! remembers the difference between "never mentioned" and "explicitly
//! `false`" ([`FeatureSet::get`]).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! features {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// A grammar feature that can be switched on or off.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum Feature {
            $($variant,)*
        }

        impl Feature {
            /// Every feature, in declaration order.
            pub const ALL: &'static [Feature] = &[$(Feature::$variant,)*];

            /// The option key, e.g. `"arrowFunctions"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Feature::$variant => $name,)*
                }
            }
        }
    };
}

features! {
    ArrowFunctions => "arrowFunctions",
    BlockBindings => "blockBindings",
    RegexUFlag => "regexUFlag",
    RegexYFlag => "regexYFlag",
    TemplateStrings => "templateStrings",
    BinaryLiterals => "binaryLiterals",
    OctalLiterals => "octalLiterals",
    UnicodeCodePointEscapes => "unicodeCodePointEscapes",
    SuperInFunctions => "superInFunctions",
    DefaultParams => "defaultParams",
    RestParams => "restParams",
    ForOf => "forOf",
    ObjectLiteralComputedProperties => "objectLiteralComputedProperties",
    ObjectLiteralShorthandMethods => "objectLiteralShorthandMethods",
    ObjectLiteralShorthandProperties => "objectLiteralShorthandProperties",
    ObjectLiteralDuplicateProperties => "objectLiteralDuplicateProperties",
    Generators => "generators",
    Destructuring => "destructuring",
    Classes => "classes",
    Modules => "modules",
    Spread => "spread",
    Jsx => "jsx",
    GlobalReturn => "globalReturn",
}

/// Features implied by `sourceType: "module"`.
pub const MODULE_BUNDLE: &[Feature] = &[
    Feature::ArrowFunctions,
    Feature::BlockBindings,
    Feature::RegexUFlag,
    Feature::RegexYFlag,
    Feature::TemplateStrings,
    Feature::BinaryLiterals,
    Feature::OctalLiterals,
    Feature::UnicodeCodePointEscapes,
    Feature::SuperInFunctions,
    Feature::DefaultParams,
    Feature::RestParams,
    Feature::ForOf,
    Feature::ObjectLiteralComputedProperties,
    Feature::ObjectLiteralShorthandMethods,
    Feature::ObjectLiteralShorthandProperties,
    Feature::ObjectLiteralDuplicateProperties,
    Feature::Generators,
    Feature::Destructuring,
    Feature::Classes,
    Feature::Modules,
];

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unrecognised feature name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown feature '{0}'")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FeatureSet
// ─────────────────────────────────────────────────────────────────────────────

/// The enabled/disabled grammar features of one parse call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet {
    flags: BTreeMap<Feature, bool>,
}

impl FeatureSet {
    /// An empty set: every feature reads as disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every feature of [`MODULE_BUNDLE`] switched on.
    pub fn module_bundle() -> Self {
        MODULE_BUNDLE.iter().map(|&f| (f, true)).collect()
    }

    /// Set `feature` explicitly.  A later call wins.
    pub fn set(&mut self, feature: Feature, enabled: bool) {
        self.flags.insert(feature, enabled);
    }

    /// Builder form of [`FeatureSet::set`].
    pub fn with(mut self, feature: Feature, enabled: bool) -> Self {
        self.set(feature, enabled);
        self
    }

    /// The explicit setting of `feature`, or `None` when it was never set.
    pub fn get(&self, feature: Feature) -> Option<bool> {
        self.flags.get(&feature).copied()
    }

    /// `true` when `feature` is explicitly enabled.
    pub fn enabled(&self, feature: Feature) -> bool {
        self.get(feature).unwrap_or(false)
    }

    /// `true` when either feature is enabled.
    pub fn either(&self, a: Feature, b: Feature) -> bool {
        self.enabled(a) || self.enabled(b)
    }

    /// Apply every setting of `overrides` on top of this set.
    pub fn merge(&mut self, overrides: &FeatureSet) {
        self.flags.extend(overrides.iter());
    }

    /// The explicit settings in feature order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, bool)> + '_ {
        self.flags.iter().map(|(&f, &on)| (f, on))
    }

    /// `true` when no feature was ever set.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<(Feature, bool)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (Feature, bool)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enabled: Vec<_> = self
            .iter()
            .filter(|&(_, on)| on)
            .map(|(feature, _)| feature.as_str())
            .collect();
        write!(f, "[{}]", enabled.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_differs_from_disabled() {
        let set = FeatureSet::new().with(Feature::Spread, false);
        assert_eq!(set.get(Feature::Spread), Some(false));
        assert_eq!(set.get(Feature::Jsx), None);
        assert!(!set.enabled(Feature::Spread));
        assert!(!set.enabled(Feature::Jsx));
    }

    #[test]
    fn test_module_bundle_contents() {
        let set = FeatureSet::module_bundle();
        assert!(set.enabled(Feature::Modules));
        assert!(set.enabled(Feature::Destructuring));
        assert_eq!(set.get(Feature::Jsx), None);
        assert_eq!(set.get(Feature::Spread), None);
        assert_eq!(set.get(Feature::GlobalReturn), None);
        assert_eq!(set.iter().count(), MODULE_BUNDLE.len());
    }

    #[test]
    fn test_merge_overrides_win() {
        let mut set = FeatureSet::module_bundle();
        set.merge(&FeatureSet::new().with(Feature::Classes, false).with(Feature::Jsx, true));
        assert!(!set.enabled(Feature::Classes));
        assert!(set.enabled(Feature::Jsx));
        assert!(set.enabled(Feature::Generators));
    }

    #[test]
    fn test_deserialize_camel_case_keys() {
        let set: FeatureSet =
            serde_json::from_str(r#"{"arrowFunctions": true, "regexUFlag": false}"#).unwrap();
        assert!(set.enabled(Feature::ArrowFunctions));
        assert_eq!(set.get(Feature::RegexUFlag), Some(false));
        assert!(serde_json::from_str::<FeatureSet>(r#"{"nope": true}"#).is_err());
    }

    #[test]
    fn test_names_round_trip_through_from_str() {
        for &feature in Feature::ALL {
            assert_eq!(feature.as_str().parse::<Feature>(), Ok(feature));
            let json = serde_json::to_string(&feature).unwrap();
            assert_eq!(json, format!("\"{}\"", feature.as_str()));
        }
        assert!("bogus".parse::<Feature>().is_err());
    }

    #[test]
    fn test_either() {
        let set = FeatureSet::new().with(Feature::RestParams, true);
        assert!(set.either(Feature::Destructuring, Feature::RestParams));
        assert!(!set.either(Feature::Classes, Feature::SuperInFunctions));
    }
}
