//! Caller options and their translation into engine configuration.
//!
//! [`ParseOptions`] is the Esprima-style options object as a caller writes
//! it.  [`ParseConfig::from_options`] resolves it once per call into the
//! feature set the validators consult and the [`EngineOptions`] the parser
//! runs with.

use log::debug;
use serde::Deserialize;

use crate::error::Result;
use crate::features::{Feature, FeatureSet};
use crate::normalize::OutputPositions;
use crate::parser::{EcmaVersion, EngineOptions, SourceType};

/// Options accepted by [`parse`](crate::parse) and
/// [`tokenize`](crate::tokenize).
///
/// Every key is optional.  Keys this crate does not know are ignored, but an
/// unknown name inside `ecmaFeatures` is an error.
///
/// ```
/// use esgate_core::{Feature, ParseOptions};
///
/// let opts = ParseOptions::from_json(r#"{"range": true, "ecmaFeatures": {"jsx": true}}"#).unwrap();
/// assert!(opts.range);
/// assert!(opts.ecma_features.enabled(Feature::Jsx));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Attach `range: [start, end]` to nodes and tokens.
    pub range: bool,
    /// Attach `loc` to nodes and tokens.
    pub loc: bool,
    /// Collect every comment into `Program.comments`.
    pub comment: bool,
    /// Tokenizer only: report the first error in `errors` instead of failing.
    pub tolerant: bool,
    /// Attach `leadingComments` / `trailingComments` to nodes.
    pub attach_comment: bool,
    /// Collect tokens into `Program.tokens`.
    pub tokens: bool,
    /// File name recorded as `loc.source`; only used together with `loc`.
    pub source: Option<String>,
    /// `"script"` or `"module"`.
    pub source_type: SourceType,
    /// Explicit grammar feature switches.
    pub ecma_features: FeatureSet,
}

impl ParseOptions {
    /// Deserialize options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder: switch one feature.
    pub fn with_feature(mut self, feature: Feature, enabled: bool) -> Self {
        self.ecma_features.set(feature, enabled);
        self
    }
}

/// The resolved configuration of a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseConfig {
    /// The final feature set.
    pub features: FeatureSet,
    /// Engine switches.
    pub engine: EngineOptions,
    /// Collect tokens.
    pub tokens: bool,
    /// Collect comments.
    pub comment: bool,
    /// Attach comments to nodes.
    pub attach_comment: bool,
    /// Report the first tokenizer error instead of failing.
    pub tolerant: bool,
}

impl ParseConfig {
    /// Resolve `options`.
    ///
    /// Module sources start from the module bundle, explicit `ecmaFeatures`
    /// win over it, and any explicit feature besides `globalReturn` selects
    /// the ES2015 dialect.  Comment attachment needs offsets, so it turns
    /// ranges on.  JSX implies spread unless spread was explicitly disabled.
    pub fn from_options(options: &ParseOptions) -> Self {
        let mut features = match options.source_type {
            SourceType::Module => FeatureSet::module_bundle(),
            SourceType::Script => FeatureSet::new(),
        };
        features.merge(&options.ecma_features);

        let es2015 = options.source_type == SourceType::Module
            || options
                .ecma_features
                .iter()
                .any(|(feature, _)| feature != Feature::GlobalReturn);
        let ecma_version = if es2015 {
            EcmaVersion::Es2015
        } else {
            EcmaVersion::Es5
        };

        let jsx = features.enabled(Feature::Jsx);
        if jsx && features.get(Feature::Spread) != Some(false) {
            features.set(Feature::Spread, true);
        }

        let source_type = if es2015 && features.enabled(Feature::Modules) {
            SourceType::Module
        } else {
            SourceType::Script
        };

        let engine = EngineOptions {
            ecma_version,
            jsx,
            ranges: options.range || options.attach_comment,
            locations: options.loc,
            allow_return_outside_function: features.enabled(Feature::GlobalReturn),
            source_type,
            source_file: options.source.clone().filter(|_| options.loc),
        };

        debug!(
            "dialect {:?} ({}), features {}",
            engine.ecma_version,
            engine.source_type.as_str(),
            features
        );

        Self {
            features,
            engine,
            tokens: options.tokens,
            comment: options.comment,
            attach_comment: options.attach_comment,
            tolerant: options.tolerant,
        }
    }

    /// Position data to attach to normalized tokens and comments.
    pub fn positions(&self) -> OutputPositions<'_> {
        OutputPositions {
            range: self.engine.ranges,
            loc: self.engine.locations,
            source: self.engine.source_file.as_deref(),
        }
    }

    /// `true` when comments have to be observed at all.
    pub fn wants_comments(&self) -> bool {
        self.comment || self.attach_comment
    }

    /// `sourceType` reported on the Program.
    pub fn reported_source_type(&self) -> SourceType {
        if self.features.enabled(Feature::Modules) {
            SourceType::Module
        } else {
            SourceType::Script
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> ParseConfig {
        ParseConfig::from_options(&ParseOptions::from_json(json).unwrap())
    }

    #[test]
    fn test_defaults_are_plain_es5() {
        let cfg = config("{}");
        assert_eq!(cfg.engine.ecma_version, EcmaVersion::Es5);
        assert_eq!(cfg.engine.source_type, SourceType::Script);
        assert!(cfg.features.is_empty());
        assert!(!cfg.engine.ranges && !cfg.engine.locations && !cfg.engine.jsx);
    }

    #[test]
    fn test_global_return_alone_keeps_es5() {
        let cfg = config(r#"{"ecmaFeatures": {"globalReturn": true}}"#);
        assert_eq!(cfg.engine.ecma_version, EcmaVersion::Es5);
        assert!(cfg.engine.allow_return_outside_function);
    }

    #[test]
    fn test_disabled_feature_still_selects_es2015() {
        let cfg = config(r#"{"ecmaFeatures": {"classes": false}}"#);
        assert_eq!(cfg.engine.ecma_version, EcmaVersion::Es2015);
        assert!(!cfg.features.enabled(Feature::Classes));
    }

    #[test]
    fn test_module_bundle_with_overrides() {
        let cfg = config(r#"{"sourceType": "module", "ecmaFeatures": {"classes": false}}"#);
        assert_eq!(cfg.engine.ecma_version, EcmaVersion::Es2015);
        assert_eq!(cfg.engine.source_type, SourceType::Module);
        assert!(cfg.features.enabled(Feature::Generators));
        assert!(!cfg.features.enabled(Feature::Classes));
        assert_eq!(cfg.reported_source_type(), SourceType::Module);
    }

    #[test]
    fn test_module_without_modules_feature_is_script() {
        let cfg = config(r#"{"sourceType": "module", "ecmaFeatures": {"modules": false}}"#);
        assert_eq!(cfg.engine.source_type, SourceType::Script);
        assert_eq!(cfg.reported_source_type(), SourceType::Script);
    }

    #[test]
    fn test_jsx_implies_spread_unless_disabled() {
        let cfg = config(r#"{"ecmaFeatures": {"jsx": true}}"#);
        assert!(cfg.engine.jsx);
        assert!(cfg.features.enabled(Feature::Spread));

        let cfg = config(r#"{"ecmaFeatures": {"jsx": true, "spread": false}}"#);
        assert!(cfg.engine.jsx);
        assert!(!cfg.features.enabled(Feature::Spread));
    }

    #[test]
    fn test_attach_comment_forces_ranges() {
        let cfg = config(r#"{"attachComment": true}"#);
        assert!(cfg.engine.ranges);
        assert!(cfg.wants_comments());
        assert!(cfg.positions().range);
    }

    #[test]
    fn test_source_needs_loc() {
        assert_eq!(config(r#"{"source": "a.js"}"#).engine.source_file, None);
        let cfg = config(r#"{"source": "a.js", "loc": true}"#);
        assert_eq!(cfg.positions().source, Some("a.js"));
    }

    #[test]
    fn test_unknown_feature_is_rejected() {
        assert!(ParseOptions::from_json(r#"{"ecmaFeatures": {"macros": true}}"#).is_err());
        assert!(ParseOptions::from_json(r#"{"somethingElse": 1}"#).is_ok());
    }
}
