//! Directive types: the authoritative description of what the UI shows.
//!
//! A `Directive` is a tagged union on `mode`, each arm carrying mode-specific
//! data (variant, narration, highlights, theme, confidence). Directives are
//! produced by LLM tool calls, menu selections, or URL decoding, and replace
//! the single current directive in the store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::graph::NodeId;

/// Maximum number of highlight node ids a directive may carry.
pub const MAX_HIGHLIGHTS: usize = 12;

/// Default confidence when a directive omits one.
pub const DEFAULT_CONFIDENCE: f64 = 0.7;

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

/// Top-level view selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Career timeline.
    Timeline,
    /// Project grid / radial / case study.
    Projects,
    /// Skills matrix or clusters.
    Skills,
    /// Personal values.
    Values,
    /// Side-by-side comparison.
    Compare,
    /// Free graph exploration.
    Explore,
    /// Neutral landing view.
    Landing,
    /// Résumé view.
    Resume,
}

impl Mode {
    /// Parse mode from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "timeline" => Some(Self::Timeline),
            "projects" => Some(Self::Projects),
            "skills" => Some(Self::Skills),
            "values" => Some(Self::Values),
            "compare" => Some(Self::Compare),
            "explore" => Some(Self::Explore),
            "landing" => Some(Self::Landing),
            "resume" => Some(Self::Resume),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeline => write!(f, "timeline"),
            Self::Projects => write!(f, "projects"),
            Self::Skills => write!(f, "skills"),
            Self::Values => write!(f, "values"),
            Self::Compare => write!(f, "compare"),
            Self::Explore => write!(f, "explore"),
            Self::Landing => write!(f, "landing"),
            Self::Resume => write!(f, "resume"),
        }
    }
}

macro_rules! variant_enum {
    ($(#[$doc:meta])* $name:ident { $($(#[$vdoc:meta])* $variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vdoc])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Wire name of the variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

variant_enum! {
    /// Landing mode variants.
    LandingVariant {
        /// Neutral ambient landing.
        Neutral => "neutral",
    }
}

variant_enum! {
    /// Timeline mode variants.
    TimelineVariant {
        /// Chronological force-graph flow.
        Flow => "flow",
        /// Era lanes grouped by node kind.
        Eras => "eras",
    }
}

variant_enum! {
    /// Projects mode variants.
    ProjectsVariant {
        /// Card grid.
        Grid => "grid",
        /// Radial card layout.
        Radial => "radial",
        /// Single project case study.
        CaseStudy => "case-study",
    }
}

variant_enum! {
    /// Skills mode variants.
    SkillsVariant {
        /// Skill x project matrix.
        Matrix => "matrix",
        /// Force-clustered skills.
        Clusters => "clusters",
    }
}

variant_enum! {
    /// Values mode variants.
    ValuesVariant {
        /// Orbiting value nodes.
        Orbit => "orbit",
        /// Plain value list.
        List => "list",
    }
}

variant_enum! {
    /// Compare mode variants.
    CompareVariant {
        /// Two panes side by side.
        SideBySide => "side-by-side",
        /// Overlaid panes.
        Overlay => "overlay",
    }
}

variant_enum! {
    /// Explore mode variants.
    ExploreVariant {
        /// Whole-graph exploration.
        Graph => "graph",
        /// Focused on highlighted nodes.
        Focus => "focus",
    }
}

variant_enum! {
    /// Resume mode variants.
    ResumeVariant {
        /// Full résumé.
        Full => "full",
        /// Condensed summary.
        Summary => "summary",
    }
}

/// Name of a color theme.
///
/// The set of known names is not a closed enum: it is supplied by the theming
/// collaborator through a [`ThemeCatalog`] and validated at the URL decode
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeName(String);

impl ThemeName {
    /// Create a new theme name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ThemeName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Injected catalog of known theme names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeCatalog {
    names: BTreeSet<ThemeName>,
}

impl ThemeCatalog {
    /// Create a catalog from a list of theme names.
    pub fn new<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ThemeName>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the catalog contains a name.
    pub fn contains(&self, name: &ThemeName) -> bool {
        self.names.contains(name)
    }

    /// All known theme names, ordered.
    pub fn theme_names(&self) -> impl Iterator<Item = &ThemeName> {
        self.names.iter()
    }

    /// Number of known themes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Mode-specific directive payload.
///
/// `theme` is optional in memory; the URL decode boundary requires it.
/// Unknown fields survive a round trip through `extra` so newer producers
/// stay compatible with older consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveData<V> {
    /// Mode-specific sub-selection.
    pub variant: V,
    /// Narration text shown alongside the view.
    #[serde(default)]
    pub narration: String,
    /// Ordered node ids to emphasize (capped at [`MAX_HIGHLIGHTS`]).
    #[serde(default)]
    pub highlights: Vec<NodeId>,
    /// Active theme name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeName>,
    /// LLM confidence in this directive [0, 1].
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Optional free-form rendering hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<serde_json::Value>,
    /// Forward-compatible passthrough of unknown fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl<V> DirectiveData<V> {
    /// Create a payload with defaults for everything but the variant.
    pub fn new(variant: V) -> Self {
        Self {
            variant,
            narration: String::new(),
            highlights: Vec::new(),
            theme: None,
            confidence: DEFAULT_CONFIDENCE,
            hints: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the narration.
    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = narration.into();
        self
    }

    /// Set the highlights.
    pub fn with_highlights(mut self, highlights: Vec<NodeId>) -> Self {
        self.highlights = highlights;
        self
    }

    /// Set the theme.
    pub fn with_theme(mut self, theme: ThemeName) -> Self {
        self.theme = Some(theme);
        self
    }

    /// Set the confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// The authoritative description of what the UI should display.
///
/// Wire shape: `{"mode": "<mode>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "data", rename_all = "lowercase")]
pub enum Directive {
    /// Career timeline.
    Timeline(DirectiveData<TimelineVariant>),
    /// Project views.
    Projects(DirectiveData<ProjectsVariant>),
    /// Skills views.
    Skills(DirectiveData<SkillsVariant>),
    /// Values views.
    Values(DirectiveData<ValuesVariant>),
    /// Comparison views.
    Compare(DirectiveData<CompareVariant>),
    /// Graph exploration.
    Explore(DirectiveData<ExploreVariant>),
    /// Landing view.
    Landing(DirectiveData<LandingVariant>),
    /// Résumé view.
    Resume(DirectiveData<ResumeVariant>),
}

/// Run a body against the data payload of any directive arm.
macro_rules! each_mode {
    ($value:expr, $data:pat => $body:expr) => {
        match $value {
            Directive::Timeline($data) => $body,
            Directive::Projects($data) => $body,
            Directive::Skills($data) => $body,
            Directive::Values($data) => $body,
            Directive::Compare($data) => $body,
            Directive::Explore($data) => $body,
            Directive::Landing($data) => $body,
            Directive::Resume($data) => $body,
        }
    };
}

impl Directive {
    /// Neutral landing directive with the given theme.
    pub fn landing(theme: ThemeName) -> Self {
        Self::Landing(DirectiveData::new(LandingVariant::Neutral).with_theme(theme))
    }

    /// The directive's mode.
    pub fn mode(&self) -> Mode {
        match self {
            Self::Timeline(_) => Mode::Timeline,
            Self::Projects(_) => Mode::Projects,
            Self::Skills(_) => Mode::Skills,
            Self::Values(_) => Mode::Values,
            Self::Compare(_) => Mode::Compare,
            Self::Explore(_) => Mode::Explore,
            Self::Landing(_) => Mode::Landing,
            Self::Resume(_) => Mode::Resume,
        }
    }

    /// Wire name of the directive's variant.
    pub fn variant_name(&self) -> &'static str {
        each_mode!(self, d => d.variant.as_str())
    }

    /// Navigation key used for the push-vs-replace history decision.
    pub fn nav_key(&self) -> String {
        format!("{}:{}", self.mode(), self.variant_name())
    }

    /// The directive's narration.
    pub fn narration(&self) -> &str {
        each_mode!(self, d => &d.narration)
    }

    /// Replace the narration.
    pub fn set_narration(&mut self, narration: impl Into<String>) {
        let narration = narration.into();
        each_mode!(self, d => d.narration = narration)
    }

    /// The directive's highlights.
    pub fn highlights(&self) -> &[NodeId] {
        each_mode!(self, d => &d.highlights)
    }

    /// The directive's theme, if present.
    pub fn theme(&self) -> Option<&ThemeName> {
        each_mode!(self, d => d.theme.as_ref())
    }

    /// Replace the theme.
    pub fn set_theme(&mut self, theme: ThemeName) {
        each_mode!(self, d => d.theme = Some(theme))
    }

    /// The directive's confidence.
    pub fn confidence(&self) -> f64 {
        each_mode!(self, d => d.confidence)
    }

    /// Normalize the payload: clamp confidence to [0, 1] and cap highlights
    /// at [`MAX_HIGHLIGHTS`].
    pub fn normalize(&mut self) {
        each_mode!(self, d => {
            d.confidence = d.confidence.clamp(0.0, 1.0);
            d.highlights.truncate(MAX_HIGHLIGHTS);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_round_trip() {
        for mode in [
            Mode::Timeline,
            Mode::Projects,
            Mode::Skills,
            Mode::Values,
            Mode::Compare,
            Mode::Explore,
            Mode::Landing,
            Mode::Resume,
        ] {
            assert_eq!(Mode::from_str(&mode.to_string()), Some(mode));
        }
        assert_eq!(Mode::from_str("unknown"), None);
    }

    #[test]
    fn test_wire_shape() {
        let directive = Directive::landing(ThemeName::from("cold"));
        let value = serde_json::to_value(&directive).unwrap();
        assert_eq!(value["mode"], "landing");
        assert_eq!(value["data"]["variant"], "neutral");
        assert_eq!(value["data"]["theme"], "cold");
    }

    #[test]
    fn test_case_study_wire_name() {
        let directive = Directive::Projects(DirectiveData::new(ProjectsVariant::CaseStudy));
        let value = serde_json::to_value(&directive).unwrap();
        assert_eq!(value["data"]["variant"], "case-study");
        assert_eq!(directive.nav_key(), "projects:case-study");
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let value = json!({
            "mode": "explore",
            "data": {
                "variant": "graph",
                "theme": "warm",
                "camera": {"zoom": 2.5}
            }
        });

        let directive: Directive = serde_json::from_value(value).unwrap();
        let Directive::Explore(data) = &directive else {
            panic!("expected explore");
        };
        assert_eq!(data.extra["camera"]["zoom"], 2.5);

        // And they survive re-serialization.
        let round = serde_json::to_value(&directive).unwrap();
        assert_eq!(round["data"]["camera"]["zoom"], 2.5);
    }

    #[test]
    fn test_defaults_on_deserialize() {
        let value = json!({
            "mode": "skills",
            "data": {"variant": "matrix"}
        });
        let directive: Directive = serde_json::from_value(value).unwrap();
        assert_eq!(directive.narration(), "");
        assert!(directive.highlights().is_empty());
        assert_eq!(directive.confidence(), DEFAULT_CONFIDENCE);
        assert_eq!(directive.theme(), None);
    }

    #[test]
    fn test_normalize_caps_highlights_and_confidence() {
        let highlights: Vec<NodeId> = (0..20).map(|i| NodeId::from(format!("n{i}").as_str())).collect();
        let mut directive = Directive::Explore(
            DirectiveData::new(ExploreVariant::Focus)
                .with_highlights(highlights)
                .with_confidence(1.4),
        );
        directive.normalize();
        assert_eq!(directive.highlights().len(), MAX_HIGHLIGHTS);
        assert_eq!(directive.confidence(), 1.0);
    }

    #[test]
    fn test_theme_catalog() {
        let catalog = ThemeCatalog::new(["cold", "warm"]);
        assert!(catalog.contains(&ThemeName::from("cold")));
        assert!(!catalog.contains(&ThemeName::from("neon")));
        assert_eq!(catalog.len(), 2);
        let names: Vec<&str> = catalog.theme_names().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["cold", "warm"]);
    }

    #[test]
    fn test_set_theme_and_narration() {
        let mut directive = Directive::landing(ThemeName::from("cold"));
        directive.set_theme(ThemeName::from("warm"));
        assert_eq!(directive.theme(), Some(&ThemeName::from("warm")));
        directive.set_narration("hello");
        assert_eq!(directive.narration(), "hello");
    }
}
