//! Core types for the viewstate kernel.

pub mod directive;
pub mod graph;
pub mod instance;

pub use directive::{
    CompareVariant, Directive, DirectiveData, ExploreVariant, LandingVariant, Mode,
    ProjectsVariant, ResumeVariant, SkillsVariant, ThemeCatalog, ThemeName, TimelineVariant,
    ValuesVariant, DEFAULT_CONFIDENCE, MAX_HIGHLIGHTS,
};
pub use graph::{GraphEdge, Node, NodeId, NodeKind, Period, PortfolioGraph};
pub use instance::{
    InstanceKey, TransitionState, ViewInstanceState, ViewPhase, Z_ENTERING, Z_EXITING,
};
