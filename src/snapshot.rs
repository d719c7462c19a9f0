//! Data snapshot builder.
//!
//! `build_snapshot` is a pure function from (graph, directive) to the
//! render-ready data of the current mode. Identical inputs always produce a
//! deeply equal snapshot; the transition manager relies on that for
//! change detection via canonical hashing. Snapshots are never persisted and
//! live exactly as long as the view instance that owns them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{
    CompareVariant, Directive, ExploreVariant, LandingVariant, Node, NodeId, NodeKind, Period,
    PortfolioGraph, ProjectsVariant, ResumeVariant, SkillsVariant, TimelineVariant, ValuesVariant,
};

/// A node prepared for the force-directed graph renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceNode {
    /// Node id.
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Node kind, drives color/size.
    pub kind: NodeKind,
    /// Whether the directive calls this node out.
    pub highlighted: bool,
}

/// A link prepared for the force-directed graph renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceLink {
    /// Source node id.
    pub source: NodeId,
    /// Target node id.
    pub target: NodeId,
    /// Relation strength.
    pub weight: f32,
}

/// Force-graph payload: nodes, links, and the ordered focus list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceGraphData {
    /// Nodes, ordered by id.
    pub nodes: Vec<ForceNode>,
    /// Links whose endpoints are both present.
    pub links: Vec<ForceLink>,
    /// Highlighted ids present in this subgraph, directive order.
    pub focus: Vec<NodeId>,
}

/// One entry in a timeline lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Node id.
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Covered period.
    pub period: Period,
    /// Whether the directive calls this entry out.
    pub highlighted: bool,
}

/// A lane of timeline entries for one node kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineLane {
    /// Kind of the entries in this lane.
    pub kind: NodeKind,
    /// Entries sorted by start year, then id.
    pub entries: Vec<TimelineEntry>,
}

/// One cell of the skill x project matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    /// Skill axis id.
    pub skill: NodeId,
    /// Project axis id.
    pub project: NodeId,
    /// Relation strength from the graph edge.
    pub strength: f32,
}

/// The skill x project matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatrix {
    /// Skill axis, ordered by id.
    pub skills: Vec<NodeId>,
    /// Project axis, ordered by id.
    pub projects: Vec<NodeId>,
    /// Cells for adjacent (skill, project) pairs only.
    pub cells: Vec<MatrixCell>,
}

/// A project card for the grid and radial layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCard {
    /// Project node id.
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Card blurb.
    pub summary: Option<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Adjacent skill ids, ordered.
    pub skills: Vec<NodeId>,
    /// Whether the directive calls this project out.
    pub highlighted: bool,
}

/// Case-study view model: one subject project in depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStudyView {
    /// The project under study, if the graph has any project at all.
    pub subject: Option<ProjectCard>,
    /// Projects sharing at least one skill with the subject.
    pub related: Vec<ProjectCard>,
}

/// One pane of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparePane {
    /// Anchor node the pane is built around.
    pub anchor: Option<NodeId>,
    /// Anchor plus its neighbors.
    pub nodes: Vec<ForceNode>,
}

/// Comparison payload: two panes and their shared neighbors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareView {
    /// Left pane, built around the first highlight.
    pub left: ComparePane,
    /// Right pane, built around the second highlight.
    pub right: ComparePane,
    /// Node ids appearing in both panes.
    pub shared: Vec<NodeId>,
}

/// One résumé item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeItem {
    /// Node id.
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Covered period, when applicable.
    pub period: Option<Period>,
    /// Short description.
    pub summary: Option<String>,
}

/// One résumé section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSection {
    /// Section title.
    pub title: String,
    /// Node kind backing this section.
    pub kind: NodeKind,
    /// Items, ordered by start year descending then id.
    pub items: Vec<ResumeItem>,
}

/// Résumé view model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeView {
    /// Sections in render order.
    pub sections: Vec<ResumeSection>,
}

/// Render-ready data derived from (graph, directive), keyed by view shape.
///
/// Owned exclusively by the view instance it was built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum DataSnapshot {
    /// Force-directed graph payload.
    Force(ForceGraphData),
    /// Timeline lanes.
    Timeline {
        /// Lanes in render order.
        lanes: Vec<TimelineLane>,
    },
    /// Skill x project matrix.
    Matrix(SkillMatrix),
    /// Project card list.
    Cards {
        /// Cards, ordered by id.
        cards: Vec<ProjectCard>,
    },
    /// Case-study view model.
    CaseStudy(CaseStudyView),
    /// Comparison panes.
    Compare(CompareView),
    /// Plain list of value nodes.
    Values {
        /// Value nodes, ordered by id.
        values: Vec<ForceNode>,
    },
    /// Résumé view model.
    Resume(ResumeView),
}

impl DataSnapshot {
    /// A values-list snapshot; handy as a minimal fixture.
    pub fn value_list(values: Vec<ForceNode>) -> Self {
        Self::Values { values }
    }
}

/// Build the snapshot for a directive against the portfolio graph.
///
/// Pure and deterministic: no clocks, no randomness, BTree-ordered
/// traversals only.
pub fn build_snapshot(graph: &PortfolioGraph, directive: &Directive) -> DataSnapshot {
    let highlights = directive.highlights();
    match directive {
        Directive::Landing(data) => match data.variant {
            LandingVariant::Neutral => {
                DataSnapshot::Force(force_subgraph(graph, |_| true, highlights))
            }
        },
        Directive::Explore(data) => match data.variant {
            ExploreVariant::Graph => {
                DataSnapshot::Force(force_subgraph(graph, |_| true, highlights))
            }
            ExploreVariant::Focus => DataSnapshot::Force(focus_subgraph(graph, highlights)),
        },
        Directive::Timeline(data) => match data.variant {
            TimelineVariant::Flow => DataSnapshot::Force(force_subgraph(
                graph,
                |n| {
                    matches!(
                        n.kind,
                        NodeKind::Experience | NodeKind::Education | NodeKind::Project
                    )
                },
                highlights,
            )),
            TimelineVariant::Eras => DataSnapshot::Timeline {
                lanes: timeline_lanes(graph, highlights),
            },
        },
        Directive::Projects(data) => match data.variant {
            ProjectsVariant::Grid | ProjectsVariant::Radial => DataSnapshot::Cards {
                cards: project_cards(graph, highlights),
            },
            ProjectsVariant::CaseStudy => DataSnapshot::CaseStudy(case_study(graph, highlights)),
        },
        Directive::Skills(data) => match data.variant {
            SkillsVariant::Matrix => DataSnapshot::Matrix(skill_matrix(graph)),
            SkillsVariant::Clusters => DataSnapshot::Force(force_subgraph(
                graph,
                |n| matches!(n.kind, NodeKind::Skill | NodeKind::Project),
                highlights,
            )),
        },
        Directive::Values(data) => match data.variant {
            ValuesVariant::Orbit => DataSnapshot::Force(values_orbit(graph, highlights)),
            ValuesVariant::List => DataSnapshot::Values {
                values: graph
                    .nodes_of_kind(NodeKind::Value)
                    .into_iter()
                    .map(|n| force_node(n, highlights))
                    .collect(),
            },
        },
        Directive::Compare(data) => match data.variant {
            CompareVariant::SideBySide | CompareVariant::Overlay => {
                DataSnapshot::Compare(compare_view(graph, highlights))
            }
        },
        Directive::Resume(data) => DataSnapshot::Resume(resume_view(graph, data.variant)),
    }
}

fn force_node(node: &Node, highlights: &[NodeId]) -> ForceNode {
    ForceNode {
        id: node.id.clone(),
        label: node.label.clone(),
        kind: node.kind,
        highlighted: highlights.contains(&node.id),
    }
}

fn force_subgraph<F>(graph: &PortfolioGraph, keep: F, highlights: &[NodeId]) -> ForceGraphData
where
    F: Fn(&Node) -> bool,
{
    let nodes: Vec<ForceNode> = graph
        .nodes()
        .filter(|n| keep(n))
        .map(|n| force_node(n, highlights))
        .collect();

    let kept: BTreeSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
    let links: Vec<ForceLink> = graph
        .edges()
        .iter()
        .filter(|e| kept.contains(&e.source) && kept.contains(&e.target))
        .map(|e| ForceLink {
            source: e.source.clone(),
            target: e.target.clone(),
            weight: e.weight,
        })
        .collect();

    let focus: Vec<NodeId> = highlights
        .iter()
        .filter(|id| kept.contains(id))
        .cloned()
        .collect();

    ForceGraphData {
        nodes,
        links,
        focus,
    }
}

fn focus_subgraph(graph: &PortfolioGraph, highlights: &[NodeId]) -> ForceGraphData {
    let mut keep: BTreeSet<NodeId> = BTreeSet::new();
    for id in highlights {
        if graph.contains(id) {
            keep.insert(id.clone());
            keep.extend(graph.neighbors(id));
        }
    }
    force_subgraph(graph, |n| keep.contains(&n.id), highlights)
}

fn values_orbit(graph: &PortfolioGraph, highlights: &[NodeId]) -> ForceGraphData {
    let mut keep: BTreeSet<NodeId> = BTreeSet::new();
    for node in graph.nodes_of_kind(NodeKind::Value) {
        keep.insert(node.id.clone());
        keep.extend(graph.neighbors(&node.id));
    }
    force_subgraph(graph, |n| keep.contains(&n.id), highlights)
}

fn timeline_lanes(graph: &PortfolioGraph, highlights: &[NodeId]) -> Vec<TimelineLane> {
    [NodeKind::Experience, NodeKind::Education]
        .into_iter()
        .map(|kind| {
            let mut entries: Vec<TimelineEntry> = graph
                .nodes_of_kind(kind)
                .into_iter()
                .filter_map(|n| {
                    n.period.map(|period| TimelineEntry {
                        id: n.id.clone(),
                        label: n.label.clone(),
                        period,
                        highlighted: highlights.contains(&n.id),
                    })
                })
                .collect();
            entries.sort_by(|a, b| {
                a.period
                    .start_year
                    .cmp(&b.period.start_year)
                    .then_with(|| a.id.cmp(&b.id))
            });
            TimelineLane { kind, entries }
        })
        .collect()
}

fn skill_matrix(graph: &PortfolioGraph) -> SkillMatrix {
    let skills: Vec<NodeId> = graph
        .nodes_of_kind(NodeKind::Skill)
        .into_iter()
        .map(|n| n.id.clone())
        .collect();
    let projects: Vec<NodeId> = graph
        .nodes_of_kind(NodeKind::Project)
        .into_iter()
        .map(|n| n.id.clone())
        .collect();

    let mut cells = Vec::new();
    for skill in &skills {
        for project in &projects {
            if let Some(strength) = graph.edge_weight(skill, project) {
                cells.push(MatrixCell {
                    skill: skill.clone(),
                    project: project.clone(),
                    strength,
                });
            }
        }
    }

    SkillMatrix {
        skills,
        projects,
        cells,
    }
}

fn project_card(graph: &PortfolioGraph, node: &Node, highlights: &[NodeId]) -> ProjectCard {
    let skills: Vec<NodeId> = graph
        .neighbors(&node.id)
        .into_iter()
        .filter(|id| {
            graph
                .node(id)
                .map(|n| n.kind == NodeKind::Skill)
                .unwrap_or(false)
        })
        .collect();

    ProjectCard {
        id: node.id.clone(),
        label: node.label.clone(),
        summary: node.summary.clone(),
        tags: node.tags.clone(),
        skills,
        highlighted: highlights.contains(&node.id),
    }
}

fn project_cards(graph: &PortfolioGraph, highlights: &[NodeId]) -> Vec<ProjectCard> {
    graph
        .nodes_of_kind(NodeKind::Project)
        .into_iter()
        .map(|n| project_card(graph, n, highlights))
        .collect()
}

fn case_study(graph: &PortfolioGraph, highlights: &[NodeId]) -> CaseStudyView {
    // Subject: first highlighted project, else the first project in the graph.
    let subject_node = highlights
        .iter()
        .filter_map(|id| graph.node(id))
        .find(|n| n.kind == NodeKind::Project)
        .or_else(|| graph.nodes_of_kind(NodeKind::Project).into_iter().next());

    let Some(subject_node) = subject_node else {
        return CaseStudyView {
            subject: None,
            related: Vec::new(),
        };
    };

    let subject = project_card(graph, subject_node, highlights);
    let subject_skills: BTreeSet<&NodeId> = subject.skills.iter().collect();

    let related: Vec<ProjectCard> = graph
        .nodes_of_kind(NodeKind::Project)
        .into_iter()
        .filter(|n| n.id != subject.id)
        .map(|n| project_card(graph, n, highlights))
        .filter(|card| card.skills.iter().any(|s| subject_skills.contains(s)))
        .collect();

    CaseStudyView {
        subject: Some(subject),
        related,
    }
}

fn compare_pane(graph: &PortfolioGraph, anchor: Option<&NodeId>, highlights: &[NodeId]) -> ComparePane {
    let Some(anchor) = anchor.filter(|id| graph.contains(id)) else {
        return ComparePane {
            anchor: None,
            nodes: Vec::new(),
        };
    };

    let mut members: BTreeSet<NodeId> = graph.neighbors(anchor).into_iter().collect();
    members.insert(anchor.clone());

    let nodes: Vec<ForceNode> = members
        .iter()
        .filter_map(|id| graph.node(id))
        .map(|n| force_node(n, highlights))
        .collect();

    ComparePane {
        anchor: Some(anchor.clone()),
        nodes,
    }
}

fn compare_view(graph: &PortfolioGraph, highlights: &[NodeId]) -> CompareView {
    let left = compare_pane(graph, highlights.first(), highlights);
    let right = compare_pane(graph, highlights.get(1), highlights);

    let left_ids: BTreeSet<&NodeId> = left.nodes.iter().map(|n| &n.id).collect();
    let shared: Vec<NodeId> = right
        .nodes
        .iter()
        .map(|n| &n.id)
        .filter(|id| left_ids.contains(*id))
        .cloned()
        .collect();

    CompareView {
        left,
        right,
        shared,
    }
}

fn resume_section(graph: &PortfolioGraph, title: &str, kind: NodeKind) -> ResumeSection {
    let mut items: Vec<ResumeItem> = graph
        .nodes_of_kind(kind)
        .into_iter()
        .map(|n| ResumeItem {
            id: n.id.clone(),
            label: n.label.clone(),
            period: n.period,
            summary: n.summary.clone(),
        })
        .collect();
    // Most recent first; undated items sink to the end.
    items.sort_by(|a, b| {
        let a_start = a.period.map(|p| p.start_year).unwrap_or(i32::MIN);
        let b_start = b.period.map(|p| p.start_year).unwrap_or(i32::MIN);
        b_start.cmp(&a_start).then_with(|| a.id.cmp(&b.id))
    });
    ResumeSection {
        title: title.to_string(),
        kind,
        items,
    }
}

fn resume_view(graph: &PortfolioGraph, variant: ResumeVariant) -> ResumeView {
    let sections = match variant {
        ResumeVariant::Full => vec![
            resume_section(graph, "Experience", NodeKind::Experience),
            resume_section(graph, "Education", NodeKind::Education),
            resume_section(graph, "Projects", NodeKind::Project),
            resume_section(graph, "Skills", NodeKind::Skill),
        ],
        ResumeVariant::Summary => vec![
            resume_section(graph, "Experience", NodeKind::Experience),
            resume_section(graph, "Skills", NodeKind::Skill),
        ],
    };
    ResumeView { sections }
}
