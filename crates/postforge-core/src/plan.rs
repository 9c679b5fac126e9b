// ABOUTME: ExecutionPlan: an explicit dependency graph over the pipeline stages with ready-set queries.
// ABOUTME: The supervisor asks the plan what can run next instead of hardcoding stage order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stage::{StageName, StageStatus};

/// The fixed dependency template of the post pipeline.
pub const STANDARD_TEMPLATE: &[(StageName, &[StageName])] = &[
    (StageName::Tone, &[]),
    (StageName::Research, &[]),
    (StageName::Content, &[StageName::Tone, StageName::Research]),
    (StageName::Image, &[StageName::Content]),
];

/// Errors raised while building a plan from a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("stage {0} appears more than once in the template")]
    DuplicateStage(StageName),

    #[error("stage {stage} depends on {dependency}, which is not in the plan")]
    UnknownDependency {
        stage: StageName,
        dependency: StageName,
    },

    #[error("dependency cycle involving stage {0}")]
    Cycle(StageName),
}

/// A stage and the stages it must wait for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNode {
    pub stage: StageName,
    pub depends_on: Vec<StageName>,
}

/// Ordered DAG of stages. Node order is template order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    nodes: Vec<PlanNode>,
}

impl ExecutionPlan {
    /// Build the plan for the standard Tone/Research -> Content -> Image pipeline.
    pub fn standard() -> Self {
        // The standard template is statically acyclic and complete.
        Self {
            nodes: STANDARD_TEMPLATE
                .iter()
                .map(|(stage, deps)| PlanNode {
                    stage: *stage,
                    depends_on: deps.to_vec(),
                })
                .collect(),
        }
    }

    /// Build a plan from an arbitrary template, rejecting duplicate stages,
    /// dependencies on stages outside the template, and cycles.
    pub fn from_template(template: &[(StageName, &[StageName])]) -> Result<Self, PlanError> {
        let mut nodes: Vec<PlanNode> = Vec::with_capacity(template.len());
        for (stage, deps) in template {
            if nodes.iter().any(|n| n.stage == *stage) {
                return Err(PlanError::DuplicateStage(*stage));
            }
            nodes.push(PlanNode {
                stage: *stage,
                depends_on: deps.to_vec(),
            });
        }

        for node in &nodes {
            for dep in &node.depends_on {
                if !nodes.iter().any(|n| n.stage == *dep) {
                    return Err(PlanError::UnknownDependency {
                        stage: node.stage,
                        dependency: *dep,
                    });
                }
            }
        }

        let plan = Self { nodes };
        plan.check_acyclic()?;
        Ok(plan)
    }

    /// Stages in template order.
    pub fn stages(&self) -> impl Iterator<Item = StageName> + '_ {
        self.nodes.iter().map(|n| n.stage)
    }

    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, stage: StageName) -> bool {
        self.nodes.iter().any(|n| n.stage == stage)
    }

    /// Direct dependencies of a stage. Empty for unknown stages.
    pub fn dependencies(&self, stage: StageName) -> &[StageName] {
        self.nodes
            .iter()
            .find(|n| n.stage == stage)
            .map(|n| n.depends_on.as_slice())
            .unwrap_or(&[])
    }

    /// Pending stages whose dependencies have all completed.
    pub fn ready_set(&self, statuses: &BTreeMap<StageName, StageStatus>) -> Vec<StageName> {
        let status_of = |s: StageName| statuses.get(&s).copied().unwrap_or(StageStatus::Pending);
        self.nodes
            .iter()
            .filter(|n| status_of(n.stage) == StageStatus::Pending)
            .filter(|n| {
                n.depends_on
                    .iter()
                    .all(|d| status_of(*d) == StageStatus::Completed)
            })
            .map(|n| n.stage)
            .collect()
    }

    /// Every stage that depends on `stage`, directly or transitively, in
    /// template order.
    pub fn dependents_of(&self, stage: StageName) -> Vec<StageName> {
        let mut reached: Vec<StageName> = vec![stage];
        // Template order is a topological order for valid plans, but a
        // fixpoint loop keeps this correct for any order.
        loop {
            let before = reached.len();
            for node in &self.nodes {
                if !reached.contains(&node.stage)
                    && node.depends_on.iter().any(|d| reached.contains(d))
                {
                    reached.push(node.stage);
                }
            }
            if reached.len() == before {
                break;
            }
        }
        self.stages()
            .filter(|s| *s != stage && reached.contains(s))
            .collect()
    }

    /// True once every stage is completed, failed or skipped.
    pub fn is_resolved(&self, statuses: &BTreeMap<StageName, StageStatus>) -> bool {
        self.stages().all(|s| {
            statuses
                .get(&s)
                .map(|status| status.is_terminal())
                .unwrap_or(false)
        })
    }

    /// Stages grouped into batches that may run in parallel. Each batch only
    /// depends on stages in earlier batches.
    pub fn layers(&self) -> Vec<Vec<StageName>> {
        let mut placed: Vec<StageName> = Vec::new();
        let mut layers = Vec::new();
        while placed.len() < self.nodes.len() {
            let layer: Vec<StageName> = self
                .nodes
                .iter()
                .filter(|n| !placed.contains(&n.stage))
                .filter(|n| n.depends_on.iter().all(|d| placed.contains(d)))
                .map(|n| n.stage)
                .collect();
            if layer.is_empty() {
                break;
            }
            placed.extend(layer.iter().copied());
            layers.push(layer);
        }
        layers
    }

    fn check_acyclic(&self) -> Result<(), PlanError> {
        let placed: Vec<StageName> = self.layers().into_iter().flatten().collect();
        match self.stages().find(|s| !placed.contains(s)) {
            Some(stuck) => Err(PlanError::Cycle(stuck)),
            None => Ok(()),
        }
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::standard()
    }
}
