//! Post-compile extension point for host build pipelines.

use anyhow::Result;

use crate::config::RevisionPlan;
use crate::revision::{RevisionBuilder, RevisionOutcome};

/// Step a host build pipeline invokes after its compile stage.
///
/// The host owns the lifecycle: this crate never registers itself anywhere,
/// it only hands the pipeline something callable.
pub trait PostCompileStep {
    /// Execute the step, returning its outcome.
    fn after_compile(&self) -> Result<RevisionOutcome>;
}

/// Post-compile step that runs a revision pass over a prepared plan.
#[derive(Debug)]
pub struct RevisionStep {
    plan: RevisionPlan,
}

impl RevisionStep {
    /// Wrap a plan into an invokable post-compile step.
    pub fn new(plan: RevisionPlan) -> Self {
        Self { plan }
    }

    /// The plan this step executes.
    pub fn plan(&self) -> &RevisionPlan {
        &self.plan
    }
}

impl PostCompileStep for RevisionStep {
    fn after_compile(&self) -> Result<RevisionOutcome> {
        RevisionBuilder::new(&self.plan).run()
    }
}
