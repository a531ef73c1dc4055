//! Loop strategies: predicates deciding whether to request another model turn.

use std::sync::Arc;

use crate::types::ModelMessage;

/// Default turn budget for [`max_iterations`]-based loops.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// What a strategy sees after each model turn.
#[derive(Debug, Clone, Copy)]
pub struct AgentLoopState<'a> {
    /// Completed model turns so far.
    pub iteration_count: usize,
    pub messages: &'a [ModelMessage],
    pub finish_reason: Option<&'a str>,
}

/// `true` means "request another turn".
pub type AgentLoopStrategy = Arc<dyn Fn(&AgentLoopState<'_>) -> bool + Send + Sync>;

/// Continue while fewer than `max` turns have run.
pub fn max_iterations(max: usize) -> AgentLoopStrategy {
    Arc::new(move |state: &AgentLoopState<'_>| state.iteration_count < max)
}

/// Always continue on iteration 0; afterwards stop once the finish reason
/// is one of `stop_reasons`.
pub fn until_finish_reason<I, S>(stop_reasons: I) -> AgentLoopStrategy
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let stop_reasons: Vec<String> = stop_reasons.into_iter().map(Into::into).collect();
    Arc::new(move |state: &AgentLoopState<'_>| {
        if state.iteration_count == 0 {
            return true;
        }
        !state
            .finish_reason
            .is_some_and(|reason| stop_reasons.iter().any(|stop| stop == reason))
    })
}

/// Continue only if every strategy agrees. Evaluation stops at the first `false`.
pub fn combine_strategies(strategies: Vec<AgentLoopStrategy>) -> AgentLoopStrategy {
    Arc::new(move |state: &AgentLoopState<'_>| {
        strategies.iter().all(|strategy| strategy(state))
    })
}
