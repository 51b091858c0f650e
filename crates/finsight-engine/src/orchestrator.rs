//! Execution orchestrator
//!
//! Fans a list of analysis ids out to their strategies and gathers exactly
//! one result per distinct id, in request order.
//!
//! Ids that cannot run (unknown, not enough periods, no strategy bound) fail
//! fast without being dispatched. Everything else runs as its own tokio task
//! in a [`JoinSet`] owned by the run, so dropping the run cancels its tasks.
//! A FIFO semaphore bounds how many execute at once, each task has its own
//! timeout and an optional deadline bounds the whole run. When the deadline
//! passes, unfinished tasks are aborted and reported as timed out.

use crate::aggregator::ResultAggregator;
use crate::config::EngineConfig;
use crate::options::RunOptions;
use crate::registry::AnalysisRegistry;
use crate::strategy::{ExecutionContext, StrategySet};
use finsight_core::{
    AnalysisResult, Batch, FailureKind, FinancialDataset, Result, StrategyOutcome, StrategyTag,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{Instrument, debug, info, info_span, instrument, warn};

/// What a spawned analysis hands back: its outcome and how long it took
type TaskOutput = (StrategyOutcome, Duration);

/// Failure kind reported when a task runs out of time
fn timeout_kind(tag: StrategyTag) -> FailureKind {
    if tag.is_remote() {
        FailureKind::ProviderTimeout
    } else {
        FailureKind::ComputationError
    }
}

fn join_failure(error: &JoinError) -> StrategyOutcome {
    if error.is_panic() {
        StrategyOutcome::failure(FailureKind::ComputationError, "analysis panicked")
    } else {
        StrategyOutcome::failure(FailureKind::ComputationError, "analysis was cancelled")
    }
}

/// Per-id state between dispatch and collection
enum Slot {
    Settled(AnalysisResult),
    Running {
        id: String,
        tag: StrategyTag,
        task: task::Id,
    },
}

/// Runs analyses concurrently and assembles the batch
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<AnalysisRegistry>,
    strategies: StrategySet,
    aggregator: ResultAggregator,
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<AnalysisRegistry>,
        strategies: StrategySet,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            strategies,
            aggregator: ResultAggregator::new(config.confidence),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<AnalysisRegistry> {
        &self.registry
    }

    pub fn strategies(&self) -> &StrategySet {
        &self.strategies
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the requested analyses against the dataset
    ///
    /// The only error is a dataset that cannot be interpreted at all. Every
    /// per-analysis failure is reported inside the batch.
    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn run(
        &self,
        dataset: &FinancialDataset,
        ids: &[String],
        options: &RunOptions,
    ) -> Result<Batch> {
        dataset.validate()?;
        let run_started = Instant::now();

        let mut seen = HashSet::new();
        let ids: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();

        let language = options.language.unwrap_or(self.config.default_language);
        let ctx = Arc::new(ExecutionContext {
            language,
            profile: options.profile.clone(),
        });
        let shared_dataset = Arc::new(dataset.clone());
        let permits = options
            .max_in_flight
            .unwrap_or(self.config.max_in_flight)
            .max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        let deadline = options
            .deadline
            .or(self.config.default_deadline())
            .map(|d| run_started + d);
        let period_count = dataset.period_count();

        debug!(
            "Dispatching {} analyses ({permits} in flight, {} periods, language {})",
            ids.len(),
            period_count,
            language.code()
        );

        let mut tasks = JoinSet::new();
        let mut slots = Vec::with_capacity(ids.len());
        for id in ids {
            slots.push(self.dispatch(
                id,
                period_count,
                &shared_dataset,
                &ctx,
                &semaphore,
                &mut tasks,
            ));
        }

        let mut finished = HashMap::with_capacity(tasks.len());
        loop {
            let next = match deadline {
                Some(at) => match timeout_at(at, tasks.join_next_with_id()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tasks.abort_all();
                        break;
                    }
                },
                None => tasks.join_next_with_id().await,
            };
            match next {
                Some(Ok((task, output))) => {
                    finished.insert(task, output);
                }
                Some(Err(e)) => {
                    finished.insert(e.id(), (join_failure(&e), run_started.elapsed()));
                }
                None => break,
            }
        }

        let results: Vec<AnalysisResult> = slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Settled(result) => result,
                Slot::Running { id, tag, task } => {
                    let (outcome, elapsed) = finished.remove(&task).unwrap_or_else(|| {
                        let budget = deadline.map_or(Duration::ZERO, |at| at - run_started);
                        (
                            StrategyOutcome::failure(
                                timeout_kind(tag),
                                "run deadline passed before the analysis finished",
                            ),
                            budget,
                        )
                    });
                    self.aggregator.wrap(&id, Some(tag), outcome, elapsed)
                }
            })
            .collect();

        for result in &results {
            if let Some(failure) = &result.provenance.failure {
                warn!(
                    "Analysis '{}' failed ({}): {}",
                    result.definition_id, failure.kind, failure.message
                );
            }
        }

        let batch = self.aggregator.assemble(results);
        info!(
            "Run finished: {} analyses, {} succeeded, {} failed in {}ms",
            batch.len(),
            batch.succeeded().count(),
            batch.failed().count(),
            run_started.elapsed().as_millis()
        );
        Ok(batch)
    }

    /// Settle an id immediately or spawn its task into `tasks`
    fn dispatch(
        &self,
        id: &str,
        period_count: usize,
        dataset: &Arc<FinancialDataset>,
        ctx: &Arc<ExecutionContext>,
        semaphore: &Arc<Semaphore>,
        tasks: &mut JoinSet<TaskOutput>,
    ) -> Slot {
        let fail_fast = |tag: Option<StrategyTag>, kind: FailureKind, message: String| {
            Slot::Settled(self.aggregator.wrap(
                id,
                tag,
                StrategyOutcome::failure(kind, message),
                Duration::ZERO,
            ))
        };

        let Some(definition) = self.registry.find_by_id(id) else {
            return fail_fast(
                None,
                FailureKind::DefinitionNotFound,
                format!("no analysis named '{id}'"),
            );
        };
        let tag = definition.strategy();

        if definition.required_years() as usize > period_count {
            return fail_fast(
                Some(tag),
                FailureKind::InsufficientData,
                format!(
                    "needs {} reporting periods, dataset has {period_count}",
                    definition.required_years()
                ),
            );
        }

        let Some(strategy) = self.strategies.get(tag) else {
            return fail_fast(
                Some(tag),
                FailureKind::ProviderUnavailable,
                format!("no strategy bound for {tag}"),
            );
        };

        let definition = definition.clone();
        let dataset = Arc::clone(dataset);
        let ctx = Arc::clone(ctx);
        let semaphore = Arc::clone(semaphore);
        let task_timeout = self.config.task_timeout();
        let span = info_span!("analysis", analysis_id = %id, strategy = %tag);
        let started = Instant::now();

        let handle = tasks.spawn(
            async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (
                        StrategyOutcome::failure(
                            FailureKind::ComputationError,
                            "execution slots were closed",
                        ),
                        started.elapsed(),
                    );
                };
                debug!("Started");

                let execution = strategy.execute(&dataset, &definition, &ctx);
                let outcome = match timeout(task_timeout, execution).await {
                    Ok(outcome) => {
                        debug!("Finished, success={}", outcome.is_success());
                        outcome
                    }
                    Err(_) => StrategyOutcome::failure(
                        timeout_kind(tag),
                        format!("analysis did not finish within {task_timeout:?}"),
                    ),
                };
                (outcome, started.elapsed())
            }
            .instrument(span),
        );

        Slot::Running {
            id: id.to_string(),
            tag,
            task: handle.id(),
        }
    }
}
