/*!
The parallel parse coordinator.

Some commands arrive with many independent tokens to parse against many
independent parsers; the coordinator fans that work out across tasks when
the batch is large enough to be worth it, bounded by a semaphore, and folds
the results back into a single [`Arguments`] map.

Failure is always soft here. A parse failure, a timeout, and a panicked task
all produce the same observable outcome: the corresponding name is simply
absent from the result map. Callers that need hard errors parse through
[`Signature::parse`][crate::Signature::parse] instead.
*/

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::warn;

use crate::access::CallerRef;
use crate::arguments::Arguments;
use crate::outcome::ParseOutcome;
use crate::parser::ArcParser;

/// Tuning for a [`ParseCoordinator`].
#[derive(Clone)]
pub struct CoordinatorConfig {
    /// Batches smaller than this parse sequentially on the calling task.
    pub threshold: usize,
    /// Upper bound on concurrently running parse tasks.
    pub max_workers: usize,
    /// Bounded wait applied to each spawned parse.
    pub task_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            threshold: 4,
            max_workers: 8,
            task_timeout: Duration::from_millis(2000),
        }
    }
}

/// One unit of work for the coordinator: parse `token` with `parser` and
/// store the result under `name`.
#[derive(Clone)]
pub struct ParseTask {
    name: String,
    token: String,
    parser: ArcParser,
}

impl ParseTask {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        token: impl Into<String>,
        parser: ArcParser,
    ) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
            parser,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

/**
Fans independent parse tasks out across bounded tokio tasks.

The coordinator is stateless between batches and cheap to clone; share one
per engine, or build one per call, as convenient.
*/
#[derive(Clone, Default)]
pub struct ParseCoordinator {
    config: CoordinatorConfig,
}

impl ParseCoordinator {
    #[must_use]
    pub fn new(config: CoordinatorConfig) -> Self {
        Self { config }
    }

    /**
    Parse every task in `tasks` and collect the successes into an
    [`Arguments`] map keyed by task name.

    Batches below the configured threshold run sequentially; larger batches
    spawn one tokio task per entry, at most `max_workers` running at once.
    Order of completion doesn't matter, since each task owns a distinct name.
    */
    pub async fn parse_batch(&self, tasks: Vec<ParseTask>, caller: &CallerRef) -> Arguments {
        if tasks.len() < self.config.threshold {
            return self.parse_sequential(tasks, caller);
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let task_timeout = self.config.task_timeout;

        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let semaphore = Arc::clone(&semaphore);
                let caller = Arc::clone(caller);

                tokio::spawn(async move {
                    // acquire never fails: the semaphore is never closed
                    let Ok(_permit) = semaphore.acquire().await else {
                        return None;
                    };

                    let name = task.name;

                    // parsers are synchronous, so the bounded wait only
                    // works with the parse running off-task; a parse that
                    // outlives the timeout is abandoned on the blocking
                    // pool and its result discarded
                    let parse = tokio::task::spawn_blocking(move || {
                        task.parser.parse_erased(&task.token, caller.as_ref())
                    });

                    match timeout(task_timeout, parse).await {
                        Ok(Ok(ParseOutcome::Success(Some(value)))) => Some((name, value)),
                        Ok(Ok(ParseOutcome::Success(None))) => None,
                        Ok(Ok(ParseOutcome::Failure(message))) => {
                            warn!(name = %name, %message, "batched parse failed; omitting");
                            None
                        }
                        Ok(Err(error)) => {
                            warn!(name = %name, %error, "batched parse panicked; omitting");
                            None
                        }
                        Err(_) => {
                            warn!(name = %name, "batched parse timed out; omitting");
                            None
                        }
                    }
                })
            })
            .collect();

        let mut results = Arguments::new();

        for handle in handles {
            match handle.await {
                Ok(Some((name, value))) => results.insert(&name, value),
                Ok(None) => {}
                // a panicked parser costs its own entry, nothing else
                Err(error) => warn!(%error, "batched parse task panicked; omitting"),
            }
        }

        results
    }

    fn parse_sequential(&self, tasks: Vec<ParseTask>, caller: &CallerRef) -> Arguments {
        let mut results = Arguments::new();

        for task in tasks {
            match task.parser.parse_erased(&task.token, caller.as_ref()) {
                ParseOutcome::Success(Some(value)) => results.insert(&task.name, value),
                ParseOutcome::Success(None) => {}
                ParseOutcome::Failure(message) => {
                    warn!(name = %task.name, %message, "parse failed; omitting");
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{CoordinatorConfig, ParseCoordinator, ParseTask};
    use crate::access::{Caller, CallerRef};
    use crate::impls::{BoolParser, IntParser, StringParser};
    use crate::outcome::ParseOutcome;
    use crate::parser::{ArgumentParser, erase};

    struct Nobody;
    impl Caller for Nobody {}

    fn nobody() -> CallerRef {
        Arc::new(Nobody)
    }

    #[tokio::test]
    async fn small_batches_parse_sequentially() {
        let coordinator = ParseCoordinator::default();

        let results = coordinator
            .parse_batch(
                vec![
                    ParseTask::new("count", "42", erase(IntParser)),
                    ParseTask::new("enabled", "yes", erase(BoolParser)),
                ],
                &nobody(),
            )
            .await;

        assert_eq!(results.get::<i32>("count"), Some(&42));
        assert_eq!(results.get::<bool>("enabled"), Some(&true));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn large_batches_parse_in_parallel() {
        let coordinator = ParseCoordinator::new(CoordinatorConfig {
            threshold: 2,
            ..CoordinatorConfig::default()
        });

        let tasks: Vec<ParseTask> = (0..16)
            .map(|n| ParseTask::new(format!("arg{n}"), n.to_string(), erase(IntParser)))
            .collect();

        let results = coordinator.parse_batch(tasks, &nobody()).await;

        assert_eq!(results.len(), 16);
        for n in 0..16_i32 {
            assert_eq!(results.get::<i32>(&format!("arg{n}")), Some(&n));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failures_leave_their_entry_absent() {
        let coordinator = ParseCoordinator::new(CoordinatorConfig {
            threshold: 0,
            ..CoordinatorConfig::default()
        });

        let results = coordinator
            .parse_batch(
                vec![
                    ParseTask::new("good", "7", erase(IntParser)),
                    ParseTask::new("bad", "seven", erase(IntParser)),
                ],
                &nobody(),
            )
            .await;

        assert_eq!(results.get::<i32>("good"), Some(&7));
        assert!(!results.contains("bad"));
        assert_eq!(results.len(), 1);
    }

    struct PanickingParser;

    impl ArgumentParser for PanickingParser {
        type Output = String;

        fn parse(&self, _token: &str, _caller: &dyn Caller) -> ParseOutcome<String> {
            panic!("deliberate test panic");
        }

        fn type_name(&self) -> &'static str {
            "string"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn a_panicked_task_costs_only_its_own_entry() {
        let coordinator = ParseCoordinator::new(CoordinatorConfig {
            threshold: 0,
            ..CoordinatorConfig::default()
        });

        let results = coordinator
            .parse_batch(
                vec![
                    ParseTask::new("stable", "fine", erase(StringParser)),
                    ParseTask::new("explosive", "boom", erase(PanickingParser)),
                ],
                &nobody(),
            )
            .await;

        assert_eq!(results.get::<String>("stable"), Some(&"fine".to_owned()));
        assert!(!results.contains("explosive"));
    }

    struct SlowParser;

    impl ArgumentParser for SlowParser {
        type Output = i32;

        fn parse(&self, _token: &str, _caller: &dyn Caller) -> ParseOutcome<i32> {
            std::thread::sleep(Duration::from_millis(200));
            ParseOutcome::success(1)
        }

        fn type_name(&self) -> &'static str {
            "integer"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn timed_out_tasks_are_omitted() {
        let coordinator = ParseCoordinator::new(CoordinatorConfig {
            threshold: 0,
            task_timeout: Duration::from_millis(20),
            ..CoordinatorConfig::default()
        });

        let results = coordinator
            .parse_batch(
                vec![
                    ParseTask::new("slow", "1", erase(SlowParser)),
                    ParseTask::new("fast", "2", erase(IntParser)),
                ],
                &nobody(),
            )
            .await;

        assert!(!results.contains("slow"));
        assert_eq!(results.get::<i32>("fast"), Some(&2));
    }
}
