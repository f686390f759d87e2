use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskdag::errors::{Result, TaskdagError};
use taskdag::exec::{DispatchedTask, ExecutorBackend, TaskOutcome};

/// One backend call as observed by [`FakeExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started { id: String, batch: usize },
    Finished { id: String, batch: usize },
}

/// A fake executor that:
/// - records start/finish of every task it is asked to run
/// - sleeps briefly so that tasks of one batch overlap
/// - reports `Failed(code)` for ids registered with [`FakeExecutor::fail`],
///   `Success` otherwise.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    events: Arc<Mutex<Vec<ExecEvent>>>,
    failures: Arc<Mutex<HashMap<String, i32>>>,
    delay: Duration,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            delay: Duration::from_millis(10),
            ..Self::default()
        }
    }

    pub fn fail(self, id: &str, exit_code: i32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(id.to_string(), exit_code);
        self
    }

    /// Shared handle to the recorded events.
    pub fn events(&self) -> Arc<Mutex<Vec<ExecEvent>>> {
        Arc::clone(&self.events)
    }
}

impl ExecutorBackend for FakeExecutor {
    fn run_task(
        &self,
        task: DispatchedTask,
    ) -> Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + '_>> {
        Box::pin(async move {
            self.events.lock().unwrap().push(ExecEvent::Started {
                id: task.id.clone(),
                batch: task.batch,
            });

            tokio::time::sleep(self.delay).await;

            let failure = self.failures.lock().unwrap().get(&task.id).copied();

            self.events.lock().unwrap().push(ExecEvent::Finished {
                id: task.id.clone(),
                batch: task.batch,
            });

            Ok::<_, TaskdagError>(match failure {
                Some(code) => TaskOutcome::Failed(code),
                None => TaskOutcome::Success,
            })
        })
    }
}
