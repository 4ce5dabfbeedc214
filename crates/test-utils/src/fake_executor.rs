use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use evalrunner::exec::{ExecutorBackend, RunConfiguration, RunOutcome};
use evalrunner::trigger::{DispatchRequest, TriggerError, WorkflowDispatcher};

/// A fake executor that:
/// - records which runs were "executed", in order
/// - returns a scripted outcome per run name (success otherwise)
///   with stdout `"<name> stdout\n"`.
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    scripted: HashMap<String, RunOutcome>,
}

impl FakeExecutor {
    pub fn new(executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            executed,
            scripted: HashMap::new(),
        }
    }

    pub fn with_outcome(mut self, run_name: &str, outcome: RunOutcome) -> Self {
        self.scripted.insert(run_name.to_string(), outcome);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn execute(
        &mut self,
        cfg: RunConfiguration,
    ) -> Pin<Box<dyn Future<Output = RunOutcome> + Send + '_>> {
        let executed = Arc::clone(&self.executed);

        Box::pin(async move {
            let name = cfg.run.name.clone();
            executed.lock().unwrap().push(name.clone());

            match self.scripted.get(&name) {
                Some(outcome) => outcome.clone(),
                None => RunOutcome {
                    error: None,
                    stdout: format!("{name} stdout\n"),
                    stderr: String::new(),
                },
            }
        })
    }
}

/// Dispatcher that records requests and answers with a fixed result.
#[derive(Clone, Default)]
pub struct StubDispatcher {
    pub requests: Arc<Mutex<Vec<DispatchRequest>>>,
    pub fail_with: Option<TriggerError>,
}

impl StubDispatcher {
    pub fn failing(error: TriggerError) -> Self {
        Self {
            requests: Arc::default(),
            fail_with: Some(error),
        }
    }
}

impl WorkflowDispatcher for StubDispatcher {
    fn dispatch<'a>(
        &'a self,
        request: &'a DispatchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), TriggerError>> + Send + 'a>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => request.validate(),
            }
        })
    }
}
