use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Dispatch requires at least one worker")]
    NoWorkers,

    #[error("Simulation run failed in worker {worker}: {source}")]
    RunFailed {
        worker: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Worker {worker} panicked during the round")]
    WorkerPanicked { worker: usize },
}
