use std::time::Duration;

/// Round-lifecycle events emitted by the dispatcher. Consumers (CLIs, test
/// harnesses) decide how to render them; the library itself never prints.
#[derive(Debug, Clone)]
pub enum Progress {
    RoundStart {
        round: usize,
        total_trials: usize,
        workers: usize,
    },
    RoundFinish {
        round: usize,
        elapsed: Duration,
    },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
