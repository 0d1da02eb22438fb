#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    IterationFinish { iteration: usize, max_delta: f64 },

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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::TaskIncrement);
    }

    #[test]
    fn callback_receives_events_in_order() {
        let events = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                events.lock().unwrap().push(format!("{:?}", event));
            }));
            reporter.report(Progress::PhaseStart { name: "Residues" });
            reporter.report(Progress::TaskStart { total_steps: 2 });
            reporter.report(Progress::PhaseFinish);
        }
        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 3);
        assert!(events[0].contains("Residues"));
        assert!(events[2].contains("PhaseFinish"));
    }
}
