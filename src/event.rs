use crossbeam_channel::{Receiver, Sender, unbounded};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub enum RipEvent {
    StageStarted(String),
    StageSkipped { stage: String, marker: PathBuf },
    StageCompleted(String),

    JobStarted(PathBuf),
    JobSucceeded(PathBuf),
    JobSkipped(PathBuf),
    JobFailed { path: PathBuf, error: String },

    Log(String),
}

/// Cloneable observer handle the pipeline reports through. Sending never
/// blocks; a dropped receiver just discards events.
#[derive(Clone)]
pub struct EventSink {
    tx: Option<Sender<RipEvent>>,
}

impl EventSink {
    pub fn channel() -> (Self, Receiver<RipEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that drops everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: RipEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit(RipEvent::Log(message.into()));
    }
}
