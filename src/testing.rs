/*!
Test substitutes for `Logger`.

Inject a `RecordingLogger` with `wrap` and assert on the calls it sees.

This module is only available with the `test-utils` feature, so its example runs under
`cargo test --features test-utils`.

```
use std::sync::Arc;

use log_ctxt::{tag, Ctxt};
use log_ctxt::testing::RecordingLogger;

let recording = RecordingLogger::new();
let ctxt = log_ctxt::wrap(&Ctxt::background(), Arc::new(recording.clone()));

log_ctxt::info(&ctxt, "hello", &[tag("a", "b")]);

let calls = recording.calls();
assert_eq!(1, calls.len());
assert_eq!("hello", calls[0].message);
```
*/

use std::sync::{Arc, Mutex, MutexGuard};

use log::Level;

use crate::tags::Tags;
use crate::{Ctxt, Logger, Tag};

/// A single call made to a `RecordingLogger`.
#[derive(Clone, Debug)]
pub struct Call {
    pub level: Level,
    pub ctxt: Ctxt,
    pub message: String,
    /// The tags passed to the call itself.
    pub tags: Vec<Tag>,
    /// The tags accumulated through `Logger::with` before the call.
    pub bound: Vec<Tag>,
}

/**
A `Logger` that records every call instead of emitting anything.

Loggers returned by `with` share the same record of calls as the logger they came from.
*/
#[derive(Clone, Debug, Default)]
pub struct RecordingLogger {
    calls: Arc<Mutex<Vec<Call>>>,
    tags: Tags,
}

impl RecordingLogger {
    pub fn new() -> Self {
        RecordingLogger::default()
    }

    /// All calls made so far, in the order they were made.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        // A panicking test shouldn't hide the calls made before it
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, level: Level, ctxt: &Ctxt, message: &str, tags: &[Tag]) {
        self.lock().push(Call {
            level,
            ctxt: ctxt.clone(),
            message: message.to_owned(),
            tags: tags.to_vec(),
            bound: self.tags.as_slice().to_vec(),
        });
    }
}

impl Logger for RecordingLogger {
    fn error(&self, ctxt: &Ctxt, message: &str, tags: &[Tag]) {
        self.record(Level::Error, ctxt, message, tags)
    }

    fn info(&self, ctxt: &Ctxt, message: &str, tags: &[Tag]) {
        self.record(Level::Info, ctxt, message, tags)
    }

    fn debug(&self, ctxt: &Ctxt, message: &str, tags: &[Tag]) {
        self.record(Level::Debug, ctxt, message, tags)
    }

    fn warn(&self, ctxt: &Ctxt, message: &str, tags: &[Tag]) {
        self.record(Level::Warn, ctxt, message, tags)
    }

    fn with(&self, tags: &[Tag]) -> Arc<dyn Logger> {
        Arc::new(RecordingLogger {
            calls: self.calls.clone(),
            tags: self.tags.appended(tags),
        })
    }
}

#[cfg(test)]
pub(crate) use self::capture::capture;
