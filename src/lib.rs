/*!
Context-scoped logging.

This crate lets you bind a logger to an execution context and enrich it with tags as the
context is passed down through your code.
Callers never thread a logger through their signatures; they pass the `Ctxt` they already
carry, and the logger bound to it (or a default one) is resolved when they log.

- Call `wrap` to bind a logger to a context.
- Call `with` to derive a context whose logger carries extra tags.
- Call `error`, `warn`, `info`, or `debug` to log through whatever logger the context carries.

Records are emitted through `log` by default, so they show up in whatever `log` backend
the application installs. Call `init` to use `env_logger`.

# Examples

```
use log_ctxt::{tag, Ctxt};

let ctxt = log_ctxt::with(&Ctxt::background(), &[tag("correlation", "An Id")]);

log_ctxt::info(&ctxt, "sending request", &[tag("operation", "request")]);
```
*/

#[macro_use]
extern crate serde_derive;
#[cfg_attr(test, macro_use)]
extern crate serde_json;

mod backend;
mod ctxt;
mod tags;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use std::sync::Arc;

pub use self::backend::{default_logger, format, LogAdapter, DEFAULT_TARGET};
pub use self::ctxt::Ctxt;
pub use self::tags::{tag, Tag};
pub use serde_json::Value;

/**
A logger that can be bound to a context.

`LogAdapter` is the implementation used by default.
Tests can bind their own implementation with `wrap`.
*/
pub trait Logger: Send + Sync + 'static {
    fn error(&self, ctxt: &Ctxt, message: &str, tags: &[Tag]);
    fn info(&self, ctxt: &Ctxt, message: &str, tags: &[Tag]);
    fn debug(&self, ctxt: &Ctxt, message: &str, tags: &[Tag]);
    fn warn(&self, ctxt: &Ctxt, message: &str, tags: &[Tag]);

    /**
    A new logger that includes `tags` on every record, after the tags this logger already carries.

    The receiver isn't changed.
    */
    fn with(&self, tags: &[Tag]) -> Arc<dyn Logger>;
}

// The key the bound logger is stored under.
// It's private so nothing outside this crate can read or shadow the binding.
struct LoggerKey;

/**
Derive a context with `logger` bound to it.

```
use std::sync::Arc;

use log_ctxt::{Ctxt, Logger, Tag};

struct Stdout;

impl Logger for Stdout {
    fn error(&self, _: &Ctxt, message: &str, _: &[Tag]) {
        println!("error: {}", message);
    }

    fn info(&self, _: &Ctxt, message: &str, _: &[Tag]) {
        println!("info: {}", message);
    }

    fn debug(&self, _: &Ctxt, message: &str, _: &[Tag]) {
        println!("debug: {}", message);
    }

    fn warn(&self, _: &Ctxt, message: &str, _: &[Tag]) {
        println!("warn: {}", message);
    }

    fn with(&self, _: &[Tag]) -> Arc<dyn Logger> {
        Arc::new(Stdout)
    }
}

let logger: Arc<dyn Logger> = Arc::new(Stdout);
let ctxt = log_ctxt::wrap(&Ctxt::background(), logger.clone());

assert!(Arc::ptr_eq(&logger, &log_ctxt::from(&ctxt)));

log_ctxt::info(&ctxt, "hello", &[]);
```
*/
pub fn wrap(ctxt: &Ctxt, logger: Arc<dyn Logger>) -> Ctxt {
    ctxt.with_value::<LoggerKey, _>(logger)
}

/**
Derive a context whose logger carries `tags` along with any it already had.

If `ctxt` has no logger bound then the default logger is enriched and bound.
*/
pub fn with(ctxt: &Ctxt, tags: &[Tag]) -> Ctxt {
    wrap(ctxt, from(ctxt).with(tags))
}

/**
Get the logger bound to a context.

If no logger is bound then the default logger is returned instead.
*/
pub fn from(ctxt: &Ctxt) -> Arc<dyn Logger> {
    ctxt.get::<LoggerKey, Arc<dyn Logger>>()
        .cloned()
        .unwrap_or_else(default_logger)
}

pub fn error(ctxt: &Ctxt, message: &str, tags: &[Tag]) {
    from(ctxt).error(ctxt, message, tags)
}

pub fn info(ctxt: &Ctxt, message: &str, tags: &[Tag]) {
    from(ctxt).info(ctxt, message, tags)
}

pub fn debug(ctxt: &Ctxt, message: &str, tags: &[Tag]) {
    from(ctxt).debug(ctxt, message, tags)
}

pub fn warn(ctxt: &Ctxt, message: &str, tags: &[Tag]) {
    from(ctxt).warn(ctxt, message, tags)
}

/**
Initialize `env_logger` as the `log` backend, configured by the `RUST_LOG` environment variable.

# Panics

This function panics if a global `log` logger has already been set.
*/
pub fn init() {
    try_init().expect("log_ctxt::init should not be called after the logger is initialized");
}

/**
Initialize `env_logger` as the `log` backend, configured by the `RUST_LOG` environment variable.

This returns an error if a global `log` logger has already been set.
*/
pub fn try_init() -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_default_env()
        .format(format())
        .try_init()
}
