use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::Arc;

use env_logger::fmt::Formatter;
use log::kv::{self, Key, Source, VisitSource};
use log::{Level, Record};
use once_cell::sync::Lazy;

use crate::tags::{Chain, Tags};
use crate::{Ctxt, Logger, Tag};

/// The `log` target used by `LogAdapter::new`.
pub const DEFAULT_TARGET: &str = "log_ctxt";

static DEFAULT: Lazy<Arc<dyn Logger>> = Lazy::new(|| Arc::new(LogAdapter::new()));

/**
The process-wide fallback logger.

It's created the first time it's needed and shared from then on.
*/
pub fn default_logger() -> Arc<dyn Logger> {
    DEFAULT.clone()
}

/**
A `Logger` that emits records through the `log` crate.

Records go to whatever global logger is installed when they're emitted.
Tags are attached as structured key/values, so a backend needs `log`'s `kv` support to see them.
*/
#[derive(Clone, Debug)]
pub struct LogAdapter {
    target: Cow<'static, str>,
    tags: Tags,
}

impl LogAdapter {
    pub fn new() -> Self {
        LogAdapter::with_target(DEFAULT_TARGET)
    }

    /// Emit records under the given `log` target instead of `log_ctxt`.
    pub fn with_target(target: impl Into<Cow<'static, str>>) -> Self {
        LogAdapter {
            target: target.into(),
            tags: Tags::Empty,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn log(&self, level: Level, message: &str, tags: &[Tag]) {
        if level > log::max_level() {
            return;
        }

        let kvs = Chain {
            bound: &self.tags,
            call: tags,
        };

        log::logger().log(
            &Record::builder()
                .args(format_args!("{}", message))
                .level(level)
                .target(&self.target)
                .key_values(&kvs)
                .build(),
        );
    }
}

impl Default for LogAdapter {
    fn default() -> Self {
        LogAdapter::new()
    }
}

impl Logger for LogAdapter {
    fn error(&self, _: &Ctxt, message: &str, tags: &[Tag]) {
        self.log(Level::Error, message, tags)
    }

    fn info(&self, _: &Ctxt, message: &str, tags: &[Tag]) {
        self.log(Level::Info, message, tags)
    }

    fn debug(&self, _: &Ctxt, message: &str, tags: &[Tag]) {
        self.log(Level::Debug, message, tags)
    }

    fn warn(&self, _: &Ctxt, message: &str, tags: &[Tag]) {
        self.log(Level::Warn, message, tags)
    }

    fn with(&self, tags: &[Tag]) -> Arc<dyn Logger> {
        Arc::new(LogAdapter {
            target: self.target.clone(),
            tags: self.tags.appended(tags),
        })
    }
}

/**
A console format for `env_logger` that writes a record's key/values after its message.

```text
INFO: 2018-02-12T06:31:58Z: sending request: (correlation: An Id, operation: request)
```
*/
pub fn format() -> impl Fn(&mut Formatter, &Record<'_>) -> io::Result<()> + Send + Sync + 'static {
    |buf, record| {
        write!(
            buf,
            "{}: {}: {}",
            record.level(),
            buf.timestamp(),
            record.args()
        )?;

        let kvs: &dyn Source = record.key_values();
        if kvs.count() > 0 {
            write!(buf, ": (")?;

            let mut visitor = WriteKvs {
                buf: &mut *buf,
                first: true,
                err: None,
            };

            // Errors from the writer are stashed in the visitor
            if let Err(err) = kvs.visit(&mut visitor) {
                return Err(visitor
                    .err
                    .take()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, err.to_string())));
            }

            write!(buf, ")")?;
        }

        writeln!(buf)
    }
}

struct WriteKvs<'a> {
    buf: &'a mut Formatter,
    first: bool,
    err: Option<io::Error>,
}

impl<'a, 'kvs> VisitSource<'kvs> for WriteKvs<'a> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        let written = if self.first {
            self.first = false;
            write!(self.buf, "{}: {}", key, value)
        } else {
            write!(self.buf, ", {}: {}", key, value)
        };

        written.map_err(|err| {
            self.err = Some(err);
            kv::Error::msg("failed to write key/value")
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use env_logger::{Target, WriteStyle};
    use log::{LevelFilter, Log};

    use super::*;
    use crate::tag;
    use crate::testing::capture;

    #[derive(Clone, Default)]
    struct Pipe(Arc<Mutex<Vec<u8>>>);

    impl Write for Pipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    // Runs a record through an `env_logger` that writes to a buffer instead of the console
    fn render(record: &Record<'_>) -> String {
        let pipe = Pipe::default();

        let logger = env_logger::Builder::new()
            .format(format())
            .filter_level(LevelFilter::Trace)
            .write_style(WriteStyle::Never)
            .target(Target::Pipe(Box::new(pipe.clone())))
            .build();

        logger.log(record);

        let out = pipe.0.lock().unwrap().clone();
        String::from_utf8(out).unwrap()
    }

    struct Unreadable;

    impl Source for Unreadable {
        fn visit<'kvs>(&'kvs self, _: &mut dyn VisitSource<'kvs>) -> Result<(), kv::Error> {
            Err(kv::Error::msg("unreadable"))
        }

        fn count(&self) -> usize {
            1
        }
    }

    #[test]
    fn default_logger_is_created_once() {
        assert!(Arc::ptr_eq(&default_logger(), &default_logger()));
    }

    #[test]
    fn emits_each_level() {
        let ctxt = Ctxt::background();
        let logger = LogAdapter::new();

        let emitted = capture(|| {
            logger.error(&ctxt, "an error", &[]);
            logger.warn(&ctxt, "a warning", &[]);
            logger.info(&ctxt, "some info", &[]);
            logger.debug(&ctxt, "some detail", &[]);
        });

        assert_eq!(
            json!([
                { "level": "ERROR", "target": "log_ctxt", "msg": "an error", "tags": [] },
                { "level": "WARN", "target": "log_ctxt", "msg": "a warning", "tags": [] },
                { "level": "INFO", "target": "log_ctxt", "msg": "some info", "tags": [] },
                { "level": "DEBUG", "target": "log_ctxt", "msg": "some detail", "tags": [] }
            ]),
            serde_json::to_value(&emitted).unwrap()
        );
    }

    #[test]
    fn with_appends_tags() {
        let ctxt = Ctxt::background();

        let root = LogAdapter::with_target("app");
        assert_eq!("app", root.target());
        assert_eq!(DEFAULT_TARGET, LogAdapter::new().target());
        let enriched = root
            .with(&[tag("service", "Banana")])
            .with(&[tag("correlation", "An Id"), tag("service", "Mandarin")]);

        let emitted = capture(|| {
            enriched.info(&ctxt, "Hi user!", &[tag("attempt", 2)]);
            root.info(&ctxt, "Hi user!", &[]);
        });

        assert_eq!(
            json!([
                {
                    "level": "INFO",
                    "target": "app",
                    "msg": "Hi user!",
                    "tags": [
                        ["service", "Banana"],
                        ["correlation", "An Id"],
                        ["service", "Mandarin"],
                        ["attempt", "2"]
                    ]
                },
                { "level": "INFO", "target": "app", "msg": "Hi user!", "tags": [] }
            ]),
            serde_json::to_value(&emitted).unwrap()
        );
    }

    #[test]
    fn empty_message_is_emitted() {
        let emitted = capture(|| LogAdapter::new().warn(&Ctxt::background(), "", &[]));

        assert_eq!(1, emitted.len());
        assert_eq!("", emitted[0].msg);
    }

    #[test]
    fn format_writes_tags_after_message() {
        let bound = Tags::Single(tag("a", "b"));
        let call = [tag("n", 1), tag("arr", json!([1, { "x": 2 }])), tag("c", true)];
        let kvs = Chain {
            bound: &bound,
            call: &call,
        };

        let out = render(
            &Record::builder()
                .args(format_args!("hi"))
                .level(Level::Info)
                .target("app")
                .key_values(&kvs)
                .build(),
        );

        assert!(out.starts_with("INFO: "), "{}", out);
        assert!(
            out.ends_with(": hi: (a: b, n: 1, arr: [1, {\"x\": 2}], c: true)\n"),
            "{}",
            out
        );
    }

    #[test]
    fn format_without_tags_has_no_parens() {
        let out = render(
            &Record::builder()
                .args(format_args!("hi"))
                .level(Level::Warn)
                .target("app")
                .build(),
        );

        assert!(out.starts_with("WARN: "), "{}", out);
        assert!(out.ends_with(": hi\n"), "{}", out);
        assert!(!out.contains('('), "{}", out);
    }

    #[test]
    fn format_fails_on_unreadable_tags() {
        let out = render(
            &Record::builder()
                .args(format_args!("hi"))
                .level(Level::Error)
                .target("app")
                .key_values(&Unreadable)
                .build(),
        );

        // A failed format isn't printed at all
        assert_eq!("", out);
    }
}
