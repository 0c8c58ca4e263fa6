//! Browser logging: `tracing` events go to the developer console at the
//! matching console level, and panics are reported there too.

use std::fmt::{self, Write as _};

use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{
    Layer,
    filter::LevelFilter,
    layer::{Context, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};
use wasm_bindgen::JsValue;

/// Where formatted lines end up.
pub type ConsoleSink = fn(&Level, &str);

/// A [`Layer`] that formats each event on one line and hands it to a sink.
pub struct ConsoleLayer {
    sink: ConsoleSink,
}

impl Default for ConsoleLayer {
    fn default() -> Self {
        Self::with_sink(write_to_console)
    }
}

impl ConsoleLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: ConsoleSink) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let line = format!(
            "{} {}: {}{}",
            metadata.level(),
            metadata.target(),
            visitor.message,
            visitor.fields
        );
        (self.sink)(metadata.level(), &line);
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: String,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

fn write_to_console(level: &Level, line: &str) {
    let line = JsValue::from_str(line);
    if *level == Level::ERROR {
        web_sys::console::error_1(&line);
    } else if *level == Level::WARN {
        web_sys::console::warn_1(&line);
    } else if *level == Level::INFO {
        web_sys::console::info_1(&line);
    } else {
        web_sys::console::debug_1(&line);
    }
}

/// Installs the console layer as the global subscriber.
///
/// # Errors
/// Fails when a global subscriber is already set.
pub fn init_logging(level: LevelFilter) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(ConsoleLayer::new().with_filter(level))
        .try_init()
}

/// Reports panics through `console.error` with their location.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info
            .payload()
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| info.payload().downcast_ref::<&str>().copied())
            .unwrap_or("unknown panic");
        let message = match info.location() {
            Some(location) => format!(
                "panic: {payload}\n  at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            ),
            None => format!("panic: {payload}"),
        };
        web_sys::console::error_1(&JsValue::from_str(&message));
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tracing::{debug, info, warn};

    thread_local! {
        static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    fn capture(level: &Level, line: &str) {
        CAPTURED.with(|lines| lines.borrow_mut().push((*level, line.to_string())));
    }

    fn captured() -> Vec<(Level, String)> {
        CAPTURED.with(|lines| lines.borrow_mut().drain(..).collect())
    }

    fn with_console<R>(level: LevelFilter, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry()
            .with(ConsoleLayer::with_sink(capture).with_filter(level));
        tracing::subscriber::with_default(subscriber, f)
    }

    #[test]
    fn formats_message_and_fields_on_one_line() {
        with_console(LevelFilter::INFO, || {
            info!(user_id = "usr_1", attempts = 2, "session created");
        });

        let lines = captured();
        assert_eq!(lines.len(), 1);
        let (level, line) = &lines[0];
        assert_eq!(*level, Level::INFO);
        assert!(line.starts_with("INFO "));
        assert!(line.contains("session created"));
        assert!(line.contains(" user_id=usr_1"));
        assert!(line.contains(" attempts=2"));
    }

    #[test]
    fn events_below_the_filter_are_dropped() {
        with_console(LevelFilter::WARN, || {
            debug!("noise");
            info!("still noise");
            warn!("kept");
        });

        let lines = captured();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::WARN);
        assert!(lines[0].1.ends_with("kept"));
    }
}
