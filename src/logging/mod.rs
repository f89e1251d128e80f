//! A sink that only logs.
//!
//! Every coordinator call, stream call and column mutation becomes one
//! `tracing` event at the configured level, with `prefix`, `stream`, `key` and
//! `value` fields. Nothing is stored, and control flow is never altered beyond
//! rejecting out-of-range columns.

use std::sync::Arc;

use tracing::Level;

use crate::kind::{Keys, Object, StreamKey};
use crate::sink::{column_key, Coordinator, Sink, SinkError, Stream};

/// Emits an event at a level chosen at runtime.
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!($($arg)+)
        } else if level == Level::WARN {
            tracing::warn!($($arg)+)
        } else if level == Level::INFO {
            tracing::info!($($arg)+)
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+)
        } else {
            tracing::trace!($($arg)+)
        }
    }};
}

/// Builds a logging sink with one stream per `(key, columns)` pair.
pub fn of(
    prefix: impl Into<Arc<str>>,
    level: Level,
    streams: impl IntoIterator<Item = (StreamKey, Keys)>,
) -> Sink {
    let prefix = prefix.into();
    let mut builder = Sink::builder(LoggingCoordinator {
        prefix: prefix.clone(),
        level,
    });
    for (stream_key, keys) in streams {
        builder = builder.stream(
            stream_key,
            LoggingStream {
                prefix: prefix.clone(),
                level,
                stream_key,
                keys,
            },
        );
    }
    builder.build()
}

pub struct LoggingCoordinator {
    prefix: Arc<str>,
    level: Level,
}

impl LoggingCoordinator {
    pub fn new(prefix: impl Into<Arc<str>>, level: Level) -> Self {
        Self {
            prefix: prefix.into(),
            level,
        }
    }
}

impl Coordinator for LoggingCoordinator {
    fn writing(&mut self) -> Result<(), SinkError> {
        event_at!(self.level, prefix = %self.prefix, "writing");
        Ok(())
    }

    fn sync(&mut self) -> Result<(), SinkError> {
        event_at!(self.level, prefix = %self.prefix, "sync");
        Ok(())
    }
}

pub struct LoggingStream {
    prefix: Arc<str>,
    level: Level,
    stream_key: StreamKey,
    keys: Keys,
}

impl LoggingStream {
    fn set(&self, column: usize, value: &dyn std::fmt::Display) -> Result<(), SinkError> {
        let key = column_key(&self.keys, column)?;
        event_at!(
            self.level,
            prefix = %self.prefix,
            stream = %self.stream_key,
            key = %key,
            value = %value,
            "set"
        );
        Ok(())
    }

    fn column_event(&self, column: usize, op: &'static str) -> Result<(), SinkError> {
        let key = column_key(&self.keys, column)?;
        event_at!(
            self.level,
            prefix = %self.prefix,
            stream = %self.stream_key,
            key = %key,
            "{}",
            op
        );
        Ok(())
    }
}

impl Stream for LoggingStream {
    fn keys(&self) -> &Keys {
        &self.keys
    }

    fn ensure_remaining_capacity(&mut self, n: usize) -> Result<(), SinkError> {
        event_at!(
            self.level,
            prefix = %self.prefix,
            stream = %self.stream_key,
            n,
            "ensure_remaining_capacity"
        );
        Ok(())
    }

    fn advance_all(&mut self) -> Result<(), SinkError> {
        event_at!(
            self.level,
            prefix = %self.prefix,
            stream = %self.stream_key,
            "advance_all"
        );
        Ok(())
    }

    fn set_boolean(&mut self, column: usize, value: bool) -> Result<(), SinkError> {
        self.set(column, &value)
    }

    fn set_char(&mut self, column: usize, value: u16) -> Result<(), SinkError> {
        self.set(column, &Object::Char(value))
    }

    fn set_byte(&mut self, column: usize, value: i8) -> Result<(), SinkError> {
        self.set(column, &value)
    }

    fn set_short(&mut self, column: usize, value: i16) -> Result<(), SinkError> {
        self.set(column, &value)
    }

    fn set_int(&mut self, column: usize, value: i32) -> Result<(), SinkError> {
        self.set(column, &value)
    }

    fn set_long(&mut self, column: usize, value: i64) -> Result<(), SinkError> {
        self.set(column, &value)
    }

    fn set_float(&mut self, column: usize, value: f32) -> Result<(), SinkError> {
        self.set(column, &value)
    }

    fn set_double(&mut self, column: usize, value: f64) -> Result<(), SinkError> {
        self.set(column, &value)
    }

    fn set_object(&mut self, column: usize, value: Object) -> Result<(), SinkError> {
        self.set(column, &value)
    }

    fn set_null(&mut self, column: usize) -> Result<(), SinkError> {
        self.column_event(column, "set_null")
    }

    fn advance(&mut self, column: usize) -> Result<(), SinkError> {
        self.column_event(column, "advance")
    }
}
