//! Deserializable sink configuration.

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::arrow::{self, BatchConsumer, NullEncoding};
use crate::kind::{Keys, StreamKey};
use crate::logging;
use crate::sink::{Sink, SinkError};
use crate::strict;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub prefix: String,
    pub level: LogLevel,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            prefix: "sink".to_string(),
            level: LogLevel::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Wrap built sinks in strict protocol checks.
    pub strict: bool,
    /// Initial per-column builder capacity of the Arrow sink.
    pub batch_capacity: usize,
    pub null_encoding: NullEncoding,
    /// Settings for [`SinkConfig::build_logging`].
    pub log: Option<LogConfig>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            strict: false,
            batch_capacity: 1024,
            null_encoding: NullEncoding::default(),
            log: None,
        }
    }
}

impl SinkConfig {
    /// Builds an Arrow sink publishing to `consumer`.
    pub fn build_arrow(
        &self,
        streams: impl IntoIterator<Item = (StreamKey, Keys)>,
        consumer: impl BatchConsumer + 'static,
    ) -> Result<Sink, SinkError> {
        let builder = streams.into_iter().fold(
            arrow::builder()
                .capacity(self.batch_capacity)
                .null_encoding(self.null_encoding),
            |builder, (key, keys)| builder.stream(key, keys),
        );
        Ok(self.finish(builder.build(consumer)?))
    }

    /// Builds a logging sink from the `log` section, or its defaults when the
    /// section is absent.
    pub fn build_logging(&self, streams: impl IntoIterator<Item = (StreamKey, Keys)>) -> Sink {
        let log = self.log.clone().unwrap_or_default();
        self.finish(logging::of(log.prefix, log.level.into(), streams))
    }

    fn finish(&self, sink: Sink) -> Sink {
        if self.strict {
            strict::of(sink)
        } else {
            sink
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow::BatchCollector;
    use crate::kind::{Key, PrimitiveKind};
    use crate::sink::IntAppender;

    fn keys() -> (Key, Keys) {
        let a = Key::of("a", PrimitiveKind::Int);
        let keys = Keys::builder().add(a.clone()).build().unwrap();
        (a, keys)
    }

    #[test]
    fn test_defaults() {
        let config: SinkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SinkConfig::default());
        assert_eq!(config.batch_capacity, 1024);
        assert_eq!(config.null_encoding, NullEncoding::Validity);
        assert!(!config.strict);
        assert!(config.log.is_none());
    }

    #[test]
    fn test_parse() {
        let config: SinkConfig = serde_json::from_str(
            r#"{
                "strict": true,
                "batch_capacity": 16,
                "null_encoding": "sentinel",
                "log": {"prefix": "ingest", "level": "debug"}
            }"#,
        )
        .unwrap();
        assert!(config.strict);
        assert_eq!(config.batch_capacity, 16);
        assert_eq!(config.null_encoding, NullEncoding::Sentinel);
        let log = config.log.unwrap();
        assert_eq!(log.prefix, "ingest");
        assert_eq!(Level::from(log.level), Level::DEBUG);

        let json = serde_json::to_string(&SinkConfig::default()).unwrap();
        assert!(json.contains(r#""null_encoding":"validity""#));
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(serde_json::from_str::<SinkConfig>(r#"{"log": {"level": "loud"}}"#).is_err());
    }

    #[test]
    fn test_build_arrow_strict() {
        let config = SinkConfig {
            strict: true,
            ..Default::default()
        };
        let (a, keys) = keys();
        let stream_key = StreamKey::new();
        let collector = BatchCollector::new();
        let mut sink = config
            .build_arrow([(stream_key, keys)], collector.clone())
            .unwrap();

        sink.writing().unwrap();
        let stream = sink.stream(&stream_key).unwrap();
        IntAppender::get(stream, &a).unwrap().set(1).unwrap();
        stream.advance_all().unwrap();
        IntAppender::get(stream, &a).unwrap().set(2).unwrap();
        let err = sink.sync().unwrap_err();
        assert!(matches!(err, SinkError::NotAdvanced { .. }));
    }

    #[test]
    fn test_build_logging() {
        let config = SinkConfig::default();
        let (a, keys) = keys();
        let stream_key = StreamKey::new();
        let mut sink = config.build_logging([(stream_key, keys)]);
        sink.writing().unwrap();
        let stream = sink.stream(&stream_key).unwrap();
        IntAppender::get(stream, &a).unwrap().set(1).unwrap();
        stream.advance_all().unwrap();
        sink.sync().unwrap();
    }
}
