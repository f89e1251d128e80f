//! The sink protocol: streams of lock-step columns under one coordinator.
//!
//! A [`Sink`] owns one [`Coordinator`] and an ordered set of [`Stream`]s, each
//! identified by an opaque [`StreamKey`]. A single writer drives it:
//!
//! ```ignore
//! sink.writing()?;
//! let stream = sink.stream(&key)?;
//! IntAppender::get(stream, &a)?.set(1)?;
//! IntAppender::get(stream, &b)?.set(2)?;
//! stream.advance_all()?;
//! sink.sync()?;             // synchronization point
//! ```

mod appender;
mod coordinator;
mod error;
mod stream;
#[cfg(test)]
pub(crate) mod testing;

pub use appender::{
    BooleanAppender, ByteAppender, CharAppender, DoubleAppender, EpochDoubleAppender,
    EpochLongAppender, FloatAppender, IntAppender, LongAppender, ObjectAppender, ShortAppender,
    TimestampAppender,
};
pub use coordinator::{Coordinator, CoordinatorState, NoopCoordinator};
pub use error::SinkError;
pub use stream::{column_key, column_of, Stream};

use indexmap::IndexMap;

use crate::kind::StreamKey;

/// Streams sharing one coordinator.
pub struct Sink {
    coordinator: Box<dyn Coordinator>,
    streams: IndexMap<StreamKey, Box<dyn Stream>>,
}

impl Sink {
    pub fn builder(coordinator: impl Coordinator + 'static) -> SinkBuilder {
        SinkBuilder {
            coordinator: Box::new(coordinator),
            streams: IndexMap::new(),
        }
    }

    /// Starts a batch: the coordinator enters writing, then every stream is
    /// notified.
    pub fn writing(&mut self) -> Result<(), SinkError> {
        self.coordinator.writing()?;
        for stream in self.streams.values_mut() {
            stream.on_writing()?;
        }
        Ok(())
    }

    /// Ends a batch at a synchronization point.
    ///
    /// The coordinator state and every stream are verified before any stream
    /// is synced, so a failed check leaves all streams untouched.
    pub fn sync(&mut self) -> Result<(), SinkError> {
        self.coordinator.check_sync()?;
        for stream in self.streams.values() {
            stream.verify()?;
        }
        for stream in self.streams.values_mut() {
            stream.on_sync()?;
        }
        self.coordinator.sync()
    }

    pub fn intermediate(&mut self) -> Result<(), SinkError> {
        self.sync()?;
        self.writing()
    }

    pub fn stream(&mut self, key: &StreamKey) -> Result<&mut dyn Stream, SinkError> {
        match self.streams.get_mut(key) {
            Some(stream) => Ok(stream.as_mut()),
            None => Err(SinkError::StreamNotFound { stream: *key }),
        }
    }

    pub fn stream_if_present(&mut self, key: &StreamKey) -> Option<&mut dyn Stream> {
        match self.streams.get_mut(key) {
            Some(stream) => Some(stream.as_mut()),
            None => None,
        }
    }

    pub fn stream_keys(&self) -> impl Iterator<Item = &StreamKey> {
        self.streams.keys()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Splits the sink so a decorator can wrap its parts.
    pub fn into_parts(self) -> (Box<dyn Coordinator>, IndexMap<StreamKey, Box<dyn Stream>>) {
        (self.coordinator, self.streams)
    }

    pub fn from_parts(
        coordinator: Box<dyn Coordinator>,
        streams: IndexMap<StreamKey, Box<dyn Stream>>,
    ) -> Self {
        Self {
            coordinator,
            streams,
        }
    }
}

pub struct SinkBuilder {
    coordinator: Box<dyn Coordinator>,
    streams: IndexMap<StreamKey, Box<dyn Stream>>,
}

impl SinkBuilder {
    /// Adds a stream. A later stream with the same key replaces the earlier one.
    pub fn stream(mut self, key: StreamKey, stream: impl Stream + 'static) -> Self {
        self.streams.insert(key, Box::new(stream));
        self
    }

    pub fn boxed_stream(mut self, key: StreamKey, stream: Box<dyn Stream>) -> Self {
        self.streams.insert(key, stream);
        self
    }

    pub fn build(self) -> Sink {
        Sink {
            coordinator: self.coordinator,
            streams: self.streams,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingStream;
    use super::*;
    use crate::kind::{Key, Keys, Object, ValueKind};

    #[test]
    fn test_stream_lookup() {
        let a = Key::of("a", ValueKind::Int);
        let key = StreamKey::new();
        let mut sink = Sink::builder(NoopCoordinator)
            .stream(key, RecordingStream::new(Keys::builder().add(a).build().unwrap()))
            .build();

        assert_eq!(sink.len(), 1);
        assert!(sink.stream(&key).is_ok());
        let missing = StreamKey::new();
        assert!(matches!(
            sink.stream(&missing),
            Err(SinkError::StreamNotFound { .. })
        ));
        assert!(sink.stream_if_present(&missing).is_none());
    }

    #[test]
    fn test_row_oriented_write() {
        let a = Key::of("A", ValueKind::Int);
        let b = Key::of("B", ValueKind::string());
        let key = StreamKey::new();
        let keys = Keys::builder().add(a.clone()).add(b.clone()).build().unwrap();
        let mut sink = Sink::builder(NoopCoordinator)
            .stream(key, RecordingStream::new(keys))
            .build();

        sink.writing().unwrap();
        let stream = sink.stream(&key).unwrap();
        stream.ensure_remaining_capacity(2).unwrap();
        for (i, name) in ["x", "y"].into_iter().enumerate() {
            IntAppender::get(stream, &a).unwrap().set(i as i32).unwrap();
            ObjectAppender::get(stream, &b)
                .unwrap()
                .set(Object::string(name))
                .unwrap();
            stream.advance_all().unwrap();
        }
        assert_eq!(stream.pos(0), Some(2));
        assert_eq!(stream.pos(1), Some(2));
        sink.sync().unwrap();
    }
}
