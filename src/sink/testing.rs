//! In-memory stream that records committed values, for tests.

use super::stream::column_key;
use super::{SinkError, Stream};
use crate::kind::{Keys, Object};

pub(crate) struct RecordingStream {
    keys: Keys,
    pending: Vec<Option<Option<Object>>>,
    columns: Vec<Vec<Option<Object>>>,
    pub(crate) reserved: usize,
}

impl RecordingStream {
    pub(crate) fn new(keys: Keys) -> Self {
        let n = keys.len();
        Self {
            keys,
            pending: vec![None; n],
            columns: vec![Vec::new(); n],
            reserved: 0,
        }
    }

    pub(crate) fn column(&self, column: usize) -> &[Option<Object>] {
        &self.columns[column]
    }

    fn stage(&mut self, column: usize, value: Option<Object>) -> Result<(), SinkError> {
        column_key(&self.keys, column)?;
        self.pending[column] = Some(value);
        Ok(())
    }
}

impl Stream for RecordingStream {
    fn keys(&self) -> &Keys {
        &self.keys
    }

    fn ensure_remaining_capacity(&mut self, n: usize) -> Result<(), SinkError> {
        self.reserved += n;
        Ok(())
    }

    fn advance_all(&mut self) -> Result<(), SinkError> {
        for column in 0..self.keys.len() {
            self.advance(column)?;
        }
        Ok(())
    }

    fn set_boolean(&mut self, column: usize, value: bool) -> Result<(), SinkError> {
        self.stage(column, Some(Object::Boolean(value)))
    }

    fn set_char(&mut self, column: usize, value: u16) -> Result<(), SinkError> {
        self.stage(column, Some(Object::Char(value)))
    }

    fn set_byte(&mut self, column: usize, value: i8) -> Result<(), SinkError> {
        self.stage(column, Some(Object::Byte(value)))
    }

    fn set_short(&mut self, column: usize, value: i16) -> Result<(), SinkError> {
        self.stage(column, Some(Object::Short(value)))
    }

    fn set_int(&mut self, column: usize, value: i32) -> Result<(), SinkError> {
        self.stage(column, Some(Object::Int(value)))
    }

    fn set_long(&mut self, column: usize, value: i64) -> Result<(), SinkError> {
        self.stage(column, Some(Object::Long(value)))
    }

    fn set_float(&mut self, column: usize, value: f32) -> Result<(), SinkError> {
        self.stage(column, Some(Object::Float(value)))
    }

    fn set_double(&mut self, column: usize, value: f64) -> Result<(), SinkError> {
        self.stage(column, Some(Object::Double(value)))
    }

    fn set_object(&mut self, column: usize, value: Object) -> Result<(), SinkError> {
        self.stage(column, Some(value))
    }

    fn set_null(&mut self, column: usize) -> Result<(), SinkError> {
        self.stage(column, None)
    }

    fn advance(&mut self, column: usize) -> Result<(), SinkError> {
        column_key(&self.keys, column)?;
        let value = self.pending[column].take().flatten();
        self.columns[column].push(value);
        Ok(())
    }

    fn pos(&self, column: usize) -> Option<u64> {
        self.columns.get(column).map(|c| c.len() as u64)
    }
}
