//! Protobuf schema parsing and column kind mapping.
//!
//! Schemas arrive as a serialized `FileDescriptorSet`. Each top-level field of
//! the root message becomes one column:
//!
//! | Protobuf                      | Kind                 |
//! |-------------------------------|----------------------|
//! | bool                          | boolean              |
//! | int32, sint32, sfixed32, enum | int                  |
//! | uint32, fixed32               | long (widened)       |
//! | int64, sint64, sfixed64       | long                 |
//! | uint64, fixed64               | long (bit-cast)      |
//! | float / double                | float / double       |
//! | string                        | string               |
//! | bytes                         | array<byte>          |
//! | google.protobuf.Timestamp     | timestamp            |
//! | repeated scalar               | array of the above   |

use prost::Message;
use prost_reflect::{DescriptorPool, FieldDescriptor, Kind, MessageDescriptor};
use prost_types::FileDescriptorSet;

use super::ProtobufError;
use crate::kind::{Key, Keys, ValueKind};

pub(crate) const TIMESTAMP: &str = "google.protobuf.Timestamp";

/// A parsed schema and its root message.
pub struct ProtobufSchema {
    pool: DescriptorPool,
    message: MessageDescriptor,
}

impl ProtobufSchema {
    /// Parses a serialized `FileDescriptorSet` and looks up `message_name`
    /// (fully qualified).
    pub fn parse(schema_data: &[u8], message_name: &str) -> Result<Self, ProtobufError> {
        let fds = FileDescriptorSet::decode(schema_data)?;
        let pool = DescriptorPool::from_file_descriptor_set(fds)
            .map_err(|e| ProtobufError::DescriptorPool(e.to_string()))?;
        Self::from_pool(pool, message_name)
    }

    pub fn from_pool(pool: DescriptorPool, message_name: &str) -> Result<Self, ProtobufError> {
        let message = pool
            .get_message_by_name(message_name)
            .ok_or_else(|| ProtobufError::MessageNotFound(message_name.to_string()))?;
        Ok(Self { pool, message })
    }

    pub fn message_descriptor(&self) -> &MessageDescriptor {
        &self.message
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// One key per field of the root message, in field declaration order.
    pub fn keys(&self) -> Result<Keys, ProtobufError> {
        let keys = self
            .message
            .fields()
            .map(|f| Ok(Key::of(f.name(), field_kind(&f)?)))
            .collect::<Result<Vec<_>, ProtobufError>>()?;
        Ok(Keys::builder().add_all(keys).build()?)
    }
}

/// The column kind of a top-level field.
pub fn field_kind(field: &FieldDescriptor) -> Result<ValueKind, ProtobufError> {
    if field.is_map() {
        return Err(unsupported(field, "map"));
    }
    let kind = scalar_kind(field, &field.kind())?;
    if field.is_list() {
        if matches!(field.kind(), Kind::Bytes) {
            return Err(unsupported(field, "repeated bytes"));
        }
        Ok(ValueKind::array_of(kind))
    } else {
        Ok(kind)
    }
}

fn scalar_kind(field: &FieldDescriptor, kind: &Kind) -> Result<ValueKind, ProtobufError> {
    Ok(match kind {
        Kind::Bool => ValueKind::Boolean,
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 | Kind::Enum(_) => ValueKind::Int,
        Kind::Uint32 | Kind::Fixed32 => ValueKind::Long,
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => ValueKind::Long,
        Kind::Uint64 | Kind::Fixed64 => ValueKind::Long,
        Kind::Float => ValueKind::Float,
        Kind::Double => ValueKind::Double,
        Kind::String => ValueKind::string(),
        Kind::Bytes => ValueKind::array_of(ValueKind::Byte),
        Kind::Message(m) if m.full_name() == TIMESTAMP => ValueKind::timestamp(),
        Kind::Message(m) => return Err(unsupported(field, m.full_name())),
    })
}

pub(crate) fn unsupported(field: &FieldDescriptor, kind: &str) -> ProtobufError {
    ProtobufError::UnsupportedField {
        field: field.full_name().to_string(),
        kind: kind.to_string(),
    }
}
