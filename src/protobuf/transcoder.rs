//! Protobuf to stream transcoder built from typed field functions.
//!
//! Every top-level field gets a [`TypedFunction`] over `DynamicMessage`: a
//! presence-aware extractor producing `Option<Value>`, composed with a
//! null-guarded conversion to the field's kind. Absent fields therefore reach
//! the stream as nulls.

use chrono::DateTime;
use prost_reflect::{DynamicMessage, FieldDescriptor, MessageDescriptor, ReflectMessage, Value};

use super::schema::{field_kind, unsupported, TIMESTAMP};
use super::ProtobufError;
use crate::adapter::{BoundWriter, RecordWriter};
use crate::function::{null_guard, Func, Identity, ObjectFunction, TypedFunction};
use crate::kind::nulls::{NULL_DOUBLE, NULL_FLOAT, NULL_INT, NULL_LONG};
use crate::kind::{Key, Object, ValueKind};
use crate::sink::Stream;

/// The extraction function for one top-level field.
pub fn field_function(
    field: &FieldDescriptor,
) -> Result<TypedFunction<DynamicMessage>, ProtobufError> {
    let kind = field_kind(field)?;
    let convert = converter(field, &kind)?;
    Ok(null_guard(&convert).map_input(&extractor(field)))
}

/// A record writer with one column per field of `message`.
pub fn record_writer(
    message: &MessageDescriptor,
) -> Result<RecordWriter<DynamicMessage>, ProtobufError> {
    message.fields().try_fold(RecordWriter::new(), |writer, field| {
        let kind = field_kind(&field)?;
        let f = field_function(&field)?;
        Ok(writer.field(Key::of(field.name(), kind), f))
    })
}

/// Decodes one message from `data` and writes it as one row of `stream`.
pub fn transcode(
    data: &[u8],
    message: &MessageDescriptor,
    writer: &BoundWriter<DynamicMessage>,
    stream: &mut dyn Stream,
) -> Result<(), ProtobufError> {
    let msg = DynamicMessage::decode(message.clone(), data)?;
    writer.write(stream, &msg)?;
    Ok(())
}

/// The field's value, or `None` when a field with presence is unset.
fn extractor(field: &FieldDescriptor) -> Func<DynamicMessage, Option<Value>> {
    let identity =
        Identity::composed("proto_field", std::iter::empty()).with_detail(field.full_name());
    let field = field.clone();
    Func::with_identity(identity, move |msg: &DynamicMessage| {
        if field.supports_presence() && !msg.has_field(&field) {
            None
        } else {
            Some(msg.get_field(&field).into_owned())
        }
    })
}

fn converter(
    field: &FieldDescriptor,
    kind: &ValueKind,
) -> Result<TypedFunction<Value>, ProtobufError> {
    Ok(match kind {
        ValueKind::Boolean => {
            Func::builtin("proto_bool", |v: &Value| v.as_bool().unwrap_or(false)).into()
        }
        ValueKind::Int => Func::builtin("proto_int", |v: &Value| match v {
            Value::I32(x) | Value::EnumNumber(x) => *x,
            _ => NULL_INT,
        })
        .into(),
        ValueKind::Long => Func::builtin("proto_long", |v: &Value| match v {
            Value::I64(x) => *x,
            Value::U32(x) => i64::from(*x),
            Value::U64(x) => *x as i64,
            _ => NULL_LONG,
        })
        .into(),
        ValueKind::Float => {
            Func::builtin("proto_float", |v: &Value| v.as_f32().unwrap_or(NULL_FLOAT)).into()
        }
        ValueKind::Double => {
            Func::builtin("proto_double", |v: &Value| v.as_f64().unwrap_or(NULL_DOUBLE)).into()
        }
        ValueKind::Generic(g) => ObjectFunction::from_func(
            Func::builtin("proto_object", to_object),
            g.clone(),
        )
        .into(),
        other => return Err(unsupported(field, &other.to_string())),
    })
}

fn to_object(value: &Value) -> Option<Object> {
    match value {
        Value::Bool(v) => Some(Object::Boolean(*v)),
        Value::I32(v) | Value::EnumNumber(v) => Some(Object::Int(*v)),
        Value::I64(v) => Some(Object::Long(*v)),
        Value::U32(v) => Some(Object::Long(i64::from(*v))),
        Value::U64(v) => Some(Object::Long(*v as i64)),
        Value::F32(v) => Some(Object::Float(*v)),
        Value::F64(v) => Some(Object::Double(*v)),
        Value::String(v) => Some(Object::string(v.as_str())),
        Value::Bytes(v) => Some(Object::array(v.iter().map(|b| Object::Byte(*b as i8)))),
        Value::List(values) => Some(Object::array(values.iter().filter_map(to_object))),
        Value::Message(msg) if msg.descriptor().full_name() == TIMESTAMP => timestamp(msg),
        Value::Message(_) | Value::Map(_) => None,
    }
}

fn timestamp(msg: &DynamicMessage) -> Option<Object> {
    let seconds = msg.get_field_by_name("seconds")?.as_i64()?;
    let nanos = msg.get_field_by_name("nanos")?.as_i32()?;
    let nanos = u32::try_from(nanos).ok()?;
    DateTime::from_timestamp(seconds, nanos).map(Object::Timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::GenericKind;
    use crate::protobuf::ProtobufSchema;
    use crate::sink::testing::RecordingStream;
    use crate::sink::SinkError;
    use prost::Message;
    use prost_reflect::DescriptorPool;
    use prost_types::field_descriptor_proto::{Label, Type};
    use prost_types::{
        DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
        FileDescriptorProto, FileDescriptorSet,
    };

    fn field(
        name: &str,
        number: i32,
        ty: Type,
        label: Label,
        type_name: Option<&str>,
    ) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(label as i32),
            r#type: Some(ty as i32),
            type_name: type_name.map(str::to_string),
            ..Default::default()
        }
    }

    fn schema_bytes() -> Vec<u8> {
        let timestamp = FileDescriptorProto {
            name: Some("google/protobuf/timestamp.proto".to_string()),
            package: Some("google.protobuf".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Timestamp".to_string()),
                field: vec![
                    field("seconds", 1, Type::Int64, Label::Optional, None),
                    field("nanos", 2, Type::Int32, Label::Optional, None),
                ],
                ..Default::default()
            }],
            ..Default::default()
        };
        let trade = FileDescriptorProto {
            name: Some("trade.proto".to_string()),
            package: Some("test".to_string()),
            syntax: Some("proto2".to_string()),
            dependency: vec!["google/protobuf/timestamp.proto".to_string()],
            enum_type: vec![EnumDescriptorProto {
                name: Some("Side".to_string()),
                value: vec![
                    EnumValueDescriptorProto {
                        name: Some("BUY".to_string()),
                        number: Some(0),
                        ..Default::default()
                    },
                    EnumValueDescriptorProto {
                        name: Some("SELL".to_string()),
                        number: Some(1),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            message_type: vec![
                DescriptorProto {
                    name: Some("Trade".to_string()),
                    field: vec![
                        field("symbol", 1, Type::String, Label::Optional, None),
                        field("size", 2, Type::Int32, Label::Optional, None),
                        field("price", 3, Type::Double, Label::Optional, None),
                        field("side", 4, Type::Enum, Label::Optional, Some(".test.Side")),
                        field("count", 5, Type::Uint32, Label::Optional, None),
                        field(
                            "at",
                            6,
                            Type::Message,
                            Label::Optional,
                            Some(".google.protobuf.Timestamp"),
                        ),
                        field("tags", 7, Type::String, Label::Repeated, None),
                    ],
                    ..Default::default()
                },
                DescriptorProto {
                    name: Some("Wrapper".to_string()),
                    field: vec![field(
                        "trade",
                        1,
                        Type::Message,
                        Label::Optional,
                        Some(".test.Trade"),
                    )],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        FileDescriptorSet {
            file: vec![timestamp, trade],
        }
        .encode_to_vec()
    }

    fn trade_schema() -> ProtobufSchema {
        ProtobufSchema::parse(&schema_bytes(), "test.Trade").unwrap()
    }

    fn full_trade(pool: &DescriptorPool, message: &MessageDescriptor) -> Vec<u8> {
        let mut at = DynamicMessage::new(pool.get_message_by_name(TIMESTAMP).unwrap());
        at.set_field_by_name("seconds", Value::I64(1_700_000_000));
        at.set_field_by_name("nanos", Value::I32(5));

        let mut msg = DynamicMessage::new(message.clone());
        msg.set_field_by_name("symbol", Value::String("AAPL".to_string()));
        msg.set_field_by_name("size", Value::I32(10));
        msg.set_field_by_name("price", Value::F64(1.25));
        msg.set_field_by_name("side", Value::EnumNumber(1));
        msg.set_field_by_name("count", Value::U32(u32::MAX));
        msg.set_field_by_name("at", Value::Message(at));
        msg.set_field_by_name(
            "tags",
            Value::List(vec![Value::String("a".to_string()), Value::String("b".to_string())]),
        );
        msg.encode_to_vec()
    }

    #[test]
    fn test_field_kinds() {
        let schema = trade_schema();
        let keys = schema.keys().unwrap();
        let kinds: Vec<String> = keys.iter().map(|k| format!("{}:{}", k, k.kind())).collect();
        assert_eq!(
            kinds,
            vec![
                "symbol:string",
                "size:int",
                "price:double",
                "side:int",
                "count:long",
                "at:timestamp",
                "tags:array<string>",
            ]
        );
    }

    #[test]
    fn test_transcode_rows() {
        let schema = trade_schema();
        let message = schema.message_descriptor();
        let writer = record_writer(message).unwrap();
        let mut stream = RecordingStream::new(writer.keys().unwrap());
        let bound = writer.bind(&stream).unwrap();

        let data = full_trade(schema.pool(), message);
        transcode(&data, message, &bound, &mut stream).unwrap();
        let empty = DynamicMessage::new(message.clone()).encode_to_vec();
        transcode(&empty, message, &bound, &mut stream).unwrap();

        assert_eq!(stream.column(0), &[Some(Object::string("AAPL")), None]);
        assert_eq!(stream.column(1), &[Some(Object::Int(10)), None]);
        assert_eq!(stream.column(2), &[Some(Object::Double(1.25)), None]);
        assert_eq!(stream.column(3), &[Some(Object::Int(1)), None]);
        assert_eq!(
            stream.column(4),
            &[Some(Object::Long(i64::from(u32::MAX))), None]
        );
        assert_eq!(
            stream.column(5),
            &[
                DateTime::from_timestamp(1_700_000_000, 5).map(Object::Timestamp),
                None
            ]
        );
        assert_eq!(
            stream.column(6),
            &[
                Some(Object::array([Object::string("a"), Object::string("b")])),
                Some(Object::array([])),
            ]
        );
    }

    #[test]
    fn test_field_function_is_null_guarded() {
        let schema = trade_schema();
        let size = schema.message_descriptor().get_field_by_name("size").unwrap();
        let f = field_function(&size).unwrap();
        let empty = DynamicMessage::new(schema.message_descriptor().clone());
        assert_eq!(f.as_int().unwrap().apply(&empty), NULL_INT);

        let at = schema.message_descriptor().get_field_by_name("at").unwrap();
        let f = field_function(&at).unwrap();
        assert_eq!(f.kind(), ValueKind::Generic(GenericKind::Timestamp));
        assert_eq!(f.as_object().unwrap().apply(&empty), None);
    }

    #[test]
    fn test_field_functions_compare_by_field() {
        let schema = trade_schema();
        let message = schema.message_descriptor();
        let size = message.get_field_by_name("size").unwrap();
        let side = message.get_field_by_name("side").unwrap();

        assert_eq!(field_function(&size).unwrap(), field_function(&size).unwrap());
        assert_ne!(field_function(&size).unwrap(), field_function(&side).unwrap());
    }

    #[test]
    fn test_nested_message_rejected() {
        let schema = ProtobufSchema::parse(&schema_bytes(), "test.Wrapper").unwrap();
        let err = record_writer(schema.message_descriptor()).err().unwrap();
        assert!(matches!(
            err,
            ProtobufError::UnsupportedField { ref field, ref kind }
                if field == "test.Wrapper.trade" && kind == "test.Trade"
        ));
    }

    #[test]
    fn test_decode_error() {
        let schema = trade_schema();
        let message = schema.message_descriptor();
        let writer = record_writer(message).unwrap();
        let mut stream = RecordingStream::new(writer.keys().unwrap());
        let bound = writer.bind(&stream).unwrap();
        let err = transcode(&[0xff, 0xff], message, &bound, &mut stream).unwrap_err();
        assert!(matches!(err, ProtobufError::Decode(_)));
    }

    #[test]
    fn test_missing_message() {
        assert!(matches!(
            ProtobufSchema::parse(&schema_bytes(), "test.Missing"),
            Err(ProtobufError::MessageNotFound(_))
        ));
        let keys_err = SinkError::KeyNotFound { key: "x".into() };
        assert!(matches!(
            ProtobufError::from(keys_err),
            ProtobufError::Sink(SinkError::KeyNotFound { .. })
        ));
    }
}
