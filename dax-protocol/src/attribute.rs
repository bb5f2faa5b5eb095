//! The bridge between DynamoDB's typed attribute-value model and the raw CBE
//! [`Value`](dax_codec::Value) domain.
//!
//! Scalars and `L`/`M` round-trip through a single-key CBE map keyed by their
//! discriminator letter (`"S"`, `"N"`, `"B"`, `"BOOL"`, `"NULL"`, `"L"`,
//! `"M"`), mirroring DynamoDB's own JSON attribute-value shape. Set types are
//! the exception: they are carried as CBE tagged sequences (tags 3321/3322/
//! 3323) rather than single-key maps, since that's what the wire actually
//! sends.

use dax_codec::Value;

use crate::error::Error;
use crate::wire::tag;

/// A DynamoDB attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    S(String),
    /// Numbers travel as their decimal string form, matching DynamoDB's own
    /// arbitrary-precision `N` representation.
    N(String),
    B(Vec<u8>),
    Bool(bool),
    Null,
    StringSet(Vec<String>),
    NumberSet(Vec<String>),
    BinarySet(Vec<Vec<u8>>),
    List(Vec<AttributeValue>),
    Map(Vec<(String, AttributeValue)>),
    /// A document-path ordinal, as sent by the server inside update-path
    /// payloads. Never produced by `to_cbe`.
    DocumentPathOrdinal(u64),
}

impl AttributeValue {
    pub fn to_cbe(&self) -> Value {
        match self {
            AttributeValue::S(s) => single("S", Value::text(s.clone())),
            AttributeValue::N(n) => single("N", Value::text(n.clone())),
            AttributeValue::B(b) => single("B", Value::Bytes(b.clone())),
            AttributeValue::Bool(b) => single("BOOL", Value::Bool(*b)),
            AttributeValue::Null => single("NULL", Value::Bool(true)),
            AttributeValue::StringSet(items) => Value::tagged(
                tag::STRING_SET,
                Value::sequence(items.iter().cloned().map(Value::text)),
            ),
            AttributeValue::NumberSet(items) => Value::tagged(
                tag::NUMBER_SET,
                Value::sequence(items.iter().cloned().map(Value::text)),
            ),
            AttributeValue::BinarySet(items) => Value::tagged(
                tag::BINARY_SET,
                Value::sequence(items.iter().cloned().map(Value::Bytes)),
            ),
            AttributeValue::List(items) => single(
                "L",
                Value::sequence(items.iter().map(AttributeValue::to_cbe)),
            ),
            AttributeValue::Map(entries) => single(
                "M",
                Value::map(
                    entries
                        .iter()
                        .map(|(k, v)| (Value::text(k.clone()), v.to_cbe())),
                ),
            ),
            AttributeValue::DocumentPathOrdinal(n) => {
                Value::tagged(tag::DOCUMENT_PATH_ORDINAL, Value::UInt(*n))
            }
        }
    }

    pub fn from_cbe(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Tagged(t, inner) if *t == tag::STRING_SET => {
                Ok(AttributeValue::StringSet(text_sequence(inner)?))
            }
            Value::Tagged(t, inner) if *t == tag::NUMBER_SET => {
                Ok(AttributeValue::NumberSet(text_sequence(inner)?))
            }
            Value::Tagged(t, inner) if *t == tag::BINARY_SET => {
                Ok(AttributeValue::BinarySet(bytes_sequence(inner)?))
            }
            Value::Tagged(t, inner) if *t == tag::DOCUMENT_PATH_ORDINAL => match inner.as_ref() {
                Value::UInt(n) => Ok(AttributeValue::DocumentPathOrdinal(*n)),
                _ => Err(Error::UnrecognizedAttribute),
            },
            Value::Map(pairs) => from_discriminated_map(pairs),
            _ => Err(Error::UnrecognizedAttribute),
        }
    }
}

fn single(discriminator: &str, payload: Value) -> Value {
    Value::map([(Value::text(discriminator), payload)])
}

fn text_sequence(value: &Value) -> Result<Vec<String>, Error> {
    value
        .as_sequence()
        .ok_or(Error::UnrecognizedAttribute)?
        .iter()
        .map(|v| {
            v.as_text()
                .map(str::to_owned)
                .ok_or(Error::UnrecognizedAttribute)
        })
        .collect()
}

fn bytes_sequence(value: &Value) -> Result<Vec<Vec<u8>>, Error> {
    value
        .as_sequence()
        .ok_or(Error::UnrecognizedAttribute)?
        .iter()
        .map(|v| match v {
            Value::Bytes(b) => Ok(b.clone()),
            _ => Err(Error::UnrecognizedAttribute),
        })
        .collect()
}

/// Maps with exactly one entry whose key is a recognized discriminator
/// decode as the scalar/list/map variant it names. Anything else — zero
/// entries, more than one, or an unrecognized single key — is a nested `M`,
/// covering `Item` payloads in replies, which are ordinary multi-key maps.
fn from_discriminated_map(pairs: &[(Value, Value)]) -> Result<AttributeValue, Error> {
    if let [(key, payload)] = pairs {
        if let Some(discriminator) = key.as_text() {
            match discriminator {
                "S" => {
                    return Ok(AttributeValue::S(
                        payload
                            .as_text()
                            .ok_or(Error::UnrecognizedAttribute)?
                            .to_owned(),
                    ))
                }
                "N" => {
                    return Ok(AttributeValue::N(
                        payload
                            .as_text()
                            .ok_or(Error::UnrecognizedAttribute)?
                            .to_owned(),
                    ))
                }
                "B" => {
                    return match payload {
                        Value::Bytes(b) => Ok(AttributeValue::B(b.clone())),
                        _ => Err(Error::UnrecognizedAttribute),
                    }
                }
                "BOOL" => {
                    return match payload {
                        Value::Bool(b) => Ok(AttributeValue::Bool(*b)),
                        _ => Err(Error::UnrecognizedAttribute),
                    }
                }
                "NULL" => return Ok(AttributeValue::Null),
                "L" => {
                    let items = payload.as_sequence().ok_or(Error::UnrecognizedAttribute)?;
                    let decoded = items
                        .iter()
                        .map(AttributeValue::from_cbe)
                        .collect::<Result<Vec<_>, _>>()?;
                    return Ok(AttributeValue::List(decoded));
                }
                "M" => return decode_nested_map(payload),
                _ => {}
            }
        }
    }

    decode_nested_map(&Value::Map(pairs.to_vec()))
}

fn decode_nested_map(value: &Value) -> Result<AttributeValue, Error> {
    let pairs = value.as_map().ok_or(Error::UnrecognizedAttribute)?;
    let decoded = pairs
        .iter()
        .map(|(k, v)| {
            let key = k
                .as_text()
                .ok_or(Error::UnrecognizedAttribute)?
                .to_owned();
            let value = AttributeValue::from_cbe(v)?;
            Ok((key, value))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(AttributeValue::Map(decoded))
}
