use minicbor::data::{Tag, Type};
use minicbor::{decode, encode, Decode, Decoder, Encode, Encoder};

/// A value in the compact binary encoding (CBE) domain.
///
/// CBE is a self-delimiting tagged union: every value starts with a single
/// prefix byte carrying a major category and either an immediate small value
/// or one of four length-prefix forms (1, 2, 4 or 8 further bytes,
/// big-endian). Mapping key order is producer-chosen and insignificant to
/// equality (`Map` compares structurally, so two maps built with different
/// insertion orders but the same pairs are not `==`, matching how DAX
/// itself treats map key order as stable-within-an-encode but otherwise
/// arbitrary).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Non-negative integer, major type 0.
    UInt(u64),
    /// Negative integer, major type 1. The represented value is
    /// `-(1 + n)`, mirroring CBOR's native encoding of negative integers.
    NInt(u64),
    /// IEEE-754 double precision float, major type 7.
    Float(f64),
    /// Opaque byte string, major type 2.
    Bytes(Vec<u8>),
    /// UTF-8 text string, major type 3.
    Text(String),
    /// Definite-length sequence, major type 4.
    Sequence(Vec<Value>),
    /// Definite-length mapping, major type 5.
    Map(Vec<(Value, Value)>),
    /// Boolean, major type 7.
    Bool(bool),
    /// Null, major type 7.
    Null,
    /// A tag number (major type 6) wrapping an inner value.
    Tagged(u64, Box<Value>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(pairs.into_iter().collect())
    }

    pub fn sequence(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Sequence(items.into_iter().collect())
    }

    pub fn tagged(tag: u64, inner: Value) -> Self {
        Value::Tagged(tag, Box::new(inner))
    }

    /// Returns the entries of a `Map` value, or `None` for any other variant.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a key by text equality in a `Map` value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    }
}

impl<C> Encode<C> for Value {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        match self {
            Value::UInt(n) => {
                e.u64(*n)?;
            }
            Value::NInt(n) => {
                let magnitude = -(1i128 + i128::from(*n));
                let int = minicbor::data::Int::try_from(magnitude).map_err(|_| {
                    encode::Error::message("negative integer out of representable range")
                })?;
                e.int(int)?;
            }
            Value::Float(f) => {
                e.f64(*f)?;
            }
            Value::Bytes(b) => {
                e.bytes(b)?;
            }
            Value::Text(s) => {
                e.str(s)?;
            }
            Value::Sequence(items) => {
                e.array(items.len() as u64)?;
                for item in items {
                    item.encode(e, ctx)?;
                }
            }
            Value::Map(pairs) => {
                e.map(pairs.len() as u64)?;
                for (k, v) in pairs {
                    k.encode(e, ctx)?;
                    v.encode(e, ctx)?;
                }
            }
            Value::Bool(b) => {
                e.bool(*b)?;
            }
            Value::Null => {
                e.null()?;
            }
            Value::Tagged(tag, inner) => {
                e.tag(Tag::Unassigned(*tag))?;
                inner.encode(e, ctx)?;
            }
        }

        Ok(())
    }
}

impl<'b, C> Decode<'b, C> for Value {
    fn decode(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 => Ok(Value::UInt(d.u64()?)),
            Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Int => {
                let magnitude = i128::from(d.int()?);

                if magnitude >= 0 {
                    Ok(Value::UInt(magnitude as u64))
                } else {
                    Ok(Value::NInt((-(magnitude + 1)) as u64))
                }
            }
            Type::F16 | Type::F32 | Type::F64 => Ok(Value::Float(d.f64()?)),
            Type::Bytes => Ok(Value::Bytes(d.bytes()?.to_vec())),
            Type::String => {
                // `d.str()` already validates UTF-8, surfacing non-UTF-8 text
                // strings as a decode error per the MalformedEncoding contract.
                Ok(Value::Text(d.str()?.to_string()))
            }
            Type::Array => {
                let len = d.array()?.ok_or_else(|| {
                    decode::Error::message("indefinite-length array is not valid CBE")
                })?;

                let mut items = Vec::with_capacity(len.min(1024) as usize);

                for _ in 0..len {
                    items.push(d.decode_with(ctx)?);
                }

                Ok(Value::Sequence(items))
            }
            Type::Map => {
                let len = d.map()?.ok_or_else(|| {
                    decode::Error::message("indefinite-length map is not valid CBE")
                })?;

                let mut pairs = Vec::with_capacity(len.min(1024) as usize);

                for _ in 0..len {
                    let key = d.decode_with(ctx)?;
                    let value = d.decode_with(ctx)?;
                    pairs.push((key, value));
                }

                Ok(Value::Map(pairs))
            }
            Type::Bool => Ok(Value::Bool(d.bool()?)),
            Type::Null => {
                d.null()?;
                Ok(Value::Null)
            }
            Type::Tag => {
                let tag = d.tag()?;

                let number = match tag {
                    Tag::Unassigned(n) => n,
                    other => {
                        return Err(decode::Error::message(format!(
                            "unsupported CBE tag: {other:?}"
                        )))
                    }
                };

                let inner: Value = d.decode_with(ctx)?;

                Ok(Value::Tagged(number, Box::new(inner)))
            }
            other => Err(decode::Error::message(format!(
                "reserved or unsupported CBE major type: {other:?}"
            ))),
        }
    }
}
