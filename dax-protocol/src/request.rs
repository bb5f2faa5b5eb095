//! Request/reply framing: turning a named operation plus a parameter map
//! into the CBE envelope DAX expects on the wire, and turning a decoded CBE
//! reply back into either a body value or a server-reported error.
//!
//! Follows a generic `query<Q, R>` pattern: one typed request moves to one
//! typed response over a single connection, simplified to this protocol's
//! flat, non-stateful request/reply shape (no acquire/release session
//! state).

use dax_codec::Value;

use crate::error::Error;
use crate::wire::{Operation, SERVICE_ID};

/// A fully-built request, ready to serialise onto the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub operation: Operation,
    pub params: Vec<(String, Value)>,
}

impl Request {
    pub fn new(operation: Operation, params: Vec<(String, Value)>) -> Result<Self, Error> {
        validate_keys(operation, &params)?;
        Ok(Request { operation, params })
    }

    /// Serialises to the wire form DAX expects: three separately-encoded,
    /// concatenated top-level CBE values — `U(service_id) || U(method_id) ||
    /// V(params)` — not one value wrapping the three. A peer decoding this
    /// stream reads the service id as a lone integer, not as the first
    /// element of an array.
    pub fn encode(&self) -> Vec<u8> {
        let params = Value::map(
            self.params
                .iter()
                .map(|(k, v)| (Value::text(k.clone()), v.clone())),
        );

        let mut bytes = dax_codec::encode(&Value::UInt(SERVICE_ID));
        bytes.extend(dax_codec::encode(&Value::UInt(self.operation.method_id())));
        bytes.extend(dax_codec::encode(&params));
        bytes
    }
}

/// A decoded reply: either a successful body value or a server-reported
/// error.
///
/// On the wire a reply is two separately-encoded, concatenated top-level CBE
/// values — `V(error_descriptor) || V(body)` — not one `[status, body]`
/// array. `error_descriptor` is a (possibly empty) sequence whose first two
/// elements, when present, are a numeric status code and a message; a
/// non-zero status short-circuits before the body is ever decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok(Value),
    Err {
        status: u64,
        message: String,
        request_id: Option<String>,
    },
}

impl Reply {
    /// True if `descriptor`'s first element is a non-zero status code — the
    /// caller should not attempt to read a body value in this case.
    pub fn descriptor_is_error(descriptor: &Value) -> bool {
        matches!(descriptor.as_sequence(), Some([status, ..]) if !matches!(status, Value::UInt(0)))
    }

    /// Builds a `Reply` from the already-decoded error descriptor and, when
    /// present, body values. Pass [`Value::Null`] for `body` when
    /// [`Reply::descriptor_is_error`] returned `true` and the body was never
    /// read off the wire.
    pub fn from_parts(descriptor: Value, body: Value) -> Result<Self, Error> {
        let items = descriptor
            .as_sequence()
            .ok_or(Error::MissingRequiredField("error descriptor"))?;

        match items {
            [] => Ok(Reply::Ok(body)),
            [status, rest @ ..] => {
                let status = match status {
                    Value::UInt(n) => *n,
                    _ => return Err(Error::MissingRequiredField("status code")),
                };

                if status == 0 {
                    Ok(Reply::Ok(body))
                } else {
                    let message = rest.first().and_then(Value::as_text).unwrap_or("").to_string();
                    let request_id = rest.get(1).and_then(Value::as_text).map(str::to_owned);
                    Ok(Reply::Err {
                        status,
                        message,
                        request_id,
                    })
                }
            }
        }
    }

    /// Turns a `Reply` into a `Result`, surfacing a server-reported error as
    /// [`Error::ServerError`].
    pub fn into_result(self) -> Result<Value, Error> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Err {
                status,
                message,
                request_id,
            } => Err(Error::ServerError {
                status,
                message,
                request_id,
            }),
        }
    }
}

/// Required and optional parameter keys for each operation. Anything outside
/// this set is rejected as [`Error::ExtraKey`]; anything required but absent
/// is rejected as [`Error::MissingKey`].
///
/// `UpdateItem`'s update payload and `Query`/`Scan`'s condition expressions
/// are listed as optional and are otherwise opaque to this validation pass —
/// only key-shaped parameters are ever checked beyond presence.
fn key_spec(operation: Operation) -> (&'static [&'static str], &'static [&'static str]) {
    match operation {
        Operation::GetItem => (
            &["TableName", "Key"],
            &["AttributesToGet", "ConsistentRead", "ProjectionExpression"],
        ),
        Operation::PutItem => (
            &["TableName", "Item"],
            &["Expected", "ReturnValues", "ConditionExpression"],
        ),
        Operation::DeleteItem => (
            &["TableName", "Key"],
            &["Expected", "ReturnValues", "ConditionExpression"],
        ),
        Operation::UpdateItem => (
            &["TableName", "Key"],
            &[
                "AttributeUpdates",
                "UpdateExpression",
                "Expected",
                "ReturnValues",
                "ConditionExpression",
            ],
        ),
        Operation::BatchGetItem => (&["RequestItems"], &[]),
        Operation::BatchWriteItem => (&["RequestItems"], &[]),
        Operation::Query => (
            &["TableName"],
            &[
                "KeyConditions",
                "KeyConditionExpression",
                "FilterExpression",
                "ExclusiveStartKey",
                "IndexName",
                "Limit",
                "ConsistentRead",
                "ScanIndexForward",
                "ProjectionExpression",
            ],
        ),
        Operation::Scan => (
            &["TableName"],
            &[
                "FilterExpression",
                "ExclusiveStartKey",
                "IndexName",
                "Limit",
                "ConsistentRead",
                "ProjectionExpression",
                "Segment",
                "TotalSegments",
            ],
        ),
        Operation::DescribeTable => (&["TableName"], &[]),
    }
}

fn validate_keys(operation: Operation, params: &[(String, Value)]) -> Result<(), Error> {
    let (required, optional) = key_spec(operation);

    for key in required {
        if !params.iter().any(|(k, _)| k == key) {
            return Err(Error::MissingKey(key.to_string()));
        }
    }

    for (key, _) in params {
        if !required.contains(&key.as_str()) && !optional.contains(&key.as_str()) {
            return Err(Error::ExtraKey(key.clone()));
        }
    }

    Ok(())
}
