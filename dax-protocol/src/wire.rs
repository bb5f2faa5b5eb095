//! Constants that identify the DAX wire protocol: the service id, the method
//! ids dispatched within it, and the CBE tag numbers used for set-typed
//! attribute values and the document-path ordinal.

/// The single service id every DAX request is framed under.
pub const SERVICE_ID: u64 = 1;

/// Method ids, as carried in the request envelope's method field.
pub mod method {
    pub const GET_ITEM: u64 = 263_244_906;
    pub const PUT_ITEM: u64 = 20_969;
    pub const DELETE_ITEM: u64 = 7;
    pub const UPDATE_ITEM: u64 = 10;
    pub const BATCH_GET_ITEM: u64 = 697_851_100;
    pub const BATCH_WRITE_ITEM: u64 = 116_217_951;
    pub const QUERY: u64 = 2;
    pub const SCAN: u64 = 3;
    pub const DESCRIBE_TABLE: u64 = 4;
    pub const DEFINE_KEY_SCHEMA: u64 = 681;
    pub const DEFINE_ATTRIBUTE_LIST: u64 = 656;
    pub const DEFINE_ATTRIBUTE_LIST_ID: u64 = 657;
    pub const AUTHORIZE_CONNECTION: u64 = 1_489_122_155;
}

/// CBE tag numbers for DynamoDB's set-typed attribute values, and the
/// receive-only document-path-ordinal tag used inside update expressions.
pub mod tag {
    /// String set (`SS`).
    pub const STRING_SET: u64 = 3321;
    /// Number set (`NS`).
    pub const NUMBER_SET: u64 = 3322;
    /// Binary set (`BS`).
    pub const BINARY_SET: u64 = 3323;
    /// Document-path ordinal. Only ever produced by the server; the bridge
    /// never emits it on encode.
    pub const DOCUMENT_PATH_ORDINAL: u64 = 3324;
}

/// The fixed magic string exchanged during the opening handshake.
pub const HANDSHAKE_MAGIC: &str = "J7yne5G";

/// Names of the operations dispatchable over this protocol, used for
/// per-operation key validation in [`crate::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetItem,
    PutItem,
    DeleteItem,
    UpdateItem,
    BatchGetItem,
    BatchWriteItem,
    Query,
    Scan,
    DescribeTable,
}

impl Operation {
    pub fn method_id(self) -> u64 {
        match self {
            Operation::GetItem => method::GET_ITEM,
            Operation::PutItem => method::PUT_ITEM,
            Operation::DeleteItem => method::DELETE_ITEM,
            Operation::UpdateItem => method::UPDATE_ITEM,
            Operation::BatchGetItem => method::BATCH_GET_ITEM,
            Operation::BatchWriteItem => method::BATCH_WRITE_ITEM,
            Operation::Query => method::QUERY,
            Operation::Scan => method::SCAN,
            Operation::DescribeTable => method::DESCRIBE_TABLE,
        }
    }

    pub fn from_method_id(id: u64) -> Option<Self> {
        Some(match id {
            method::GET_ITEM => Operation::GetItem,
            method::PUT_ITEM => Operation::PutItem,
            method::DELETE_ITEM => Operation::DeleteItem,
            method::UPDATE_ITEM => Operation::UpdateItem,
            method::BATCH_GET_ITEM => Operation::BatchGetItem,
            method::BATCH_WRITE_ITEM => Operation::BatchWriteItem,
            method::QUERY => Operation::Query,
            method::SCAN => Operation::Scan,
            method::DESCRIBE_TABLE => Operation::DescribeTable,
            _ => return None,
        })
    }
}
