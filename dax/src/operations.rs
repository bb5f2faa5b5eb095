use dax_codec::Value;
use dax_network::Signer;
use dax_protocol::{AttributeValue, KeyElement, KeySchema, Operation, Request};
use tracing::warn;

use crate::error::Error;
use crate::Client;

type Item = Vec<(String, AttributeValue)>;

fn item_to_cbe(item: &Item) -> Value {
    Value::map(item.iter().map(|(k, v)| (Value::text(k.clone()), v.to_cbe())))
}

fn cbe_to_item(value: &Value) -> Result<Item, Error> {
    match AttributeValue::from_cbe(value)? {
        AttributeValue::Map(entries) => Ok(entries),
        other => Ok(vec![("_value".to_string(), other)]),
    }
}

/// `Table.KeySchema`'s entries, as returned by `DescribeTable`, collapsed
/// into the internal `{hash, range?}` shape. Missing `KeyType` defaults to
/// `HASH`/`RANGE` in list order; a missing `AttributeType` is treated as
/// text (`"S"`).
fn key_schema_from_describe_table(body: &Value) -> Option<KeySchema> {
    let table = body.get("Table")?;
    let elements = table.get("KeySchema")?.as_sequence()?;

    let mut hash_key = None;
    let mut range_key = None;

    for (index, element) in elements.iter().enumerate() {
        let map = element.as_map()?;
        let name = map
            .iter()
            .find(|(k, _)| k.as_text() == Some("AttributeName"))
            .and_then(|(_, v)| v.as_text())?
            .to_string();

        let attribute_type = map
            .iter()
            .find(|(k, _)| k.as_text() == Some("AttributeType"))
            .and_then(|(_, v)| v.as_text())
            .unwrap_or("S")
            .to_string();

        let key_type = map
            .iter()
            .find(|(k, _)| k.as_text() == Some("KeyType"))
            .and_then(|(_, v)| v.as_text())
            .unwrap_or(if index == 0 { "HASH" } else { "RANGE" });

        let element = KeyElement::new(name, attribute_type);

        match key_type {
            "HASH" => hash_key = Some(element),
            "RANGE" => range_key = Some(element),
            _ => {}
        }
    }

    hash_key.map(|hash_key| KeySchema::new(hash_key, range_key))
}

impl<S: Signer + Clone + Send + Sync + 'static> Client<S> {
    pub async fn get_item(
        &self,
        table_name: impl Into<String>,
        key: &Item,
    ) -> Result<Option<Item>, Error> {
        let table_name = table_name.into();
        self.validate_key(&table_name, key).await?;

        let params = vec![
            ("TableName".to_string(), Value::text(table_name)),
            ("Key".to_string(), item_to_cbe(key)),
        ];

        let body = self.execute(Operation::GetItem, params).await?;

        match body.get("Item") {
            Some(item) => Ok(Some(cbe_to_item(item)?)),
            None => Ok(None),
        }
    }

    /// Validates the key projection in `item` only if both halves of a
    /// cached schema are present; an item missing the range attribute is
    /// not necessarily malformed (the schema may be hash-only, or unknown),
    /// so this never raises `MissingKey` the way `get_item`/`delete_item`/
    /// `update_item` do.
    pub async fn put_item(&self, table_name: impl Into<String>, item: &Item) -> Result<(), Error> {
        let table_name = table_name.into();

        if let Some(schema) = self.key_schema_cache().get(&table_name) {
            let has = |name: &str| item.iter().any(|(k, _)| k == name);
            let range_present = schema
                .range_key
                .as_ref()
                .map(|r| has(&r.attribute_name))
                .unwrap_or(true);
            if has(&schema.hash_key.attribute_name) && range_present {
                let projection: Item = item
                    .iter()
                    .filter(|(k, _)| {
                        k == &schema.hash_key.attribute_name
                            || schema.range_key.as_ref().map(|r| &r.attribute_name) == Some(k)
                    })
                    .cloned()
                    .collect();
                schema.validate_key(&projection)?;
            }
        }

        let params = vec![
            ("TableName".to_string(), Value::text(table_name)),
            ("Item".to_string(), item_to_cbe(item)),
        ];

        self.execute(Operation::PutItem, params).await?;
        Ok(())
    }

    pub async fn delete_item(&self, table_name: impl Into<String>, key: &Item) -> Result<(), Error> {
        let table_name = table_name.into();
        self.validate_key(&table_name, key).await?;

        let params = vec![
            ("TableName".to_string(), Value::text(table_name)),
            ("Key".to_string(), item_to_cbe(key)),
        ];

        self.execute(Operation::DeleteItem, params).await?;
        Ok(())
    }

    /// `attribute_updates` is passed through unvalidated beyond the key
    /// projection above it — the server is authoritative for update
    /// semantics, so the facade does not interpret this payload.
    pub async fn update_item(
        &self,
        table_name: impl Into<String>,
        key: &Item,
        attribute_updates: Value,
    ) -> Result<(), Error> {
        let table_name = table_name.into();
        self.validate_key(&table_name, key).await?;

        let params = vec![
            ("TableName".to_string(), Value::text(table_name)),
            ("Key".to_string(), item_to_cbe(key)),
            ("AttributeUpdates".to_string(), attribute_updates),
        ];

        self.execute(Operation::UpdateItem, params).await?;
        Ok(())
    }

    /// Validates each table's keys in `request_items` (`{table: {Keys:
    /// [key, ...]}}`) against that table's cached schema, the same way a
    /// single `GetItem` would, before the batch ever reaches the wire.
    pub async fn batch_get_item(&self, request_items: Value) -> Result<Value, Error> {
        if let Some(tables) = request_items.as_map() {
            for (table_name, spec) in tables {
                let Some(table_name) = table_name.as_text() else {
                    continue;
                };
                let Some(keys) = spec.get("Keys").and_then(Value::as_sequence) else {
                    continue;
                };
                for key in keys {
                    let key_item = cbe_to_item(key)?;
                    self.validate_key(table_name, &key_item).await?;
                }
            }
        }

        let params = vec![("RequestItems".to_string(), request_items)];
        self.execute(Operation::BatchGetItem, params).await
    }

    /// Validates each table's keys in `request_items` (`{table:
    /// [{PutRequest:{Item}} | {DeleteRequest:{Key}}, ...]}`) the same way
    /// `get_item`/`delete_item`/`put_item` would, one write request at a
    /// time.
    pub async fn batch_write_item(&self, request_items: Value) -> Result<Value, Error> {
        if let Some(tables) = request_items.as_map() {
            for (table_name, writes) in tables {
                let Some(table_name) = table_name.as_text() else {
                    continue;
                };
                let Some(writes) = writes.as_sequence() else {
                    continue;
                };

                for write in writes {
                    if let Some(delete_request) = write.get("DeleteRequest") {
                        if let Some(key) = delete_request.get("Key") {
                            let key_item = cbe_to_item(key)?;
                            self.validate_key(table_name, &key_item).await?;
                        }
                    }
                    // PutRequest's Item is validated the same lenient way
                    // put_item validates a standalone item: only if both
                    // key halves are present.
                    if let Some(put_request) = write.get("PutRequest") {
                        if let Some(item) = put_request.get("Item") {
                            let item = cbe_to_item(item)?;
                            if let Some(schema) = self.key_schema_cache().get(table_name) {
                                let has = |name: &str| item.iter().any(|(k, _)| k == name);
                                let range_present = schema
                                    .range_key
                                    .as_ref()
                                    .map(|r| has(&r.attribute_name))
                                    .unwrap_or(true);
                                if has(&schema.hash_key.attribute_name) && range_present {
                                    let projection: Item = item
                                        .iter()
                                        .filter(|(k, _)| {
                                            k == &schema.hash_key.attribute_name
                                                || schema.range_key.as_ref().map(|r| &r.attribute_name)
                                                    == Some(k)
                                        })
                                        .cloned()
                                        .collect();
                                    schema.validate_key(&projection)?;
                                }
                            }
                        }
                    }
                }
            }
        }

        let params = vec![("RequestItems".to_string(), request_items)];
        self.execute(Operation::BatchWriteItem, params).await
    }

    /// `key_conditions`/`exclusive_start_key` are passed through opaque to
    /// framing; only the presence of `TableName` is validated.
    pub async fn query(
        &self,
        table_name: impl Into<String>,
        key_conditions: Value,
        exclusive_start_key: Option<&Item>,
    ) -> Result<Value, Error> {
        let mut params = vec![
            ("TableName".to_string(), Value::text(table_name.into())),
            ("KeyConditions".to_string(), key_conditions),
        ];

        if let Some(key) = exclusive_start_key {
            params.push(("ExclusiveStartKey".to_string(), item_to_cbe(key)));
        }

        self.execute(Operation::Query, params).await
    }

    pub async fn scan(
        &self,
        table_name: impl Into<String>,
        exclusive_start_key: Option<&Item>,
    ) -> Result<Value, Error> {
        let mut params = vec![("TableName".to_string(), Value::text(table_name.into()))];

        if let Some(key) = exclusive_start_key {
            params.push(("ExclusiveStartKey".to_string(), item_to_cbe(key)));
        }

        self.execute(Operation::Scan, params).await
    }

    pub async fn describe_table(&self, table_name: impl Into<String>) -> Result<Value, Error> {
        let params = vec![("TableName".to_string(), Value::text(table_name.into()))];
        self.execute(Operation::DescribeTable, params).await
    }

    /// Validates `key` against the table's cached schema, warming the
    /// cache with a `DescribeTable` round-trip on a miss. A failure in the
    /// warming call is logged and swallowed: the operation proceeds with
    /// no key validation at all, matching the server-side check that still
    /// applies once the request lands.
    async fn validate_key(&self, table_name: &str, key: &Item) -> Result<(), Error> {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let schema = match self.key_schema_cache().get(table_name) {
            Some(schema) => Some(schema),
            None => self.warm_key_schema_cache(table_name).await,
        };

        if let Some(schema) = schema {
            schema.validate_key(key)?;
        }

        Ok(())
    }

    async fn warm_key_schema_cache(&self, table_name: &str) -> Option<KeySchema> {
        let params = vec![("TableName".to_string(), Value::text(table_name.to_string()))];

        match self.execute(Operation::DescribeTable, params).await {
            Ok(body) => {
                let schema = key_schema_from_describe_table(&body)?;
                self.key_schema_cache()
                    .insert(table_name.to_string(), schema.clone());
                Some(schema)
            }
            Err(err) => {
                warn!(table = table_name, error = %err, "DescribeTable fallback failed, proceeding without key validation");
                None
            }
        }
    }

    pub(crate) async fn execute(
        &self,
        operation: Operation,
        params: Vec<(String, Value)>,
    ) -> Result<Value, Error> {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let request = Request::new(operation, params)?;
        let mut conn = self.pool.checkout().await?;

        match conn.send_request(&request).await {
            Ok(reply) => reply
                .into_result()
                .map_err(dax_network::Error::from)
                .map_err(Error::from),
            Err(err) => {
                let endpoint = conn.endpoint().clone();
                conn.discard();
                self.mark_endpoint_bad(&endpoint);
                Err(Error::from(err))
            }
        }
    }
}
