use crate::attribute::AttributeValue;
use crate::error::Error;

/// One key element: an attribute name paired with its declared type
/// (`"S"`/`"N"`/`"B"`), matching §3's `HashKeyElement`/`RangeKeyElement`
/// shape (`{AttributeName, AttributeType}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyElement {
    pub attribute_name: String,
    pub attribute_type: String,
}

impl KeyElement {
    pub fn new(attribute_name: impl Into<String>, attribute_type: impl Into<String>) -> Self {
        KeyElement {
            attribute_name: attribute_name.into(),
            attribute_type: attribute_type.into(),
        }
    }
}

/// The hash (and optional range) key of a table, as learned from a
/// `DescribeTable` reply's `Table.KeySchema` and cached by `dax-network`'s
/// `KeySchemaCache`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub hash_key: KeyElement,
    pub range_key: Option<KeyElement>,
}

impl KeySchema {
    pub fn new(hash_key: KeyElement, range_key: Option<KeyElement>) -> Self {
        KeySchema { hash_key, range_key }
    }

    /// Confirms `key` carries exactly the hash key (and, if the schema has
    /// one, the range key) named by this schema — no more, no fewer.
    pub fn validate_key(&self, key: &[(String, AttributeValue)]) -> Result<(), Error> {
        let has = |name: &str| key.iter().any(|(k, _)| k == name);

        if !has(&self.hash_key.attribute_name) {
            return Err(Error::MissingKey(self.hash_key.attribute_name.clone()));
        }

        if let Some(range_key) = &self.range_key {
            if !has(&range_key.attribute_name) {
                return Err(Error::MissingKey(range_key.attribute_name.clone()));
            }
        }

        for (k, _) in key {
            let is_hash = k == &self.hash_key.attribute_name;
            let is_range = self
                .range_key
                .as_ref()
                .is_some_and(|r| &r.attribute_name == k);

            if !is_hash && !is_range {
                return Err(Error::ExtraKey(k.clone()));
            }
        }

        Ok(())
    }
}
