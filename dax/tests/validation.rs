//! Exercises the parts of `Client` that never need a live connection: key
//! validation against a pre-populated schema cache short-circuits before
//! any socket is touched, and a closed client rejects every operation the
//! same way.

use dax::{AttributeValue, Client, Config, Error};
use dax_network::EndpointList;
use dax_protocol::{KeyElement, KeySchema};

fn orders_schema() -> KeySchema {
    KeySchema::new(KeyElement::new("id", "N"), Some(KeyElement::new("sort", "S")))
}

#[derive(Clone)]
struct NullSigner;

impl dax_network::signer::LocalSigner for NullSigner {
    async fn sign(&self) -> Result<dax_network::signer::SignedAuth, dax_network::Error> {
        Ok(dax_network::signer::SignedAuth {
            access_key: "AKIATEST".to_string(),
            signature: "00".to_string(),
            string_to_sign: b"test".to_vec(),
            token: None,
        })
    }
}

fn client() -> Client<NullSigner> {
    let config = Config::new(EndpointList::parse("dax://localhost:8111").unwrap());
    Client::new(config, NullSigner).unwrap()
}

#[tokio::test]
async fn a_missing_sort_key_fails_validation_before_any_socket_is_touched() {
    let client = client();
    client
        .key_schema_cache()
        .insert("orders".to_string(), orders_schema());

    let key = vec![("id".to_string(), AttributeValue::N("1".to_string()))];
    let err = client.get_item("orders", &key).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Validation(dax_protocol::Error::MissingKey(k)) if k == "sort"
    ));
}

#[tokio::test]
async fn an_attribute_outside_the_schema_fails_as_extra_key() {
    let client = client();
    client
        .key_schema_cache()
        .insert("orders".to_string(), orders_schema());

    let key = vec![
        ("id".to_string(), AttributeValue::N("1".to_string())),
        ("sort".to_string(), AttributeValue::S("a".to_string())),
        ("extra".to_string(), AttributeValue::S("x".to_string())),
    ];
    let err = client.delete_item("orders", &key).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Validation(dax_protocol::Error::ExtraKey(k)) if k == "extra"
    ));
}

#[tokio::test]
async fn put_item_is_unvalidated_when_the_item_lacks_the_cached_range_key() {
    let client = client();
    client
        .key_schema_cache()
        .insert("orders".to_string(), orders_schema());

    // `sort` is absent; per the PutItem rule this proceeds unvalidated
    // rather than failing locally. It still fails once it reaches the
    // network, since this test never starts a server, but that failure
    // must be a network error, not a validation error.
    let item = vec![("id".to_string(), AttributeValue::N("1".to_string()))];
    let err = client.put_item("orders", &item).await.unwrap_err();

    assert!(matches!(err, Error::RequestFailed(_)));
}

#[tokio::test]
async fn a_closed_client_rejects_every_operation_without_touching_the_pool() {
    let client = client();
    client.close();

    let key = vec![("id".to_string(), AttributeValue::N("1".to_string()))];
    let err = client.get_item("orders", &key).await.unwrap_err();
    assert!(matches!(err, Error::Closed));
}
