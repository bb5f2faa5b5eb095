use dax_codec::Value;
use proptest::prelude::*;

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<u64>().prop_map(Value::UInt),
        any::<u64>().prop_map(Value::NInt),
        any::<f64>().prop_filter("NaN breaks equality", |f| !f.is_nan()).prop_map(Value::Float),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
        ".*".prop_map(Value::text),
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ];

    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..8).prop_map(Value::Sequence),
            proptest::collection::vec((inner.clone(), inner.clone()), 0..8).prop_map(Value::Map),
            (1u64..1_000_000, inner).prop_map(|(t, v)| Value::tagged(t, v)),
        ]
    })
}

proptest! {
    #[test]
    fn encode_then_decode_is_identity(value in arb_value()) {
        let bytes = dax_codec::encode(&value);
        let (decoded, remaining) = dax_codec::decode(&bytes).expect("decode should succeed for any encoded Value");
        prop_assert_eq!(decoded, value);
        prop_assert!(remaining.is_empty());
    }
}
