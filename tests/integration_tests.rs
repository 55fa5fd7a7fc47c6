//! Integration tests for the vector engine.
//!
//! These exercise wrap → kernels → export across crate boundaries using
//! in-memory Arrow arrays.

use std::sync::{Arc, Once};

use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::types::Int64Type;
use arrow_array::{
    Array, ArrayRef, BooleanArray, Int64Array, ListArray, RecordBatch, StringArray,
};
use arrow_buffer::{BooleanBuffer, NullBuffer};
use arrow_schema::{DataType, Field, Schema};
use proptest::prelude::*;
use vector_engine::{
    AnyVector, Bitmap, BoolVector, BytesVector, BytesVectorBuilder, CmpOp, ColumnBatch,
    Date32Vector, Float64Vector, Int64Vector, IntervalValue, IntervalVector, NestedVector,
    Time32Vector, Time64Vector, TimestampVector, TypeTag, Value, Vector, VectorConfig,
    VectorError, NULL_HASH,
};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// 13 Int64 rows; the window `[3, 13)` has validity bits `1101101101`.
fn offset_int_array() -> Int64Array {
    let bits = [
        true, true, true, // outside the window
        true, true, false, true, true, false, true, true, false, true,
    ];
    let values: Vec<i64> = (0..13).map(|i| i * 10).collect();
    let nulls = NullBuffer::from(bits.to_vec());
    Int64Array::new(values.into(), Some(nulls)).slice(3, 10)
}

// ---------------------------------------------------------------------------
// Offset wrapping
// ---------------------------------------------------------------------------

#[test]
fn test_wrap_offset_array() {
    init_tracing();
    let array = offset_int_array();
    let vector = Int64Vector::from_arrow(&array).unwrap();

    assert_eq!(vector.len(), 10);
    assert!(vector.is_null(2));
    assert!(!vector.is_null(0));
    assert_eq!(vector.value(0).unwrap(), Some(30));
    assert_eq!(vector.null_count(), 3);

    let taken = vector.take(&[0, 2, 4]).unwrap();
    assert!(!taken.is_null(0));
    assert!(taken.is_null(1));
    assert!(!taken.is_null(2));
    assert_eq!(taken.value(2).unwrap(), Some(70));
}

#[test]
fn test_validity_realigned_for_every_offset() {
    init_tracing();
    let len = 100;
    let bits: Vec<bool> = (0..len + 64).map(|i| (i * 7 + i / 3) % 5 != 0).collect();
    let values: Vec<i64> = (0..(len + 64) as i64).collect();
    let full = Int64Array::new(values.into(), Some(NullBuffer::from(bits.clone())));

    for k in 0..64 {
        let vector = Int64Vector::from_arrow(&full.slice(k, len)).unwrap();
        for i in 0..len {
            assert_eq!(vector.is_null(i), !bits[k + i], "offset {} row {}", k, i);
        }
        assert_eq!(vector.validity().map_or(0, |v| v.bit_offset()), 0);
    }
}

#[test]
fn test_boolean_values_realigned() {
    let bools: Vec<bool> = (0..70).map(|i| i % 3 == 1).collect();
    let buffer = BooleanBuffer::from(bools.clone());
    for k in [1, 5, 9, 63] {
        let array = BooleanArray::new(buffer.slice(k, 70 - k), None);
        let vector = AnyVector::from_arrow(&array).unwrap();
        let expected: Vec<Option<Value>> =
            bools[k..].iter().map(|b| Some(Value::Boolean(*b))).collect();
        assert_eq!(vector.to_list(), expected);
    }
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn test_round_trip_shares_buffers() {
    init_tracing();
    let array = offset_int_array();
    let vector = Int64Vector::from_arrow(&array).unwrap();
    let back = vector.to_arrow().unwrap();
    let ints = back.as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(ints, &array);
    assert_eq!(ints.values().as_ptr(), array.values().as_ptr());
}

#[test]
fn test_round_trip_record_batch() {
    init_tracing();
    let ids: ArrayRef = Arc::new(Int64Array::from(vec![Some(1), None, Some(3)]));
    let names: ArrayRef = Arc::new(StringArray::from(vec![Some("a"), Some("b"), None]));
    let tags: ArrayRef = Arc::new(ListArray::from_iter_primitive::<Int64Type, _, _>(vec![
        Some(vec![Some(1), Some(2)]),
        None,
        Some(vec![]),
    ]));
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, true),
        Field::new("name", DataType::Utf8, true),
        Field::new("tags", tags.data_type().clone(), true),
    ]));
    let batch = RecordBatch::try_new(schema, vec![ids, names, tags]).unwrap();

    let columns = ColumnBatch::from_record_batch(&batch, &VectorConfig::default()).unwrap();
    assert_eq!(columns.to_record_batch().unwrap(), batch);
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

#[test]
fn test_hash_from_zero_matches_mix() {
    let vector = Int64Vector::from_values(vec![1, 2, 3, 4, 5]);
    let hashes = vector.hash().unwrap();
    for (i, h) in hashes.iter().enumerate() {
        assert_eq!(*h, vector_engine::mix_hash(0, (i + 1) as u64));
    }
}

#[test]
fn test_null_rows_hash_alike_across_types() {
    let ints = Int64Vector::from_options([Some(1), None]).unwrap();
    let strs = BytesVector::from_values([Some("x"), None]).unwrap();
    assert_eq!(ints.hash().unwrap()[1], strs.hash().unwrap()[1]);
    assert_eq!(ints.hash().unwrap()[1], vector_engine::mix_hash(0, NULL_HASH));
}

#[test]
fn test_hash_into_window() {
    let vector = Int64Vector::from_values(vec![1, 2]);
    let mut out = vec![0u64; 5];
    vector.hash_into(&mut out, 3).unwrap();
    assert_eq!(&out[..3], &[0, 0, 0]);
    assert!(matches!(
        vector.hash_into(&mut out, 4),
        Err(VectorError::BufferTooSmall { needed: 2, available: 1 })
    ));
}

#[test]
fn test_multi_column_keys() {
    let batch = ColumnBatch::from_columns(vec![
        ("a", AnyVector::from(Int64Vector::from_values(vec![1, 1, 2]))),
        ("b", AnyVector::from(BytesVector::from_values([Some("x"), Some("x"), Some("x")]).unwrap())),
    ])
    .unwrap();
    let keys = batch.hash().unwrap();
    assert_eq!(keys[0], keys[1]);
    assert_ne!(keys[1], keys[2]);
}

#[test]
fn test_nested_hash_equal_lists() {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for row in [Some(vec!["a", "b"]), Some(vec![]), None, Some(vec!["a", "b"])] {
        match row {
            Some(items) => {
                for item in items {
                    builder.values().append_value(item);
                }
                builder.append(true);
            }
            None => builder.append(false),
        }
    }
    let vector = AnyVector::from_arrow(&builder.finish()).unwrap();
    let h = vector.hash().unwrap();
    assert_eq!(h[0], h[3]);
    assert_ne!(h[1], h[2]);
}

// ---------------------------------------------------------------------------
// Gather
// ---------------------------------------------------------------------------

#[test]
fn test_nested_take_offsets() {
    let child = Int64Vector::from_values(vec![1, 2, 3, 4, 5]);
    let lists = NestedVector::from_lengths(&[3, 0, 2], child, None).unwrap();
    let taken = lists.take(&[2, 0]).unwrap();
    assert_eq!(taken.offsets(), &[0, 2, 5]);
    assert_eq!(
        taken.get(0).unwrap(),
        Some(Value::List(vec![Some(Value::Int64(4)), Some(Value::Int64(5))]))
    );
}

#[test]
fn test_take_rejects_bad_index_before_work() {
    let vector = AnyVector::from(BytesVector::from_values([Some("a")]).unwrap());
    assert!(matches!(
        vector.take(&[0, 1]),
        Err(VectorError::IndexOutOfBounds { index: 1, len: 1 })
    ));
}

proptest! {
    #[test]
    fn test_take_matches_get(
        rows in proptest::collection::vec(proptest::option::of(any::<i64>()), 1..100),
        picks in proptest::collection::vec(any::<usize>(), 0..100),
    ) {
        let vector = Int64Vector::from_options(rows.iter().copied()).unwrap();
        let indices: Vec<usize> = picks.iter().map(|p| p % rows.len()).collect();
        let taken = vector.take(&indices).unwrap();
        prop_assert_eq!(taken.len(), indices.len());
        for (k, &i) in indices.iter().enumerate() {
            prop_assert_eq!(taken.get(k).unwrap(), vector.get(i).unwrap());
        }
    }

    #[test]
    fn test_bytes_take_matches_get(
        rows in proptest::collection::vec(proptest::option::of("[a-z]{0,8}"), 1..50),
        picks in proptest::collection::vec(any::<usize>(), 0..50),
    ) {
        let vector = BytesVector::from_values(rows.iter().map(|r| r.as_deref())).unwrap();
        let indices: Vec<usize> = picks.iter().map(|p| p % rows.len()).collect();
        let taken = vector.take(&indices).unwrap();
        for (k, &i) in indices.iter().enumerate() {
            prop_assert_eq!(taken.value(k).unwrap(), vector.value(i).unwrap());
        }
    }
}

// ---------------------------------------------------------------------------
// Every vector type: Arrow round trip and gathered null counts
// ---------------------------------------------------------------------------

const ALL_TAGS: [TypeTag; 10] = [
    TypeTag::Int64,
    TypeTag::Float64,
    TypeTag::Boolean,
    TypeTag::Date32,
    TypeTag::Time32,
    TypeTag::Time64,
    TypeTag::Timestamp,
    TypeTag::Interval,
    TypeTag::Bytes,
    TypeTag::List,
];

/// A vector of type `tag` whose row `i` is derived from `seeds[i]`; `None`
/// seeds become null rows.
fn vector_of(tag: TypeTag, seeds: &[Option<i64>]) -> AnyVector {
    let validity = || {
        seeds
            .iter()
            .any(Option::is_none)
            .then(|| Bitmap::from_bools(seeds.iter().map(Option::is_some)).unwrap())
    };
    match tag {
        TypeTag::Int64 => Int64Vector::from_options(seeds.iter().copied()).unwrap().into(),
        TypeTag::Float64 => {
            Float64Vector::from_options(seeds.iter().map(|s| s.map(|v| v as f64 / 4.0)))
                .unwrap()
                .into()
        }
        TypeTag::Boolean => BoolVector::from_options(seeds.iter().map(|s| s.map(|v| v % 2 == 0)))
            .unwrap()
            .into(),
        TypeTag::Date32 => Date32Vector::from_options(seeds.iter().map(|s| s.map(|v| v as i32)))
            .unwrap()
            .into(),
        TypeTag::Time32 => {
            Time32Vector::from_options(seeds.iter().map(|s| s.map(|v| v.rem_euclid(86_400) as i32)))
                .unwrap()
                .into()
        }
        TypeTag::Time64 => Time64Vector::from_options(seeds.iter().copied()).unwrap().into(),
        TypeTag::Timestamp => TimestampVector::from_options(seeds.iter().copied()).unwrap().into(),
        TypeTag::Interval => {
            let values: Vec<IntervalValue> = seeds
                .iter()
                .map(|s| s.map_or(IntervalValue::default(), |v| IntervalValue::new(v as i32 as i64, v)))
                .collect();
            IntervalVector::try_new(&values, validity()).unwrap().into()
        }
        TypeTag::Bytes => {
            let strings: Vec<Option<String>> = seeds.iter().map(|s| s.map(|v| v.to_string())).collect();
            BytesVector::from_strs(strings.iter().map(|s| s.as_deref())).unwrap().into()
        }
        TypeTag::List => {
            let lengths: Vec<usize> =
                seeds.iter().map(|s| s.map_or(0, |v| v.rem_euclid(4) as usize)).collect();
            let total: i64 = lengths.iter().sum::<usize>() as i64;
            let child = AnyVector::from(Int64Vector::from_values((0..total).collect()));
            NestedVector::from_lengths(&lengths, child, validity()).unwrap().into()
        }
    }
}

proptest! {
    #[test]
    fn test_every_type_round_trips_through_arrow(
        tag in proptest::sample::select(ALL_TAGS.to_vec()),
        seeds in proptest::collection::vec(proptest::option::weighted(0.7, any::<i64>()), 1..64),
    ) {
        let vector = vector_of(tag, &seeds);
        let back = AnyVector::from_arrow(vector.to_arrow().unwrap().as_ref()).unwrap();
        prop_assert_eq!(back.type_tag(), tag);
        prop_assert_eq!(back.null_count(), vector.null_count());
        prop_assert_eq!(back.to_list(), vector.to_list());
    }

    #[test]
    fn test_take_null_count_matches_source_rows(
        tag in proptest::sample::select(ALL_TAGS.to_vec()),
        seeds in proptest::collection::vec(proptest::option::weighted(0.7, any::<i64>()), 1..64),
        picks in proptest::collection::vec(any::<usize>(), 0..64),
    ) {
        let vector = vector_of(tag, &seeds);
        let indices: Vec<usize> = picks.iter().map(|p| p % seeds.len()).collect();
        let taken = vector.take(&indices).unwrap();
        let expected = indices.iter().filter(|&&i| seeds[i].is_none()).count();
        prop_assert_eq!(taken.null_count(), expected);
        prop_assert_eq!(taken.len(), indices.len());
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

#[test]
fn test_builder_contract() {
    let mut builder = BytesVectorBuilder::with_counts(3, 10).unwrap();
    builder.append(b"abc").unwrap();
    builder.append_null().unwrap();
    builder.append(b"1234567").unwrap();
    assert!(matches!(builder.append(b"z"), Err(VectorError::OutOfSequence { .. })));

    let mut builder = BytesVectorBuilder::with_estimate(5, 4).unwrap();
    for value in [&b"twelve bytes"[..], b"", b"x", b"another long value", b"y"] {
        builder.append(value).unwrap();
    }
    let vector = builder.finish().unwrap();
    assert_eq!(vector.len(), 5);
    assert_eq!(vector.byte_length(3).unwrap(), 18);
    assert!(Arc::ptr_eq(&vector, &builder.finish().unwrap()));
}

// ---------------------------------------------------------------------------
// Comparisons and reductions
// ---------------------------------------------------------------------------

#[test]
fn test_comparisons_ignore_validity() {
    let vector = Int64Vector::try_new(
        vec![1, 5, 9],
        Some(Bitmap::from_bools([true, false, true]).unwrap()),
    )
    .unwrap();
    let mask = vector.compare_scalar(5, CmpOp::Ge).unwrap();
    assert_eq!(mask.to_bools(), vec![false, true, true]);
    assert_eq!(mask.null_count(), 0);
}

#[test]
fn test_comparison_chain_with_bool_ops() {
    let vector = Int64Vector::from_values((0..10).collect());
    let lo = vector.greater_than_or_equals(3).unwrap();
    let hi = vector.less_than(7).unwrap();
    let both = lo.and(&hi).unwrap();
    assert_eq!(both.count_true(), 4);
    assert!(both.any());
    assert!(!both.all());
}

#[test]
fn test_reductions_on_wrapped_array() {
    let array = offset_int_array();
    let vector = Int64Vector::from_arrow(&array).unwrap();
    assert_eq!(vector.min().unwrap(), 30);
    assert_eq!(vector.max().unwrap(), 120);
    assert_eq!(vector.sum().unwrap(), 30 + 40 + 60 + 70 + 90 + 100 + 120);
}
