//! Operator scenarios over real table files.

use relic_buffer::BufferPool;
use relic_common::types::{Field, FieldType, PredicateOp};
use relic_common::RelicError;
use relic_exec::{
    aggregate, filter, join, projection, Aggregate, AggregateOp, FilterPredicate, JoinPredicate,
};
use relic_storage::{BTreeFile, HeapFile, TableFile, Tuple, TupleDesc};

fn desc(fields: &[(&str, FieldType)]) -> TupleDesc {
    TupleDesc::new(
        fields.iter().map(|(_, t)| *t).collect(),
        fields.iter().map(|(n, _)| n.to_string()).collect(),
    )
    .unwrap()
}

fn collect(pool: &mut BufferPool, file: &dyn TableFile) -> Vec<Tuple> {
    let mut rows = Vec::new();
    let mut cursor = file.begin(pool).unwrap();
    while cursor != file.end() {
        rows.push(file.get_tuple(pool, &cursor).unwrap());
        file.next(pool, &mut cursor).unwrap();
    }
    rows
}

#[test]
fn test_projection_reorders_fields() {
    let mut pool = BufferPool::new();
    let in_desc = desc(&[
        ("id", FieldType::Int),
        ("name", FieldType::Char),
        ("score", FieldType::Double),
    ]);
    let mut input = BTreeFile::create(&mut pool, 0, in_desc, 0).unwrap();
    for (id, name, score) in [(1, "a", 2.5), (2, "b", 3.5)] {
        input
            .insert_tuple(
                &mut pool,
                &Tuple::new(vec![
                    Field::Int(id),
                    Field::Char(name.to_string()),
                    Field::Double(score),
                ]),
            )
            .unwrap();
    }

    let out_desc = desc(&[("score", FieldType::Double), ("id", FieldType::Int)]);
    let mut output = HeapFile::new(1, out_desc).unwrap();
    projection(&mut pool, &input, &mut output, &["score", "id"]).unwrap();

    let rows = collect(&mut pool, &output);
    assert_eq!(
        rows,
        vec![
            Tuple::new(vec![Field::Double(2.5), Field::Int(1)]),
            Tuple::new(vec![Field::Double(3.5), Field::Int(2)]),
        ]
    );
}

#[test]
fn test_projection_rejects_mismatched_output_schema() {
    let mut pool = BufferPool::new();
    let in_desc = desc(&[("id", FieldType::Int), ("score", FieldType::Double)]);
    let input = BTreeFile::create(&mut pool, 0, in_desc, 0).unwrap();

    // Output claims INT where the projection derives DOUBLE.
    let mut output = HeapFile::new(1, desc(&[("score", FieldType::Int)])).unwrap();
    assert!(matches!(
        projection(&mut pool, &input, &mut output, &["score"]),
        Err(RelicError::TypeMismatch { .. })
    ));
}

#[test]
fn test_projection_unknown_field() {
    let mut pool = BufferPool::new();
    let input =
        BTreeFile::create(&mut pool, 0, desc(&[("id", FieldType::Int)]), 0).unwrap();
    let mut output = HeapFile::new(1, desc(&[("id", FieldType::Int)])).unwrap();
    assert!(matches!(
        projection(&mut pool, &input, &mut output, &["missing"]),
        Err(RelicError::FieldNotFound(_))
    ));
}

#[test]
fn test_filter_keeps_matching_rows() {
    let mut pool = BufferPool::new();
    let table_desc = desc(&[("id", FieldType::Int), ("value", FieldType::Int)]);
    let mut input = BTreeFile::create(&mut pool, 0, table_desc.clone(), 0).unwrap();
    for (id, value) in [(1, 10), (2, 20), (3, 30)] {
        input
            .insert_tuple(&mut pool, &Tuple::new(vec![Field::Int(id), Field::Int(value)]))
            .unwrap();
    }

    let mut output = HeapFile::new(1, table_desc).unwrap();
    let predicates = [FilterPredicate::new("value", PredicateOp::Ge, Field::Int(20))];
    filter(&mut pool, &input, &mut output, &predicates).unwrap();

    let rows = collect(&mut pool, &output);
    assert_eq!(
        rows,
        vec![
            Tuple::new(vec![Field::Int(2), Field::Int(20)]),
            Tuple::new(vec![Field::Int(3), Field::Int(30)]),
        ]
    );
}

#[test]
fn test_filter_ands_all_predicates() {
    let mut pool = BufferPool::new();
    let table_desc = desc(&[("id", FieldType::Int), ("value", FieldType::Int)]);
    let mut input = BTreeFile::create(&mut pool, 0, table_desc.clone(), 0).unwrap();
    for id in 0..10 {
        input
            .insert_tuple(
                &mut pool,
                &Tuple::new(vec![Field::Int(id), Field::Int(id * 10)]),
            )
            .unwrap();
    }

    let mut output = HeapFile::new(1, table_desc).unwrap();
    let predicates = [
        FilterPredicate::new("value", PredicateOp::Gt, Field::Int(20)),
        FilterPredicate::new("id", PredicateOp::Lt, Field::Int(5)),
    ];
    filter(&mut pool, &input, &mut output, &predicates).unwrap();

    let rows = collect(&mut pool, &output);
    assert_eq!(rows.len(), 2); // ids 3 and 4
    assert_eq!(rows[0].field(0), &Field::Int(3));
    assert_eq!(rows[1].field(0), &Field::Int(4));
}

fn value_table(pool: &mut BufferPool, values: &[i32]) -> BTreeFile {
    let mut table =
        BTreeFile::create(pool, 0, desc(&[("value", FieldType::Int)]), 0).unwrap();
    for &v in values {
        table
            .insert_tuple(pool, &Tuple::new(vec![Field::Int(v)]))
            .unwrap();
    }
    table
}

#[test]
fn test_aggregate_avg_is_computed_after_the_scan() {
    let mut pool = BufferPool::new();
    let input = value_table(&mut pool, &[3, 5, 9]);

    let mut output = HeapFile::new(1, desc(&[("avg", FieldType::Double)])).unwrap();
    aggregate(
        &mut pool,
        &input,
        &mut output,
        &Aggregate::new("value", AggregateOp::Avg),
    )
    .unwrap();

    let rows = collect(&mut pool, &output);
    assert_eq!(rows.len(), 1);
    match rows[0].field(0) {
        Field::Double(v) => assert!((v - 17.0 / 3.0).abs() < 1e-9),
        other => panic!("expected DOUBLE, got {:?}", other),
    }
}

#[test]
fn test_aggregate_count_sum_min_max() {
    let mut pool = BufferPool::new();
    let input = value_table(&mut pool, &[3, 5, 9]);

    for (op, expected) in [
        (AggregateOp::Count, 3),
        (AggregateOp::Sum, 17),
        (AggregateOp::Min, 3),
        (AggregateOp::Max, 9),
    ] {
        let mut output = HeapFile::new(1 + op as u32, desc(&[("r", FieldType::Int)])).unwrap();
        aggregate(&mut pool, &input, &mut output, &Aggregate::new("value", op)).unwrap();
        let rows = collect(&mut pool, &output);
        assert_eq!(rows, vec![Tuple::new(vec![Field::Int(expected)])], "{:?}", op);
    }
}

#[test]
fn test_aggregate_over_double_column() {
    let mut pool = BufferPool::new();
    let table_desc = desc(&[("id", FieldType::Int), ("score", FieldType::Double)]);
    let mut input = BTreeFile::create(&mut pool, 0, table_desc, 0).unwrap();
    for (id, score) in [(1, 1.5), (2, 2.5), (3, 4.0)] {
        input
            .insert_tuple(
                &mut pool,
                &Tuple::new(vec![Field::Int(id), Field::Double(score)]),
            )
            .unwrap();
    }

    let mut output = HeapFile::new(1, desc(&[("max", FieldType::Double)])).unwrap();
    aggregate(
        &mut pool,
        &input,
        &mut output,
        &Aggregate::new("score", AggregateOp::Max),
    )
    .unwrap();
    assert_eq!(
        collect(&mut pool, &output),
        vec![Tuple::new(vec![Field::Double(4.0)])]
    );
}

#[test]
fn test_aggregate_count_on_empty_input() {
    let mut pool = BufferPool::new();
    let input = value_table(&mut pool, &[]);
    let mut output = HeapFile::new(1, desc(&[("n", FieldType::Int)])).unwrap();
    aggregate(
        &mut pool,
        &input,
        &mut output,
        &Aggregate::new("value", AggregateOp::Count),
    )
    .unwrap();
    assert_eq!(
        collect(&mut pool, &output),
        vec![Tuple::new(vec![Field::Int(0)])]
    );
}

#[test]
fn test_numeric_aggregate_over_char_is_unsupported() {
    let mut pool = BufferPool::new();
    let input = BTreeFile::create(
        &mut pool,
        0,
        desc(&[("id", FieldType::Int), ("name", FieldType::Char)]),
        0,
    )
    .unwrap();
    let mut output = HeapFile::new(1, desc(&[("r", FieldType::Int)])).unwrap();
    assert!(matches!(
        aggregate(
            &mut pool,
            &input,
            &mut output,
            &Aggregate::new("name", AggregateOp::Sum),
        ),
        Err(RelicError::Unsupported(_))
    ));
}

#[test]
fn test_join_on_equal_ids() {
    let mut pool = BufferPool::new();
    let left_desc = desc(&[("id", FieldType::Int), ("tag", FieldType::Char)]);
    let right_desc = desc(&[("id", FieldType::Int), ("val", FieldType::Char)]);

    let mut left = BTreeFile::create(&mut pool, 0, left_desc.clone(), 0).unwrap();
    for (id, tag) in [(1, "x"), (2, "y")] {
        left.insert_tuple(
            &mut pool,
            &Tuple::new(vec![Field::Int(id), Field::Char(tag.to_string())]),
        )
        .unwrap();
    }
    let mut right = BTreeFile::create(&mut pool, 1, right_desc.clone(), 0).unwrap();
    for (id, val) in [(1, "p"), (3, "q")] {
        right
            .insert_tuple(
                &mut pool,
                &Tuple::new(vec![Field::Int(id), Field::Char(val.to_string())]),
            )
            .unwrap();
    }

    let merged = TupleDesc::merge(&left_desc, &right_desc).unwrap();
    let mut output = HeapFile::new(2, merged).unwrap();
    join(
        &mut pool,
        &left,
        &right,
        &mut output,
        &JoinPredicate::new("id", PredicateOp::Eq, "id"),
    )
    .unwrap();

    let rows = collect(&mut pool, &output);
    assert_eq!(
        rows,
        vec![Tuple::new(vec![
            Field::Int(1),
            Field::Char("x".to_string()),
            Field::Int(1),
            Field::Char("p".to_string()),
        ])]
    );
}

#[test]
fn test_join_inequality_produces_cross_matches() {
    let mut pool = BufferPool::new();
    let left_desc = desc(&[("a", FieldType::Int)]);
    let right_desc = desc(&[("b", FieldType::Int)]);

    let mut left = BTreeFile::create(&mut pool, 0, left_desc.clone(), 0).unwrap();
    for v in [1, 2] {
        left.insert_tuple(&mut pool, &Tuple::new(vec![Field::Int(v)]))
            .unwrap();
    }
    let mut right = BTreeFile::create(&mut pool, 1, right_desc.clone(), 0).unwrap();
    for v in [1, 2, 3] {
        right
            .insert_tuple(&mut pool, &Tuple::new(vec![Field::Int(v)]))
            .unwrap();
    }

    let merged = TupleDesc::merge(&left_desc, &right_desc).unwrap();
    let mut output = HeapFile::new(2, merged).unwrap();
    join(
        &mut pool,
        &left,
        &right,
        &mut output,
        &JoinPredicate::new("a", PredicateOp::Lt, "b"),
    )
    .unwrap();

    // (1,2), (1,3), (2,3)
    let rows = collect(&mut pool, &output);
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_operators_compose_across_backends() {
    let mut pool = BufferPool::new();
    let table_desc = desc(&[("id", FieldType::Int), ("value", FieldType::Int)]);

    // Heap input, B+tree output: the operators only see the contract.
    let mut input = HeapFile::new(0, table_desc.clone()).unwrap();
    for (id, value) in [(3, 30), (1, 10), (2, 20)] {
        input
            .insert_tuple(&mut pool, &Tuple::new(vec![Field::Int(id), Field::Int(value)]))
            .unwrap();
    }

    let mut output = BTreeFile::create(&mut pool, 1, table_desc, 0).unwrap();
    let predicates = [FilterPredicate::new("value", PredicateOp::Ne, Field::Int(20))];
    filter(&mut pool, &input, &mut output, &predicates).unwrap();

    // The B+tree output re-sorts the surviving rows by key.
    let rows = collect(&mut pool, &output);
    assert_eq!(
        rows,
        vec![
            Tuple::new(vec![Field::Int(1), Field::Int(10)]),
            Tuple::new(vec![Field::Int(3), Field::Int(30)]),
        ]
    );
}
