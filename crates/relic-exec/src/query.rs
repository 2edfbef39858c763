//! The relational operators: projection, filter, aggregate, join.
//!
//! Each operator scans its input(s) through the table-file contract
//! and appends result rows to an output table file. Nothing here knows
//! which storage backend is underneath.

use crate::predicate::{Aggregate, AggregateOp, FilterPredicate, JoinPredicate};
use relic_buffer::BufferPool;
use relic_common::types::{Field, FieldType, CHAR_WIDTH};
use relic_common::{RelicError, Result};
use relic_storage::{TableFile, Tuple, TupleDesc};

/// Infers a field type purely from its serialized width.
fn infer_type(width: usize) -> Result<FieldType> {
    if width == FieldType::Int.byte_size() {
        Ok(FieldType::Int)
    } else if width == FieldType::Double.byte_size() {
        Ok(FieldType::Double)
    } else if width <= CHAR_WIDTH {
        Ok(FieldType::Char)
    } else {
        Err(RelicError::UnsupportedFieldSize(width))
    }
}

/// Checks that the output file's schema matches the one the operator
/// derived for its results.
fn check_output_schema(output: &dyn TableFile, derived: &TupleDesc) -> Result<()> {
    if output.desc() != derived {
        return Err(RelicError::TypeMismatch {
            expected: derived.to_string(),
            actual: output.desc().to_string(),
        });
    }
    Ok(())
}

/// Copies the named fields, in the given order, from every input row
/// into the output file.
///
/// The output schema is derived by looking up each named field and
/// inferring its type from its byte width.
pub fn projection(
    pool: &mut BufferPool,
    input: &dyn TableFile,
    output: &mut dyn TableFile,
    field_names: &[&str],
) -> Result<()> {
    let in_desc = input.desc();
    let mut indices = Vec::with_capacity(field_names.len());
    let mut types = Vec::with_capacity(field_names.len());
    for name in field_names {
        let index = in_desc.index_of(name)?;
        indices.push(index);
        types.push(infer_type(in_desc.field_width(index))?);
    }
    let out_desc = TupleDesc::new(
        types,
        field_names.iter().map(|name| name.to_string()).collect(),
    )?;
    check_output_schema(output, &out_desc)?;

    let mut cursor = input.begin(pool)?;
    while cursor != input.end() {
        let row = input.get_tuple(pool, &cursor)?;
        let fields = indices.iter().map(|&i| row.field(i).clone()).collect();
        output.insert_tuple(pool, &Tuple::new(fields))?;
        input.next(pool, &mut cursor)?;
    }
    Ok(())
}

/// Copies every input row that satisfies all of `predicates` (logical
/// AND) into the output file verbatim.
pub fn filter(
    pool: &mut BufferPool,
    input: &dyn TableFile,
    output: &mut dyn TableFile,
    predicates: &[FilterPredicate],
) -> Result<()> {
    let in_desc = input.desc();
    let indices = predicates
        .iter()
        .map(|p| in_desc.index_of(&p.field))
        .collect::<Result<Vec<_>>>()?;

    let mut cursor = input.begin(pool)?;
    while cursor != input.end() {
        let row = input.get_tuple(pool, &cursor)?;
        let mut passes = true;
        for (pred, &index) in predicates.iter().zip(&indices) {
            if !row.field(index).compare(pred.op, &pred.operand)? {
                passes = false;
                break;
            }
        }
        if passes {
            output.insert_tuple(pool, &row)?;
        }
        input.next(pool, &mut cursor)?;
    }
    Ok(())
}

/// Aggregates one field over the whole input (no grouping), appending
/// exactly one result row.
///
/// COUNT accumulates from zero and works on any column; SUM/AVG/MIN/
/// MAX work on INT and DOUBLE columns, with MIN/MAX seeded from the
/// column type's extreme values. AVG divides the sum by the row count
/// once the scan completes and always produces DOUBLE.
pub fn aggregate(
    pool: &mut BufferPool,
    input: &dyn TableFile,
    output: &mut dyn TableFile,
    agg: &Aggregate,
) -> Result<()> {
    let in_desc = input.desc();
    let index = in_desc.index_of(&agg.field)?;
    let ftype = in_desc.field_type(index);
    if ftype == FieldType::Char && agg.op != AggregateOp::Count {
        return Err(RelicError::Unsupported(format!(
            "{:?} aggregate over a CHAR column",
            agg.op
        )));
    }

    let mut count: usize = 0;
    let mut int_acc: i64 = match agg.op {
        AggregateOp::Min => i32::MAX as i64,
        AggregateOp::Max => i32::MIN as i64,
        _ => 0,
    };
    let mut dbl_acc: f64 = match agg.op {
        AggregateOp::Min => f64::MAX,
        AggregateOp::Max => f64::MIN,
        _ => 0.0,
    };

    let mut cursor = input.begin(pool)?;
    while cursor != input.end() {
        let row = input.get_tuple(pool, &cursor)?;
        match row.field(index) {
            Field::Int(v) => {
                let v = *v as i64;
                match agg.op {
                    AggregateOp::Sum | AggregateOp::Avg => int_acc += v,
                    AggregateOp::Min => int_acc = int_acc.min(v),
                    AggregateOp::Max => int_acc = int_acc.max(v),
                    AggregateOp::Count => {}
                }
            }
            Field::Double(v) => match agg.op {
                AggregateOp::Sum | AggregateOp::Avg => dbl_acc += v,
                AggregateOp::Min => dbl_acc = dbl_acc.min(*v),
                AggregateOp::Max => dbl_acc = dbl_acc.max(*v),
                AggregateOp::Count => {}
            },
            Field::Char(_) => {}
        }
        count += 1;
        input.next(pool, &mut cursor)?;
    }

    let result = match ftype {
        FieldType::Int => match agg.op {
            AggregateOp::Count => Field::Int(count as i32),
            AggregateOp::Sum | AggregateOp::Min | AggregateOp::Max => Field::Int(int_acc as i32),
            AggregateOp::Avg => Field::Double(if count == 0 {
                0.0
            } else {
                int_acc as f64 / count as f64
            }),
        },
        FieldType::Double => match agg.op {
            AggregateOp::Count => Field::Int(count as i32),
            AggregateOp::Sum | AggregateOp::Min | AggregateOp::Max => Field::Double(dbl_acc),
            AggregateOp::Avg => Field::Double(if count == 0 {
                0.0
            } else {
                dbl_acc / count as f64
            }),
        },
        // Only COUNT reaches a CHAR column.
        FieldType::Char => Field::Int(count as i32),
    };

    output.insert_tuple(pool, &Tuple::new(vec![result]))
}

/// Unindexed nested-loop join: for each left row, scans all of
/// `right`; on a predicate match the left row's fields followed by the
/// right row's fields form one output row.
pub fn join(
    pool: &mut BufferPool,
    left: &dyn TableFile,
    right: &dyn TableFile,
    output: &mut dyn TableFile,
    pred: &JoinPredicate,
) -> Result<()> {
    let left_index = left.desc().index_of(&pred.left)?;
    let right_index = right.desc().index_of(&pred.right)?;
    let merged = TupleDesc::merge(left.desc(), right.desc())?;
    check_output_schema(output, &merged)?;

    let mut left_cursor = left.begin(pool)?;
    while left_cursor != left.end() {
        let left_row = left.get_tuple(pool, &left_cursor)?;
        let mut right_cursor = right.begin(pool)?;
        while right_cursor != right.end() {
            let right_row = right.get_tuple(pool, &right_cursor)?;
            if left_row
                .field(left_index)
                .compare(pred.op, right_row.field(right_index))?
            {
                let mut fields = left_row.fields().to_vec();
                fields.extend(right_row.into_fields());
                output.insert_tuple(pool, &Tuple::new(fields))?;
            }
            right.next(pool, &mut right_cursor)?;
        }
        left.next(pool, &mut left_cursor)?;
    }
    Ok(())
}
