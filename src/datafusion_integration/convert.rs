// Copyright (c) 2026 kubetables contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Conversion from the engine value model to Arrow arrays.
//!
//! Maps, lists, and timestamps use native Arrow types so SQL operations
//! (map access, array functions, timestamp arithmetic) work without casts:
//!
//! - labels/annotations: `Map<Utf8, Utf8>` — `labels['app']`
//! - finalizers: `List<Utf8>`
//! - timestamps: `Timestamp(Nanosecond, "UTC")`
//!
//! The raw `metadata`/`resource` passthrough columns stay JSON text.

use std::sync::Arc;

use datafusion::arrow::array::{
    ArrayRef, Int64Builder, ListBuilder, MapBuilder, RecordBatch, StringBuilder,
    TimestampNanosecondBuilder,
};
use datafusion::arrow::datatypes::{DataType, Field, Fields, Schema, SchemaRef, TimeUnit};
use datafusion::error::{DataFusionError, Result};

use crate::tables::columns::ColumnType;
use crate::tables::types::ColumnValue;

/// Arrow rendering of a semantic column type.
pub fn arrow_type(ty: ColumnType) -> DataType {
    match ty {
        ColumnType::Text => DataType::Utf8,
        ColumnType::Bigint => DataType::Int64,
        ColumnType::TimestampTz => DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
        ColumnType::TextList => DataType::List(Arc::new(Field::new_list_field(DataType::Utf8, true))),
        // Field layout must match what MapBuilder::finish produces.
        ColumnType::TextMap => DataType::Map(
            Arc::new(Field::new(
                "entries",
                DataType::Struct(Fields::from(vec![
                    Field::new("keys", DataType::Utf8, false),
                    Field::new("values", DataType::Utf8, true),
                ])),
                false,
            )),
            false,
        ),
    }
}

/// Build an Arrow schema from (name, type) pairs. Every column is nullable.
pub fn arrow_schema<'a>(columns: impl IntoIterator<Item = (&'a str, ColumnType)>) -> SchemaRef {
    let fields: Vec<Field> = columns
        .into_iter()
        .map(|(name, ty)| Field::new(name, arrow_type(ty), true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Convert row-oriented extracted values into one RecordBatch.
///
/// `types` must parallel the schema fields; every row must carry one value
/// per column. A value whose shape disagrees with its declared column type
/// is an internal error — extraction produced it, so this is a bug, not bad
/// cluster data.
pub fn rows_to_batch(
    schema: SchemaRef,
    types: &[ColumnType],
    rows: &[Vec<ColumnValue>],
) -> Result<RecordBatch> {
    let mut builders: Vec<ValueBuilder> = types.iter().map(|ty| ValueBuilder::new(*ty)).collect();

    for row in rows {
        if row.len() != builders.len() {
            return Err(DataFusionError::Internal(format!(
                "row width {} does not match column count {}",
                row.len(),
                builders.len()
            )));
        }
        for (builder, value) in builders.iter_mut().zip(row) {
            builder.append(value)?;
        }
    }

    let arrays: Vec<ArrayRef> = builders.into_iter().map(ValueBuilder::finish).collect();
    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// One Arrow builder per semantic type, dispatched by tag.
enum ValueBuilder {
    Text(StringBuilder),
    Bigint(Int64Builder),
    TimestampTz(TimestampNanosecondBuilder),
    TextList(ListBuilder<StringBuilder>),
    TextMap(MapBuilder<StringBuilder, StringBuilder>),
}

impl ValueBuilder {
    fn new(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Text => ValueBuilder::Text(StringBuilder::new()),
            ColumnType::Bigint => ValueBuilder::Bigint(Int64Builder::new()),
            ColumnType::TimestampTz => {
                ValueBuilder::TimestampTz(TimestampNanosecondBuilder::new().with_timezone("UTC"))
            }
            ColumnType::TextList => ValueBuilder::TextList(ListBuilder::new(StringBuilder::new())),
            ColumnType::TextMap => {
                ValueBuilder::TextMap(MapBuilder::new(None, StringBuilder::new(), StringBuilder::new()))
            }
        }
    }

    fn append(&mut self, value: &ColumnValue) -> Result<()> {
        match (self, value) {
            (ValueBuilder::Text(builder), ColumnValue::Text(s)) => builder.append_value(s),
            (ValueBuilder::Text(builder), ColumnValue::Null) => builder.append_null(),
            (ValueBuilder::Bigint(builder), ColumnValue::Bigint(n)) => builder.append_value(*n),
            (ValueBuilder::Bigint(builder), ColumnValue::Null) => builder.append_null(),
            (ValueBuilder::TimestampTz(builder), ColumnValue::TimestampTz(nanos)) => {
                builder.append_value(*nanos)
            }
            (ValueBuilder::TimestampTz(builder), ColumnValue::Null) => builder.append_null(),
            (ValueBuilder::TextList(builder), ColumnValue::TextList(items)) => {
                for item in items {
                    builder.values().append_value(item);
                }
                builder.append(true);
            }
            (ValueBuilder::TextList(builder), ColumnValue::Null) => builder.append(false),
            (ValueBuilder::TextMap(builder), ColumnValue::TextMap(entries)) => {
                for (key, value) in entries {
                    builder.keys().append_value(key);
                    builder.values().append_value(value);
                }
                builder.append(true)?;
            }
            (ValueBuilder::TextMap(builder), ColumnValue::Null) => builder.append(false)?,
            (_, value) => {
                return Err(DataFusionError::Internal(format!(
                    "extracted value {value:?} does not match its declared column type"
                )));
            }
        }
        Ok(())
    }

    fn finish(self) -> ArrayRef {
        match self {
            ValueBuilder::Text(mut builder) => Arc::new(builder.finish()),
            ValueBuilder::Bigint(mut builder) => Arc::new(builder.finish()),
            ValueBuilder::TimestampTz(mut builder) => Arc::new(builder.finish()),
            ValueBuilder::TextList(mut builder) => Arc::new(builder.finish()),
            ValueBuilder::TextMap(mut builder) => Arc::new(builder.finish()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::array::{Array, Int64Array, MapArray, StringArray};

    #[test]
    fn schema_uses_native_arrow_types() {
        let schema = arrow_schema([
            ("name", ColumnType::Text),
            ("labels", ColumnType::TextMap),
            ("finalizers", ColumnType::TextList),
            ("creationTimestamp", ColumnType::TimestampTz),
            ("deletionGracePeriodSeconds", ColumnType::Bigint),
        ]);

        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert!(matches!(schema.field(1).data_type(), DataType::Map(_, false)));
        assert!(matches!(schema.field(2).data_type(), DataType::List(_)));
        assert_eq!(
            schema.field(3).data_type(),
            &DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into()))
        );
        assert_eq!(schema.field(4).data_type(), &DataType::Int64);
        assert!(schema.fields().iter().all(|f| f.is_nullable()));
    }

    #[test]
    fn builds_batches_with_nulls() {
        let types = [ColumnType::Text, ColumnType::Bigint];
        let schema = arrow_schema([("name", types[0]), ("grace", types[1])]);
        let rows = vec![
            vec![
                ColumnValue::Text("web-0".to_string()),
                ColumnValue::Bigint(30),
            ],
            vec![ColumnValue::Null, ColumnValue::Null],
        ];

        let batch = rows_to_batch(schema, &types, &rows).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let names = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.value(0), "web-0");
        assert!(names.is_null(1));

        let grace = batch.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(grace.value(0), 30);
        assert!(grace.is_null(1));
    }

    #[test]
    fn map_values_roundtrip() {
        let types = [ColumnType::TextMap];
        let schema = arrow_schema([("labels", types[0])]);
        let rows = vec![
            vec![ColumnValue::TextMap(vec![
                ("app".to_string(), "web".to_string()),
                ("tier".to_string(), "frontend".to_string()),
            ])],
            vec![ColumnValue::Null],
        ];

        let batch = rows_to_batch(schema, &types, &rows).unwrap();
        let map = batch.column(0).as_any().downcast_ref::<MapArray>().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.value(0).len(), 2);
        assert!(map.is_null(1));
    }

    #[test]
    fn schema_and_builder_map_layouts_agree() {
        // RecordBatch::try_new validates array types against the schema, so
        // this would fail if MapBuilder's output ever diverged from
        // arrow_type's Map layout.
        let types = [ColumnType::TextMap, ColumnType::TextList];
        let schema = arrow_schema([("labels", types[0]), ("finalizers", types[1])]);
        let rows = vec![vec![
            ColumnValue::TextMap(vec![("a".to_string(), "b".to_string())]),
            ColumnValue::TextList(vec!["x".to_string()]),
        ]];
        assert!(rows_to_batch(schema, &types, &rows).is_ok());
    }

    #[test]
    fn mismatched_value_shape_is_an_internal_error() {
        let types = [ColumnType::Bigint];
        let schema = arrow_schema([("grace", types[0])]);
        let rows = vec![vec![ColumnValue::Text("not a number".to_string())]];
        assert!(rows_to_batch(schema, &types, &rows).is_err());
    }

    #[test]
    fn empty_rows_make_an_empty_batch() {
        let types = [ColumnType::Text];
        let schema = arrow_schema([("name", types[0])]);
        let batch = rows_to_batch(schema, &types, &[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 1);
    }
}
