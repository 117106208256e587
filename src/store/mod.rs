//! A single-file relational store backed by SQLite.
//!
//! The handle is an explicit value: open it, pass it to every step that
//! needs it, and close it when done. [`with_store`] scopes that lifecycle so
//! the handle is released on every exit path.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{
    array::{ArrayRef, RecordBatch},
    compute::cast,
    datatypes::{Field, Schema, SchemaRef},
};
use itertools::Itertools;
use rusqlite::{params_from_iter, types::Value, Connection, ErrorCode};
use snafu::location;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub mod types;

use types::{to_sql_value, SqlType};

/// A handle on the embedded relational store.
#[derive(Debug)]
pub struct Store {
    /// The open connection.
    conn: Connection,
    /// The database file, `None` for in-memory stores.
    path: Option<PathBuf>,
}

impl Store {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(classify)?;
        info!(path = %path.display(), "opened store");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a store that lives in memory for the lifetime of the handle.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(classify)?;
        Ok(Self { conn, path: None })
    }

    /// Releases the handle, reporting any failure to close.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, err)| classify(err))?;
        if let Some(path) = path {
            info!(path = %path.display(), "closed store");
        }
        Ok(())
    }

    /// Writes `batch` as the relation `name`, replacing any relation of the
    /// same name.
    ///
    /// Columns are declared from the batch schema. The drop, create and
    /// inserts run in one transaction, a failure leaves the previous relation
    /// in place.
    pub fn persist(&mut self, name: &str, batch: &RecordBatch) -> Result<()> {
        let schema = batch.schema();
        if schema.fields().is_empty() {
            return Err(Error::Schema {
                message: format!("Cannot persist relation '{name}' without columns"),
                location: location!(),
            });
        }

        let columns = schema
            .fields()
            .iter()
            .map(|field| -> Result<String> {
                let sql_type = SqlType::try_from_arrow(field.data_type())?;
                Ok(format!("{} {}", quote_identifier(field.name()), sql_type.declaration()))
            })
            .collect::<Result<Vec<_>>>()?;

        let relation = quote_identifier(name);
        let create = format!("CREATE TABLE {relation} ({})", columns.join(", "));
        let insert = format!(
            "INSERT INTO {relation} VALUES ({})",
            (1..=columns.len()).map(|i| format!("?{i}")).join(", ")
        );
        debug!(sql = %create, "creating relation");

        let tx = self.conn.transaction().map_err(classify)?;
        tx.execute(&format!("DROP TABLE IF EXISTS {relation}"), [])
            .map_err(classify)?;
        tx.execute(&create, []).map_err(classify)?;
        {
            let mut stmt = tx.prepare(&insert).map_err(classify)?;
            for row in 0..batch.num_rows() {
                let values = batch
                    .columns()
                    .iter()
                    .map(|column| to_sql_value(column.as_ref(), row))
                    .collect::<Result<Vec<Value>>>()?;
                stmt.execute(params_from_iter(values)).map_err(classify)?;
            }
        }
        tx.commit().map_err(classify)?;

        info!(relation = name, rows = batch.num_rows(), "persisted relation");
        Ok(())
    }

    /// Executes a query and returns its rows in engine order.
    ///
    /// Column types come from the declared type of the underlying table
    /// column when there is one, otherwise they are inferred from the values.
    pub fn query(&self, sql: &str) -> Result<RecordBatch> {
        debug!(sql, "executing query");
        let mut stmt = self.conn.prepare(sql).map_err(classify)?;
        let columns = stmt
            .columns()
            .iter()
            .map(|column| {
                let declared = column.decl_type().and_then(SqlType::from_declaration);
                (column.name().to_string(), declared)
            })
            .collect::<Vec<_>>();

        let mut values: Vec<Vec<Value>> = vec![Vec::new(); columns.len()];
        let mut rows = stmt.query([]).map_err(classify)?;
        while let Some(row) = rows.next().map_err(classify)? {
            for (index, column) in values.iter_mut().enumerate() {
                column.push(row.get::<_, Value>(index).map_err(classify)?);
            }
        }

        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
        for ((name, declared), column) in columns.into_iter().zip(values.iter()) {
            let sql_type = match declared {
                Some(sql_type) => sql_type,
                None => SqlType::infer(column)?,
            };
            arrays.push(sql_type.build_array(&name, column)?);
            fields.push(Field::new(name, sql_type.data_type(), true));
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        debug!(rows = batch.num_rows(), "query returned");
        Ok(batch)
    }

    /// Executes a query and casts its columns to `schema`.
    ///
    /// Computed columns of an empty result have no values to infer a type
    /// from; this gives them the type the caller expects instead. The result
    /// must have the same column names as `schema`, in order.
    pub fn query_as(&self, sql: &str, schema: SchemaRef) -> Result<RecordBatch> {
        let batch = self.query(sql)?;
        let actual = batch.schema();
        let names = |schema: &Schema| {
            schema
                .fields()
                .iter()
                .map(|field| field.name().clone())
                .collect::<Vec<_>>()
        };
        if names(&actual) != names(&schema) {
            return Err(Error::Schema {
                message: format!(
                    "Query returned columns [{}], expected [{}]",
                    names(&actual).join(", "),
                    names(&schema).join(", ")
                ),
                location: location!(),
            });
        }

        let columns = batch
            .columns()
            .iter()
            .zip(schema.fields().iter())
            .map(|(column, field)| Ok(cast(column, field.data_type())?))
            .collect::<Result<Vec<ArrayRef>>>()?;

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Lists the user relations in the store, sorted by name.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )
            .map_err(classify)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(classify)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(classify)?;

        Ok(names)
    }
}

/// Opens the store at `path`, runs `f` with it and closes it again.
///
/// The handle is closed whether or not `f` succeeds. When both `f` and the
/// close fail, the error of `f` is returned.
pub fn with_store<T>(path: impl AsRef<Path>, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
    let mut store = Store::open(path)?;
    let result = f(&mut store);
    let closed = store.close();

    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "failed to close store after error");
            Err(err)
        }
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Sorts a SQLite error into the crate's error taxonomy.
fn classify(err: rusqlite::Error) -> Error {
    let message = err.to_string();

    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if matches!(
            failure.code,
            ErrorCode::CannotOpen
                | ErrorCode::ReadOnly
                | ErrorCode::PermissionDenied
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull
                | ErrorCode::NotADatabase
        ) {
            return Error::Io {
                message,
                location: location!(),
            };
        }
    }

    if message.contains("syntax error") || message.contains("incomplete input") {
        Error::Syntax {
            message,
            location: location!(),
        }
    } else if message.contains("no such table")
        || message.contains("no such column")
        || message.contains("ambiguous column name")
    {
        Error::Reference {
            message,
            location: location!(),
        }
    } else {
        Error::Sqlite {
            message,
            location: location!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{BooleanArray, Float32Array, Float64Array, Int32Array, RecordBatch},
        datatypes::{DataType, Field, Schema},
        util::pretty,
    };

    use crate::{
        error::Error,
        model::{CountryCode, TransitRecord},
        tests::{create_record_batch_with_nulls, transit_records},
    };

    use super::{with_store, Store};

    fn assert_batch_lines(batch: &RecordBatch, expected: Vec<&str>) {
        let formatted = pretty::pretty_format_batches(&[batch.clone()])
            .unwrap()
            .to_string();
        let lines = formatted.trim().lines().collect::<Vec<_>>();
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_store_persist_round_trip() {
        let mut store = Store::open_in_memory().unwrap();
        let mut records = transit_records(&[("DK", 2), ("GB", 1)]);
        records[0] = records[0].clone().with_cost(206.13, "DKK").with_years(Some(2009), None);
        records.push(TransitRecord::without_city("TR"));
        let batch = TransitRecord::to_record_batch(&records).unwrap();

        store.persist("transit_cost", &batch).unwrap();
        let result = store.query("SELECT * FROM transit_cost").unwrap();

        assert_eq!(result, batch);
        store.close().unwrap();
    }

    #[test]
    fn test_store_persist_round_trip_all_types() {
        let mut store = Store::open_in_memory().unwrap();
        let schema = Arc::new(Schema::new(vec![
            Field::new("flag", DataType::Boolean, true),
            Field::new("small", DataType::Int32, true),
            Field::new("ratio", DataType::Float32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(BooleanArray::from(vec![Some(true), None, Some(false)])),
                Arc::new(Int32Array::from(vec![Some(-3), Some(7), None])),
                Arc::new(Float32Array::from(vec![None, Some(0.25), Some(1.5)])),
            ],
        )
        .unwrap();

        store.persist("mixed", &batch).unwrap();
        let result = store.query("SELECT * FROM mixed").unwrap();

        assert_eq!(result, batch);
    }

    #[test]
    fn test_store_persist_non_finite_reals() {
        let mut store = Store::open_in_memory().unwrap();
        let schema = Arc::new(Schema::new(vec![Field::new("cost", DataType::Float64, true)]));
        let infinite = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Float64Array::from(vec![
                Some(f64::INFINITY),
                Some(f64::NEG_INFINITY),
                None,
            ]))],
        )
        .unwrap();

        store.persist("costs", &infinite).unwrap();
        assert_eq!(store.query("SELECT * FROM costs").unwrap(), infinite);

        // NaN would come back as NULL; the previous relation stays in place
        let nan = RecordBatch::try_new(
            schema,
            vec![Arc::new(Float64Array::from(vec![Some(1.0), Some(f64::NAN)]))],
        )
        .unwrap();
        let result = store.persist("costs", &nan);
        assert!(matches!(result, Err(Error::Schema { .. })));
        assert_eq!(store.query("SELECT * FROM costs").unwrap(), infinite);
    }

    #[test]
    fn test_store_persist_overwrites() {
        let mut store = Store::open_in_memory().unwrap();
        let first = CountryCode::to_record_batch(&[
            CountryCode::new("DK", "Denmark"),
            CountryCode::new("TR", "Turkey"),
        ])
        .unwrap();
        let second = CountryCode::to_record_batch(&[CountryCode::new("GB", "United Kingdom")])
            .unwrap();

        store.persist("country_codes", &first).unwrap();
        store.persist("country_codes", &second).unwrap();
        let result = store.query("SELECT iso2c, country_name_en FROM country_codes").unwrap();

        assert_batch_lines(
            &result,
            vec![
                "+-------+-----------------+",
                "| iso2c | country_name_en |",
                "+-------+-----------------+",
                "| GB    | United Kingdom  |",
                "+-------+-----------------+",
            ],
        );
        assert_eq!(store.table_names().unwrap(), vec!["country_codes"]);
    }

    #[test]
    fn test_store_query_computed_columns() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .persist("simple", &create_record_batch_with_nulls())
            .unwrap();

        let result = store
            .query("SELECT COUNT(c1) AS n, SUM(c2) * 1.5 AS weighted, NULL AS missing FROM simple")
            .unwrap();

        let schema = result.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
        assert_batch_lines(
            &result,
            vec![
                "+---+----------+---------+",
                "| n | weighted | missing |",
                "+---+----------+---------+",
                "| 2 | 4.5      |         |",
                "+---+----------+---------+",
            ],
        );
    }

    #[test]
    fn test_store_query_as_types_empty_results() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .persist("simple", &create_record_batch_with_nulls())
            .unwrap();
        let sql = "SELECT c1, COUNT(c2) AS n FROM simple GROUP BY c1 HAVING n > 5";
        let expected = Arc::new(Schema::new(vec![
            Field::new("c1", DataType::Utf8, true),
            Field::new("n", DataType::Int64, true),
        ]));

        // nothing to infer from, the count reads as text
        let inferred = store.query(sql).unwrap();
        assert_eq!(inferred.schema().field(1).data_type(), &DataType::Utf8);

        let result = store.query_as(sql, expected.clone()).unwrap();
        assert_eq!(result, RecordBatch::new_empty(expected.clone()));

        let result = store.query_as("SELECT c1, c2 FROM simple", expected);
        assert!(matches!(result, Err(Error::Schema { .. })));
    }

    #[test]
    fn test_store_query_errors() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .persist("simple", &create_record_batch_with_nulls())
            .unwrap();

        let syntax = store.query("SELEC c1 FROM simple");
        assert!(matches!(syntax, Err(Error::Syntax { .. })));

        let table = store.query("SELECT c1 FROM missing");
        assert!(matches!(table, Err(Error::Reference { .. })));

        let column = store.query("SELECT c9 FROM simple");
        assert!(matches!(column, Err(Error::Reference { .. })));
    }

    #[test]
    fn test_store_persist_unsupported_type() {
        let mut store = Store::open_in_memory().unwrap();
        let schema = Arc::new(Schema::new(vec![Field::new("d", DataType::Date32, true)]));
        let batch = RecordBatch::new_empty(schema);

        let result = store.persist("dates", &batch);
        assert!(matches!(result, Err(Error::Schema { .. })));
        assert!(store.table_names().unwrap().is_empty());
    }

    #[test]
    fn test_store_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transit.db");
        let batch = create_record_batch_with_nulls();

        with_store(&path, |store| store.persist("simple", &batch)).unwrap();
        let result = with_store(&path, |store| store.query("SELECT * FROM simple")).unwrap();

        assert_eq!(result, batch);
    }

    #[test]
    fn test_with_store_closes_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transit.db");

        let result = with_store(&path, |store| store.query("SELECT * FROM missing"));
        assert!(matches!(result, Err(Error::Reference { .. })));

        // the file is not held open; it can be removed and recreated
        std::fs::remove_file(&path).unwrap();
        with_store(&path, |store| store.table_names()).unwrap();
    }

    #[test]
    fn test_store_open_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("transit.db");

        let result = Store::open(&path);
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
