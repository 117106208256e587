use std::sync::Arc;

use arrow::{
    array::{
        Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array,
        Int64Array, StringArray,
    },
    datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type},
};
use rusqlite::types::Value;
use snafu::location;

use crate::error::{Error, Result};

/// The column types a relation can be declared with.
///
/// Each variant maps to exactly one Arrow [`DataType`], so a relation written
/// from a batch reads back with the same schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Boolean,
    Int32,
    Integer,
    Float32,
    Real,
    Text,
}

impl SqlType {
    /// Maps an Arrow [`DataType`] to its declared column type.
    pub fn try_from_arrow(data_type: &DataType) -> Result<Self> {
        match data_type {
            DataType::Boolean => Ok(SqlType::Boolean),
            DataType::Int32 => Ok(SqlType::Int32),
            DataType::Int64 => Ok(SqlType::Integer),
            DataType::Float32 => Ok(SqlType::Float32),
            DataType::Float64 => Ok(SqlType::Real),
            DataType::Utf8 => Ok(SqlType::Text),
            other => Err(Error::Schema {
                message: format!("Columns of type '{other}' cannot be persisted"),
                location: location!(),
            }),
        }
    }

    /// Maps a declared column type back, following SQLite's affinity rules
    /// for declarations this crate did not write itself.
    pub fn from_declaration(declaration: &str) -> Option<Self> {
        let declaration = declaration.to_ascii_uppercase();
        match declaration.as_str() {
            "BOOLEAN" => return Some(SqlType::Boolean),
            "INT32" => return Some(SqlType::Int32),
            "FLOAT32" => return Some(SqlType::Float32),
            _ => {}
        }

        if declaration.contains("INT") {
            Some(SqlType::Integer)
        } else if ["CHAR", "CLOB", "TEXT"]
            .iter()
            .any(|affinity| declaration.contains(affinity))
        {
            Some(SqlType::Text)
        } else if ["REAL", "FLOA", "DOUB"]
            .iter()
            .any(|affinity| declaration.contains(affinity))
        {
            Some(SqlType::Real)
        } else {
            None
        }
    }

    /// Infers the type of a computed column from its values.
    ///
    /// A column mixing integers and reals widens to [`SqlType::Real`]; a
    /// column without any value is [`SqlType::Text`].
    pub fn infer(values: &[Value]) -> Result<Self> {
        let mut inferred: Option<SqlType> = None;
        for value in values {
            let current = match value {
                Value::Null => continue,
                Value::Integer(_) => SqlType::Integer,
                Value::Real(_) => SqlType::Real,
                Value::Text(_) => SqlType::Text,
                Value::Blob(_) => {
                    return Err(Error::Schema {
                        message: "BLOB values are not supported in query results".to_string(),
                        location: location!(),
                    })
                }
            };
            inferred = match (inferred, current) {
                (None, t) => Some(t),
                (Some(SqlType::Integer), SqlType::Real)
                | (Some(SqlType::Real), SqlType::Integer) => Some(SqlType::Real),
                (Some(SqlType::Text), _) | (_, SqlType::Text) => Some(SqlType::Text),
                (Some(t), _) => Some(t),
            };
        }

        Ok(inferred.unwrap_or(SqlType::Text))
    }

    /// The declaration used in `CREATE TABLE`.
    pub fn declaration(&self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::Int32 => "INT32",
            SqlType::Integer => "INTEGER",
            SqlType::Float32 => "FLOAT32",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }

    /// The Arrow [`DataType`] values of this type are read into.
    pub fn data_type(&self) -> DataType {
        match self {
            SqlType::Boolean => DataType::Boolean,
            SqlType::Int32 => DataType::Int32,
            SqlType::Integer => DataType::Int64,
            SqlType::Float32 => DataType::Float32,
            SqlType::Real => DataType::Float64,
            SqlType::Text => DataType::Utf8,
        }
    }

    /// Builds an Arrow array of this type from SQLite values.
    pub fn build_array(&self, name: &str, values: &[Value]) -> Result<ArrayRef> {
        let mismatch = |value: &Value| Error::InvalidData {
            message: format!(
                "Value {value:?} in column '{name}' cannot be read as {}",
                self.declaration()
            ),
            location: location!(),
        };

        let array: ArrayRef = match self {
            SqlType::Boolean => Arc::new(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Integer(i) => Ok(Some(*i != 0)),
                        other => Err(mismatch(other)),
                    })
                    .collect::<Result<BooleanArray>>()?,
            ),
            SqlType::Int32 => Arc::new(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Integer(i) => {
                            i32::try_from(*i).map(Some).map_err(|_| mismatch(v))
                        }
                        other => Err(mismatch(other)),
                    })
                    .collect::<Result<Int32Array>>()?,
            ),
            SqlType::Integer => Arc::new(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Integer(i) => Ok(Some(*i)),
                        other => Err(mismatch(other)),
                    })
                    .collect::<Result<Int64Array>>()?,
            ),
            SqlType::Float32 => Arc::new(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Real(f) => Ok(Some(*f as f32)),
                        Value::Integer(i) => Ok(Some(*i as f32)),
                        other => Err(mismatch(other)),
                    })
                    .collect::<Result<Float32Array>>()?,
            ),
            SqlType::Real => Arc::new(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Real(f) => Ok(Some(*f)),
                        Value::Integer(i) => Ok(Some(*i as f64)),
                        other => Err(mismatch(other)),
                    })
                    .collect::<Result<Float64Array>>()?,
            ),
            SqlType::Text => Arc::new(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Text(s) => Ok(Some(s.clone())),
                        Value::Integer(i) => Ok(Some(i.to_string())),
                        Value::Real(f) => Ok(Some(f.to_string())),
                        other => Err(mismatch(other)),
                    })
                    .collect::<Result<StringArray>>()?,
            ),
        };

        Ok(array)
    }
}

/// Reads one element of an array as a SQLite value.
pub fn to_sql_value(array: &dyn Array, index: usize) -> Result<Value> {
    if array.is_null(index) {
        return Ok(Value::Null);
    }

    Ok(match array.data_type() {
        DataType::Boolean => Value::Integer(array.as_boolean().value(index) as i64),
        DataType::Int32 => Value::Integer(array.as_primitive::<Int32Type>().value(index) as i64),
        DataType::Int64 => Value::Integer(array.as_primitive::<Int64Type>().value(index)),
        DataType::Float32 => real(array.as_primitive::<Float32Type>().value(index) as f64)?,
        DataType::Float64 => real(array.as_primitive::<Float64Type>().value(index))?,
        DataType::Utf8 => Value::Text(array.as_string::<i32>().value(index).to_string()),
        other => {
            return Err(Error::Schema {
                message: format!("Values of type '{other}' cannot be persisted"),
                location: location!(),
            })
        }
    })
}

/// SQLite stores NaN as NULL, which would read back as a missing value.
fn real(value: f64) -> Result<Value> {
    if value.is_nan() {
        return Err(Error::Schema {
            message: "NaN values cannot be persisted, the store reads them back as NULL"
                .to_string(),
            location: location!(),
        });
    }
    Ok(Value::Real(value))
}

#[cfg(test)]
mod tests {
    use arrow::{
        array::{Array, AsArray, Float64Array},
        datatypes::DataType,
    };
    use rusqlite::types::Value;

    use crate::error::Error;

    use super::{to_sql_value, SqlType};

    #[test]
    fn test_sql_type_declarations_round_trip() {
        let types = [
            DataType::Boolean,
            DataType::Int32,
            DataType::Int64,
            DataType::Float32,
            DataType::Float64,
            DataType::Utf8,
        ];

        for data_type in types.iter() {
            let sql_type = SqlType::try_from_arrow(data_type).unwrap();
            let declared = SqlType::from_declaration(sql_type.declaration()).unwrap();
            assert_eq!(&declared.data_type(), data_type);
        }
    }

    #[test]
    fn test_sql_type_foreign_declarations() {
        assert_eq!(SqlType::from_declaration("varchar(10)"), Some(SqlType::Text));
        assert_eq!(SqlType::from_declaration("BIGINT"), Some(SqlType::Integer));
        assert_eq!(SqlType::from_declaration("DOUBLE"), Some(SqlType::Real));
        assert_eq!(SqlType::from_declaration("NUMERIC"), None);
    }

    #[test]
    fn test_sql_type_unsupported_arrow_type() {
        let result = SqlType::try_from_arrow(&DataType::Date32);
        assert!(matches!(result, Err(Error::Schema { .. })));
    }

    #[test]
    fn test_sql_type_infer() {
        let ints = [Value::Null, Value::Integer(1)];
        let mixed = [Value::Integer(1), Value::Real(1.5)];
        let empty = [Value::Null];

        assert_eq!(SqlType::infer(&ints).unwrap(), SqlType::Integer);
        assert_eq!(SqlType::infer(&mixed).unwrap(), SqlType::Real);
        assert_eq!(SqlType::infer(&empty).unwrap(), SqlType::Text);
    }

    #[test]
    fn test_sql_type_build_array() {
        let values = [Value::Integer(2), Value::Null, Value::Real(0.5)];
        let array = SqlType::Real.build_array("cost", &values).unwrap();
        let array = array.as_primitive::<arrow::datatypes::Float64Type>();

        assert_eq!(array.value(0), 2.0);
        assert!(array.is_null(1));
        assert_eq!(array.value(2), 0.5);

        let result = SqlType::Integer.build_array("n", &[Value::Text("x".to_string())]);
        assert!(matches!(result, Err(Error::InvalidData { .. })));
    }

    #[test]
    fn test_to_sql_value_reals() {
        let array = Float64Array::from(vec![Some(f64::INFINITY), None, Some(f64::NAN)]);

        assert_eq!(to_sql_value(&array, 0).unwrap(), Value::Real(f64::INFINITY));
        assert_eq!(to_sql_value(&array, 1).unwrap(), Value::Null);
        assert!(matches!(to_sql_value(&array, 2), Err(Error::Schema { .. })));
    }
}
