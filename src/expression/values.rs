use std::{
    cmp::Ordering,
    fmt::Display,
    hash::{Hash, Hasher},
    iter,
    sync::Arc,
};

use crate::error::{Error, Result};
use arrow::{
    array::{
        new_null_array, Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, Scalar,
        StringArray,
    },
    datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type},
};
use snafu::location;

/// Representing the return value of a physical expression.
/// Which is either an arrow `Array` or a `Scalar` value.
#[derive(Debug)]
pub enum ColumnarValue {
    /// An arrow array.
    Array(ArrayRef),
    /// A `ScalarValue`.
    Scalar(ScalarValue),
}

impl ColumnarValue {
    /// Convert the variant into an [`arrow::array::ArrayRef`].
    pub fn into_array(self, num_rows: usize) -> Result<ArrayRef> {
        use ColumnarValue::*;

        Ok(match self {
            Array(e) => e,
            Scalar(e) => e.to_array(num_rows),
        })
    }
}

/// A single, possibly missing, value.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Null,
    Boolean(Option<bool>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    Utf8(Option<String>),
}

impl ScalarValue {
    /// Attempts to create a [`ScalarValue`] from an array element.
    ///
    /// 32-bit numbers are widened to their 64-bit counterparts.
    pub fn try_from_array(array: &dyn Array, index: usize) -> Result<Self> {
        if !array.is_valid(index) {
            return array.data_type().try_into();
        }

        Ok(match array.data_type() {
            DataType::Null => ScalarValue::Null,
            DataType::Boolean => ScalarValue::Boolean(Some(array.as_boolean().value(index))),
            DataType::Int32 => {
                ScalarValue::Int64(Some(array.as_primitive::<Int32Type>().value(index) as i64))
            }
            DataType::Int64 => ScalarValue::Int64(Some(array.as_primitive::<Int64Type>().value(index))),
            DataType::Float32 => {
                ScalarValue::Float64(Some(array.as_primitive::<Float32Type>().value(index) as f64))
            }
            DataType::Float64 => {
                ScalarValue::Float64(Some(array.as_primitive::<Float64Type>().value(index)))
            }
            DataType::Utf8 => {
                ScalarValue::Utf8(Some(array.as_string::<i32>().value(index).to_string()))
            }
            other => {
                return Err(Error::InvalidOperation {
                    message: format!(
                        "Creating a ScalarValue from array with datatype '{}' is not supported",
                        other
                    ),
                    location: location!(),
                });
            }
        })
    }

    /// Retrieves the data type of the [`ScalarValue`].
    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::Null => DataType::Null,
            ScalarValue::Boolean(_) => DataType::Boolean,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(_) => DataType::Utf8,
        }
    }

    /// Whether this value is null or not
    pub fn is_null(&self) -> bool {
        match self {
            ScalarValue::Null => true,
            ScalarValue::Boolean(v) => v.is_none(),
            ScalarValue::Int64(v) => v.is_none(),
            ScalarValue::Float64(v) => v.is_none(),
            ScalarValue::Utf8(v) => v.is_none(),
        }
    }

    /// Converts the [`ScalarValue`] into a `Scalar<ArrayRef>`.
    pub fn to_scalar(&self) -> Result<Scalar<ArrayRef>> {
        Ok(Scalar::new(self.to_array(1)))
    }

    /// Converts the [`ScalarValue`] into an `ArrayRef` with the specified number of rows.
    pub fn to_array(&self, num_rows: usize) -> ArrayRef {
        match self {
            ScalarValue::Null => new_null_array(&DataType::Null, num_rows),
            ScalarValue::Boolean(v) => Arc::new(BooleanArray::from(vec![*v; num_rows])),
            ScalarValue::Int64(v) => Arc::new(Int64Array::from(vec![*v; num_rows])),
            ScalarValue::Float64(v) => Arc::new(Float64Array::from(vec![*v; num_rows])),
            ScalarValue::Utf8(v) => match v {
                Some(v) => Arc::new(StringArray::from_iter_values(
                    iter::repeat(v).take(num_rows),
                )),
                None => new_null_array(&DataType::Utf8, num_rows),
            },
        }
    }

    /// Builds an array of `data_type` from a sequence of scalars.
    ///
    /// Missing values of any variant are accepted; present values must
    /// match `data_type`.
    pub fn iter_to_array(
        scalars: impl IntoIterator<Item = ScalarValue>,
        data_type: &DataType,
    ) -> Result<ArrayRef> {
        let mismatch = |value: &ScalarValue| Error::InvalidData {
            message: format!("Cannot build an array of type '{data_type}' from value {value}"),
            location: location!(),
        };

        let array: ArrayRef = match data_type {
            DataType::Boolean => Arc::new(
                scalars
                    .into_iter()
                    .map(|v| match v {
                        ScalarValue::Boolean(v) => Ok(v),
                        other if other.is_null() => Ok(None),
                        other => Err(mismatch(&other)),
                    })
                    .collect::<Result<BooleanArray>>()?,
            ),
            DataType::Int64 => Arc::new(
                scalars
                    .into_iter()
                    .map(|v| match v {
                        ScalarValue::Int64(v) => Ok(v),
                        other if other.is_null() => Ok(None),
                        other => Err(mismatch(&other)),
                    })
                    .collect::<Result<Int64Array>>()?,
            ),
            DataType::Float64 => Arc::new(
                scalars
                    .into_iter()
                    .map(|v| match v {
                        ScalarValue::Float64(v) => Ok(v),
                        ScalarValue::Int64(v) => Ok(v.map(|v| v as f64)),
                        other if other.is_null() => Ok(None),
                        other => Err(mismatch(&other)),
                    })
                    .collect::<Result<Float64Array>>()?,
            ),
            DataType::Utf8 => Arc::new(
                scalars
                    .into_iter()
                    .map(|v| match v {
                        ScalarValue::Utf8(v) => Ok(v),
                        other if other.is_null() => Ok(None),
                        other => Err(mismatch(&other)),
                    })
                    .collect::<Result<StringArray>>()?,
            ),
            other => {
                return Err(Error::InvalidOperation {
                    message: format!("Building an array of type '{other}' is not supported"),
                    location: location!(),
                })
            }
        };

        Ok(array)
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        use ScalarValue::*;

        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (Float64(a), Float64(b)) => a.map(f64::to_bits) == b.map(f64::to_bits),
            (Utf8(a), Utf8(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ScalarValue::Null => {}
            ScalarValue::Boolean(v) => v.hash(state),
            ScalarValue::Int64(v) => v.hash(state),
            ScalarValue::Float64(v) => v.map(f64::to_bits).hash(state),
            ScalarValue::Utf8(v) => v.hash(state),
        }
    }
}

impl PartialOrd for ScalarValue {
    /// Orders present values of the same variant; integers and floats
    /// compare numerically. Everything else is unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use ScalarValue::*;

        match (self, other) {
            (Boolean(Some(a)), Boolean(Some(b))) => a.partial_cmp(b),
            (Int64(Some(a)), Int64(Some(b))) => a.partial_cmp(b),
            (Float64(Some(a)), Float64(Some(b))) => a.partial_cmp(b),
            (Int64(Some(a)), Float64(Some(b))) => (*a as f64).partial_cmp(b),
            (Float64(Some(a)), Int64(Some(b))) => a.partial_cmp(&(*b as f64)),
            (Utf8(Some(a)), Utf8(Some(b))) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl TryFrom<DataType> for ScalarValue {
    type Error = Error;

    /// Tries to create a `ScalarValue` from a `DataType`.
    fn try_from(data_type: DataType) -> Result<Self> {
        (&data_type).try_into()
    }
}

impl TryFrom<&DataType> for ScalarValue {
    type Error = Error;

    /// Tries to create a missing `ScalarValue` of a `DataType`.
    fn try_from(data_type: &DataType) -> Result<Self> {
        Ok(match data_type {
            DataType::Null => ScalarValue::Null,
            DataType::Boolean => ScalarValue::Boolean(None),
            DataType::Int32 | DataType::Int64 => ScalarValue::Int64(None),
            DataType::Float32 | DataType::Float64 => ScalarValue::Float64(None),
            DataType::Utf8 => ScalarValue::Utf8(None),
            _ => {
                return Err(Error::InvalidOperation {
                    message: format!(
                        "TryFrom DataType '{}' to ScalarValue is not supported",
                        data_type
                    ),
                    location: location!(),
                })
            }
        })
    }
}

macro_rules! format_option {
    ($f:expr, $expr:expr) => {
        match $expr {
            Some(v) => write!($f, "{}", v),
            None => write!($f, "NULL"),
        }
    };
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Boolean(v) => format_option!(f, v),
            ScalarValue::Int64(v) => format_option!(f, v),
            ScalarValue::Float64(v) => format_option!(f, v),
            ScalarValue::Utf8(v) => format_option!(f, v),
        }
    }
}
