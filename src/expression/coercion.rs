use arrow::{
    array::{new_empty_array, ArrayRef},
    compute::kernels::numeric::{add_wrapping, div, mul_wrapping, sub_wrapping},
    datatypes::DataType,
};
use snafu::location;

use crate::error::{Error, Result};

use super::operator::Operator;

/// Represents the signature of an operation,
/// including the input and output data types.
#[derive(Debug)]
pub struct Signature {
    /// The left input's [`DataType`].
    lhs: DataType,
    /// The right input's [`DataType`].
    rhs: DataType,
    /// The return value's [`DataType`].
    ret: DataType,
}

impl Signature {
    /// Attempts to create a new [`Signature`] instance.
    ///
    /// Mixed integer and floating point inputs are both coerced to
    /// `Float64`; a `Null` input takes the type of the other side.
    fn try_new(lhs: &DataType, op: &Operator, rhs: &DataType) -> Result<Self> {
        use DataType::*;
        use Operator::*;

        let coercion_err = |lhs: &DataType, op: &Operator, rhs: &DataType| -> Error {
            Error::InvalidData {
                message: format!(
                    "Cannot infer datatype from operation {} {} {}",
                    lhs, op, rhs
                ),
                location: location!(),
            }
        };

        match op {
            Eq | NotEq | Lt | LtEq | Gt | GtEq => {
                let input = comparison_coercion(lhs, rhs).ok_or_else(|| coercion_err(lhs, op, rhs))?;
                Ok(Self {
                    lhs: input.clone(),
                    rhs: input,
                    ret: Boolean,
                })
            }
            Or | And => {
                if !matches!((lhs, rhs), (Boolean | Null, Boolean | Null)) {
                    return Err(coercion_err(lhs, op, rhs));
                }
                Ok(Self {
                    lhs: Boolean,
                    rhs: Boolean,
                    ret: Boolean,
                })
            }
            Plus | Minus | Multiply | Divide => {
                let input = numeric_coercion(lhs, rhs).ok_or_else(|| coercion_err(lhs, op, rhs))?;
                let left = new_empty_array(&input);
                let right = new_empty_array(&input);
                let result: ArrayRef = match op {
                    Plus => add_wrapping(&left, &right)?,
                    Minus => sub_wrapping(&left, &right)?,
                    Multiply => mul_wrapping(&left, &right)?,
                    _ => div(&left, &right)?,
                };
                Ok(Self {
                    lhs: input.clone(),
                    rhs: input,
                    ret: result.data_type().clone(),
                })
            }
        }
    }

    /// Gets the result data type of an operation given the input data types and operator.
    pub fn get_result_type(lhs: &DataType, op: &Operator, rhs: &DataType) -> Result<DataType> {
        Self::try_new(lhs, op, rhs).map(|sig| sig.ret)
    }

    /// Gets the input data type of an operation given the input data types and operator.
    pub fn get_input_types(
        lhs: &DataType,
        op: &Operator,
        rhs: &DataType,
    ) -> Result<(DataType, DataType)> {
        Self::try_new(lhs, op, rhs).map(|sig| (sig.lhs, sig.rhs))
    }
}

/// Whether the type takes part in numeric coercion.
pub fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64
    )
}

fn numeric_coercion(lhs: &DataType, rhs: &DataType) -> Option<DataType> {
    use DataType::*;

    match (lhs, rhs) {
        (Null, Null) => Some(Int64),
        (Null, other) | (other, Null) if is_numeric(other) => Some(widen(other)),
        (l, r) if is_numeric(l) && is_numeric(r) => {
            if matches!(l, Float32 | Float64) || matches!(r, Float32 | Float64) {
                Some(Float64)
            } else if l == r {
                Some(l.clone())
            } else {
                Some(Int64)
            }
        }
        _ => None,
    }
}

fn comparison_coercion(lhs: &DataType, rhs: &DataType) -> Option<DataType> {
    use DataType::*;

    match (lhs, rhs) {
        (l, r) if l == r => Some(l.clone()),
        (Null, other) | (other, Null) => Some(other.clone()),
        (l, r) if is_numeric(l) && is_numeric(r) => numeric_coercion(l, r),
        _ => None,
    }
}

fn widen(data_type: &DataType) -> DataType {
    match data_type {
        DataType::Int32 => DataType::Int64,
        DataType::Float32 => DataType::Float64,
        other => other.clone(),
    }
}
