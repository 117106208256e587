use std::fmt::Display;

use crate::error::{Error, Result};
use arrow::datatypes::{Field, Schema};
use snafu::location;

/// Represents a [`Column`] expression in an AST.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    /// The name of the column.
    name: String,
}

impl Column {
    /// Creates a new [`Column`] instance.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The name of the column.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Resolves this column to its index in `schema`.
    ///
    /// When several fields share the name, the first one wins.
    pub fn index_of(&self, schema: &Schema) -> Result<usize> {
        schema
            .column_with_name(&self.name)
            .map(|(index, _)| index)
            .ok_or_else(|| Error::Reference {
                message: format!(
                    "Column with name '{}' could not be found in schema",
                    &self.name
                ),
                location: location!(),
            })
    }

    /// Resolves this column to its [`Field`] definition from a schema.
    pub fn to_field(&self, schema: &Schema) -> Result<Field> {
        let index = self.index_of(schema)?;
        Ok(schema.field(index).clone())
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::{DataType, Field, Schema};

    use crate::{error::Error, tests::create_schema};

    use super::Column;

    #[test]
    fn test_column_to_field() {
        let schema = create_schema();

        let cols = [
            ("c1", DataType::Utf8, Column::new("c1")),
            ("c2", DataType::Int64, Column::new("c2")),
            ("c3", DataType::Int64, Column::new("c3")),
        ];

        for (name, data_type, col) in cols.iter() {
            let field = col.to_field(&schema).unwrap();
            assert_eq!(field.name(), name);
            assert_eq!(field.data_type(), data_type);
        }
    }

    #[test]
    fn test_column_duplicate_names_resolve_to_first() {
        let schema = Schema::new(vec![
            Field::new("currency", DataType::Utf8, true),
            Field::new("currency", DataType::Int64, true),
        ]);

        let column = Column::new("currency");
        assert_eq!(column.index_of(&schema).unwrap(), 0);
        assert!(matches!(
            Column::new("missing").index_of(&schema),
            Err(Error::Reference { .. })
        ));
    }
}
