use std::collections::HashMap;

use ahash::RandomState;
use arrow::{
    array::ArrayRef,
    datatypes::DataType,
    row::{OwnedRow, RowConverter, SortField},
};

use crate::error::Result;

/// Assigns a dense group index to every distinct combination of key values.
///
/// Groups are numbered in order of first appearance. Missing key values
/// form their own group.
#[derive(Debug)]
pub struct GroupValues {
    row_converter: RowConverter,
    map: HashMap<OwnedRow, usize, RandomState>,
    /// The input row at which each group was first seen.
    first_rows: Vec<usize>,
}

impl GroupValues {
    pub fn try_new(key_types: &[DataType]) -> Result<Self> {
        let row_converter = RowConverter::new(
            key_types
                .iter()
                .map(|data_type| SortField::new(data_type.clone()))
                .collect(),
        )?;

        Ok(Self {
            row_converter,
            map: HashMap::default(),
            first_rows: vec![],
        })
    }

    /// Maps each row of `cols` to its group index, written into `groups`.
    pub fn intern(&mut self, cols: &[ArrayRef], groups: &mut Vec<usize>) -> Result<()> {
        groups.clear();

        let rows = self.row_converter.convert_columns(cols)?;
        for (row_idx, row) in rows.iter().enumerate() {
            let next_group = self.first_rows.len();
            let group_idx = *self.map.entry(row.owned()).or_insert(next_group);
            if group_idx == next_group {
                self.first_rows.push(row_idx);
            }
            groups.push(group_idx);
        }

        Ok(())
    }

    /// The number of distinct groups seen so far.
    pub fn len(&self) -> usize {
        self.first_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_rows.is_empty()
    }

    /// The input row at which each group was first seen, by group index.
    pub fn first_rows(&self) -> &[usize] {
        &self.first_rows
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{ArrayRef, Int64Array, StringArray},
        datatypes::DataType,
    };

    use super::GroupValues;

    #[test]
    fn test_group_values_first_appearance_order() {
        let names: ArrayRef = Arc::new(StringArray::from(vec![
            Some("b"),
            Some("a"),
            None,
            Some("b"),
            Some("a"),
            None,
        ]));
        let ids: ArrayRef = Arc::new(Int64Array::from(vec![1, 1, 1, 1, 2, 1]));

        let mut group_values = GroupValues::try_new(&[DataType::Utf8, DataType::Int64]).unwrap();
        let mut groups = vec![];
        group_values.intern(&[names, ids], &mut groups).unwrap();

        assert_eq!(groups, vec![0, 1, 2, 0, 3, 2]);
        assert_eq!(group_values.len(), 4);
        assert_eq!(group_values.first_rows(), &[0, 1, 2, 4]);
    }
}
