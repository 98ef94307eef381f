use located_error::prelude::*;

use crate::error::GenotypeError;

/// Column-type tag carried on the sample annotation file's second header
/// line: `0` identifies the mandatory id/null columns, `1` a discrete
/// covariate, `3` a continuous covariate, `P` a phenotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind { Identifier, Discrete, Continuous, Phenotype }

impl ColumnKind {
    pub fn from_tag(tag: &str) -> anyhow::Result<Self> {
        match tag {
            "0" => Ok(Self::Identifier),
            "1" => Ok(Self::Discrete),
            "3" => Ok(Self::Continuous),
            "P" | "p" => Ok(Self::Phenotype),
            other => Err(GenotypeError::MalformedSampleRow).with_loc(|| format!("Unrecognised column-type tag '{other}'")),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Identifier => "0",
            Self::Discrete   => "1",
            Self::Continuous => "3",
            Self::Phenotype  => "P",
        }
    }
}

/// One row of the sample annotation table: an ordered list of string
/// fields whose first three positions are mandated to be `(id_1, id_2,
/// missing)` by [`SampleTable`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleRow {
    pub fields: Vec<String>,
}

impl SampleRow {
    #[must_use]
    pub fn new(fields: Vec<String>) -> Self {
        Self{fields}
    }

    #[must_use]
    pub fn id1(&self) -> &str {
        &self.fields[0]
    }

    #[must_use]
    pub fn id2(&self) -> &str {
        &self.fields[1]
    }

    #[must_use]
    pub fn missing(&self) -> &str {
        &self.fields[2]
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn push(&mut self, value: impl Into<String>) {
        self.fields.push(value.into());
    }
}

/// The full sample annotation table: column names, their type tags, and
/// one [`SampleRow`] per sample, in file order.
///
/// Mandatory schema: columns 0, 1, 2 are `(id_1, id_2, missing)`, all
/// tagged [`ColumnKind::Identifier`].
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    pub columns: Vec<String>,
    pub kinds: Vec<ColumnKind>,
    pub rows: Vec<SampleRow>,
}

const MANDATORY_COLUMNS: [&str; 3] = ["id_1", "id_2", "missing"];

impl SampleTable {
    #[must_use]
    pub fn new(columns: Vec<String>, kinds: Vec<ColumnKind>) -> Self {
        Self{columns, kinds, rows: Vec::new()}
    }

    /// Validate that the first three columns are `(id_1, id_2, missing)`,
    /// each tagged as [`ColumnKind::Identifier`].
    pub fn validate_schema(&self) -> anyhow::Result<()> {
        if self.columns.len() < 3 || self.kinds.len() != self.columns.len() {
            return Err(GenotypeError::MalformedSampleRow).loc("While validating sample table schema");
        }
        for (i, want) in MANDATORY_COLUMNS.iter().enumerate() {
            if self.columns[i] != *want || self.kinds[i] != ColumnKind::Identifier {
                return Err(GenotypeError::MalformedSampleRow)
                    .with_loc(|| format!("Expected mandatory column '{want}' (kind 0) at position {i}"));
            }
        }
        Ok(())
    }

    /// Ensure this table and `other` share the same column schema, as
    /// required before writing a sink with one table's header and the
    /// other's rows.
    pub fn schema_matches(&self, other: &Self) -> anyhow::Result<()> {
        if self.columns != other.columns || self.kinds != other.kinds {
            return Err(GenotypeError::SchemaMismatch(format!(
                "{:?} (kinds {:?}) vs {:?} (kinds {:?})", self.columns, self.kinds, other.columns, other.kinds
            ))).loc("While comparing sample table schemas");
        }
        Ok(())
    }

    /// Append a new column (e.g. the `missing`/`heterozygosity` columns
    /// the statistics engine derives) with one value per existing row.
    ///
    /// # Errors
    /// `GenotypeError::SchemaMismatch` if `values.len()` does not match
    /// `self.rows.len()`.
    pub fn add_column(&mut self, name: impl Into<String>, kind: ColumnKind, values: Vec<String>) -> anyhow::Result<()> {
        if values.len() != self.rows.len() {
            return Err(GenotypeError::SchemaMismatch(format!(
                "column has {} values but table has {} rows", values.len(), self.rows.len()
            ))).loc("While appending a derived sample-table column");
        }
        self.columns.push(name.into());
        self.kinds.push(kind);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_table() -> SampleTable {
        let mut t = SampleTable::new(
            vec!["id_1".into(), "id_2".into(), "missing".into(), "phenotype".into()],
            vec![ColumnKind::Identifier, ColumnKind::Identifier, ColumnKind::Identifier, ColumnKind::Phenotype],
        );
        t.rows.push(SampleRow::new(vec!["S1".into(), "S1".into(), "0".into(), "1.2".into()]));
        t.rows.push(SampleRow::new(vec!["S2".into(), "S2".into(), "0".into(), "3.4".into()]));
        t
    }

    #[test]
    fn validates_mandatory_schema() {
        assert!(minimal_table().validate_schema().is_ok());
    }

    #[test]
    fn rejects_missing_mandatory_column() {
        let mut t = minimal_table();
        t.columns[1] = "wrong".into();
        assert!(t.validate_schema().is_err());
    }

    #[test]
    fn add_column_extends_every_row() {
        let mut t = minimal_table();
        t.add_column("heterozygosity", ColumnKind::Continuous, vec!["0.1".into(), "0.2".into()]).unwrap();
        assert_eq!(t.rows[0].fields.last().unwrap(), "0.1");
        assert_eq!(t.rows[1].fields.last().unwrap(), "0.2");
    }

    #[test]
    fn add_column_rejects_length_mismatch() {
        let mut t = minimal_table();
        assert!(t.add_column("bad", ColumnKind::Continuous, vec!["only-one".into()]).is_err());
    }

    #[test]
    fn schema_mismatch_detected() {
        let a = minimal_table();
        let mut b = minimal_table();
        b.columns.push("extra".into());
        b.kinds.push(ColumnKind::Discrete);
        assert!(a.schema_matches(&b).is_err());
    }
}
