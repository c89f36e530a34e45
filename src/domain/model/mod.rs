//! Domain model definitions: the visitor record and the explicit table schema it lives in.

pub mod visitor;

pub use visitor::{Visitor, VISITORS};

/// Column types the schema layer knows how to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-assigned, monotonically increasing integer.
    Serial,
    Text,
}

impl ColumnType {
    pub fn to_sql(self) -> &'static str {
        match self {
            ColumnType::Serial => "SERIAL",
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    /// Emits a secondary `ix_<table>_<column>` index.
    pub indexed: bool,
}

/// Static description of a table: name, columns, nullability and indexing.
///
/// The DDL executed at start-up is generated from this value, so the table definition lives
/// in exactly one place.
#[derive(Clone, Copy, Debug)]
pub struct TableSchema {
    pub table_name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableSchema {
    /// `CREATE TABLE IF NOT EXISTS ...` for this table.
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut def = format!("{} {}", c.name, c.col_type.to_sql());
                if c.primary_key {
                    def.push_str(" PRIMARY KEY");
                } else if !c.nullable {
                    def.push_str(" NOT NULL");
                }
                def
            })
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table_name,
            columns.join(", ")
        )
    }

    /// One `CREATE INDEX IF NOT EXISTS ...` per indexed column.
    pub fn create_index_sql(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.indexed)
            .map(|c| {
                format!(
                    "CREATE INDEX IF NOT EXISTS ix_{table}_{col} ON {table} ({col})",
                    table = self.table_name,
                    col = c.name
                )
            })
            .collect()
    }

    /// Comma separated column list, in declaration order.
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
