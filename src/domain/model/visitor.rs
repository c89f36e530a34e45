use serde::Serialize;
use utoipa::ToSchema;

use super::{ColumnDef, ColumnType, TableSchema};

/// A recorded visitor.
///
/// Instances handed to handlers are request-scoped copies; the `visitors` table owns the
/// canonical row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema, sqlx::FromRow)]
pub struct Visitor {
    pub id: i32,
    #[schema(example = "Alice")]
    pub name: String,
}

/// Schema of the `visitors` table.
pub const VISITORS: TableSchema = TableSchema {
    table_name: "visitors",
    columns: &[
        ColumnDef {
            name: "id",
            col_type: ColumnType::Serial,
            nullable: false,
            primary_key: true,
            indexed: true,
        },
        ColumnDef {
            name: "name",
            col_type: ColumnType::Text,
            nullable: false,
            primary_key: false,
            indexed: true,
        },
    ],
};
