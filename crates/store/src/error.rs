#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Schema conflict on table {table}: {detail}")]
    SchemaConflict { table: String, detail: String },
}
