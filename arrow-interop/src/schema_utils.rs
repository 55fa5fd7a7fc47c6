use anyhow::{Context, Result};
use arrow_schema::Schema;
use vector_core::{TypeTag, VectorConfig};

pub trait SchemaExt {
    /// The named fields, in the order given. Schema metadata is kept.
    fn project_by_name(&self, names: &[&str]) -> Result<Schema>;
    /// Sum of per-field item sizes once held as vectors.
    fn row_byte_width(&self) -> Result<usize>;
    fn is_vector_compatible(&self, config: &VectorConfig) -> bool;
}

impl SchemaExt for Schema {
    fn project_by_name(&self, names: &[&str]) -> Result<Schema> {
        let fields = names
            .iter()
            .map(|name| {
                self.field_with_name(name)
                    .cloned()
                    .with_context(|| format!("Column '{}' not found", name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Schema::new_with_metadata(fields, self.metadata().clone()))
    }

    fn row_byte_width(&self) -> Result<usize> {
        let config = VectorConfig::default();
        self.fields().iter().map(|f| {
            TypeTag::from_arrow(f.data_type(), &config)
                .map(TypeTag::item_size)
                .with_context(|| format!("Field '{}'", f.name()))
        }).sum()
    }

    fn is_vector_compatible(&self, config: &VectorConfig) -> bool {
        self.fields().iter().all(|f| TypeTag::from_arrow(f.data_type(), config).is_ok())
    }
}
