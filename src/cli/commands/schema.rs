//! Schema command: JSON Schema of the run file format.

use crate::error::Result;
use crate::model::RunFile;
use schemars::schema_for;

/// Print the run file schema to stdout.
///
/// # Errors
///
/// Returns an error if the schema cannot be serialized.
pub fn execute() -> Result<()> {
    let schema = schema_for!(RunFile);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
