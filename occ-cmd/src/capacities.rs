//! Listing of the capacity table a pipeline would use.

use crate::pipeline::PipelineKind;
use anyhow::Context;
use csv::Writer;
use occ_station::capacity::CapacityTable;
use std::{io::Write, path::Path};

/// Effective capacity table: the file given on the command line, or the
/// pipeline's built-in table.
pub fn load_capacities(kind: PipelineKind, path: Option<&Path>) -> anyhow::Result<CapacityTable> {
    match path {
        Some(path) => CapacityTable::from_path(path)
            .with_context(|| format!("Failed to load capacities from {}", path.display())),
        None => kind.capacities(),
    }
}

/// Write `table` as `NAME,CAPACITY` CSV.
pub fn write_capacities<W: Write>(table: &CapacityTable, out: W) -> anyhow::Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["NAME", "CAPACITY"])?;
    for (name, capacity) in table.iter() {
        writer.write_record([name, capacity.to_string().as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn run_capacities(kind: PipelineKind, path: Option<&Path>) -> anyhow::Result<()> {
    let table = load_capacities(kind, path)?;
    write_capacities(&table, std::io::stdout().lock())
}
