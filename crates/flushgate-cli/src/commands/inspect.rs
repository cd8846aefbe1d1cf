//! Batch file inspection.

use anyhow::{Context, Result};
use comfy_table::Cell;
use flushgate_adapters::storage::batch_file::{BatchFileReader, BatchFrame};
use serde::Serialize;
use std::path::Path;

use crate::OutputFormat;
use crate::output::{self, Format};

/// One frame in the listing.
#[derive(Serialize)]
struct FrameOutput {
    id: u64,
    offset: u64,
    bytes: usize,
}

/// Inspection output.
#[derive(Serialize)]
struct InspectOutput {
    path: String,
    batches: usize,
    payload_bytes: u64,
    intact_bytes: u64,
    file_bytes: u64,
    id_gaps: usize,
    frames: Vec<FrameOutput>,
}

impl InspectOutput {
    fn new(path: &Path, file_bytes: u64, frames: &[BatchFrame]) -> Self {
        let id_gaps = frames
            .windows(2)
            .filter(|w| w[1].id != w[0].id.next())
            .count();

        Self {
            path: path.display().to_string(),
            batches: frames.len(),
            payload_bytes: frames.iter().map(|f| f.len() as u64).sum(),
            intact_bytes: frames.iter().map(|f| f.encoded_len() as u64).sum(),
            file_bytes,
            id_gaps,
            frames: frames
                .iter()
                .map(|f| FrameOutput {
                    id: f.id.as_u64(),
                    offset: f.offset,
                    bytes: f.len(),
                })
                .collect(),
        }
    }
}

/// Run the inspect command.
pub fn run(path: &Path, strict: bool, format: OutputFormat, quiet: bool) -> Result<()> {
    let file_bytes = std::fs::metadata(path)
        .with_context(|| format!("cannot stat {}", path.display()))?
        .len();

    let reader = BatchFileReader::new(path);
    let frames = if strict {
        reader.read_strict()?
    } else {
        reader.read_all()?
    };
    let info = InspectOutput::new(path, file_bytes, &frames);

    if info.intact_bytes < info.file_bytes {
        output::warning(
            &format!(
                "{} trailing bytes could not be read as batches",
                info.file_bytes - info.intact_bytes
            ),
            quiet,
        );
    }

    let fmt: Format = format.into();
    match fmt {
        Format::Json => output::print_json(&info, quiet)?,
        Format::Table => {
            if !quiet {
                let mut table = output::create_table();
                output::add_header(&mut table, &["Batch", "Offset", "Bytes"]);
                for frame in &info.frames {
                    table.add_row(vec![
                        Cell::new(frame.id),
                        Cell::new(frame.offset),
                        Cell::new(frame.bytes),
                    ]);
                }
                println!("{table}");
            }

            let items = vec![
                ("Path", info.path.clone()),
                ("Batches", info.batches.to_string()),
                ("Payload", output::format_bytes(info.payload_bytes)),
                ("File Size", output::format_bytes(info.file_bytes)),
                ("Id Gaps", info.id_gaps.to_string()),
            ];
            output::print_key_value_table(&items, quiet);
        }
    }

    Ok(())
}
