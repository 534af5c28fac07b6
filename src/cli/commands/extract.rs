//! Extract Command
//!
//! Prints the text extracted from a document, as the analysis would see it.

use std::path::Path;

use serde_json::json;

use crate::cli::util::{CommandContext, OutputFormat};
use crate::extract::{DocumentFormat, extract_text};
use crate::types::Result;

pub fn run(ctx: CommandContext, path: &Path, format: OutputFormat) -> Result<()> {
    let rt = ctx.runtime()?;
    let text = rt.block_on(extract_text(path, &ctx.config.extraction))?;

    if format.is_json() {
        let report = json!({
            "path": path.display().to_string(),
            "format": DocumentFormat::from_path(path).label(),
            "chars": text.chars().count(),
            "text": text,
        });
        ctx.output.plain(&serde_json::to_string_pretty(&report)?);
    } else {
        ctx.output.plain(&text);
    }
    Ok(())
}
