use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use httpreq_core::RequestResult;

/// Print one block per result and optionally save the last body, as raw bytes.
///
/// Exit code is failure when any request did not get a response.
pub fn write_results<W: Write>(results: &[RequestResult], output_file: Option<&Path>, out: &mut W) -> Result<ExitCode> {
    let mut delivered = true;
    for result in results {
        let millis = result.elapsed().as_millis();
        match (result.response(), result.error()) {
            (Some(response), _) => {
                writeln!(out, "{} ({millis} ms)", response.status)?;
                if output_file.is_none() && !response.body.is_empty() {
                    writeln!(out, "{}", response.text())?;
                }
            }
            (None, Some(err)) => {
                delivered = false;
                writeln!(out, "error: {err} ({millis} ms)")?;
            }
            (None, None) => {}
        }
    }

    if let Some(path) = output_file {
        let body = results
            .last()
            .and_then(RequestResult::response)
            .map(|r| r.body.as_slice())
            .unwrap_or_default();
        fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(if delivered { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
