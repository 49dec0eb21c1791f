//! DOCX rendering through an external `pandoc` binary.

use crate::errors::ExportError;
use std::process::Stdio;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, warn};

/// Converts `markdown` to DOCX bytes by piping it through pandoc.
///
/// A binary that cannot be spawned surfaces as
/// [`ExportError::ConverterUnavailable`]; a non-zero exit surfaces as
/// [`ExportError::ConversionFailed`] carrying pandoc's stderr.
pub async fn render_docx(pandoc_path: &str, markdown: &str) -> Result<Vec<u8>, ExportError> {
    let workdir = tempfile::tempdir()?;
    let output_path = workdir.path().join("consulting_template.docx");

    debug!(pandoc = pandoc_path, output = %output_path.display(), "Running pandoc");
    let mut child = Command::new(pandoc_path)
        .arg("--from=markdown")
        .arg("--to=docx")
        .arg("--output")
        .arg(&output_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExportError::ConverterUnavailable {
            tool: pandoc_path.to_string(),
            source,
        })?;

    // Stdin is fed from its own task while stderr drains.
    let writer = child.stdin.take().map(|mut stdin| {
        let input = markdown.as_bytes().to_vec();
        tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        })
    });

    let output = child.wait_with_output().await?;
    let write_result = match writer {
        Some(handle) => handle.await?,
        None => Ok(()),
    };
    if !output.status.success() {
        if let Err(e) = &write_result {
            debug!(error = %e, "pandoc stopped reading its input");
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(status = %output.status, %stderr, "pandoc conversion failed");
        return Err(ExportError::ConversionFailed {
            tool: pandoc_path.to_string(),
            status: output.status.to_string(),
            stderr,
        });
    }

    write_result?;

    Ok(tokio::fs::read(&output_path).await?)
}
