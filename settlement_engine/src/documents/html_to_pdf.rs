use std::{process::Stdio, time::Duration};

use dealer_common::helpers::env_non_empty;
use log::*;
use tokio::process::Command;

use crate::documents::{DocumentError, PdfRenderer};

const DEFAULT_PDF_COMMAND: &str = "wkhtmltopdf";
const DEFAULT_PDF_ARGS: &str = "--quiet {input} {output}";
const DEFAULT_PDF_TIMEOUT: u64 = 60;

/// Renders PDFs by running an external HTML-to-PDF program (`wkhtmltopdf`, headless Chromium, etc.).
///
/// The HTML is written to a temporary file, and the program is expected to write the PDF to a second temporary file.
/// The `{input}` and `{output}` placeholders in the argument list are replaced with the paths of these files.
#[derive(Debug, Clone)]
pub struct HtmlToPdfCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Default for HtmlToPdfCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_PDF_COMMAND.to_string(),
            args: split_args(DEFAULT_PDF_ARGS),
            timeout: Duration::from_secs(DEFAULT_PDF_TIMEOUT),
        }
    }
}

impl HtmlToPdfCommand {
    pub fn new<S: Into<String>>(program: S, args: Vec<String>, timeout: Duration) -> Self {
        Self { program: program.into(), args, timeout }
    }

    pub fn new_from_env_or_default() -> Self {
        let program = env_non_empty("DSF_PDF_COMMAND").unwrap_or_else(|| {
            debug!("🪛️ DSF_PDF_COMMAND is not set. Using {DEFAULT_PDF_COMMAND}");
            DEFAULT_PDF_COMMAND.to_string()
        });
        let args = env_non_empty("DSF_PDF_ARGS").unwrap_or_else(|| DEFAULT_PDF_ARGS.to_string());
        let timeout = env_non_empty("DSF_PDF_TIMEOUT")
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid DSF_PDF_TIMEOUT ({s}): {e}. Using {DEFAULT_PDF_TIMEOUT}s"))
                    .ok()
            })
            .unwrap_or(DEFAULT_PDF_TIMEOUT);
        Self::new(program, split_args(&args), Duration::from_secs(timeout))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn split_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(String::from).collect()
}

impl PdfRenderer for HtmlToPdfCommand {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, DocumentError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("invoice.html");
        let output = dir.path().join("invoice.pdf");
        tokio::fs::write(&input, html).await?;
        let input = input.to_string_lossy();
        let output_str = output.to_string_lossy();
        let args = self.args.iter().map(|a| a.replace("{input}", &input).replace("{output}", &output_str));
        trace!("📄️ Running {} to render {} bytes of HTML", self.program, html.len());
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();
        let result = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| DocumentError::RenderTimeout(self.timeout.as_secs()))?
            .map_err(|e| DocumentError::RenderError(format!("Could not run {}: {e}", self.program)))?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let msg = format!("{} exited with {}. {}", self.program, result.status, stderr.trim());
            return Err(DocumentError::RenderError(msg));
        }
        let pdf = tokio::fs::read(&output).await?;
        if !pdf.starts_with(b"%PDF") {
            return Err(DocumentError::RenderError(format!("{} did not produce a PDF document", self.program)));
        }
        debug!("📄️ Rendered a {} byte PDF", pdf.len());
        Ok(pdf)
    }
}
