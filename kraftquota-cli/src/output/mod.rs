//! Output formatting for CLI.
//!
//! Every view is rendered to a string first, then written in one go.

mod json;
mod text;

use std::io::Write;

use kraftquota_core::{AuthConfig, OutputFormat, QuotaReport};
use serde::Serialize;
use thiserror::Error;

pub use json::{JsonFormatter, YamlFormatter};
pub use text::{QuotaView, TextFormatter};


// ============================================================================
// Errors
// ============================================================================

/// Errors raised while rendering or writing output.
#[derive(Debug, Error)]
pub enum RenderError {
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Writing to the output stream failed.
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Printer
// ============================================================================

/// Renders quota reports in the selected format.
pub trait QuotaPrinter {
    /// Prints the full report. `auth` supplies the account identity.
    fn print_quotas(
        &self,
        format: OutputFormat,
        auth: &AuthConfig,
        report: &QuotaReport,
    ) -> Result<(), RenderError>;

    /// Prints only the limits of each entry.
    fn print_quotas_limits(&self, format: OutputFormat, report: &QuotaReport) -> Result<(), RenderError>;

    /// Prints only the features of each entry.
    fn print_quotas_features(&self, format: OutputFormat, report: &QuotaReport) -> Result<(), RenderError>;
}

impl<T: QuotaPrinter + ?Sized> QuotaPrinter for &T {
    fn print_quotas(
        &self,
        format: OutputFormat,
        auth: &AuthConfig,
        report: &QuotaReport,
    ) -> Result<(), RenderError> {
        (**self).print_quotas(format, auth, report)
    }

    fn print_quotas_limits(&self, format: OutputFormat, report: &QuotaReport) -> Result<(), RenderError> {
        (**self).print_quotas_limits(format, report)
    }

    fn print_quotas_features(&self, format: OutputFormat, report: &QuotaReport) -> Result<(), RenderError> {
        (**self).print_quotas_features(format, report)
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Renders the full report.
pub fn render_quotas(
    format: OutputFormat,
    auth: &AuthConfig,
    report: &QuotaReport,
    use_colors: bool,
) -> Result<String, RenderError> {
    render(
        format,
        use_colors,
        &json::quota_outputs(auth, report),
        || QuotaView::quotas(auth, report),
    )
}

/// Renders the limits view.
pub fn render_limits(format: OutputFormat, report: &QuotaReport, use_colors: bool) -> Result<String, RenderError> {
    render(format, use_colors, &json::limits_outputs(report), || QuotaView::limits(report))
}

/// Renders the features view.
pub fn render_features(format: OutputFormat, report: &QuotaReport, use_colors: bool) -> Result<String, RenderError> {
    render(format, use_colors, &json::features_outputs(report), || QuotaView::features(report))
}

fn render<T: Serialize>(
    format: OutputFormat,
    use_colors: bool,
    structured: &T,
    view: impl FnOnce() -> QuotaView,
) -> Result<String, RenderError> {
    let rendered = match format {
        OutputFormat::Json => JsonFormatter::new(true).format(structured)?,
        OutputFormat::Yaml => YamlFormatter.format(structured)?,
        OutputFormat::Table => TextFormatter::new(use_colors).format_table(&view()),
        OutputFormat::List => TextFormatter::new(use_colors).format_list(&view()),
    };
    Ok(rendered)
}

// ============================================================================
// Stdout Printer
// ============================================================================

/// Printer writing to standard output.
#[derive(Debug, Clone, Copy)]
pub struct StdoutPrinter {
    use_colors: bool,
}

impl StdoutPrinter {
    /// Creates a printer; colors apply to `list` and `table` only.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn write(rendered: &str) -> Result<(), RenderError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{rendered}")?;
        stdout.flush()?;
        Ok(())
    }
}

impl QuotaPrinter for StdoutPrinter {
    fn print_quotas(
        &self,
        format: OutputFormat,
        auth: &AuthConfig,
        report: &QuotaReport,
    ) -> Result<(), RenderError> {
        Self::write(&render_quotas(format, auth, report, self.use_colors)?)
    }

    fn print_quotas_limits(&self, format: OutputFormat, report: &QuotaReport) -> Result<(), RenderError> {
        Self::write(&render_limits(format, report, self.use_colors)?)
    }

    fn print_quotas_features(&self, format: OutputFormat, report: &QuotaReport) -> Result<(), RenderError> {
        Self::write(&render_features(format, report, self.use_colors)?)
    }
}
