//! Quotas command - show account quotas, limits, and features.
//!
//! Runs in two phases. [`QuotasCommand::validate`] checks the flags and
//! resolves the metro and token; [`QuotasCommand::execute`] resolves
//! credentials, fetches the report from the metro, and prints the selected
//! view.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use kraftquota_core::{Metro, OutputFormat};
use kraftquota_fetch::{FetchError, HttpUsersClientFactory, QuotasApi, SystemKeychain, UsersClientFactory};
use kraftquota_store::{ConfigResolver, EnvConfigResolver, Settings, SettingsStore, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::Cli;
use crate::output::{QuotaPrinter, RenderError, StdoutPrinter};

// ============================================================================
// Arguments & Options
// ============================================================================

/// Arguments for the quotas command.
#[derive(Args, Debug, Clone)]
pub struct QuotasArgs {
    /// Only show the limits.
    #[arg(long, short)]
    pub limits: bool,

    /// Only show the features.
    #[arg(long, short)]
    pub features: bool,

    /// Set output format. Options: table, yaml, json, list.
    #[arg(long, short, default_value = "list")]
    pub output: String,
}

impl Default for QuotasArgs {
    fn default() -> Self {
        Self {
            limits: false,
            features: false,
            output: OutputFormat::default().as_str().to_string(),
        }
    }
}

/// Options for a single invocation.
///
/// `metro`, `token` and `format` are filled in by [`QuotasCommand::validate`].
#[derive(Debug, Clone, Default)]
pub struct QuotasOptions {
    /// Only show the limits.
    pub limits: bool,
    /// Only show the features.
    pub features: bool,
    /// Requested output format, as typed.
    pub output: String,
    metro: Option<Metro>,
    token: Option<String>,
    format: OutputFormat,
}

impl QuotasOptions {
    /// Returns the resolved metro, once validated.
    pub fn metro(&self) -> Option<&Metro> {
        self.metro.as_ref()
    }

    /// Returns the parsed output format, once validated.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Returns which view to print.
    pub fn selection(&self) -> QuotaSelection {
        QuotaSelection::from_flags(self.limits, self.features)
    }
}

impl From<&QuotasArgs> for QuotasOptions {
    fn from(args: &QuotasArgs) -> Self {
        Self {
            limits: args.limits,
            features: args.features,
            output: args.output.clone(),
            ..Default::default()
        }
    }
}

/// Which part of the report to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaSelection {
    /// Limits only.
    Limits,
    /// Features only.
    Features,
    /// Usage, hard caps, limits, and features.
    All,
}

impl QuotaSelection {
    /// Maps the flags to a view. Limits wins if both are set; validation
    /// rejects that combination before execution.
    pub fn from_flags(limits: bool, features: bool) -> Self {
        match (limits, features) {
            (true, _) => Self::Limits,
            (false, true) => Self::Features,
            (false, false) => Self::All,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Quotas command errors.
#[derive(Debug, Error)]
pub enum QuotasError {
    /// Metro or token could not be resolved.
    #[error("could not populate metro and token: {0}")]
    ConfigResolution(#[source] StoreError),

    /// Output format is not one of the supported values.
    #[error("invalid output format: {0}")]
    InvalidOutputFormat(String),

    /// Both `--limits` and `--features` were given.
    #[error("cannot use both limits and features flags")]
    ConflictingFlags,

    /// No usable credentials.
    #[error("could not retrieve credentials: {0}")]
    Credential(#[source] StoreError),

    /// The remote quotas call failed.
    #[error("could not get quotas: {0}")]
    RemoteQuota(#[source] FetchError),

    /// Printing the report failed.
    #[error("could not render quotas: {0}")]
    Render(#[source] RenderError),
}

// ============================================================================
// Command
// ============================================================================

/// The quotas command with its collaborators.
pub struct QuotasCommand<R, F, P> {
    resolver: R,
    clients: F,
    printer: P,
}

impl<R, F, P> QuotasCommand<R, F, P>
where
    R: ConfigResolver,
    F: UsersClientFactory,
    P: QuotaPrinter,
{
    /// Creates a command over a config resolver, client factory, and printer.
    pub fn new(resolver: R, clients: F, printer: P) -> Self {
        Self {
            resolver,
            clients,
            printer,
        }
    }

    /// Checks the flags and resolves the metro and token into `opts`.
    ///
    /// Local checks run first, so flag mistakes are reported even when no
    /// metro is configured.
    ///
    /// # Errors
    ///
    /// - [`QuotasError::ConflictingFlags`] if both `limits` and `features` are set
    /// - [`QuotasError::InvalidOutputFormat`] for an unknown output format
    /// - [`QuotasError::ConfigResolution`] if the metro cannot be resolved
    pub fn validate(&self, opts: &mut QuotasOptions) -> Result<(), QuotasError> {
        if opts.limits && opts.features {
            return Err(QuotasError::ConflictingFlags);
        }

        opts.format = opts
            .output
            .parse()
            .map_err(|_| QuotasError::InvalidOutputFormat(opts.output.clone()))?;

        let resolved = self
            .resolver
            .populate_metro_token()
            .map_err(QuotasError::ConfigResolution)?;
        debug!(metro = %resolved.metro, explicit_token = resolved.token.is_some(), "Validated quotas options");

        opts.metro = Some(resolved.metro);
        opts.token = resolved.token;
        Ok(())
    }

    /// Fetches the report and prints the selected view.
    ///
    /// # Errors
    ///
    /// - [`QuotasError::ConfigResolution`] if `opts` was never validated
    /// - [`QuotasError::Credential`] if no credentials can be resolved
    /// - [`QuotasError::RemoteQuota`] if the client cannot be built or the call fails
    /// - [`QuotasError::Render`] if printing fails
    pub async fn execute(&self, opts: &QuotasOptions) -> Result<(), QuotasError> {
        let metro = opts
            .metro()
            .ok_or(QuotasError::ConfigResolution(StoreError::MetroUnset))?;

        let auth = self
            .resolver
            .auth_config(opts.token.as_deref())
            .await
            .map_err(QuotasError::Credential)?;

        let client = self
            .clients
            .users_client(auth.token_auth(), metro)
            .map_err(QuotasError::RemoteQuota)?;

        info!(metro = %metro, "Fetching quotas");
        let report = client.quotas().await.map_err(|e| {
            warn!(error = %e, "Quotas request failed");
            QuotasError::RemoteQuota(e)
        })?;

        let printed = match opts.selection() {
            QuotaSelection::Limits => self.printer.print_quotas_limits(opts.format(), &report),
            QuotaSelection::Features => self.printer.print_quotas_features(opts.format(), &report),
            QuotaSelection::All => self.printer.print_quotas(opts.format(), &auth, &report),
        };
        printed.map_err(QuotasError::Render)
    }

    /// Validates, then executes.
    ///
    /// # Errors
    ///
    /// Returns the first error from either phase.
    pub async fn run(&self, mut opts: QuotasOptions) -> Result<(), QuotasError> {
        self.validate(&mut opts)?;
        self.execute(&opts).await
    }
}

// ============================================================================
// Entry Point
// ============================================================================

/// Request timeout: `--timeout` if given, else the settings value; at least 1 s.
fn request_timeout(flag: Option<u64>, settings: &Settings) -> Duration {
    flag.map_or_else(|| settings.timeout(), |secs| Duration::from_secs(secs.max(1)))
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Runs the quotas command.
pub async fn run(args: &QuotasArgs, cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    let settings = store.get().await;

    let mut clients = HttpUsersClientFactory::new().with_timeout(request_timeout(cli.timeout, &settings));
    if let Some(api_url) = &settings.api_url {
        clients = clients.with_base_url(api_url.clone());
    }

    let use_colors = cli.use_colors(settings.color);
    let resolver = EnvConfigResolver::new(settings, Arc::new(SystemKeychain::new()))
        .with_flags(cli.metro.clone(), cli.token.clone());

    let command = QuotasCommand::new(resolver, clients, StdoutPrinter::new(use_colors));

    tokio::select! {
        result = command.run(QuotasOptions::from(args)) => result.map_err(Into::into),
        () = interrupted() => {
            warn!("Interrupted");
            anyhow::bail!("interrupted")
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kraftquota_core::{AuthConfig, QuotaEntry, QuotaReport, TokenAuth};
    use kraftquota_store::MetroToken;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ------------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------------

    #[derive(Default)]
    struct FakeResolver {
        metro: Option<&'static str>,
        token: Option<&'static str>,
        populate_calls: AtomicUsize,
        auth_calls: AtomicUsize,
    }

    impl FakeResolver {
        fn with_metro(metro: &'static str) -> Self {
            Self {
                metro: Some(metro),
                token: Some("secret"),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ConfigResolver for FakeResolver {
        fn populate_metro_token(&self) -> Result<MetroToken, StoreError> {
            self.populate_calls.fetch_add(1, Ordering::SeqCst);
            let metro = self.metro.ok_or(StoreError::MetroUnset)?;
            Ok(MetroToken {
                metro: Metro::new(metro)?,
                token: self.token.map(str::to_string),
            })
        }

        async fn auth_config(&self, token: Option<&str>) -> Result<AuthConfig, StoreError> {
            self.auth_calls.fetch_add(1, Ordering::SeqCst);
            let token = token.ok_or(StoreError::TokenNotFound)?;
            Ok(AuthConfig::new(Some("alice".to_string()), token))
        }
    }

    #[derive(Clone)]
    enum Reply {
        Report(QuotaReport),
        Refused,
    }

    struct FakeClient {
        reply: Reply,
    }

    #[async_trait]
    impl QuotasApi for FakeClient {
        async fn quotas(&self) -> Result<QuotaReport, FetchError> {
            match &self.reply {
                Reply::Report(report) => Ok(report.clone()),
                Reply::Refused => Err(FetchError::Request(
                    "error sending request: tcp connect error: connection refused".to_string(),
                )),
            }
        }
    }

    struct FakeFactory {
        reply: Reply,
        scoped_to: Mutex<Option<String>>,
        calls: AtomicUsize,
    }

    impl FakeFactory {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                scoped_to: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl UsersClientFactory for FakeFactory {
        type Client = FakeClient;

        fn users_client(&self, _auth: TokenAuth, metro: &Metro) -> Result<FakeClient, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.scoped_to.lock().unwrap() = Some(metro.to_string());
            Ok(FakeClient {
                reply: self.reply.clone(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingPrinter {
        calls: Mutex<Vec<(&'static str, OutputFormat, Option<String>)>>,
    }

    impl RecordingPrinter {
        fn calls(&self) -> Vec<(&'static str, OutputFormat, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl QuotaPrinter for RecordingPrinter {
        fn print_quotas(
            &self,
            format: OutputFormat,
            auth: &AuthConfig,
            _report: &QuotaReport,
        ) -> Result<(), RenderError> {
            self.calls.lock().unwrap().push(("all", format, auth.user.clone()));
            Ok(())
        }

        fn print_quotas_limits(&self, format: OutputFormat, _report: &QuotaReport) -> Result<(), RenderError> {
            self.calls.lock().unwrap().push(("limits", format, None));
            Ok(())
        }

        fn print_quotas_features(&self, format: OutputFormat, _report: &QuotaReport) -> Result<(), RenderError> {
            self.calls.lock().unwrap().push(("features", format, None));
            Ok(())
        }
    }

    fn report() -> QuotaReport {
        QuotaReport::new(vec![QuotaEntry {
            uuid: "u-1".to_string(),
            ..Default::default()
        }])
    }

    fn options(limits: bool, features: bool, output: &str) -> QuotasOptions {
        QuotasOptions::from(&QuotasArgs {
            limits,
            features,
            output: output.to_string(),
        })
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    #[test]
    fn test_default_args() {
        let opts = QuotasOptions::from(&QuotasArgs::default());
        assert_eq!(opts.output, "list");
        assert_eq!(opts.selection(), QuotaSelection::All);
    }

    #[test]
    fn test_selection_from_flags() {
        assert_eq!(QuotaSelection::from_flags(true, false), QuotaSelection::Limits);
        assert_eq!(QuotaSelection::from_flags(false, true), QuotaSelection::Features);
        assert_eq!(QuotaSelection::from_flags(false, false), QuotaSelection::All);
    }

    #[test]
    fn test_conflicting_flags_rejected_for_every_format() {
        for output in ["table", "yaml", "json", "list", "xml"] {
            let resolver = FakeResolver::default();
            let command = QuotasCommand::new(&resolver, FakeFactory::new(Reply::Refused), RecordingPrinter::default());

            let err = command.validate(&mut options(true, true, output)).unwrap_err();
            assert!(matches!(err, QuotasError::ConflictingFlags), "output {output}: {err}");
            assert_eq!(err.to_string(), "cannot use both limits and features flags");
            assert_eq!(resolver.populate_calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_invalid_output_format() {
        let resolver = FakeResolver::with_metro("fra0");
        let command = QuotasCommand::new(&resolver, FakeFactory::new(Reply::Refused), RecordingPrinter::default());

        for output in ["xml", "JSON", ""] {
            let err = command.validate(&mut options(false, false, output)).unwrap_err();
            assert!(matches!(err, QuotasError::InvalidOutputFormat(ref o) if o == output));
            assert_eq!(err.to_string(), format!("invalid output format: {output}"));
        }
    }

    #[test]
    fn test_metro_resolution_failure() {
        let command = QuotasCommand::new(
            FakeResolver::default(),
            FakeFactory::new(Reply::Refused),
            RecordingPrinter::default(),
        );

        let err = command.validate(&mut options(false, false, "list")).unwrap_err();
        assert!(matches!(err, QuotasError::ConfigResolution(StoreError::MetroUnset)));
        assert!(err.to_string().starts_with("could not populate metro and token: "));
    }

    #[test]
    fn test_validate_populates_options() {
        let command = QuotasCommand::new(
            FakeResolver::with_metro("fra0"),
            FakeFactory::new(Reply::Refused),
            RecordingPrinter::default(),
        );

        let mut opts = options(false, true, "yaml");
        command.validate(&mut opts).unwrap();

        assert_eq!(opts.metro().map(Metro::as_str), Some("fra0"));
        assert_eq!(opts.format(), OutputFormat::Yaml);
        assert_eq!(opts.selection(), QuotaSelection::Features);
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_dispatches_each_selection_once() {
        let cases = [
            (true, false, "limits"),
            (false, true, "features"),
            (false, false, "all"),
        ];

        for (limits, features, expected) in cases {
            let printer = RecordingPrinter::default();
            let command = QuotasCommand::new(
                FakeResolver::with_metro("fra0"),
                FakeFactory::new(Reply::Report(report())),
                &printer,
            );

            command.run(options(limits, features, "table")).await.unwrap();

            let calls = printer.calls();
            assert_eq!(calls.len(), 1, "{expected}");
            assert_eq!(calls[0].0, expected);
            assert_eq!(calls[0].1, OutputFormat::Table);
        }
    }

    #[tokio::test]
    async fn test_full_view_receives_credentials() {
        let printer = RecordingPrinter::default();
        let command = QuotasCommand::new(
            FakeResolver::with_metro("fra0"),
            FakeFactory::new(Reply::Report(report())),
            &printer,
        );

        command.run(options(false, false, "json")).await.unwrap();
        assert_eq!(printer.calls()[0].2.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_client_scoped_to_resolved_metro() {
        let factory = FakeFactory::new(Reply::Report(report()));
        let command = QuotasCommand::new(FakeResolver::with_metro("WAS1"), &factory, RecordingPrinter::default());

        command.run(options(false, false, "list")).await.unwrap();
        assert_eq!(factory.scoped_to.lock().unwrap().as_deref(), Some("was1"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_wrapped() {
        let printer = RecordingPrinter::default();
        let command = QuotasCommand::new(FakeResolver::with_metro("fra0"), FakeFactory::new(Reply::Refused), &printer);

        let err = command.run(options(false, false, "list")).await.unwrap_err();
        let message = err.to_string();

        assert!(matches!(err, QuotasError::RemoteQuota(_)));
        assert!(message.contains("could not get quotas"), "{message}");
        assert!(message.contains("connection refused"), "{message}");
        assert!(printer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let resolver = FakeResolver {
            metro: Some("fra0"),
            token: None,
            ..Default::default()
        };
        let factory = FakeFactory::new(Reply::Report(report()));
        let command = QuotasCommand::new(resolver, &factory, RecordingPrinter::default());

        let err = command.run(options(false, false, "list")).await.unwrap_err();
        assert!(matches!(err, QuotasError::Credential(StoreError::TokenNotFound)));
        assert!(err.to_string().starts_with("could not retrieve credentials: "));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_requires_validation() {
        let resolver = FakeResolver::with_metro("fra0");
        let command = QuotasCommand::new(&resolver, FakeFactory::new(Reply::Refused), RecordingPrinter::default());

        let err = command.execute(&options(false, false, "list")).await.unwrap_err();
        assert!(matches!(err, QuotasError::ConfigResolution(_)));
        assert_eq!(resolver.auth_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_request_timeout() {
        let settings = Settings {
            timeout_secs: 12,
            ..Default::default()
        };
        assert_eq!(request_timeout(None, &settings), Duration::from_secs(12));
        assert_eq!(request_timeout(Some(5), &settings), Duration::from_secs(5));
        assert_eq!(request_timeout(Some(0), &settings), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_interrupted_waits_for_signal() {
        let waited = tokio::time::timeout(Duration::from_millis(50), interrupted()).await;
        assert!(waited.is_err(), "should not resolve without Ctrl-C");
    }

    #[tokio::test]
    async fn test_validation_failure_stops_execution() {
        let printer = RecordingPrinter::default();
        let factory = FakeFactory::new(Reply::Report(report()));
        let command = QuotasCommand::new(FakeResolver::with_metro("fra0"), &factory, &printer);

        assert!(command.run(options(false, false, "xml")).await.is_err());
        assert_eq!(factory.calls.load(Ordering::SeqCst), 0);
        assert!(printer.calls().is_empty());
    }
}
