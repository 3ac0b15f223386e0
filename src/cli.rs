use clap::Parser;

/// gamingfix - repair the Xbox / Gaming Services stack
///
/// Checks the Microsoft Store, Xbox app, identity provider, Game Bar and
/// Gaming Services packages, re-registers them from their manifests,
/// installs any that are missing, makes sure the gaming services are set to
/// start automatically and are running, and installs the WebView2 and
/// Visual C++ runtimes. Must be run from an elevated terminal. Safe to run
/// repeatedly.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "gamingfix")]
#[command(version)]
pub struct Cli {
    /// Also reconcile the legacy Xbox Console Companion app
    #[arg(long)]
    pub include_legacy_console_companion: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
