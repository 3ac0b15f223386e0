//! Target catalog.
//!
//! The fixed, ordered lists a run reconciles. Order is execution order only;
//! entries do not depend on each other. Items that other components lean on
//! at runtime (Store, identity provider) are listed first for readability.

use crate::installer::PackageSource;
use crate::services::ServiceSpec;

/// A package the run must leave installed and registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSpec {
    /// Package family name queried by the inspector
    pub name: &'static str,
    /// Human-readable name for logs
    pub label: &'static str,
    /// Where to install from when absent; `None` means repair-only
    pub source: Option<PackageSource>,
}

/// A runtime installed through the package-source client with no inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedistSpec {
    pub label: &'static str,
    pub source: PackageSource,
}

/// Packages reconciled on every run.
pub const COMPONENTS: &[ComponentSpec] = &[
    // The Store cannot reinstall itself; a broken Store is repaired by registration
    ComponentSpec {
        name: "Microsoft.WindowsStore",
        label: "Microsoft Store",
        source: None,
    },
    ComponentSpec {
        name: "Microsoft.XboxIdentityProvider",
        label: "Xbox Identity Provider",
        source: Some(PackageSource::store("9WZDNCRD1HKW")),
    },
    ComponentSpec {
        name: "Microsoft.GamingServices",
        label: "Gaming Services",
        source: Some(PackageSource::store("9MWPM2CQNLHN")),
    },
    ComponentSpec {
        name: "Microsoft.GamingApp",
        label: "Xbox app",
        source: Some(PackageSource::store("9MV0B5HZVK9Z")),
    },
    ComponentSpec {
        name: "Microsoft.XboxGamingOverlay",
        label: "Xbox Game Bar",
        source: Some(PackageSource::store("9NZKPSTSNW4P")),
    },
];

/// Added with `--include-legacy-console-companion`.
pub const LEGACY_CONSOLE_COMPANION: ComponentSpec = ComponentSpec {
    name: "Microsoft.XboxApp",
    label: "Xbox Console Companion",
    source: Some(PackageSource::store("9WZDNCRFJBD8")),
};

/// Services that must start automatically and be running.
pub const SERVICES: &[ServiceSpec] = &[
    ServiceSpec {
        name: "GamingServices",
    },
    ServiceSpec {
        name: "GamingServicesNet",
    },
    ServiceSpec {
        name: "XblAuthManager",
    },
    ServiceSpec {
        name: "XblGameSave",
    },
];

/// Runtimes installed unconditionally; winget skips ones already present.
pub const REDISTRIBUTABLES: &[RedistSpec] = &[
    RedistSpec {
        label: "Microsoft Edge WebView2 Runtime",
        source: PackageSource::winget("Microsoft.EdgeWebView2Runtime"),
    },
    RedistSpec {
        label: "Visual C++ 2015-2022 Redistributable (x64)",
        source: PackageSource::winget("Microsoft.VCRedist.2015+.x64"),
    },
    RedistSpec {
        label: "Visual C++ 2015-2022 Redistributable (x86)",
        source: PackageSource::winget("Microsoft.VCRedist.2015+.x86"),
    },
];

/// Component list for a run, in execution order.
pub fn target_components(include_legacy_console_companion: bool) -> Vec<ComponentSpec> {
    let mut components = COMPONENTS.to_vec();
    if include_legacy_console_companion {
        components.push(LEGACY_CONSOLE_COMPANION);
    }
    components
}
