//! Description of the external formatter driven by the pipeline
//!
//! The pipeline never hard-codes the tool: everything it needs to build a
//! command line, probe availability, and tell the user how to install it
//! lives here.

/// Configuration for an external formatter run as `<runtime> -m <module>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Python module passed to `-m` (e.g., "mdformat")
    pub module: &'static str,
    /// Display name for user-facing messages
    pub display_name: &'static str,
    /// Package name given to `pip install`
    pub package: &'static str,
    /// Substring a runtime's `--version` output must contain
    pub runtime_name: &'static str,
    /// URL to the documentation
    pub docs_url: &'static str,
}

impl ToolConfig {
    /// Arguments that ask the tool for its version; exit 0 means installed
    pub fn version_args(&self) -> Vec<String> {
        vec!["-m".to_string(), self.module.to_string(), "--version".to_string()]
    }

    /// Arguments that install the tool into a runtime
    pub fn install_args(&self) -> Vec<String> {
        vec![
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
            self.package.to_string(),
        ]
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        mdformat()
    }
}

/// Pre-configured tool description for mdformat
pub fn mdformat() -> ToolConfig {
    ToolConfig {
        module: "mdformat",
        display_name: "mdformat",
        package: "mdformat",
        runtime_name: "python",
        docs_url: "https://mdformat.readthedocs.io",
    }
}
