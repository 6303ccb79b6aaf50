//! Charm-style installation check using cliclack

use crate::error::FormatError;
use crate::host::ContextHint;
use crate::orchestrator::FormatOrchestrator;
use crate::runtime::{probe_runtime, Installer, RuntimeCandidate};
use anyhow::Result;

/// CLI arguments for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    /// Never prompt; report and exit (non-interactive mode)
    pub yes: bool,
}

/// Verify the runtime and tool from scratch, offering to install the tool
/// when the runtime lacks it
pub async fn run_check(
    orchestrator: &FormatOrchestrator,
    hint: &ContextHint,
    args: CheckArgs,
) -> Result<()> {
    let tool = orchestrator.tool();
    cliclack::intro(format!("{} installation check", tool.display_name))?;

    // Outcome notifications are rendered by the orchestrator's sink
    match orchestrator.check_installation(hint).await {
        Ok(runtime) => {
            show_runtime_version(orchestrator, &runtime).await?;
            cliclack::outro("Ready to format")?;
            Ok(())
        }
        Err(FormatError::ToolUnavailable { runtime, .. }) => {
            handle_missing_tool(orchestrator, hint, runtime, &args).await
        }
        Err(e) => {
            cliclack::outro_cancel("No usable Python interpreter")?;
            Err(e.into())
        }
    }
}

async fn show_runtime_version(
    orchestrator: &FormatOrchestrator,
    runtime: &RuntimeCandidate,
) -> Result<()> {
    let resolver = orchestrator.resolver();
    let info = probe_runtime(resolver.prober(), runtime.as_str(), resolver.runtime_name()).await;

    match info.and_then(|info| info.version) {
        Some(version) => cliclack::log::info(format!("Python {} ({})", version, runtime))?,
        None => cliclack::log::info(format!("Python at {} (version unknown)", runtime))?,
    }
    Ok(())
}

async fn handle_missing_tool(
    orchestrator: &FormatOrchestrator,
    hint: &ContextHint,
    runtime: RuntimeCandidate,
    args: &CheckArgs,
) -> Result<()> {
    let installer = Installer::new(orchestrator.tool().clone(), runtime.clone());
    let name = installer.tool().display_name;

    // In non-interactive mode, just report how to fix it
    if args.yes {
        cliclack::log::info(format!("Install it with: {}", installer.install_command()))?;
        anyhow::bail!("{} is not installed for {}", name, runtime);
    }

    let action: &str = cliclack::select("What would you like to do?")
        .item(
            "install",
            format!("Install {} with pip", name),
            installer.install_command(),
        )
        .item(
            "docs",
            format!("Open documentation ({})", installer.tool().docs_url),
            "",
        )
        .item("skip", "Skip for now", "")
        .interact()?;

    match action {
        "install" => {
            let confirm: bool = cliclack::confirm("Proceed with installation?")
                .initial_value(true)
                .interact()?;

            if !confirm {
                cliclack::outro_cancel("Installation skipped")?;
                anyhow::bail!("{} is not installed for {}", name, runtime);
            }

            if let Err(e) = installer.install().await {
                cliclack::log::error(format!("{}", e))?;
                anyhow::bail!("Installation failed.");
            }

            // Confirm the install actually took under this runtime
            match orchestrator.check_installation(hint).await {
                Ok(runtime) => {
                    show_runtime_version(orchestrator, &runtime).await?;
                    cliclack::outro("Ready to format")?;
                    Ok(())
                }
                Err(e) => {
                    cliclack::outro_cancel("Installation did not take effect")?;
                    Err(e.into())
                }
            }
        }
        "docs" => {
            installer.open_docs()?;
            cliclack::outro(format!("After installing {}, run this command again.", name))?;
            Ok(())
        }
        _ => {
            cliclack::outro_cancel(format!(
                "Continuing without {}. Install it with: {}",
                name,
                installer.install_command()
            ))?;
            anyhow::bail!("{} is not installed for {}", name, runtime);
        }
    }
}
