//! Installing the formatter into a resolved runtime
//!
//! Runs `<runtime> -m pip install <package>` and streams pip's output to the
//! terminal as it arrives.

use super::RuntimeCandidate;
use crate::tool::ToolConfig;
use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

/// Timeout for installation (2 minutes; pip may build wheels)
const INSTALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Installs a tool into one runtime
pub struct Installer {
    tool: ToolConfig,
    runtime: RuntimeCandidate,
}

impl Installer {
    pub fn new(tool: ToolConfig, runtime: RuntimeCandidate) -> Self {
        Self { tool, runtime }
    }

    pub fn tool(&self) -> &ToolConfig {
        &self.tool
    }

    /// Get the install command string
    pub fn install_command(&self) -> String {
        let mut parts = vec![self.runtime.to_string()];
        parts.extend(self.tool.install_args());
        parts.join(" ")
    }

    /// Install the tool, showing the command and streaming its output
    pub async fn install(&self) -> Result<()> {
        let cmd = self.install_command();
        println!();
        println!("{} {}", "Running:".dimmed(), cmd.yellow());
        println!();

        let mut child = TokioCommand::new(&self.runtime)
            .args(self.tool.install_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.runtime))?;

        let stdout = child.stdout.take().context("Failed to capture stdout")?;
        let stderr = child.stderr.take().context("Failed to capture stderr")?;

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();

        // Stream output until both pipes close
        let output_task = async {
            let mut stdout_open = true;
            let mut stderr_open = true;
            while stdout_open || stderr_open {
                tokio::select! {
                    line = stdout_reader.next_line(), if stdout_open => {
                        match line {
                            Ok(Some(line)) => println!("  {}", line),
                            Ok(None) => stdout_open = false,
                            Err(e) => {
                                eprintln!("{} {}", "Error reading stdout:".red(), e);
                                stdout_open = false;
                            }
                        }
                    }
                    line = stderr_reader.next_line(), if stderr_open => {
                        match line {
                            Ok(Some(line)) => eprintln!("  {}", line.yellow()),
                            Ok(None) => stderr_open = false,
                            Err(e) => {
                                eprintln!("{} {}", "Error reading stderr:".red(), e);
                                stderr_open = false;
                            }
                        }
                    }
                }
            }
        };

        if timeout(INSTALL_TIMEOUT, output_task).await.is_err() {
            // Kill the process on timeout
            let _ = child.kill().await;
            println!();
            anyhow::bail!(
                "Installation timed out after {} seconds.\n\
                 Please try installing manually:\n\
                 {}",
                INSTALL_TIMEOUT.as_secs(),
                cmd
            );
        }

        match timeout(Duration::from_secs(5), child.wait()).await {
            Ok(Ok(status)) => {
                println!();
                if status.success() {
                    Ok(())
                } else {
                    anyhow::bail!(
                        "Installation failed with exit code: {}\n\
                         Please try installing manually: {}",
                        status.code().unwrap_or(-1),
                        cmd
                    );
                }
            }
            Ok(Err(e)) => {
                anyhow::bail!("Failed to wait for installer: {}", e);
            }
            Err(_) => {
                let _ = child.kill().await;
                anyhow::bail!(
                    "Installation process hung. Please try installing manually:\n{}",
                    cmd
                );
            }
        }
    }

    /// Open the tool's documentation in the default browser
    pub fn open_docs(&self) -> Result<()> {
        println!(
            "{}",
            format!("Opening {} documentation in your browser...", self.tool.display_name).cyan()
        );
        open::that(self.tool.docs_url)?;
        Ok(())
    }
}
