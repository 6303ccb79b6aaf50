//! Platform-specific process launch plans
//!
//! On Windows the interpreter is started through `cmd` after switching the
//! console code page to UTF-8, otherwise text piped through the console can
//! be mangled. Everywhere else the interpreter is spawned directly.

use crate::platform::Platform;
use crate::runtime::RuntimeCandidate;
use std::fmt;
use tokio::process::Command;

/// Switches the console to UTF-8 before running the interpreter
const UTF8_CODE_PAGE: &str = "chcp 65001 >nul";

/// Program, arguments, and (for `cmd`) the raw command line to spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPlan {
    pub program: String,
    pub args: Vec<String>,
    /// Line handed to the shell verbatim, after `args`
    pub shell_line: Option<String>,
}

impl InvocationPlan {
    /// Build the command; stdio and working directory are left to the caller
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(line) = &self.shell_line {
            // cmd does its own parsing, so the line must not be re-quoted
            #[cfg(windows)]
            command.raw_arg(line);
            #[cfg(not(windows))]
            command.arg(line);
        }
        command
    }
}

impl fmt::Display for InvocationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(line) = &self.shell_line {
            write!(f, " {}", line)?;
        }
        Ok(())
    }
}

/// Decide how to launch `runtime` with `args` on `platform`
pub fn plan_invocation(
    runtime: &RuntimeCandidate,
    args: &[String],
    platform: Platform,
) -> InvocationPlan {
    match platform {
        Platform::Unix => InvocationPlan {
            program: runtime.as_str().to_string(),
            args: args.to_vec(),
            shell_line: None,
        },
        Platform::Windows => {
            let mut line = format!("{} && {}", UTF8_CODE_PAGE, quote_for_cmd(runtime.as_str()));
            for arg in args {
                line.push(' ');
                line.push_str(&quote_for_cmd(arg));
            }
            InvocationPlan {
                program: "cmd".to_string(),
                args: vec!["/d".to_string(), "/s".to_string(), "/c".to_string()],
                // /s strips exactly one pair of outer quotes
                shell_line: Some(format!("\"{}\"", line)),
            }
        }
    }
}

/// Quote an argument for cmd.exe, doubling embedded quotes
fn quote_for_cmd(arg: &str) -> String {
    format!("\"{}\"", arg.replace('"', "\"\""))
}
