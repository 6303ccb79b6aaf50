//! Formatter command-line assembly

use crate::config::FormatOptions;
use crate::tool::ToolConfig;

/// Final argument telling the tool to read from stdin
pub const STDIN_MARKER: &str = "-";

/// Arguments for a formatting pass, in a fixed order:
/// `-m <module> [--wrap W] --end-of-line E [--no-validate] [extra...] -`
///
/// Later flags win in the tool's parser, so extra arguments can override the
/// derived ones.
pub fn format_args(tool: &ToolConfig, options: &FormatOptions) -> Vec<String> {
    let mut args = vec!["-m".to_string(), tool.module.to_string()];

    if let Some(wrap) = options.wrap {
        args.push("--wrap".to_string());
        args.push(wrap.as_arg());
    }

    args.push("--end-of-line".to_string());
    args.push(options.end_of_line.as_str().to_string());

    if !options.validate {
        args.push("--no-validate".to_string());
    }

    args.extend(options.extra_args.iter().cloned());
    args.push(STDIN_MARKER.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EndOfLine, WrapMode};
    use crate::tool;

    #[test]
    fn test_default_args() {
        let args = format_args(&tool::mdformat(), &FormatOptions::default());
        assert_eq!(args, ["-m", "mdformat", "--end-of-line", "lf", "-"]);
    }

    #[test]
    fn test_full_args_order() {
        let options = FormatOptions {
            wrap: Some(WrapMode::Width(80)),
            end_of_line: EndOfLine::Crlf,
            validate: false,
            extra_args: vec!["--number".to_string(), "--wrap".to_string(), "no".to_string()],
        };

        let args = format_args(&tool::mdformat(), &options);
        assert_eq!(
            args,
            [
                "-m",
                "mdformat",
                "--wrap",
                "80",
                "--end-of-line",
                "crlf",
                "--no-validate",
                "--number",
                "--wrap",
                "no",
                "-"
            ]
        );
    }

    #[test]
    fn test_args_are_stable() {
        let options = FormatOptions {
            wrap: Some(WrapMode::Keep),
            ..FormatOptions::default()
        };
        let tool = tool::mdformat();
        assert_eq!(format_args(&tool, &options), format_args(&tool, &options));
    }
}
