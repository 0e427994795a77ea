//! CLI argument and environment parsing
//!
//! Every flag has an environment-variable counterpart so the wrapper can be
//! configured once in a shell profile; flags win over the environment. The
//! first non-flag argument starts the command to wrap.

use std::env;

use crate::linker::Terminator;

pub const USAGE: &str = "\
Usage: linkwrap [options] <command> [args...]
       <other command> | linkwrap [options]

Options:
  --scheme=NAME           URL scheme for file links (default: file)
                          Can also be set via LINKWRAP_SCHEME env var
                          Examples: file, vscode, cursor, zed
  --terminator=TYPE       OSC 8 string terminator (default: st)
                          Can also be set via LINKWRAP_TERMINATOR env var
                          st: ESC \\ (ECMA-48 standard)
                          bel: BEL 0x07 (legacy xterm)
  --domains=LIST          Comma-separated domains to linkify without https://
                          (default: github.com, env: LINKWRAP_DOMAINS)
  --no-resolve-basename   Disable basename resolution (default: enabled)
                          Can also be set via LINKWRAP_NO_RESOLVE_BASENAME=1
  --exclude-dir=DIR,...   Directories to exclude from search (replaces defaults)
                          Default: vendor,node_modules,.git,__pycache__,.cache
                          Can also be set via LINKWRAP_EXCLUDE_DIRS
  --symbol-links          Link identifiers in colored output to the editor's
                          symbol opener (env: LINKWRAP_SYMBOL_LINKS=1)
  --debug-writes          Log every write to a temp file for later replay
                          (env: LINKWRAP_DEBUG_WRITES=1)

Examples:
  linkwrap go build ./...
  linkwrap --scheme=cursor grep -rn \"TODO\" .
  grep -rn \"TODO\" . | linkwrap
";

const DEFAULT_EXCLUDE_DIRS: &[&str] = &["vendor", "node_modules", ".git", "__pycache__", ".cache"];

/// Parsed configuration for one wrapper run.
#[derive(Clone, Debug)]
pub struct Args {
    pub scheme: String,
    pub terminator: Terminator,
    pub domains: Vec<String>,
    pub resolve_basename: bool,
    pub exclude_dirs: Vec<String>,
    pub symbol_links: bool,
    pub debug_writes: bool,
    /// Command to exec under a PTY; empty means pipe mode.
    pub command: Vec<String>,
}

pub fn parse_args(args: &[String]) -> Result<Args, String> {
    parse_from(args, |key| env::var(key).ok())
}

fn parse_from<F>(args: &[String], env: F) -> Result<Args, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut parsed = Args {
        scheme: env("LINKWRAP_SCHEME").unwrap_or_default(),
        terminator: env("LINKWRAP_TERMINATOR")
            .as_deref()
            .and_then(Terminator::parse)
            .unwrap_or_default(),
        domains: env("LINKWRAP_DOMAINS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| vec!["github.com".to_string()]),
        resolve_basename: env("LINKWRAP_NO_RESOLVE_BASENAME").as_deref() != Some("1"),
        exclude_dirs: env("LINKWRAP_EXCLUDE_DIRS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| {
                DEFAULT_EXCLUDE_DIRS
                    .iter()
                    .map(|d| d.to_string())
                    .collect()
            }),
        symbol_links: env("LINKWRAP_SYMBOL_LINKS").as_deref() == Some("1"),
        debug_writes: env("LINKWRAP_DEBUG_WRITES").as_deref() == Some("1"),
        command: Vec::new(),
    };

    let mut iter = args.iter().enumerate();
    while let Some((i, arg)) = iter.next() {
        if let Some(value) = arg.strip_prefix("--scheme=") {
            parsed.scheme = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--terminator=") {
            parsed.terminator = Terminator::parse(value)
                .ok_or_else(|| format!("invalid terminator: {value} (expected: st, bel)"))?;
        } else if let Some(value) = arg.strip_prefix("--domains=") {
            parsed.domains = split_list(value);
        } else if arg == "--no-resolve-basename" {
            parsed.resolve_basename = false;
        } else if let Some(value) = arg.strip_prefix("--exclude-dir=") {
            parsed.exclude_dirs = split_list(value);
        } else if arg == "--symbol-links" {
            parsed.symbol_links = true;
        } else if arg == "--debug-writes" {
            parsed.debug_writes = true;
        } else if arg == "--" {
            parsed.command = args[i + 1..].to_vec();
            return Ok(parsed);
        } else if arg.starts_with('-') {
            return Err(format!("unknown option: {arg}"));
        } else {
            parsed.command = args[i..].to_vec();
            return Ok(parsed);
        }
    }

    Ok(parsed)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let args = parse_from(&[], no_env).unwrap();
        assert_eq!(args.scheme, "");
        assert_eq!(args.terminator, Terminator::St);
        assert_eq!(args.domains, vec!["github.com"]);
        assert!(args.resolve_basename);
        assert_eq!(
            args.exclude_dirs,
            vec!["vendor", "node_modules", ".git", "__pycache__", ".cache"]
        );
        assert!(!args.symbol_links);
        assert!(!args.debug_writes);
        assert!(args.command.is_empty());
    }

    #[test]
    fn flags_override() {
        let args = parse_from(
            &strings(&[
                "--scheme=cursor",
                "--terminator=bel",
                "--domains=github.com, gitlab.com",
                "--no-resolve-basename",
                "--exclude-dir=target",
                "--symbol-links",
                "--debug-writes",
            ]),
            no_env,
        )
        .unwrap();
        assert_eq!(args.scheme, "cursor");
        assert_eq!(args.terminator, Terminator::Bel);
        assert_eq!(args.domains, vec!["github.com", "gitlab.com"]);
        assert!(!args.resolve_basename);
        assert_eq!(args.exclude_dirs, vec!["target"]);
        assert!(args.symbol_links);
        assert!(args.debug_writes);
    }

    #[test]
    fn env_fallback_and_cli_precedence() {
        let env = |key: &str| match key {
            "LINKWRAP_SCHEME" => Some("vscode".to_string()),
            "LINKWRAP_TERMINATOR" => Some("bel".to_string()),
            "LINKWRAP_DOMAINS" => Some("example.com".to_string()),
            "LINKWRAP_NO_RESOLVE_BASENAME" => Some("1".to_string()),
            "LINKWRAP_SYMBOL_LINKS" => Some("1".to_string()),
            _ => None,
        };

        let args = parse_from(&[], &env).unwrap();
        assert_eq!(args.scheme, "vscode");
        assert_eq!(args.terminator, Terminator::Bel);
        assert_eq!(args.domains, vec!["example.com"]);
        assert!(!args.resolve_basename);
        assert!(args.symbol_links);

        let args = parse_from(&strings(&["--scheme=cursor", "--terminator=st"]), &env).unwrap();
        assert_eq!(args.scheme, "cursor");
        assert_eq!(args.terminator, Terminator::St);
    }

    #[test]
    fn first_non_flag_starts_command() {
        let args = parse_from(&strings(&["--scheme=cursor", "go", "build", "./..."]), no_env)
            .unwrap();
        assert_eq!(args.scheme, "cursor");
        assert_eq!(args.command, vec!["go", "build", "./..."]);
    }

    #[test]
    fn double_dash_ends_option_parsing() {
        let args = parse_from(&strings(&["--", "--scheme=cursor", "ls"]), no_env).unwrap();
        assert_eq!(args.scheme, "");
        assert_eq!(args.command, vec!["--scheme=cursor", "ls"]);
    }

    #[test]
    fn command_flags_are_not_ours() {
        let args = parse_from(&strings(&["grep", "-rn", "TODO"]), no_env).unwrap();
        assert_eq!(args.command, vec!["grep", "-rn", "TODO"]);
    }

    #[test]
    fn unknown_option_rejected() {
        assert!(parse_from(&strings(&["--bogus"]), no_env).is_err());
        assert!(parse_from(&strings(&["--terminator=xyz"]), no_env).is_err());
    }

    #[test]
    fn list_splitting_trims_and_drops_empties() {
        assert_eq!(split_list("a, b ,,c"), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn invalid_env_terminator_ignored() {
        let env = |key: &str| match key {
            "LINKWRAP_TERMINATOR" => Some("bogus".to_string()),
            _ => None,
        };
        let args = parse_from(&[], env).unwrap();
        assert_eq!(args.terminator, Terminator::St);
    }
}
