use std::ffi::OsString;

pub use clap::Parser;

/// Long options understood by [`Args`]. Anything else starting with `--` is
/// dropped by [`Args::parse_lenient_from`].
const KNOWN_LONG: &[&str] = &[
    "--verbose",
    "--info",
    "--template",
    "--update",
    "--debug",
    "--help",
    "--version",
];

/// Short options understood by [`Args`].
const KNOWN_SHORT: &[char] = &['T', 'h', 'V'];

#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "tplnew", version, about = "Create a project from the project template")]
pub struct Args {
    /// Directory of the new project (optional with --update)
    #[arg(value_name = "PROJECT_DIRECTORY")]
    pub project_directory: Option<String>,

    /// Print additional logs
    #[arg(long)]
    pub verbose: bool,

    /// Print environment debug info
    #[arg(long)]
    pub info: bool,

    /// Address or path of the template repository
    #[arg(short = 'T', long, value_name = "URL", env = "TPLNEW_TEMPLATE")]
    pub template: Option<String>,

    /// Refresh the configuration files of an existing project from the template
    #[arg(long)]
    pub update: bool,

    /// Do not create, clone or install anything, only print the steps
    #[arg(long)]
    pub debug: bool,

    /// Unknown options removed before parsing
    #[arg(skip)]
    pub ignored: Vec<String>,
}

impl Args {
    /// Parses `std::env::args_os`, tolerating options this tool does not know.
    #[must_use]
    pub fn parse_lenient() -> Self {
        Self::parse_lenient_from(std::env::args_os())
    }

    /// Parses `args` after stripping unknown options, so wrapper scripts can
    /// pass through flags meant for other tools.
    #[must_use]
    pub fn parse_lenient_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let (kept, ignored) = retain_known(args);
        let mut parsed = Self::parse_from(kept);
        parsed.ignored = ignored;
        parsed
    }
}

fn retain_known<I, T>(args: I) -> (Vec<OsString>, Vec<String>)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut kept = Vec::new();
    let mut ignored = Vec::new();
    let mut args = args.into_iter().map(Into::into).peekable();

    if let Some(bin) = args.next() {
        kept.push(bin);
    }

    while let Some(arg) = args.next() {
        let Some(text) = arg.to_str() else {
            kept.push(arg);
            continue;
        };

        if text == "--" {
            kept.push(arg);
            kept.extend(args.by_ref());
            break;
        }

        if let Some(long) = text.strip_prefix("--") {
            let (name, inline_value) = match long.split_once('=') {
                Some((name, _)) => (name, true),
                None => (long, false),
            };
            let flag = format!("--{name}");

            if KNOWN_LONG.contains(&flag.as_str()) {
                let takes_value = flag == "--template" && !inline_value;
                kept.push(arg);
                if takes_value {
                    kept.extend(args.next());
                }
            } else {
                ignored.push(text.to_string());
                if !inline_value {
                    // `--registry https://r` takes its value along with it.
                    if let Some(value) = args.next_if(|next| !starts_with_dash(next)) {
                        ignored.push(value.to_string_lossy().into_owned());
                    }
                }
            }
        } else if text.len() > 1 && text.starts_with('-') {
            let mut chars = text.chars().skip(1);
            let first = chars.next().unwrap_or_default();

            if KNOWN_SHORT.contains(&first) {
                let takes_value = first == 'T' && chars.next().is_none();
                kept.push(arg);
                if takes_value {
                    kept.extend(args.next());
                }
            } else {
                ignored.push(text.to_string());
            }
        } else {
            kept.push(arg);
        }
    }

    (kept, ignored)
}

fn starts_with_dash(arg: &OsString) -> bool {
    arg.to_str().is_some_and(|text| text.starts_with('-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_option() {
        let args = Args::parse_lenient_from([
            "tplnew",
            "my-app",
            "--verbose",
            "--info",
            "--update",
            "--debug",
            "-T",
            "https://example.com/tpl.git",
        ]);

        assert_eq!(args.project_directory.as_deref(), Some("my-app"));
        assert!(args.verbose && args.info && args.update && args.debug);
        assert_eq!(args.template.as_deref(), Some("https://example.com/tpl.git"));
        assert!(args.ignored.is_empty());
    }

    #[test]
    fn template_accepts_inline_value() {
        let args = Args::parse_lenient_from(["tplnew", "--template=../tpl", "app"]);
        assert_eq!(args.template.as_deref(), Some("../tpl"));
        assert_eq!(args.project_directory.as_deref(), Some("app"));
    }

    #[test]
    fn unknown_options_are_dropped() {
        let args = Args::parse_lenient_from([
            "tplnew",
            "app",
            "--use-pnpm",
            "-x",
            "--scripts-version=1.0.0",
        ]);

        assert_eq!(args.project_directory.as_deref(), Some("app"));
        assert_eq!(
            args.ignored,
            vec!["--use-pnpm", "-x", "--scripts-version=1.0.0"]
        );
    }

    #[test]
    fn unknown_option_takes_its_value() {
        let args = Args::parse_lenient_from(["tplnew", "--registry", "https://r", "my-app"]);
        assert_eq!(args.project_directory.as_deref(), Some("my-app"));
        assert_eq!(args.ignored, vec!["--registry", "https://r"]);

        let args =
            Args::parse_lenient_from(["tplnew", "--update", "--registry", "https://r.example"]);
        assert!(args.update);
        assert_eq!(args.project_directory, None);
        assert_eq!(args.ignored, vec!["--registry", "https://r.example"]);
    }

    #[test]
    fn unknown_option_before_known_flag_takes_nothing() {
        let args = Args::parse_lenient_from(["tplnew", "--use-pnpm", "--debug", "app"]);
        assert!(args.debug);
        assert_eq!(args.project_directory.as_deref(), Some("app"));
        assert_eq!(args.ignored, vec!["--use-pnpm"]);
    }

    #[test]
    fn project_directory_is_optional() {
        let args = Args::parse_lenient_from(["tplnew", "--update"]);
        assert!(args.update);
        assert_eq!(args.project_directory, None);
    }

    #[test]
    fn arguments_after_separator_are_kept() {
        let args = Args::parse_lenient_from(["tplnew", "--", "-odd-name"]);
        assert_eq!(args.project_directory.as_deref(), Some("-odd-name"));
    }
}
