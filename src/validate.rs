//! npm package name rules, as enforced by `validate-npm-package-name`,
//! plus the names this tool refuses because the template depends on them.

use regex::Regex;
use std::sync::OnceLock;

/// Names that collide with the template's own dependencies. Sorted.
pub const RESERVED_NAMES: [&str; 3] = ["react", "react-dom", "react-scripts"];

const BLACKLIST: [&str; 2] = ["node_modules", "favicon.ico"];

const MAX_LENGTH: usize = 214;

/// Node core modules. A package named after one cannot be `require`d.
const BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

static SCOPED: OnceLock<Regex> = OnceLock::new();

fn scoped_pattern() -> &'static Regex {
    SCOPED.get_or_init(|| Regex::new(r"^(?:@([^/]+?)/)?([^/]+?)$").expect("valid regex"))
}

/// Outcome of checking a name against the npm naming rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl NameReport {
    /// Usable for a new package: no errors and no warnings.
    #[must_use]
    pub fn valid_for_new_packages(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Every error followed by every warning.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .map(String::as_str)
    }
}

/// Characters `encodeURIComponent` leaves untouched.
fn is_url_safe(s: &str) -> bool {
    s.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '!' | '~' | '*' | '\'' | '(' | ')')
    })
}

#[must_use]
pub fn check_package_name(name: &str) -> NameReport {
    let mut report = NameReport::default();
    let lower = name.to_lowercase();

    if name.is_empty() {
        report
            .errors
            .push("name length must be greater than zero".to_string());
    }

    if name.starts_with('.') {
        report
            .errors
            .push("name cannot start with a period".to_string());
    }

    if name.starts_with('_') {
        report
            .errors
            .push("name cannot start with an underscore".to_string());
    }

    if name.trim() != name {
        report
            .errors
            .push("name cannot contain leading or trailing spaces".to_string());
    }

    for blacklisted in BLACKLIST {
        if lower == blacklisted {
            report
                .errors
                .push(format!("{blacklisted} is a blacklisted name"));
        }
    }

    for builtin in BUILTINS {
        if lower == *builtin {
            report
                .warnings
                .push(format!("{builtin} is a core module name"));
        }
    }

    if name.chars().count() > MAX_LENGTH {
        report.warnings.push(format!(
            "name can no longer contain more than {MAX_LENGTH} characters"
        ));
    }

    if lower != name {
        report
            .warnings
            .push("name can no longer contain capital letters".to_string());
    }

    let last_segment = name.rsplit('/').next().unwrap_or(name);
    if last_segment.contains(['~', '\'', '!', '(', ')', '*']) {
        report.warnings.push(
            "name can no longer contain special characters (\"~'!()*\")".to_string(),
        );
    }

    if !is_url_safe(name) {
        let scoped_ok = scoped_pattern().captures(name).is_some_and(|caps| {
            match (caps.get(1), caps.get(2)) {
                (Some(user), Some(pkg)) => is_url_safe(user.as_str()) && is_url_safe(pkg.as_str()),
                _ => false,
            }
        });

        if !scoped_ok {
            report
                .errors
                .push("name can only contain URL-friendly characters".to_string());
        }
    }

    report
}

/// Whether `name` collides with one of [`RESERVED_NAMES`].
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}
