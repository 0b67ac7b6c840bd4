//! `--info`: a read-only report of the machine the tool runs on. Every probe
//! is independent and a failing one shows up as `Not Found`.

use owo_colors::OwoColorize;
use regex::Regex;
use serde_json::Value;
use std::{
    fmt::{self, Display},
    path::Path,
    sync::OnceLock,
};

use crate::runner::{Runner, ToolCall};

pub const LOCAL_PACKAGES: [&str; 3] = ["react", "react-dom", "react-scripts"];
pub const GLOBAL_PACKAGES: [&str; 1] = ["create-react-app"];

const NOT_FOUND: &str = "Not Found";

static VERSION_RE: OnceLock<Regex> = OnceLock::new();

fn version_pattern() -> &'static Regex {
    VERSION_RE.get_or_init(|| {
        Regex::new(r"(\d+\.\d+(?:\.\d+)*(?:-[0-9A-Za-z.]+)?)").expect("valid regex")
    })
}

/// First version-looking token of `text`, e.g. `120.0.6099.109` out of
/// `Google Chrome 120.0.6099.109`.
#[must_use]
pub fn parse_version(text: &str) -> Option<String> {
    version_pattern()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub label: String,
    pub value: Option<String>,
}

impl Entry {
    fn new(label: impl Into<String>, value: Option<String>) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub sections: Vec<Section>,
}

impl Report {
    #[must_use]
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Value reported for `label` under `title`; `None` if it was not found.
    #[must_use]
    pub fn value(&self, title: &str, label: &str) -> Option<&str> {
        self.section(title)?
            .entries
            .iter()
            .find(|e| e.label == label)?
            .value
            .as_deref()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "  {}:", section.title)?;
            for entry in &section.entries {
                writeln!(
                    f,
                    "    {}: {}",
                    entry.label,
                    entry.value.as_deref().unwrap_or(NOT_FOUND)
                )?;
            }
        }
        Ok(())
    }
}

/// Prints the report with the same heading `--info` uses.
pub fn print(report: &Report) {
    println!(
        "\n{}\n",
        "Environment Info:".if_supports_color(owo_colors::Stream::Stdout, |s| s.bold())
    );
    println!("{report}");
}

/// Gathers the report. `project_dir` is where local packages are looked up.
#[must_use]
pub fn gather(runner: &dyn Runner, project_dir: &Path) -> Report {
    Report {
        sections: vec![
            system(runner),
            binaries(runner),
            browsers(runner),
            npm_packages(project_dir),
            npm_global_packages(runner),
        ],
    }
}

fn system(runner: &dyn Runner) -> Section {
    Section {
        title: "System",
        entries: vec![
            Entry::new("OS", Some(os_description(runner))),
            Entry::new("CPU", Some(cpu_description(runner))),
        ],
    }
}

fn os_description(runner: &dyn Runner) -> String {
    let os = std::env::consts::OS;

    let detail = match os {
        "linux" => {
            let kernel = runner.capture(&ToolCall::new("uname").arg("-r"));
            let distro = std::fs::read_to_string("/etc/os-release")
                .ok()
                .and_then(|release| pretty_name(&release));
            [kernel, distro]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ")
        }
        "macos" => runner
            .capture(&ToolCall::new("sw_vers").arg("-productVersion"))
            .unwrap_or_default(),
        "windows" => runner
            .capture(&ToolCall::new("cmd").args(["/C", "ver"]))
            .and_then(|v| parse_version(&v))
            .unwrap_or_default(),
        _ => String::new(),
    };

    let name = match os {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        other => other,
    };

    if detail.is_empty() {
        name.to_string()
    } else {
        format!("{name} {detail}")
    }
}

/// `PRETTY_NAME` out of an `os-release` file.
fn pretty_name(release: &str) -> Option<String> {
    release.lines().find_map(|line| {
        line.strip_prefix("PRETTY_NAME=")
            .map(|v| v.trim_matches('"').to_string())
    })
}

fn cpu_description(runner: &dyn Runner) -> String {
    let cores = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);

    let model = match std::env::consts::OS {
        "linux" => std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|info| cpu_model(&info)),
        "macos" => runner.capture(&ToolCall::new("sysctl").args(["-n", "machdep.cpu.brand_string"])),
        _ => None,
    };

    match model {
        Some(model) => format!("({cores}) {} {model}", std::env::consts::ARCH),
        None => format!("({cores}) {}", std::env::consts::ARCH),
    }
}

fn cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "model name").then(|| value.trim().to_string())
    })
}

/// `<version> - <path>` for a binary on `PATH`.
fn binary(runner: &dyn Runner, program: &str) -> Option<String> {
    let path = runner.locate(program)?;
    let version = runner
        .capture(&ToolCall::new(program).arg("--version"))
        .and_then(|out| parse_version(&out))?;

    Some(format!("{version} - {}", path.display()))
}

fn binaries(runner: &dyn Runner) -> Section {
    Section {
        title: "Binaries",
        entries: vec![
            Entry::new("Node", binary(runner, "node")),
            Entry::new("npm", binary(runner, "npm")),
            Entry::new("Yarn", binary(runner, "yarn")),
        ],
    }
}

/// Executables tried, in order, for each browser on the current platform.
fn browser_candidates(browser: &str) -> &'static [&'static str] {
    match (std::env::consts::OS, browser) {
        ("macos", "Chrome") => &["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"],
        ("macos", "Edge") => &["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"],
        ("macos", "Firefox") => &["/Applications/Firefox.app/Contents/MacOS/firefox"],
        ("windows", _) => &[],
        (_, "Chrome") => &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ],
        (_, "Edge") => &["microsoft-edge", "microsoft-edge-stable"],
        (_, "Firefox") => &["firefox"],
        _ => &[],
    }
}

fn browser_version(runner: &dyn Runner, browser: &str) -> Option<String> {
    match (std::env::consts::OS, browser) {
        ("macos", "Safari") => runner
            .capture(&ToolCall::new("defaults").args([
                "read",
                "/Applications/Safari.app/Contents/Info",
                "CFBundleShortVersionString",
            ]))
            .and_then(|v| parse_version(&v)),
        ("windows", "Internet Explorer") => runner
            .capture(&ToolCall::new("reg").args([
                "query",
                r"HKLM\Software\Microsoft\Internet Explorer",
                "/v",
                "svcVersion",
            ]))
            .and_then(|v| parse_version(&v)),
        _ => browser_candidates(browser).iter().find_map(|program| {
            runner
                .capture(&ToolCall::new(*program).arg("--version"))
                .and_then(|v| parse_version(&v))
        }),
    }
}

fn browsers(runner: &dyn Runner) -> Section {
    Section {
        title: "Browsers",
        entries: ["Chrome", "Edge", "Internet Explorer", "Firefox", "Safari"]
            .into_iter()
            .map(|browser| Entry::new(browser, browser_version(runner, browser)))
            .collect(),
    }
}

fn read_json(path: &Path) -> Option<Value> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

fn installed_version(node_modules: &Path, package: &str) -> Option<String> {
    read_json(&node_modules.join(package).join("package.json"))?
        .get("version")?
        .as_str()
        .map(str::to_string)
}

/// Range `package` is declared with in a `package.json`.
fn wanted_version(manifest: &Value, package: &str) -> Option<String> {
    ["dependencies", "devDependencies", "peerDependencies"]
        .iter()
        .find_map(|table| manifest.get(table)?.get(package)?.as_str())
        .map(str::to_string)
}

fn npm_packages(project_dir: &Path) -> Section {
    let manifest = read_json(&project_dir.join("package.json"));
    let node_modules = project_dir.join("node_modules");

    let entries = LOCAL_PACKAGES
        .into_iter()
        .map(|package| {
            let wanted = manifest
                .as_ref()
                .and_then(|m| wanted_version(m, package));
            let installed = installed_version(&node_modules, package);

            let value = match (wanted, installed) {
                (Some(wanted), Some(installed)) => Some(format!("{wanted} => {installed}")),
                (Some(only), None) | (None, Some(only)) => Some(only),
                (None, None) => None,
            };

            Entry::new(package, value)
        })
        .collect();

    Section {
        title: "npmPackages",
        entries,
    }
}

fn npm_global_packages(runner: &dyn Runner) -> Section {
    let global_root = runner
        .capture(&ToolCall::new("npm").args(["root", "-g"]))
        .map(|out| out.trim().to_string())
        .filter(|out| !out.is_empty());

    let entries = GLOBAL_PACKAGES
        .into_iter()
        .map(|package| {
            let version = global_root
                .as_deref()
                .and_then(|root| installed_version(Path::new(root), package));
            Entry::new(package, version)
        })
        .collect();

    Section {
        title: "npmGlobalPackages",
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, fs, path::PathBuf};

    /// Answers `capture` from a table keyed by the rendered command line.
    #[derive(Default)]
    struct Canned {
        outputs: HashMap<String, String>,
        paths: HashMap<String, PathBuf>,
    }

    impl Runner for Canned {
        fn run(&self, call: &ToolCall) -> anyhow::Result<()> {
            anyhow::bail!("unexpected run of `{call}`")
        }

        fn capture(&self, call: &ToolCall) -> Option<String> {
            self.outputs.get(&call.to_string()).cloned()
        }

        fn locate(&self, program: &str) -> Option<PathBuf> {
            self.paths.get(program).cloned()
        }
    }

    #[test]
    fn parses_common_version_outputs() {
        assert_eq!(parse_version("v18.17.1").as_deref(), Some("18.17.1"));
        assert_eq!(parse_version("1.22.19").as_deref(), Some("1.22.19"));
        assert_eq!(
            parse_version("Google Chrome 120.0.6099.109 ").as_deref(),
            Some("120.0.6099.109")
        );
        assert_eq!(parse_version("Mozilla Firefox 121.0").as_deref(), Some("121.0"));
        assert_eq!(parse_version("10.0.0-beta.1").as_deref(), Some("10.0.0-beta.1"));
        assert_eq!(parse_version("command not found"), None);
    }

    #[test]
    fn missing_tools_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let report = gather(&Canned::default(), dir.path());

        for label in ["Node", "npm", "Yarn"] {
            assert_eq!(report.value("Binaries", label), None);
        }
        for label in LOCAL_PACKAGES {
            assert_eq!(report.value("npmPackages", label), None);
        }
        assert_eq!(report.value("npmGlobalPackages", "create-react-app"), None);
        assert!(report.value("System", "OS").is_some());
        assert!(report.value("System", "CPU").is_some());

        let rendered = report.to_string();
        assert!(rendered.contains("    Yarn: Not Found"));
        assert!(rendered.contains("  Browsers:"));
    }

    #[test]
    fn binaries_report_version_and_path() {
        let mut runner = Canned::default();
        runner
            .outputs
            .insert("node --version".to_string(), "v20.10.0".to_string());
        runner
            .paths
            .insert("node".to_string(), PathBuf::from("/usr/bin/node"));
        runner.paths.insert("npm".to_string(), PathBuf::from("/usr/bin/npm"));

        let dir = tempfile::tempdir().unwrap();
        let report = gather(&runner, dir.path());

        assert_eq!(
            report.value("Binaries", "Node"),
            Some("20.10.0 - /usr/bin/node")
        );
        // On PATH but `--version` failed.
        assert_eq!(report.value("Binaries", "npm"), None);
    }

    #[test]
    fn local_and_global_packages() {
        let project = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();

        fs::write(
            project.path().join("package.json"),
            r#"{ "dependencies": { "react": "^18.2.0" }, "devDependencies": { "react-scripts": "5.0.1" } }"#,
        )
        .unwrap();
        fs::create_dir_all(project.path().join("node_modules/react")).unwrap();
        fs::write(
            project.path().join("node_modules/react/package.json"),
            r#"{ "name": "react", "version": "18.2.0" }"#,
        )
        .unwrap();
        fs::create_dir_all(global.path().join("create-react-app")).unwrap();
        fs::write(
            global.path().join("create-react-app/package.json"),
            r#"{ "version": "5.0.1" }"#,
        )
        .unwrap();

        let mut runner = Canned::default();
        runner.outputs.insert(
            "npm root -g".to_string(),
            global.path().display().to_string(),
        );

        let report = gather(&runner, project.path());

        assert_eq!(report.value("npmPackages", "react"), Some("^18.2.0 => 18.2.0"));
        assert_eq!(report.value("npmPackages", "react-dom"), None);
        assert_eq!(report.value("npmPackages", "react-scripts"), Some("5.0.1"));
        assert_eq!(
            report.value("npmGlobalPackages", "create-react-app"),
            Some("5.0.1")
        );
    }

    #[test]
    fn os_release_and_cpuinfo_parsing() {
        let release = "NAME=\"Ubuntu\"\nPRETTY_NAME=\"Ubuntu 22.04.3 LTS\"\nID=ubuntu\n";
        assert_eq!(pretty_name(release).as_deref(), Some("Ubuntu 22.04.3 LTS"));
        assert_eq!(pretty_name("ID=alpine"), None);

        let cpuinfo = "processor\t: 0\nmodel name\t: AMD Ryzen 7 5800X\nflags\t: fpu\n";
        assert_eq!(cpu_model(cpuinfo).as_deref(), Some("AMD Ryzen 7 5800X"));
    }
}
