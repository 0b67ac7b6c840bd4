use owo_colors::{OwoColorize, Stream::Stderr, Style};
use std::fmt::{self, Display};

use crate::validate::{NameReport, RESERVED_NAMES};

const BIN: &str = env!("CARGO_PKG_NAME");

/// Reasons to stop before anything is written to disk. These are reported
/// to the user as-is instead of as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingProjectName,
    InvalidName { name: String, report: NameReport },
    ReservedName { name: String },
}

impl std::error::Error for Rejection {}

fn paint<T: Display>(text: T, style: Style) -> String {
    text.if_supports_color(Stderr, |s| s.style(style))
        .to_string()
}

impl Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let red = Style::new().red();
        let green = Style::new().green();
        let cyan = Style::new().cyan();

        match self {
            Rejection::MissingProjectName => {
                writeln!(f, "Please specify the project directory:")?;
                writeln!(
                    f,
                    "  {} {}",
                    paint(BIN, cyan),
                    paint("<project-directory>", green)
                )?;
                writeln!(f)?;
                writeln!(f, "For example:")?;
                writeln!(f, "  {} {}", paint(BIN, cyan), paint("my-app", green))?;
                writeln!(f)?;
                write!(
                    f,
                    "Run {} to see all options.",
                    paint(format!("{BIN} --help"), cyan)
                )
            }
            Rejection::InvalidName { name, report } => {
                write!(
                    f,
                    "Could not create a project called {} because of npm naming restrictions:",
                    paint(format!("\"{name}\""), red)
                )?;
                for message in report.messages() {
                    write!(f, "\n{}", paint(format!("  *  {message}"), red))?;
                }
                Ok(())
            }
            Rejection::ReservedName { name } => {
                writeln!(
                    f,
                    "{} {} {}",
                    paint("We cannot create a project called", red),
                    paint(name, green),
                    paint("because a dependency with the same name exists.", red)
                )?;
                writeln!(
                    f,
                    "{}",
                    paint(
                        "Due to the way npm works, the following names are not allowed:",
                        red
                    )
                )?;
                writeln!(f)?;
                for reserved in RESERVED_NAMES {
                    writeln!(f, "{}", paint(format!("  {reserved}"), cyan))?;
                }
                writeln!(f)?;
                write!(f, "{}", paint("Please choose a different project name.", red))
            }
        }
    }
}
