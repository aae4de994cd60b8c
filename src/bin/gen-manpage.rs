//! Man pages for avrprog
//!
//! Writes `avrprog.1` plus one `avrprog-<command>.1` page per subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::{Command, CommandFactory};
use std::fs;
use std::path::PathBuf;

#[path = "../cli.rs"]
mod cli;

/// Render the top-level page and a page for each subcommand
///
/// Returns `(file name, roff source)` pairs.
fn render_pages(cmd: &Command) -> std::io::Result<Vec<(String, Vec<u8>)>> {
    let mut pages = Vec::new();

    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut buffer)?;
    pages.push((format!("{}.1", cmd.get_name()), buffer));

    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "help") {
        let title = format!("{}-{}", cmd.get_name(), sub.get_name());
        let mut buffer = Vec::new();
        clap_mangen::Man::new(sub.clone())
            .title(title.clone())
            .render(&mut buffer)?;
        pages.push((format!("{}.1", title), buffer));
    }

    Ok(pages)
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));

    fs::create_dir_all(&output_dir)?;

    for (name, page) in render_pages(&cli::Cli::command())? {
        let path = output_dir.join(&name);
        fs::write(&path, page)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_page_per_command() {
        let pages = render_pages(&cli::Cli::command()).unwrap();
        let names: Vec<&str> = pages.iter().map(|(name, _)| name.as_str()).collect();

        assert_eq!(
            names,
            [
                "avrprog.1",
                "avrprog-probe.1",
                "avrprog-write.1",
                "avrprog-verify.1",
                "avrprog-erase.1",
                "avrprog-list-devices.1",
                "avrprog-list-programmers.1",
            ]
        );
    }

    #[test]
    fn test_write_page_documents_its_options() {
        let pages = render_pages(&cli::Cli::command()).unwrap();
        let (_, write) = pages
            .iter()
            .find(|(name, _)| name == "avrprog-write.1")
            .unwrap();
        let text = String::from_utf8_lossy(write);

        // roff escapes hyphens
        let text = text.replace("\\-", "-");
        assert!(text.contains("--start-address"));
        assert!(text.contains("--no-erase"));
    }
}
