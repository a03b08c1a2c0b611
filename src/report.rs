//! Terminal output for run and configuration summaries.

use std::path::{Path, PathBuf};

use colored::*;

use crate::config::Configuration;
use crate::runner::ParseFault;

/// What a `run` did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Files discovered under the source root.
    pub discovered: usize,
    /// Files handed to the runner.
    pub selected: usize,
    pub rewritten: Vec<PathBuf>,
    pub faults: Vec<ParseFault>,
}

impl RunSummary {
    pub fn passed(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Print a run summary to stdout.
pub fn write_summary(root: &Path, summary: &RunSummary) {
    print!("{}", "javannotate".cyan().bold());
    println!("  {}{}", "Source root: ".dimmed(), root.display());
    println!();

    println!(
        "  {} of {} file(s) processed, {} rewritten",
        summary.selected,
        summary.discovered,
        summary.rewritten.len()
    );
    for file in &summary.rewritten {
        println!("    {} {}", "✓".green(), relative(root, file).display());
    }

    if !summary.faults.is_empty() {
        println!();
        println!("  {} ({}):", "Parse faults".bold(), summary.faults.len());
        for fault in &summary.faults {
            println!(
                "    {} {} -> {}",
                "ERROR".red(),
                relative(root, &fault.file).display(),
                fault.message
            );
        }
    }

    println!();
    if summary.passed() {
        println!("  {}", "✓ DONE".green());
    } else {
        println!("  {}", "✗ FAILED".red());
    }
}

/// Print the outline of a validated configuration.
pub fn write_config_summary(path: &Path, config: &Configuration) {
    print!("{}", "javannotate".cyan().bold());
    println!("  {}{}", "Configuration: ".dimmed(), path.display());
    println!();

    let (fields, methods) = config.member_counts();
    println!("  {:<12} {}", "Encoding".bold(), config.encoding());
    println!("  {:<12} {}", "Classes".bold(), config.len());
    println!("  {:<12} {}", "Fields".bold(), fields);
    println!("  {:<12} {}", "Methods".bold(), methods);

    if !config.is_empty() {
        println!();
        for class in config.class_names() {
            println!("    {}", class);
        }
    }

    println!();
    println!("  {}", "✓ VALID".green());
}

fn relative<'a>(root: &Path, file: &'a Path) -> &'a Path {
    file.strip_prefix(root).unwrap_or(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_without_faults() {
        let mut summary = RunSummary::default();
        assert!(summary.passed());
        summary.faults.push(ParseFault {
            file: PathBuf::from("A.java"),
            message: "syntax error".to_string(),
        });
        assert!(!summary.passed());
    }

    #[test]
    fn test_relative_paths() {
        let root = Path::new("/src");
        assert_eq!(relative(root, Path::new("/src/p/A.java")), Path::new("p/A.java"));
        assert_eq!(relative(root, Path::new("/other/B.java")), Path::new("/other/B.java"));
    }
}
