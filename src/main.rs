use anyhow::Context;
use clap::{Parser, ValueEnum};
use colored::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tagsplice_lib::config::Config;
use tagsplice_lib::exit_codes;
use tagsplice_lib::utils::LineIndex;
use tagsplice_lib::{Dialect, SpliceError, SplicedDocument, Splicer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One line per template plus a summary
    Text,
    /// The spliced documents as a JSON array
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files to splice
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Configuration file path; disables discovery of .tagsplice.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host dialect (js or ts), overriding the config file and file extensions
    #[arg(long)]
    dialect: Option<Dialect>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Show detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Result of processing one file
enum Outcome {
    Spliced { source: String, document: SplicedDocument },
    Failed { path: PathBuf, source: String, error: SpliceError },
    ToolError { path: PathBuf, error: anyhow::Error },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let explicit_config = match cli.config.as_deref().map(Config::load).transpose() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(exit_codes::TOOL_ERROR);
        }
    };

    let start = Instant::now();
    let outcomes = process_files(&cli.files, explicit_config.as_ref(), cli.dialect);
    let duration_ms = start.elapsed().as_millis();

    let printed = match cli.output {
        OutputFormat::Text => {
            print_text(&outcomes, cli.quiet, duration_ms);
            true
        }
        OutputFormat::Json => print_json(&outcomes),
    };

    let code = if printed { exit_code(&outcomes) } else { exit_codes::TOOL_ERROR };
    std::process::exit(code);
}

impl Outcome {
    fn exit_code(&self) -> i32 {
        match self {
            Outcome::Spliced { .. } => exit_codes::SUCCESS,
            Outcome::Failed { .. } => exit_codes::SPLICE_FAILED,
            Outcome::ToolError { .. } => exit_codes::TOOL_ERROR,
        }
    }
}

/// The most severe outcome decides; tool errors outrank splice failures
fn exit_code(outcomes: &[Outcome]) -> i32 {
    outcomes
        .iter()
        .map(Outcome::exit_code)
        .max()
        .unwrap_or(exit_codes::SUCCESS)
}

#[cfg(feature = "parallel")]
fn process_files(files: &[PathBuf], explicit_config: Option<&Config>, dialect: Option<Dialect>) -> Vec<Outcome> {
    use rayon::prelude::*;

    files
        .par_iter()
        .map(|path| process_file(path, explicit_config, dialect))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn process_files(files: &[PathBuf], explicit_config: Option<&Config>, dialect: Option<Dialect>) -> Vec<Outcome> {
    files
        .iter()
        .map(|path| process_file(path, explicit_config, dialect))
        .collect()
}

fn process_file(path: &Path, explicit_config: Option<&Config>, dialect: Option<Dialect>) -> Outcome {
    let (source, config) = match load_file(path, explicit_config, dialect) {
        Ok(loaded) => loaded,
        Err(error) => {
            return Outcome::ToolError {
                path: path.to_path_buf(),
                error,
            };
        }
    };

    let file = path.display().to_string();
    match Splicer::new(config).splice(&source, &file) {
        Ok(document) => Outcome::Spliced { source, document },
        Err(error) => Outcome::Failed {
            path: path.to_path_buf(),
            source,
            error,
        },
    }
}

fn load_file(path: &Path, explicit_config: Option<&Config>, dialect: Option<Dialect>) -> anyhow::Result<(String, Config)> {
    let source = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut config = match explicit_config {
        Some(config) => config.clone(),
        None => discover_config(path)?,
    };
    if dialect.is_some() {
        config.dialect = dialect;
    }
    Ok((source, config))
}

fn discover_config(path: &Path) -> anyhow::Result<Config> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());

    Ok(Config::discover(&dir)?.map(|(_, config)| config).unwrap_or_default())
}

fn print_text(outcomes: &[Outcome], quiet: bool, duration_ms: u128) {
    let mut total_templates = 0;
    let mut failed_files = 0;

    for outcome in outcomes {
        match outcome {
            Outcome::Spliced { source, document } => {
                total_templates += document.templates;
                if quiet {
                    continue;
                }
                let index = LineIndex::new(source);
                for node in document.template_nodes() {
                    let template = &node.marker.template;
                    let location = index.location(template.range.start);
                    println!(
                        "{}:{}:{} {}{}",
                        document.file.blue().underline(),
                        location.line.to_string().cyan(),
                        location.column.to_string().cyan(),
                        template.kind.as_str(),
                        if node.marker.is_default { " [default]".green() } else { "".normal() }
                    );
                }
            }
            Outcome::Failed { path, source, error } => {
                failed_files += 1;
                print_splice_error(path, source, error);
            }
            Outcome::ToolError { error, .. } => {
                failed_files += 1;
                eprintln!("{}: {:#}", "Error".red().bold(), error);
            }
        }
    }

    if quiet {
        return;
    }

    let total_files = outcomes.len();
    let file_text = if total_files == 1 { "file" } else { "files" };
    if failed_files == 0 {
        println!(
            "\n{} Spliced {} template(s) in {} {} ({}ms)",
            "Success:".green().bold(),
            total_templates,
            total_files,
            file_text,
            duration_ms
        );
    } else {
        println!(
            "\n{} {}/{} {} could not be spliced ({}ms)",
            "Issues:".yellow().bold(),
            failed_files,
            total_files,
            file_text,
            duration_ms
        );
    }
}

fn print_splice_error(path: &Path, source: &str, error: &SpliceError) {
    // Scan and syntax errors already name the file and position
    if error.location().is_some() {
        eprintln!("{}: {}", "Error".red().bold(), error);
        return;
    }

    eprintln!("{}: {}: {}", "Error".red().bold(), path.display(), error);
    if let SpliceError::Reconciliation { ranges, .. } = error {
        let index = LineIndex::new(source);
        for range in ranges {
            let location = index.location(range.start);
            eprintln!("  unmatched template at {}:{}", path.display(), location);
        }
    }
}

/// Returns false when the output could not be serialized
fn print_json(outcomes: &[Outcome]) -> bool {
    let entries: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|outcome| match outcome {
            Outcome::Spliced { document, .. } => json!({
                "status": "spliced",
                "document": document,
            }),
            Outcome::Failed { path, error, .. } => json!({
                "status": "failed",
                "file": path.display().to_string(),
                "error": error.to_string(),
                "location": error.location(),
            }),
            Outcome::ToolError { path, error } => json!({
                "status": "tool-error",
                "file": path.display().to_string(),
                "error": format!("{error:#}"),
            }),
        })
        .collect();

    match serde_json::to_string_pretty(&entries) {
        Ok(text) => {
            println!("{text}");
            true
        }
        Err(e) => {
            eprintln!("{}: Failed to serialize output: {}", "Error".red().bold(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spliced() -> Outcome {
        let source = "<template>Hi</template>\n".to_string();
        let document = tagsplice_lib::splice(&source, "a.gts").unwrap();
        Outcome::Spliced { source, document }
    }

    fn failed() -> Outcome {
        Outcome::Failed {
            path: PathBuf::from("b.gts"),
            source: String::new(),
            error: SpliceError::InvariantViolation("lost".to_string()),
        }
    }

    fn tool_error() -> Outcome {
        Outcome::ToolError {
            path: PathBuf::from("c.gts"),
            error: anyhow::anyhow!("Failed to read c.gts"),
        }
    }

    #[test]
    fn test_exit_code_follows_most_severe_outcome() {
        assert_eq!(exit_code(&[]), exit_codes::SUCCESS);
        assert_eq!(exit_code(&[spliced()]), exit_codes::SUCCESS);
        assert_eq!(exit_code(&[spliced(), failed()]), exit_codes::SPLICE_FAILED);
        assert_eq!(exit_code(&[tool_error(), failed(), spliced()]), exit_codes::TOOL_ERROR);
    }
}
