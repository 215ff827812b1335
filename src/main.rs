//! moodle2edx - Moodle backup to edX course converter

use std::process::ExitCode;

use clap::Parser;

use moodle2edx::convert::{DEFAULT_ORG, DEFAULT_SEMESTER};
use moodle2edx::{ConversionReport, ConvertConfig, convert_backup};

#[derive(Parser)]
#[command(name = "moodle2edx")]
#[command(version, about = "Convert a Moodle course backup into an edX XML course", long_about = None)]
#[command(after_help = "EXAMPLES:
    moodle2edx backup.mbz course/           Convert an archive
    moodle2edx backup_dir/ -o MITx          Convert into the current directory
    moodle2edx backup.mbz out/ --json       Print the report as JSON")]
struct Cli {
    /// Moodle backup (.mbz archive or unpacked directory)
    #[arg(value_name = "INPUT")]
    input: String,

    /// Directory to write the edX course into
    #[arg(value_name = "OUTPUT", default_value = ".")]
    output: String,

    /// Organization tag for the course
    #[arg(short, long, default_value = DEFAULT_ORG)]
    org: String,

    /// Course run name
    #[arg(short, long, default_value = DEFAULT_SEMESTER)]
    semester: String,

    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log every copied file and written document
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = ConvertConfig::new()
        .with_org(&cli.org)
        .with_semester(&cli.semester);

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli, config: &ConvertConfig) -> Result<(), String> {
    let report = convert_backup(&cli.input, &cli.output, config).map_err(|e| e.to_string())?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &ConversionReport) {
    println!("Course: {} ({})", report.course_name, report.course_number);
    println!("Run: {}", report.run);
    println!("Chapters: {}", report.chapters);
    println!("HTML components: {}", report.html_documents);
    println!("Problems: {}", report.problem_documents);
    println!("Static files: {}", report.static_files);
    if !report.diagnostics.is_empty() {
        println!("Warnings: {}", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            println!("  {diagnostic}");
        }
    }
}
