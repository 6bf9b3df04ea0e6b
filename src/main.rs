use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use imgscan::{
    config::Config,
    model::{RegistryAuth, ScanReport, Severity},
    output::{format_result_to_string, print_result, OutputFormat},
    scanner::{TrivyWrapper, Wrapper},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const CRITICAL_VULN: u8 = 2;
    pub const HIGH_VULN: u8 = 3;
    pub const MEDIUM_VULN: u8 = 4;
    pub const LOW_VULN: u8 = 5;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "imgscan")]
#[command(
    author,
    version,
    about = "Scan container images for vulnerabilities with trivy"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a container image reference
    Scan {
        /// Image reference, e.g. registry.local/library/alpine:3.10
        image: String,

        /// Registry username
        #[arg(short, long, default_value = "")]
        username: String,

        /// Registry password
        #[arg(short, long, default_value = "")]
        password: String,

        /// Registry is reachable over plain HTTP only
        #[arg(long)]
        insecure_registry: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write JSON report to file
        #[arg(short, long)]
        output: Option<String>,

        /// Exit with error if vulnerabilities at or above this severity are found
        #[arg(long, value_enum)]
        fail_on: Option<FailLevel>,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum FailLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl FailLevel {
    fn threshold(self) -> Severity {
        match self {
            FailLevel::Critical => Severity::Critical,
            FailLevel::High => Severity::High,
            FailLevel::Medium => Severity::Medium,
            FailLevel::Low => Severity::Low,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Scan {
            image,
            username,
            password,
            insecure_registry,
            format,
            output,
            fail_on,
        } => {
            let auth = RegistryAuth::new(username, password);
            run_scan(&image, &auth, insecure_registry, &format, output, fail_on)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn run_scan(
    image: &str,
    auth: &RegistryAuth,
    insecure_registry: bool,
    format: &str,
    output_file: Option<String>,
    fail_on: Option<FailLevel>,
) -> Result<u8> {
    let format = OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table;

    let config = Config::load()?;
    config.ensure_dirs()?;
    let wrapper = TrivyWrapper::new(config);

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Scanning {}...", image));
        Some(pb)
    } else {
        None
    };

    let result = wrapper.run(image, auth, insecure_registry);

    if let Some(pb) = progress {
        match &result {
            Ok(report) => pb.finish_with_message(format!(
                "Found {} vulnerabilities",
                report.vulnerabilities.len()
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    let report = result?;

    if let Some(path) = output_file {
        std::fs::write(&path, format_result_to_string(&report)?)?;
        if is_interactive {
            println!("Results written to: {}", path);
        }
    } else {
        print_result(&report, format)?;
    }

    Ok(determine_exit_code(&report, fail_on))
}

/// Determine the exit code based on vulnerabilities found and --fail-on setting
fn determine_exit_code(report: &ScanReport, fail_on: Option<FailLevel>) -> u8 {
    let Some(fail_on) = fail_on else {
        return exit_codes::SUCCESS;
    };

    match report.summary().highest() {
        Some(highest) if highest >= fail_on.threshold() => match highest {
            Severity::Critical => exit_codes::CRITICAL_VULN,
            Severity::High => exit_codes::HIGH_VULN,
            Severity::Medium => exit_codes::MEDIUM_VULN,
            Severity::Low => exit_codes::LOW_VULN,
            Severity::Unknown => exit_codes::SUCCESS,
        },
        _ => exit_codes::SUCCESS,
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'imgscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
