//! certissue CLI.
//!
//! Loads the CA named in the configuration file once, then issues, verifies and writes a
//! certificate for every configured user.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use certissue::config::Config;
use certissue::directory::{Directory, StaticDirectory, plan_subjects};
use certissue::loader::load_ca;
use certissue::pipeline::Pipeline;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "certissue")]
#[command(about = "Issue X.509 client certificates for directory users", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Enable debug logging (overrides the `debug` setting)
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is not up yet; report configuration problems on stderr.
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}: {e}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    init_tracing(cli.debug || config.debug);

    match run(&config) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            tracing::error!(failed, "Some certificates could not be issued");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Aborting");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over both the flag and the configuration file.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Returns the number of users whose certificate could not be issued.
fn run(config: &Config) -> Result<usize, Box<dyn std::error::Error>> {
    config.prepare_output_dir()?;

    let ca = load_ca(
        &config.ca_cert_path,
        &config.ca_key_path,
        config.ca_key_passphrase.expose(),
    )?;
    tracing::info!(
        ca = ?ca.certificate.subject().common_name,
        key = ca.private_key.algorithm_name(),
        bits = ca.private_key.bits(),
        "Loaded CA"
    );

    let directory = StaticDirectory::new(config.users.clone());
    let users = directory.users()?;
    if users.is_empty() {
        tracing::warn!("No users configured, nothing to issue");
    }

    let pipeline = Pipeline::new(&ca, tracing::info_span!("issue"))
        .with_options(config.issue_options())
        .with_key_encoding(config.issued_key_encoding);

    let planned = plan_subjects(
        &users,
        config.cert_key_size,
        config.cert_validity_days,
        &config.output_dir,
    );
    let mut failed = 0;
    for (user, subject) in users.iter().zip(planned) {
        if let Err(e) = subject.and_then(|subject| pipeline.run(&subject)) {
            tracing::error!(dn = %user.dn, error = %e, "Failed to issue certificate");
            failed += 1;
        }
    }

    tracing::info!(
        issued = users.len() - failed,
        failed,
        "Finished issuing certificates"
    );
    Ok(failed)
}
