mod cli;
mod compiler;
mod identity;
mod preflight;
mod submit;

use clap::Parser;
use std::process::exit;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum RunError {
    #[error(transparent)]
    Identity(#[from] identity::IdentityError),
    #[error(transparent)]
    Preflight(#[from] preflight::PreflightError),
    #[error(transparent)]
    Compile(#[from] compiler::CompileError),
    #[error(transparent)]
    Submit(#[from] submit::SubmitError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = cli::Cli::parse();
    if let Err(error) = run(&cli) {
        error!("{error}");
        exit(1);
    }
}

fn run(cli: &cli::Cli) -> Result<(), RunError> {
    let request = cli.to_request();

    // nothing is resolved or written while the input is in doubt
    preflight::check_input(&request)?;

    let identity = identity::current()?;
    let job = compiler::compile(&request, &identity)?;
    submit::write_script(&job.script)?;

    println!();
    println!("--- Script information ---");
    println!("Hostname: {}", identity.hostname);
    println!("Username: {}", identity.user);
    println!("Modules: {}", job.toolchain.modules());

    if cli.nosub {
        println!("{} created.", submit::SCRIPT_NAME);
    } else {
        submit::submit()?;
        println!("Job sent to {}", request.queue);
    }

    Ok(())
}
