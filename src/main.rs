use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use hashguard::cli::{Cli, Commands};
use hashguard::commands::check::{CheckOptions, CheckOutcome};
use hashguard::error::IntegrityError;
use hashguard::output::{self, Verbosity};
use hashguard::{HashguardContext, commands};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "HASHGUARD_LOG";

/// Changes were detected.
const EXIT_CHANGED: u8 = 1;

/// The command could not complete.
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            let category = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<IntegrityError>())
                .map(IntegrityError::category);
            match category {
                Some(category) => eprintln!("{} {e:#}", format!("{category}:").red().bold()),
                None => eprintln!("{} {e:#}", "Error:".red().bold()),
            }
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    if cli.quiet {
        output::set_verbosity(Verbosity::Quiet);
    } else if cli.verbose {
        output::set_verbosity(Verbosity::Verbose);
    }

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = HashguardContext::new(cli.config, cli.manifest)?;
    let cancel = ctx.cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        // A second Ctrl-C falls through to the default behaviour
        if cancel.is_cancelled() {
            std::process::exit(130);
        }
        cancel.cancel();
    }) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    match cli.command {
        Commands::Init {
            root,
            algorithm,
            force,
        } => commands::init::execute(&ctx, &root, algorithm, force)?,
        Commands::Check {
            root,
            algorithm,
            short,
            strict,
            update,
            yes,
        } => {
            let options = CheckOptions {
                algorithm,
                short,
                strict,
                update,
                yes,
            };
            if commands::check::execute(&ctx, &root, options)? == CheckOutcome::Changed {
                return Ok(ExitCode::from(EXIT_CHANGED));
            }
        }
        Commands::Update { root, algorithm } => commands::update::execute(&ctx, &root, algorithm)?,
        Commands::Show { long } => commands::show::execute(&ctx, long)?,
        Commands::Hash { files, algorithm } => commands::hash::execute(&ctx, &files, algorithm)?,
        Commands::Completion { .. } => unreachable!("handled before context creation"),
    }

    Ok(ExitCode::SUCCESS)
}

/// Installs the stderr log subscriber. `HASHGUARD_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "hashguard=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
