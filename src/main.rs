use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::{debug, warn};

use trailsift_logs::{
    CompileError, Predicate, apply_filters, compile_and_print, compile_logs, load_file,
};
use trailsift_types::to_indented_string;

mod cli;
mod config;
mod remediation;

use cli::Args;
use config::Config;

fn main() -> ExitCode {
    // Bare invocation prints usage and does nothing else
    if std::env::args_os().len() <= 1 {
        let _ = Args::command().print_help();
        return ExitCode::SUCCESS;
    }

    let args = Args::parse();

    let config = match config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(args.log_level.as_deref().unwrap_or(&config.logging.level));

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = run(&args, &config, &mut out);

    // Handle any errors
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(text) = e
                .downcast_ref::<CompileError>()
                .and_then(remediation::guidance)
            {
                eprint!("{text}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries nothing but JSON
fn init_tracing(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

/// Load the requested input, apply every filter and write the result to `out`
fn run<W: Write>(args: &Args, config: &Config, out: &mut W) -> Result<()> {
    let predicates = args.predicates()?;
    let indent = config.output.indent;

    if args.dump {
        return dump(args, &predicates, indent, out);
    }

    let collection = if let Some(dir) = &args.dir {
        compile_logs(dir, args.successful_api || config.compile.successful_only)?
    } else if let Some(file) = &args.file {
        if args.successful_api {
            warn!("--successful_api only applies to --dir and is ignored");
        }
        load_file(file)?
    } else {
        debug!("neither --dir nor --file given, nothing to do");
        return Ok(());
    };

    let filtered = apply_filters(collection, &predicates);
    writeln!(out, "{}", filtered.to_pretty_string(indent)?)?;
    out.flush()?;
    Ok(())
}

/// Streaming mode: print each record matching `--search` as soon as it is read
fn dump<W: Write>(args: &Args, predicates: &[Predicate], indent: usize, out: &mut W) -> Result<()> {
    let Some(dir) = &args.dir else {
        anyhow::bail!("--dump requires --dir");
    };
    if predicates
        .iter()
        .any(|p| matches!(p, Predicate::Field { .. }))
    {
        warn!("field filters are ignored with --dump, only --search applies");
    }
    if args.successful_api {
        warn!("--successful_api is ignored with --dump");
    }

    let search = args.search.as_deref().unwrap_or("");
    let emitted = compile_and_print(dir, search, |record| {
        let text = to_indented_string(record, indent)?;
        writeln!(out, "{text}")
    })?;
    out.flush()?;

    debug!(emitted, "dump finished");
    Ok(())
}
