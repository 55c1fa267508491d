mod args;
mod config;
mod env;
mod executor;
mod info;
mod validate;
mod version;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::{Cli, Command};
use rpc_protocol::{Result, ResultCode};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(is_verbose(&cli.command));

    let (code, output) = dispatch(cli.command).await;
    if !output.is_empty() {
        println!("{output}");
    }
    std::process::exit(code.exit_code());
}

fn is_verbose(command: &Command) -> bool {
    match command {
        Command::Activate(a) => a.common.verbose,
        Command::Deactivate(d) => d.common.verbose,
        Command::Configure(c) => c.common.verbose,
        Command::AmtInfo(c) | Command::Maintenance(c) => c.verbose,
        Command::Version => false,
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "rpc=debug" } else { "rpc=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();
}

async fn dispatch(command: Command) -> (ResultCode, String) {
    match command {
        Command::Activate(args) => match validate::activate(&args) {
            Ok(params) => outcome(executor::run_activate(params).await, ""),
            Err(e) => (e.code, e.message),
        },
        Command::Deactivate(args) => match validate::deactivate(&args) {
            Ok(params) => outcome(executor::run_deactivate(params).await, ""),
            Err(e) => (e.code, e.message),
        },
        Command::Configure(args) => match validate::configure(&args) {
            Ok(params) => outcome(executor::run_configure(params).await, ""),
            Err(e) => (e.code, e.message),
        },
        Command::AmtInfo(_) => match info::run() {
            Ok(i) => (ResultCode::Success, i.render_text()),
            Err(e) => (e.code(), e.to_string()),
        },
        Command::Version => (ResultCode::Success, version::render_text()),
        Command::Maintenance(args) => match validate::maintenance(&args) {
            Ok(params) => outcome(executor::run_maintenance(params).await, ""),
            Err(e) => (e.code, e.message),
        },
    }
}

fn outcome(result: Result<()>, success_message: &str) -> (ResultCode, String) {
    match result {
        Ok(()) => (ResultCode::Success, success_message.to_string()),
        Err(e) => (e.code(), e.to_string()),
    }
}
