use clap::Parser;
use loganseek::{
    cli::{init_verbose, Args},
    commands::run,
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let args = Args::parse();
    init_verbose(&args);
    log::info!(
        "Running {}-{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    run::run(args)?;
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
