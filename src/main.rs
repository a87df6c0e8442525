//! Entry point for the `drive-i18n` command line.

use clap::Parser;
use drive_i18n::cli::{
    self,
    Cli,
};

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();
    let guard = cli::init_tracing(cli.log_dir.as_deref());

    let result = cli::run(cli, &mut std::io::stdout().lock()).await;

    // exit() skips destructors; flush file logs first
    drop(guard);
    if let Err(error) = result {
        eprintln!("{error}");
        std::process::exit(error.exit_code());
    }
}
