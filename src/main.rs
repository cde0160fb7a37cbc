use barflow::cli::{Cli, run};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging disabled: {e}");
    }
    run(cli)
}
