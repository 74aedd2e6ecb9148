use natrix_cli::cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
  let matches = cli::command();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli::verbosity_filter(&matches))))
    .with_writer(std::io::stderr)
    .init();

  match cli::run(&matches) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("natrix: {err}");
      ExitCode::from(err.exit_code())
    }
  }
}
