use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let matches = envreg_cli::command().get_matches();

    // logs go to stderr; stdout carries only the status line
    let verbosity = matches.get_count("verbose");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(envreg_cli::log_level(verbosity)));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match envreg_cli::run(&matches) {
        Ok(report) => {
            if report.success {
                println!("{}", report.message);
            } else {
                eprintln!("{}", report.message);
            }
            ExitCode::from(report.exit_code())
        }
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}
