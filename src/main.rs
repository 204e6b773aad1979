use std::process::ExitCode;

fn main() -> ExitCode {
    // Warnings by default; `RUST_LOG=info` (or `debug`) shows pipeline and solver detail.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match ev_forecast::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
