use std::process::ExitCode;

fn main() -> ExitCode {
    match hotel_prices::app::run_forecast() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
