mod application;
mod handlers;
mod state;


use std::process::ExitCode;

#[actix_web::main]
async fn main() -> ExitCode {
    match application::run().await {
        Ok(()) => ExitCode::SUCCESS,
        // Tracing may not be installed yet, so report straight to stderr.
        Err(err) => {
            eprintln!("[buffer-calc] failed to start: {err}");
            ExitCode::FAILURE
        }
    }
}
