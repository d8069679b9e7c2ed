//! # Stemmux
//!
//! A command-line front end for assembling separated stems into multichannel
//! audio and exporting gain mixes.

use log::error;

mod cli;
mod logging;
mod runner;

fn main() {
    dotenv::dotenv().ok();
    let args = cli::args::build_cli().get_matches();
    let quiet = args.get_flag("quiet")
        || args
            .subcommand()
            .map(|(_, sub)| sub.get_flag("quiet"))
            .unwrap_or(false);
    logging::init(quiet);

    let code = match runner::run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}
