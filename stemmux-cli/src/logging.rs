use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Install the stderr logger. The level comes from `RUST_LOG` (default
/// `info`); `quiet` keeps only errors.
pub fn init(quiet: bool) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.target(Target::Stderr).format_timestamp(None);
    if quiet {
        builder.filter_level(LevelFilter::Error);
    }
    if builder.try_init().is_err() {
        log::warn!("a logger is already installed");
    }
}
