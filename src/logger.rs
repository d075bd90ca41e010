use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Log to stdout with timestamps. `RUST_LOG` still overrides individual
/// targets on top of the level picked on the command line.
pub fn init(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .parse_env(Env::default())
        .format_timestamp_secs()
        .target(Target::Stdout);

    if let Err(error) = builder.try_init() {
        eprintln!("Unable to set up logging: {}", error);
    }
}
