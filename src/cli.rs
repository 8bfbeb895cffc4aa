use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

pub fn init_logging(verbosity: i32) -> Result<(), log::SetLoggerError> {
    TermLogger::init(
        select_log_level_filter(verbosity),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
}

fn select_log_level_filter(verbosity: i32) -> LevelFilter {
    match verbosity {
        i32::MIN..=0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
