//! Small logging bootstrap shared by the task graph sample harness and tests.

use log::LevelFilter;

lazy_static::lazy_static! {
    static ref INIT_GUARD: std::sync::Once = std::sync::Once::new();
}

/// Initialize colored, timestamped logging to stdout.
///
/// Safe to call more than once; only the first call takes effect.
pub fn init_logger(level: LevelFilter) -> anyhow::Result<()> {
    let mut result = Ok(());

    INIT_GUARD.call_once(|| {
        result = build_dispatch(level).apply().map_err(anyhow::Error::from);
    });

    result
}

fn build_dispatch(level: LevelFilter) -> fern::Dispatch {
    let colors = fern::colors::ColoredLevelConfig::new()
        .error(fern::colors::Color::Red)
        .warn(fern::colors::Color::Yellow)
        .info(fern::colors::Color::Green)
        .debug(fern::colors::Color::Blue)
        .trace(fern::colors::Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
}
