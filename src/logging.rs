//! Process-wide logging and graceful-shutdown wiring. The only global state
//! in the crate: initialized once from `bin/solve.rs`, never read from inside
//! `cave` or `heuristic`.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// combined term + timestamped file logger, the way the teacher's top-level
/// `init()` wires `simplelog::CombinedLogger`.
pub fn init() {
    let _ = std::fs::create_dir_all("logs");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();
    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )];
    if let Ok(file) = std::fs::File::create(format!("logs/{time}.log")) {
        loggers.push(simplelog::WriteLogger::new(log::LevelFilter::Debug, config, file));
    }
    if simplelog::CombinedLogger::init(loggers).is_err() {
        // a logger is already installed (e.g. a second `init()` call in tests); ignore.
    }
}

/// registers a `ctrlc` handler that flips `flag` once and lets the driver's
/// next budget check observe it; a second SIGINT kills the process outright,
/// matching the teacher's "forcing exit" escalation in its own signal spawn.
pub fn install_shutdown_handler(flag: Arc<AtomicBool>) {
    let armed = Arc::new(AtomicBool::new(false));
    let result = ctrlc::set_handler(move || {
        if armed.swap(true, Ordering::SeqCst) {
            log::warn!("second interrupt received, forcing exit");
            std::process::exit(130);
        }
        log::info!("interrupt received, flushing best known path");
        flag.store(true, Ordering::SeqCst);
    });
    if let Err(err) = result {
        log::warn!("failed to install signal handler: {err}");
    }
}
