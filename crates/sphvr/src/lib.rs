pub mod driver;
pub mod framework;
pub mod interrupt;
pub mod orientation;
pub mod pipeline;
pub mod settings;
pub mod sink;
pub mod valgrind;
pub mod window;

/// Install the shared `env_logger` setup used by every binary.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

/// Serializes tests that dispatch the global default GLib main context, which
/// only one thread may own at a time.
#[cfg(test)]
pub(crate) fn lock_main_context() -> std::sync::MutexGuard<'static, ()> {
    static MAIN_CONTEXT: std::sync::Mutex<()> = std::sync::Mutex::new(());
    MAIN_CONTEXT.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
