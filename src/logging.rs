//! Process-wide diagnostic logging. The engine itself never writes to stderr
//! directly; dial failures and shutdown transitions go through this logger
//! instead (see the dial-failure path in `worker_group` and the design notes
//! on propagation policy).

/// Initializes the global logger exactly once. Respects `RUST_LOG` if set;
/// otherwise defaults to `info` so dial failures are visible without any
/// environment configuration.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
