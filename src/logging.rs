//! Logger setup shared by the binaries
use env_logger::{Builder, Env};
use std::io::Write;

/// Log at info unless RUST_LOG says otherwise, as `[time] target - LEVEL: message`
pub fn init() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(buf, "[{}] {} - {}: {}",
                buf.timestamp_millis(), record.target(), record.level(), record.args())
        })
        .init();
}
