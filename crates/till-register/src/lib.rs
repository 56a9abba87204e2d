//! # Till Register
//!
//! Host-facing layer of the till: the POS and admin screens as state
//! containers, register configuration, errors in the shape the UI receives,
//! and the sale sink.
//!
//! ## Module Organization
//! ```text
//! till_register/
//! ├── lib.rs          ◄─── You are here (exports & tracing setup)
//! ├── session.rs      ◄─── POS screen: search, scanner, dialogs, cart, checkout
//! ├── admin.rs        ◄─── Product management screen
//! ├── config.rs       ◄─── register.toml + TILL_* overrides
//! ├── clock.rs        ◄─── System and manual clocks
//! ├── sink.rs         ◄─── Where completed sales go
//! └── error.rs        ◄─── ApiError / ConfigError
//! ```
//!
//! ## Host Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  init_tracing()                                                         │
//! │  let config = RegisterConfig::load_or_default(None);                    │
//! │  let mut pos = PosSession::open(config);                                │
//! │                                                                         │
//! │  loop {                                                                 │
//! │      input event  ──► pos.global_key(..) / pos.dispatch(..) / ...       │
//! │      timer        ──► pos.tick()   (schedule by pos.next_deadline())    │
//! │      redraw       ◄── pos.cart_view(), pos.suggestion_rows(), ...       │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod clock;
pub mod config;
pub mod error;
pub mod session;
pub mod sink;

pub use admin::AdminScreen;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RegisterConfig;
pub use error::{ApiError, ConfigError, ErrorCode};
pub use session::PosSession;
pub use sink::{LogSaleSink, MemorySaleSink, SaleSink};

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// ## Log Levels
/// - Default: `info` for dependencies, `debug` for till crates
/// - Override: Set `RUST_LOG` environment variable
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till_core=debug,till_register=debug"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
