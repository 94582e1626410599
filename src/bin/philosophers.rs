//! Dining-philosophers demonstration runner.
//!
//! Seats five philosophers, runs a bounded number of think/eat rounds,
//! and narrates every state transition to the console. The round count
//! can be overridden from the command line:
//!
//! ```bash
//! $ cargo run --bin philosophers -- 20
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::time::Duration;

use symposium::philosophers::{self, Table};
use tracing_subscriber::EnvFilter;

const SEATS: usize = 5;
const DEFAULT_ROUNDS: usize = 5;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rounds = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_ROUNDS);

    let table = Table::new(SEATS);
    philosophers::run(
        &table,
        rounds,
        Duration::from_millis(500),
        Duration::from_millis(500),
    );

    for seat in 0..table.seats() {
        tracing::info!(seat, meals = table.meals(seat), "finished");
    }
}
