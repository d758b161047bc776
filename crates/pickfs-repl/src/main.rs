//! pickfs console entry point.
//!
//! Launch the interactive console:
//! ```bash
//! cargo run -p pickfs-repl
//! ```

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    // Logs go to stderr so they never mix with command output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("pickfs_kernel=info".parse()?)
                .add_directive("pickfs_repl=info".parse()?),
        )
        .init();

    pickfs_repl::run()
}
