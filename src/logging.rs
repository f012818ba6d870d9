// Log output for the desktop shell. `--verbose` on the command line or
// `"debug": true` in the config file turns on per-event gesture, transform
// and render-stage logs.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Quiet runs log at `info` and ignore
/// `RUST_LOG`. Verbose runs start at `debug`, and `RUST_LOG` narrows or
/// widens that when it is set (e.g. `RUST_LOG=bolmaker::gesture=trace`).
/// A second call is a no-op.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init(false);
        init(true);
        tracing::debug!("still running");
    }
}
