// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI configuration loaded from environment variables.

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of worker threads for parallel builds.
    pub worker_threads: usize,
    /// Build cells and boundaries on the rayon pool.
    pub parallel_build: bool,
    /// Tracing filter directive.
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            worker_threads: var("WORKER_THREADS")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(num_cpus::get),
            parallel_build: var("PARALLEL_BUILD")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            log_filter: var("RUST_LOG").unwrap_or_else(|| "info".into()),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
