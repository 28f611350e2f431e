//! Bootstrap configuration (C5, §6.3)
//!
//! One field per configuration option in SPEC_FULL.md §6.3, each
//! overridable by an environment variable, following teacher's `main.rs`
//! `Args` derive. Defaults mirror the original `layerproxy` flag table in
//! `main.go`.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tiered, read-through object cache", long_about = None)]
pub struct Args {
    /// Bind address for the HTTP frontend, e.g. ":8009" or "0.0.0.0:8009".
    #[arg(long, env = "LAYERCACHE_LISTEN", default_value = "0.0.0.0:8009")]
    pub listen: String,

    /// Region (or other locality hint) passed to the origin adapter.
    #[arg(long, env = "LAYERCACHE_ORIGIN_REGION", default_value = "us-east-1")]
    pub origin_region: String,

    /// Key returned when the origin reports NotFound for the requested key.
    /// Empty disables the fallback.
    #[arg(long, env = "LAYERCACHE_ON_DNE", default_value = "")]
    pub fallback_key: String,

    /// Root directory for the filesystem tier.
    #[arg(long, env = "LAYERCACHE_FS_ROOT", default_value = "./layercache-data")]
    pub fs_root: String,

    /// Byte budget for the in-memory tier.
    #[arg(long, env = "LAYERCACHE_CACHE_BYTES", default_value_t = 1_000_000_000)]
    pub memory_cache_bytes: usize,

    /// Watcher tick period in seconds; 0 disables the watcher.
    #[arg(long, env = "LAYERCACHE_WATCH_DELAY", default_value_t = 0)]
    pub watch_delay_secs: u64,

    /// Origin key prefixes to warm at startup. May be repeated.
    #[arg(long = "prefetch", env = "LAYERCACHE_PREFETCH", value_delimiter = ',')]
    pub prefetch_prefixes: Vec<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Output logs as JSON instead of plain text.
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_flag_table() {
        let args = Args::parse_from(["layercache"]);
        assert_eq!(args.listen, "0.0.0.0:8009");
        assert_eq!(args.origin_region, "us-east-1");
        assert_eq!(args.fallback_key, "");
        assert_eq!(args.memory_cache_bytes, 1_000_000_000);
        assert_eq!(args.watch_delay_secs, 0);
        assert!(args.prefetch_prefixes.is_empty());
    }

    #[test]
    fn prefetch_prefixes_parse_as_comma_separated_list() {
        let args = Args::parse_from(["layercache", "--prefetch", "2015_,2016_"]);
        assert_eq!(args.prefetch_prefixes, vec!["2015_", "2016_"]);
    }
}
