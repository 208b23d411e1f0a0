use std::path::PathBuf;
use std::time::Duration;

use frontlines_shared::CampaignConfig;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_TABLE_RELOAD_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_BROADCAST_BUFFER: usize = 64;
pub const SSE_KEEPALIVE_SECS: u64 = 15;

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn data_dir() -> PathBuf {
    std::env::var("DATA_DIR")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn table_reload_interval() -> Duration {
    std::env::var("TABLE_RELOAD_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_TABLE_RELOAD_INTERVAL_SECS))
}

pub fn sse_broadcast_buffer() -> usize {
    std::env::var("SSE_BROADCAST_BUFFER")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_BROADCAST_BUFFER)
}

/// Build the campaign constants once at startup. Only the recent-change window is tunable;
/// a window of 0 is allowed and disables recent-claim emphasis.
pub fn campaign_config() -> CampaignConfig {
    let config = CampaignConfig::default();
    match std::env::var("RECENT_HIGHLIGHT_COUNT")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
    {
        Some(count) => config.with_recent_highlight_count(count),
        None => config,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{
        DEFAULT_BROADCAST_BUFFER, DEFAULT_SERVER_PORT, campaign_config, data_dir,
        server_port, sse_broadcast_buffer, table_reload_interval,
    };

    #[test]
    fn defaults_apply_when_unset() {
        temp_env::with_vars_unset(
            [
                "SERVER_PORT",
                "DATA_DIR",
                "TABLE_RELOAD_INTERVAL_SECS",
                "SSE_BROADCAST_BUFFER",
                "RECENT_HIGHLIGHT_COUNT",
            ],
            || {
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(data_dir(), PathBuf::from("data"));
                assert_eq!(table_reload_interval(), Duration::from_secs(5));
                assert_eq!(sse_broadcast_buffer(), DEFAULT_BROADCAST_BUFFER);
                assert_eq!(campaign_config().recent_highlight_count, 3);
            },
        );
    }

    #[test]
    fn env_overrides_are_parsed() {
        temp_env::with_vars(
            [
                ("SERVER_PORT", Some("8080")),
                ("DATA_DIR", Some(" /srv/frontlines ")),
                ("TABLE_RELOAD_INTERVAL_SECS", Some("30")),
                ("RECENT_HIGHLIGHT_COUNT", Some("5")),
            ],
            || {
                assert_eq!(server_port(), 8080);
                assert_eq!(data_dir(), PathBuf::from("/srv/frontlines"));
                assert_eq!(table_reload_interval(), Duration::from_secs(30));
                assert_eq!(campaign_config().recent_highlight_count, 5);
            },
        );
    }

    #[test]
    fn invalid_values_fall_back() {
        temp_env::with_vars(
            [
                ("SERVER_PORT", Some("0")),
                ("DATA_DIR", Some("   ")),
                ("TABLE_RELOAD_INTERVAL_SECS", Some("soon")),
                ("SSE_BROADCAST_BUFFER", Some("-1")),
                ("RECENT_HIGHLIGHT_COUNT", Some("many")),
            ],
            || {
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(data_dir(), PathBuf::from("data"));
                assert_eq!(table_reload_interval(), Duration::from_secs(5));
                assert_eq!(sse_broadcast_buffer(), DEFAULT_BROADCAST_BUFFER);
                assert_eq!(campaign_config().recent_highlight_count, 3);
            },
        );
    }

    #[test]
    fn zero_window_is_accepted() {
        temp_env::with_var("RECENT_HIGHLIGHT_COUNT", Some("0"), || {
            assert_eq!(campaign_config().recent_highlight_count, 0);
        });
    }
}
