// src/fetch/urls.rs
use url::Url;

use crate::config::FetchConfig;

/// Every archive URL for the configured years, months and states.
///
/// Names follow `<prefix><UF><YY><MM>.dbc`; year is the outer loop, then
/// month, then state.
pub fn archive_urls(cfg: &FetchConfig) -> Vec<String> {
    let base = if cfg.base_url.ends_with('/') {
        cfg.base_url.clone()
    } else {
        format!("{}/", cfg.base_url)
    };

    let mut urls = Vec::with_capacity(
        usize::from(cfg.end_year.saturating_sub(cfg.start_year) + 1)
            * cfg.months.len()
            * cfg.states.len(),
    );
    for year in cfg.start_year..=cfg.end_year {
        for month in &cfg.months {
            for state in &cfg.states {
                urls.push(format!(
                    "{base}{prefix}{state}{yy:02}{month:02}.dbc",
                    prefix = cfg.prefix,
                    yy = year % 100,
                ));
            }
        }
    }
    urls
}

/// Local file name for a URL: its last path segment, or `downloaded_file`.
pub fn dest_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("downloaded_file")
        .to_string()
}
