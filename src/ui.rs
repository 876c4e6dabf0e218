//! Terminal progress view.
//!
//! Subscribes to the aggregator and renders a live progress bar with
//! one line per discovered account. Holds no search logic; everything
//! it shows comes from observer notifications.

use indicatif::{ProgressBar, ProgressStyle};

use crate::models::{SearchSession, SearchStats, SiteResult};
use crate::profile;
use crate::search::SearchObserver;

/// Display color for a category label. Unknown categories fall back to
/// gray; purely cosmetic.
pub fn category_color(category: &str) -> &'static str {
    match category.to_lowercase().as_str() {
        "social" => "blue",
        "gaming" => "purple",
        "forums" => "green",
        "developer" => "orange",
        "marketplace" => "yellow",
        "streaming" => "pink",
        "adult" => "red",
        _ => "gray",
    }
}

/// Colored dot matching [`category_color`], for terminal output.
pub fn category_dot(category: &str) -> &'static str {
    match category_color(category) {
        "blue" => "🔵",
        "purple" => "🟣",
        "green" => "🟢",
        "orange" => "🟠",
        "yellow" => "🟡",
        "pink" => "🩷",
        "red" => "🔴",
        _ => "⚪",
    }
}

/// Short icon code for a platform, e.g. `GH` for anything GitHub-ish.
/// Unrecognized sites get their first two letters.
pub fn platform_icon(site_name: &str) -> String {
    let name = site_name.to_lowercase();

    let known = [
        ("github", "GH"),
        ("twitter", "𝕏"),
        ("x.com", "𝕏"),
        ("instagram", "IG"),
        ("linkedin", "in"),
        ("reddit", "R"),
        ("discord", "D"),
        ("telegram", "TG"),
        ("snapchat", "SC"),
        ("mastodon", "M"),
        ("steam", "ST"),
        ("epic", "EG"),
        ("twitch", "TW"),
        ("spotify", "♪"),
        ("youtube", "YT"),
        ("tiktok", "TT"),
        ("pinterest", "P"),
        ("vimeo", "V"),
        ("gitlab", "GL"),
        ("stackoverflow", "SO"),
        ("stack overflow", "SO"),
        ("cashapp", "$"),
        ("patreon", "PT"),
    ];

    for (needle, icon) in known {
        if name.contains(needle) {
            return icon.to_string();
        }
    }

    site_name.chars().take(2).flat_map(char::to_uppercase).collect()
}

/// Live terminal renderer for one search session.
pub struct ProgressDisplay {
    bar: ProgressBar,
}

impl ProgressDisplay {
    /// Creates the display. In quiet mode nothing is drawn.
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
            );
            bar
        };
        Self { bar }
    }

    /// Finishes the bar and clears it from the terminal.
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl SearchObserver for ProgressDisplay {
    fn on_started(&mut self, session: &SearchSession) {
        self.bar
            .set_message(format!("searching for '{}'", session.query));
    }

    fn on_progress(&mut self, stats: &SearchStats) {
        if stats.total > 0 {
            self.bar.set_length(stats.total);
        }
        self.bar.set_position(stats.scanned);
    }

    fn on_checking(&mut self, site_name: &str) {
        self.bar.set_message(format!("checking {}", site_name));
    }

    fn on_result_found(&mut self, result: &SiteResult) {
        let mut line = format!(
            "{} [{}] {}",
            category_dot(&result.category),
            platform_icon(&result.site_name),
            result.site_name
        );
        if let Some(fields) = result.profile_fields() {
            if let Some(username) = profile::extract(fields).username {
                line.push_str(&format!(" @{}", username));
            }
        }
        if !result.url.is_empty() {
            line.push_str(&format!(" -> {}", result.url));
        }
        self.bar.println(line);
    }

    fn on_completed(&mut self, stats: &SearchStats) {
        self.bar.finish_with_message(format!(
            "done: {} of {} sites checked, {} accounts found",
            stats.scanned, stats.total, stats.found
        ));
    }

    fn on_cancelled(&mut self) {
        self.bar.abandon_with_message("search cancelled");
    }
}
