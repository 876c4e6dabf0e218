//! Markdown and JSON report generation.
//!
//! Renders a finished (or cancelled) session's read model into a
//! shareable document. The JSON form doubles as the snapshot format and
//! can be reloaded with `--load`.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::models::{
    CategoryBucket, SearchSession, SearchStats, SiteResult, SiteResultData, Snapshot,
    SnapshotStats,
};
use crate::profile::{self, format, render_profile, ProfileSummary};
use crate::ui::{category_color, platform_icon};

/// Report rendering options.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Append the full recursive profile dump to each result.
    pub include_profile_dump: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_profile_dump: true,
        }
    }
}

/// Builds the serializable snapshot of a session's accumulated results.
pub fn to_snapshot(
    session: &SearchSession,
    stats: SearchStats,
    buckets: &[CategoryBucket],
) -> Snapshot {
    Snapshot {
        query: Some(session.query.clone()),
        stats: SnapshotStats {
            scanned: stats.scanned,
            total: stats.total,
        },
        results: buckets
            .iter()
            .flat_map(|bucket| bucket.results.iter())
            .map(|result| SiteResultData {
                status: SiteResultData::STATUS_FOUND.to_string(),
                result: result.clone(),
                progress: None,
            })
            .collect(),
    }
}

/// Generates the JSON report (pretty-printed snapshot).
pub fn generate_json_report(
    session: &SearchSession,
    stats: SearchStats,
    buckets: &[CategoryBucket],
) -> Result<String> {
    let snapshot = to_snapshot(session, stats, buckets);
    serde_json::to_string_pretty(&snapshot).context("Failed to serialize results")
}

/// Generates the complete Markdown report.
pub fn generate_markdown_report(
    session: &SearchSession,
    stats: SearchStats,
    buckets: &[CategoryBucket],
    options: ReportOptions,
) -> String {
    let mut output = String::new();

    output.push_str("# Namescan Report\n\n");
    output.push_str(&generate_metadata_section(session, stats));
    output.push_str(&generate_category_summary(buckets));

    for bucket in buckets {
        output.push_str(&generate_category_section(bucket, options));
    }

    output.push_str(&generate_footer());
    output
}

fn generate_metadata_section(session: &SearchSession, stats: SearchStats) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Query:** `{}`\n", session.query));
    section.push_str(&format!("- **Status:** {}\n", session.status));
    section.push_str(&format!(
        "- **Started:** {}\n",
        session.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Sites Checked:** {} / {}\n",
        stats.scanned, stats.total
    ));
    section.push_str(&format!("- **Accounts Found:** {}\n", stats.found));
    section.push('\n');

    section
}

fn generate_category_summary(buckets: &[CategoryBucket]) -> String {
    if buckets.is_empty() {
        return "No accounts were found.\n\n".to_string();
    }

    let mut section = String::new();
    section.push_str("## Categories\n\n");
    section.push_str("| Category | Accounts | Color |\n");
    section.push_str("|:---|:---:|:---|\n");
    for bucket in buckets {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            format::humanize_key(&bucket.name),
            bucket.len(),
            category_color(&bucket.name)
        ));
    }
    section.push('\n');

    section
}

fn generate_category_section(bucket: &CategoryBucket, options: ReportOptions) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## {} ({})\n\n",
        format::humanize_key(&bucket.name),
        bucket.len()
    ));

    for result in &bucket.results {
        section.push_str(&generate_result_entry(result, options));
    }

    section
}

fn generate_result_entry(result: &SiteResult, options: ReportOptions) -> String {
    let mut entry = String::new();

    entry.push_str(&format!(
        "### [{}] {}\n\n",
        platform_icon(&result.site_name),
        result.site_name
    ));

    if !result.url.is_empty() {
        entry.push_str(&format!("- **URL:** <{}>\n", result.url));
    }
    if let Some(status) = result.status_code {
        entry.push_str(&format!("- **HTTP Status:** {}\n", status));
    }
    if result.response_time.is_some() {
        entry.push_str(&format!(
            "- **Response Time:** {}ms\n",
            result.response_time_ms()
        ));
    }
    if let Some(checked_at) = &result.checked_at {
        entry.push_str(&format!(
            "- **Checked:** {}\n",
            format::time_ago(checked_at, Utc::now())
        ));
    }

    if let Some(fields) = result.profile_fields() {
        let summary = profile::extract(fields);
        entry.push_str(&generate_summary_lines(&summary));

        if options.include_profile_dump {
            entry.push_str("\n<details><summary>Full profile data</summary>\n\n```text\n");
            entry.push_str(&render_profile(fields));
            entry.push_str("```\n\n</details>\n");
        }
    }

    entry.push('\n');
    entry
}

fn generate_summary_lines(summary: &ProfileSummary) -> String {
    let mut lines = String::new();

    if let Some(username) = &summary.username {
        lines.push_str(&format!("- **Username:** @{}\n", username));
    }
    if let Some(full_name) = &summary.full_name {
        lines.push_str(&format!("- **Full Name:** {}\n", full_name));
    }
    if let Some(bio) = &summary.bio {
        lines.push_str(&format!("- **Bio:** {}\n", bio));
    }
    if let Some(followers) = summary.followers.filter(|n| *n > 0) {
        lines.push_str(&format!(
            "- **Followers:** {}\n",
            format::format_count(followers as f64)
        ));
    }
    if let Some(following) = summary.following.filter(|n| *n > 0) {
        lines.push_str(&format!(
            "- **Following:** {}\n",
            format::format_count(following as f64)
        ));
    }
    if let Some(posts) = summary.posts.filter(|n| *n > 0) {
        lines.push_str(&format!(
            "- **Posts:** {}\n",
            format::format_count(posts as f64)
        ));
    }
    if let Some(reputation) = summary.reputation.filter(|n| *n > 0) {
        lines.push_str(&format!(
            "- **Reputation:** {}\n",
            format::format_count(reputation as f64)
        ));
    }
    if let Some(country) = &summary.country {
        lines.push_str(&format!("- **Location:** {}\n", country));
    }
    if let Some(gender) = &summary.gender {
        lines.push_str(&format!("- **Gender:** {}\n", gender));
    }
    if let Some(website) = &summary.website {
        lines.push_str(&format!("- **Website:** <{}>\n", website));
    }
    if let Some(created_at) = &summary.created_at {
        lines.push_str(&format!(
            "- **Joined:** {}\n",
            format::format_short_date(created_at)
        ));
    }
    if let Some(last_active) = &summary.last_active {
        lines.push_str(&format!(
            "- **Last Active:** {}\n",
            format::format_short_date(last_active)
        ));
    }
    if summary.verified {
        lines.push_str("- **Verified Account** ✔\n");
    }
    if let Some(image) = &summary.profile_image {
        lines.push_str(&format!("- **Profile Image:** <{}>\n", image));
    }
    for (platform, handle) in &summary.social_profiles {
        lines.push_str(&format!(
            "- **{}:** [{}](https://{}.com/{})\n",
            format::humanize_key(platform),
            handle,
            platform,
            handle
        ));
    }
    for link in &summary.social_links {
        lines.push_str(&format!("- **Link:** <{}>\n", link));
    }
    for stat in &summary.numeric_stats {
        lines.push_str(&format!(
            "- **{}:** {}\n",
            stat.key,
            format::format_count(stat.value)
        ));
    }
    for field in &summary.other_fields {
        lines.push_str(&format!("- **{}:** {}\n", field.key, field.value));
    }

    lines
}

fn generate_footer() -> String {
    format!(
        "\n---\n\n*Generated by namescan v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}
