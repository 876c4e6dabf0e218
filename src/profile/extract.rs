//! Heuristic profile-field extraction.
//!
//! Backends return whatever JSON each source site exposes, so every
//! semantic slot (username, follower count, join date, ...) is resolved
//! by scanning an ordered list of known key synonyms; the first key
//! present with a usable value wins. Leftover scalar fields fall into
//! generic numeric/other buckets, capped to keep result cards bounded.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::profile::format::{humanize_key, parse_date};

// Synonym tables, in priority order. Collected from the payload shapes
// of the sites the backend probes.

const USERNAME_FIELDS: &[&str] = &[
    "username",
    "user_name",
    "userName",
    "disqus_username",
    "imgur_username",
    "name",
    "handle",
    "login",
    "screen_name",
    "screenName",
    "display",
    "nickname",
    "nick",
    "account_name",
];

const NAME_FIELDS: &[&str] = &[
    "fullname",
    "full_name",
    "fullName",
    "displayName",
    "display_name",
    "realName",
    "real_name",
    "name",
];

const BIO_FIELDS: &[&str] = &[
    "bio",
    "description",
    "about",
    "aboutMe",
    "about_me",
    "motto",
    "statusMessage",
    "status_message",
    "blurb",
    "note",
    "summary",
    "headline",
    "tagline",
];

const IMAGE_FIELDS: &[&str] = &[
    "profileImageUrl",
    "profile_image_url",
    "profilePic",
    "profile_pic",
    "image",
    "avatar",
    "avatar_static",
    "avatar_url",
    "icon_img",
    "logo",
    "logoUrl",
    "pic_url",
    "photo",
    "photo_url",
    "picture",
];

const COUNTRY_FIELDS: &[&str] = &[
    "country",
    "location",
    "city",
    "place",
    "nationality",
    "region",
    "area",
    "locale",
];

const GENDER_FIELDS: &[&str] = &["gender", "genderVerbal", "gender_verbal", "sex"];

const FOLLOWER_FIELDS: &[&str] = &[
    "follower_count",
    "followers_count",
    "followersCount",
    "followerCount",
    "followers",
    "subscriber_count",
    "subscribers",
    "fans",
];

const FOLLOWING_FIELDS: &[&str] = &[
    "following_count",
    "follows_count",
    "followsCount",
    "followingCount",
    "following",
    "followeeCount",
    "followees",
    "subscriptions",
];

const POSTS_FIELDS: &[&str] = &[
    "posts",
    "post_count",
    "postCount",
    "statuses_count",
    "statusesCount",
    "tweets",
    "updates",
    "contributions",
    "cloudcast_count",
    "videos",
    "photos",
];

const REPUTATION_FIELDS: &[&str] = &[
    "reputation",
    "karma",
    "total_karma",
    "points",
    "score",
    "rating",
];

const CREATED_FIELDS: &[&str] = &[
    "created_at",
    "createdAt",
    "createdOn",
    "created",
    "memberSince",
    "member_since",
    "createdDate",
    "created_date",
    "joinedAt",
    "joined_at",
    "registered",
    "signup_date",
];

const LAST_ACTIVE_FIELDS: &[&str] = &[
    "last_active",
    "lastActive",
    "last_seen",
    "lastSeen",
    "updated_at",
    "updatedAt",
    "last_login",
    "lastLogin",
];

const VERIFIED_FIELDS: &[&str] = &[
    "verified",
    "isVerified",
    "is_verified",
    "is_twitter_verified",
    "verified_account",
    "badge",
];

const WEBSITE_FIELDS: &[&str] = &["website", "url", "homepage", "blog", "site", "web"];

const SOCIAL_LINK_FIELDS: &[&str] = &["social_links", "socialLinks", "links", "urls"];

/// Platforms whose top-level keys are treated as profile handles.
const SOCIAL_PLATFORMS: &[&str] = &[
    "youtube",
    "twitter",
    "twitch",
    "instagram",
    "facebook",
    "tiktok",
    "snapchat",
    "linkedin",
    "github",
    "gitlab",
];

/// Container keys that hold nested values the slot resolvers already
/// look inside, so the generic fallback must not revisit them.
const CONTAINER_FIELDS: &[&str] = &[
    "data",
    "counters",
    "stats",
    "picture",
    "backgroundPicture",
    "links",
];

/// Display cap for generic numeric stats.
const MAX_NUMERIC_STATS: usize = 8;
/// Display cap for generic string/boolean fields.
const MAX_OTHER_FIELDS: usize = 5;

/// A leftover field captured by the generic fallback, with the key
/// already humanized for display.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedField<T> {
    pub key: String,
    pub value: T,
}

/// Normalized view over one result's profile payload. Recomputed from
/// the raw payload at render time, never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSummary {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub country: Option<String>,
    pub gender: Option<String>,
    pub followers: Option<i64>,
    pub following: Option<i64>,
    pub posts: Option<i64>,
    pub reputation: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_active: Option<DateTime<Utc>>,
    pub verified: bool,
    pub website: Option<String>,
    pub social_links: Vec<String>,
    /// (platform, handle) pairs, in the fixed platform order.
    pub social_profiles: Vec<(String, String)>,
    pub numeric_stats: Vec<NamedField<f64>>,
    pub other_fields: Vec<NamedField<String>>,
}

/// Derives the normalized summary from a raw profile payload.
pub fn extract(profile: &Map<String, Value>) -> ProfileSummary {
    let mut summary = ProfileSummary {
        username: first_string(profile, USERNAME_FIELDS),
        bio: first_string(profile, BIO_FIELDS),
        gender: first_string(profile, GENDER_FIELDS),
        ..ProfileSummary::default()
    };

    // A bare "name" can be either slot; only treat it as the full name
    // when it differs from the resolved username.
    summary.full_name = NAME_FIELDS
        .iter()
        .filter_map(|field| truthy(profile, field).and_then(value_to_string))
        .find(|name| Some(name) != summary.username.as_ref());

    summary.profile_image = first_image(profile);
    summary.country = first_country(profile);

    summary.followers = first_int(profile, FOLLOWER_FIELDS)
        .or_else(|| nested_int(profile, "counters", "followers"))
        .or_else(|| nested_stat(profile, "followers"));
    summary.following = first_int(profile, FOLLOWING_FIELDS)
        .or_else(|| nested_int(profile, "counters", "following"))
        .or_else(|| nested_stat(profile, "following"));
    summary.posts =
        first_int(profile, POSTS_FIELDS).or_else(|| nested_int(profile, "counters", "posts"));
    summary.reputation = first_int(profile, REPUTATION_FIELDS)
        .or_else(|| nested_int(profile, "data", "total_karma"));

    summary.created_at = first_date(profile, CREATED_FIELDS).or_else(|| {
        profile
            .get("data")
            .and_then(Value::as_object)
            .and_then(|data| data.get("created_utc"))
            .and_then(parse_date)
    });
    summary.last_active = first_date(profile, LAST_ACTIVE_FIELDS);

    summary.verified = VERIFIED_FIELDS
        .iter()
        .any(|field| profile.get(*field).is_some_and(is_truthy_flag));

    summary.website = WEBSITE_FIELDS
        .iter()
        .filter_map(|field| profile.get(*field).and_then(Value::as_str))
        .find(|s| s.starts_with("http"))
        .map(str::to_string);

    summary.social_links = first_link_list(profile);
    summary.social_profiles = social_profiles(profile);

    collect_leftovers(profile, &mut summary);
    summary
}

// === Slot resolvers ===

/// Gets a field if present and truthy in the loose sense the payloads
/// require: null, empty strings, `false`, and `0` do not count.
fn truthy<'a>(profile: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    profile.get(field).filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn first_string(profile: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| truthy(profile, field).and_then(value_to_string))
}

/// Lenient integer coercion: numbers are truncated, strings are parsed
/// up to the first non-digit (so "1,500" reads as 1).
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, s),
            };
            let leading: String = digits.chars().take_while(char::is_ascii_digit).collect();
            leading.parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}

fn first_int(profile: &Map<String, Value>, fields: &[&str]) -> Option<i64> {
    fields
        .iter()
        .find_map(|field| profile.get(*field).filter(|v| !v.is_null()).and_then(coerce_int))
}

fn nested_int(profile: &Map<String, Value>, container: &str, field: &str) -> Option<i64> {
    profile
        .get(container)
        .and_then(Value::as_object)
        .and_then(|obj| obj.get(field))
        .filter(|v| !v.is_null())
        .and_then(coerce_int)
}

/// Reads `stats.<field>`, which some sites ship as a scalar and others
/// as an object with a `value` member.
fn nested_stat(profile: &Map<String, Value>, field: &str) -> Option<i64> {
    let stat = profile
        .get("stats")
        .and_then(Value::as_object)
        .and_then(|stats| stats.get(field))?;
    match stat {
        Value::Object(obj) => obj.get("value").and_then(coerce_int),
        other => coerce_int(other),
    }
}

fn first_date(profile: &Map<String, Value>, fields: &[&str]) -> Option<DateTime<Utc>> {
    fields
        .iter()
        .find_map(|field| truthy(profile, field).and_then(parse_date))
}

/// Image fields are either URL strings or objects carrying a `url`.
fn first_image(profile: &Map<String, Value>) -> Option<String> {
    IMAGE_FIELDS.iter().find_map(|field| {
        let value = truthy(profile, field)?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get("url").and_then(Value::as_str).map(str::to_string),
            _ => None,
        }
    })
}

/// Country/location fields are strings or `{name, code}` objects.
fn first_country(profile: &Map<String, Value>) -> Option<String> {
    COUNTRY_FIELDS.iter().find_map(|field| {
        let value = truthy(profile, field)?;
        match value {
            Value::Object(obj) => obj
                .get("name")
                .or_else(|| obj.get("code"))
                .and_then(Value::as_str)
                .map(str::to_string),
            other => value_to_string(other),
        }
    })
}

/// Verified flags arrive as booleans, "True"/"true" strings, or 1.
fn is_truthy_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "True" || s == "true",
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// Social link collections are arrays of URLs or objects whose values
/// are URLs; everything that is not an http(s) string is filtered out.
fn first_link_list(profile: &Map<String, Value>) -> Vec<String> {
    for field in SOCIAL_LINK_FIELDS {
        let Some(value) = profile.get(*field) else {
            continue;
        };
        let candidates: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(obj) => obj.values().collect(),
            _ => continue,
        };
        let links: Vec<String> = candidates
            .into_iter()
            .filter_map(Value::as_str)
            .filter(|s| s.starts_with("http"))
            .map(str::to_string)
            .collect();
        if !links.is_empty() {
            return links;
        }
    }
    Vec::new()
}

fn social_profiles(profile: &Map<String, Value>) -> Vec<(String, String)> {
    SOCIAL_PLATFORMS
        .iter()
        .filter_map(|platform| {
            let handle = truthy(profile, platform).and_then(value_to_string)?;
            Some((platform.to_string(), handle))
        })
        .collect()
}

// === Generic fallback ===

fn is_claimed_key(key: &str) -> bool {
    let tables: &[&[&str]] = &[
        USERNAME_FIELDS,
        NAME_FIELDS,
        BIO_FIELDS,
        IMAGE_FIELDS,
        COUNTRY_FIELDS,
        GENDER_FIELDS,
        FOLLOWER_FIELDS,
        FOLLOWING_FIELDS,
        POSTS_FIELDS,
        REPUTATION_FIELDS,
        CREATED_FIELDS,
        LAST_ACTIVE_FIELDS,
        VERIFIED_FIELDS,
        WEBSITE_FIELDS,
        SOCIAL_LINK_FIELDS,
        SOCIAL_PLATFORMS,
        CONTAINER_FIELDS,
    ];
    tables.iter().any(|table| table.contains(&key))
}

/// Names that look like internal identifiers or style values; excluded
/// from the generic display buckets.
fn looks_like_identifier(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower.contains("id") || lower.contains("color") || lower.contains("col")
}

fn collect_leftovers(profile: &Map<String, Value>, summary: &mut ProfileSummary) {
    for (key, value) in profile {
        if is_claimed_key(key) {
            continue;
        }
        match value {
            Value::Number(n) => {
                if summary.numeric_stats.len() < MAX_NUMERIC_STATS {
                    if let Some(v) = n.as_f64() {
                        summary.numeric_stats.push(NamedField {
                            key: humanize_key(key),
                            value: v,
                        });
                    }
                }
            }
            Value::String(s) => {
                if !s.is_empty()
                    && !looks_like_identifier(key)
                    && summary.other_fields.len() < MAX_OTHER_FIELDS
                {
                    summary.other_fields.push(NamedField {
                        key: humanize_key(key),
                        value: s.clone(),
                    });
                }
            }
            Value::Bool(b) => {
                if !looks_like_identifier(key) && summary.other_fields.len() < MAX_OTHER_FIELDS {
                    summary.other_fields.push(NamedField {
                        key: humanize_key(key),
                        value: if *b { "Yes" } else { "No" }.to_string(),
                    });
                }
            }
            // nested values are the recursive renderer's job
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use serde_json::json;

    fn profile(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_basic_slots() {
        let summary = extract(&profile(json!({
            "followers_count": 1500,
            "username": "alice"
        })));
        assert_eq!(summary.followers, Some(1500));
        assert_eq!(summary.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_synonym_priority_first_match_wins() {
        let summary = extract(&profile(json!({
            "handle": "second",
            "username": "first"
        })));
        assert_eq!(summary.username.as_deref(), Some("first"));
    }

    #[test]
    fn test_name_equal_to_username_skipped() {
        let summary = extract(&profile(json!({
            "username": "alice",
            "name": "alice",
            "display_name": "Alice Liddell"
        })));
        assert_eq!(summary.full_name.as_deref(), Some("Alice Liddell"));
    }

    #[test]
    fn test_created_at_epoch_seconds_is_january_2021() {
        let summary = extract(&profile(json!({ "created_at": 1609459200 })));
        let created = summary.created_at.unwrap();
        assert_eq!(created.year(), 2021);
        assert_eq!(created.month(), 1);
    }

    #[test]
    fn test_unparseable_date_yields_none() {
        let summary = extract(&profile(json!({ "created_at": "a while ago" })));
        assert!(summary.created_at.is_none());
    }

    #[test]
    fn test_nested_counters_and_stats() {
        let summary = extract(&profile(json!({
            "counters": { "followers": 10, "posts": 3 },
            "stats": { "following": { "value": "42" } }
        })));
        assert_eq!(summary.followers, Some(10));
        assert_eq!(summary.posts, Some(3));
        assert_eq!(summary.following, Some(42));
    }

    #[test]
    fn test_reddit_style_data_container() {
        let summary = extract(&profile(json!({
            "data": { "total_karma": 9001, "created_utc": 1609459200 }
        })));
        assert_eq!(summary.reputation, Some(9001));
        assert_eq!(summary.created_at.unwrap().year(), 2021);
    }

    #[test]
    fn test_verified_variants() {
        for value in [json!(true), json!("True"), json!("true"), json!(1)] {
            let summary = extract(&profile(json!({ "verified": value })));
            assert!(summary.verified, "value {:?} should verify", value);
        }
        let summary = extract(&profile(json!({ "verified": false })));
        assert!(!summary.verified);
    }

    #[test]
    fn test_website_requires_http_prefix() {
        let summary = extract(&profile(json!({
            "website": "not a url",
            "blog": "https://blog.example"
        })));
        assert_eq!(summary.website.as_deref(), Some("https://blog.example"));
    }

    #[test]
    fn test_image_from_object_url() {
        let summary = extract(&profile(json!({
            "picture": { "url": "https://img.example/a.png" }
        })));
        assert_eq!(
            summary.profile_image.as_deref(),
            Some("https://img.example/a.png")
        );
    }

    #[test]
    fn test_country_from_object() {
        let summary = extract(&profile(json!({ "country": { "name": "Iceland" } })));
        assert_eq!(summary.country.as_deref(), Some("Iceland"));
    }

    #[test]
    fn test_social_links_filtered_to_urls() {
        let summary = extract(&profile(json!({
            "links": ["https://a.example", "mailto:x@y", "https://b.example"]
        })));
        assert_eq!(summary.social_links, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_social_platform_handles() {
        let summary = extract(&profile(json!({
            "github": "octocat",
            "twitch": "octostream"
        })));
        assert_eq!(
            summary.social_profiles,
            vec![
                ("twitch".to_string(), "octostream".to_string()),
                ("github".to_string(), "octocat".to_string()),
            ]
        );
    }

    #[test]
    fn test_leftover_numeric_and_other_fields() {
        let summary = extract(&profile(json!({
            "username": "alice",
            "gists": 12,
            "pronouns": "she/her",
            "is_hireable": true,
            "theme_color": "#fff",
            "user_id": "abc123"
        })));

        assert_eq!(summary.numeric_stats.len(), 1);
        assert_eq!(summary.numeric_stats[0].key, "Gists");
        assert_eq!(summary.numeric_stats[0].value, 12.0);

        let keys: Vec<&str> = summary.other_fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["Pronouns", "Is Hireable"]);
        assert_eq!(summary.other_fields[1].value, "Yes");
    }

    #[test]
    fn test_leftover_caps() {
        let mut map = Map::new();
        for i in 0..12 {
            map.insert(format!("metric_{}", i), json!(i));
            map.insert(format!("note_{}", i), json!(format!("n{}", i)));
        }
        let summary = extract(&map);
        assert_eq!(summary.numeric_stats.len(), 8);
        assert_eq!(summary.other_fields.len(), 5);
    }

    #[test]
    fn test_nested_objects_excluded_from_fallback() {
        let summary = extract(&profile(json!({
            "badges": ["a", "b"],
            "extra": { "nested": true }
        })));
        assert!(summary.numeric_stats.is_empty());
        assert!(summary.other_fields.is_empty());
    }

    #[test]
    fn test_empty_profile() {
        assert_eq!(extract(&Map::new()), ProfileSummary::default());
    }
}
