//! Project classifier — turns raw repository records into display-ready
//! projects. Pure and deterministic given the same input and evaluation
//! time; nothing here is persisted, the whole list is regenerated on
//! every fetch.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::github::GithubRepo;

/// Topics that describe the repository rather than its technology.
const TOPIC_STOPLIST: &[&str] = &["portfolio", "website", "blog", "demo", "example", "template"];

const MAX_TECHNOLOGIES: usize = 6;
const FEATURED_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryProject {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub live_url: Option<String>,
    pub github_url: String,
    pub featured: bool,
    pub stars: i64,
    pub forks: i64,
    pub topics: Vec<String>,
    pub language: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub gradient: String,
}

/// Filters, orders and maps a raw repository list.
///
/// Archived, forked and non-public repositories are dropped before any
/// other processing; the remainder is stably sorted by descending star
/// count, so ties keep the upstream order.
pub fn process_repositories(repos: Vec<GithubRepo>, now: DateTime<Utc>) -> Vec<RepositoryProject> {
    let mut repos: Vec<GithubRepo> = repos
        .into_iter()
        .filter(|r| !r.archived && !r.fork && r.visibility == "public")
        .collect();
    repos.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));

    repos
        .into_iter()
        .map(|repo| {
            let featured = is_featured(&repo, now);
            RepositoryProject {
                id: repo.id,
                title: format_title(&repo.name),
                category: determine_category(&repo.topics, repo.language.as_deref()).to_string(),
                description: repo
                    .description
                    .unwrap_or_else(|| "No description available".to_string()),
                technologies: extract_technologies(&repo.topics, repo.language.as_deref()),
                live_url: repo.homepage.filter(|h| !h.is_empty()),
                github_url: repo.html_url,
                featured,
                stars: repo.stargazers_count,
                forks: repo.forks_count,
                gradient: determine_gradient(repo.language.as_deref()).to_string(),
                language: repo.language,
                topics: repo.topics,
                last_updated: repo.updated_at,
            }
        })
        .collect()
}

/// Topic table wins first, in the topic list's given order; language
/// table is the fallback; `Other` when neither matches.
pub fn determine_category(topics: &[String], language: Option<&str>) -> &'static str {
    for topic in topics {
        if let Some(category) = category_for(&topic.to_lowercase()) {
            return category;
        }
    }
    if let Some(language) = language {
        if let Some(category) = category_for(&language.to_lowercase()) {
            return category;
        }
    }
    "Other"
}

fn category_for(key: &str) -> Option<&'static str> {
    let category = match key {
        "ai" | "machine-learning" | "deep-learning" | "nlp" | "computer-vision" | "tensorflow"
        | "pytorch" | "scikit-learn" => "AI/ML",
        "web" | "web-app" | "frontend" | "backend" | "fullstack" | "react" | "vue" | "angular"
        | "node" => "Web Apps",
        "mobile" | "android" | "ios" | "react-native" | "flutter" => "Mobile",
        "data" | "data-science" | "analytics" | "database" | "sql" | "nosql" => "Data Science",
        "devops" | "docker" | "kubernetes" | "ci-cd" | "automation" => "DevOps",
        "cloud" | "aws" | "azure" | "gcp" => "Cloud",
        _ => return None,
    };
    Some(category)
}

/// Cosmetic accent token per language; deterministic, neutral default.
pub fn determine_gradient(language: Option<&str>) -> &'static str {
    match language {
        Some("Python") | Some("Shell") => "from-green-500 to-emerald-500",
        Some("JavaScript") => "from-yellow-500 to-orange-500",
        Some("TypeScript") => "from-blue-500 to-indigo-500",
        Some("C++") | Some("Kotlin") => "from-purple-500 to-pink-500",
        Some("Java") | Some("Ruby") => "from-red-500 to-pink-500",
        Some("Go") => "from-cyan-500 to-blue-500",
        Some("Rust") | Some("Swift") | Some("HTML") => "from-orange-500 to-red-500",
        Some("PHP") => "from-purple-500 to-indigo-500",
        Some("Dart") | Some("CSS") => "from-blue-500 to-cyan-500",
        Some("Dockerfile") => "from-blue-500 to-indigo-500",
        _ => "from-gray-500 to-gray-700",
    }
}

/// `my-cool-repo` -> `My Cool Repo`
pub fn format_title(name: &str) -> String {
    name.split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Language plus topics, minus the stoplist, de-duplicated in order and
/// capped at six entries.
pub fn extract_technologies(topics: &[String], language: Option<&str>) -> Vec<String> {
    let mut techs: Vec<String> = Vec::new();
    if let Some(language) = language {
        techs.push(language.to_string());
    }
    for topic in topics {
        if TOPIC_STOPLIST.contains(&topic.to_lowercase().as_str()) {
            continue;
        }
        if !techs.contains(topic) {
            techs.push(topic.clone());
        }
    }
    techs.truncate(MAX_TECHNOLOGIES);
    techs
}

/// A repo is featured if it has stars, carries a `featured`/`showcase`
/// topic, or was updated within the last 30 days. Recomputed on every
/// fetch, never stored.
pub fn is_featured(repo: &GithubRepo, now: DateTime<Utc>) -> bool {
    repo.stargazers_count > 0
        || repo
            .topics
            .iter()
            .any(|t| t.eq_ignore_ascii_case("featured") || t.eq_ignore_ascii_case("showcase"))
        || repo.updated_at > now - Duration::days(FEATURED_WINDOW_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, stars: i64) -> GithubRepo {
        GithubRepo {
            id: stars,
            name: name.to_string(),
            full_name: format!("someone/{name}"),
            description: None,
            html_url: format!("https://github.com/someone/{name}"),
            homepage: None,
            language: None,
            stargazers_count: stars,
            forks_count: 0,
            topics: vec![],
            updated_at: Utc::now() - Duration::days(365),
            archived: false,
            fork: false,
            visibility: "public".to_string(),
        }
    }

    #[test]
    fn filters_archived_forked_and_private() {
        let mut archived = repo("old", 10);
        archived.archived = true;
        let mut forked = repo("copy", 10);
        forked.fork = true;
        let mut private = repo("secret", 10);
        private.visibility = "private".to_string();
        let kept = repo("kept", 1);

        let out = process_repositories(vec![archived, forked, private, kept], Utc::now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Kept");
    }

    #[test]
    fn sorts_by_stars_descending_with_stable_ties() {
        let mut a = repo("a", 1);
        a.id = 1;
        let mut b = repo("b", 5);
        b.id = 2;
        let mut c = repo("c", 1);
        c.id = 3;

        let out = process_repositories(vec![a, b, c], Utc::now());
        let ids: Vec<i64> = out.iter().map(|p| p.id).collect();
        // b first, then a and c in original order (stable tie)
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn topic_match_beats_language_match() {
        let topics = vec!["react".to_string()];
        assert_eq!(determine_category(&topics, Some("Python")), "Web Apps");
    }

    #[test]
    fn topic_order_determines_first_match() {
        let topics = vec!["docker".to_string(), "react".to_string()];
        assert_eq!(determine_category(&topics, None), "DevOps");
    }

    #[test]
    fn language_fallback_then_other() {
        assert_eq!(determine_category(&[], Some("SQL")), "Data Science");
        assert_eq!(determine_category(&[], Some("Brainfuck")), "Other");
        assert_eq!(determine_category(&[], None), "Other");
    }

    #[test]
    fn gradient_is_deterministic_with_neutral_default() {
        assert_eq!(determine_gradient(Some("Rust")), "from-orange-500 to-red-500");
        assert_eq!(determine_gradient(Some("COBOL")), "from-gray-500 to-gray-700");
        assert_eq!(determine_gradient(None), "from-gray-500 to-gray-700");
    }

    #[test]
    fn title_capitalizes_hyphenated_words() {
        assert_eq!(format_title("my-cool-repo"), "My Cool Repo");
        assert_eq!(format_title("single"), "Single");
    }

    #[test]
    fn technologies_exclude_stoplist_dedupe_and_cap() {
        let topics: Vec<String> = [
            "portfolio", "rust", "axum", "tokio", "sqlx", "redis", "docker", "k8s",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let techs = extract_technologies(&topics, Some("Rust"));
        assert_eq!(techs.len(), MAX_TECHNOLOGIES);
        assert_eq!(techs[0], "Rust");
        assert!(!techs.contains(&"portfolio".to_string()));
    }

    #[test]
    fn featured_by_stars_topic_or_recency() {
        let now = Utc::now();
        assert!(is_featured(&repo("starred", 3), now));

        let mut topical = repo("topical", 0);
        topical.topics = vec!["Showcase".to_string()];
        assert!(is_featured(&topical, now));

        let mut fresh = repo("fresh", 0);
        fresh.updated_at = now - Duration::days(2);
        assert!(is_featured(&fresh, now));

        assert!(!is_featured(&repo("stale", 0), now));
    }
}
