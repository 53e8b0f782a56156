//! Website visits made during research, with domain-based credibility.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::{ParseError, Url};

use crate::consensus::ordered_sum;

/// Official and government sources, wire services, major reference.
const TIER_1_DOMAINS: &[&str] = &[
    ".gov",
    ".gov.uk",
    ".gov.au",
    ".gov.cn",
    "sec.gov",
    "treasury.gov",
    "federalreserve.gov",
    "europa.eu",
    "un.org",
    "reuters.com",
    "apnews.com",
    "afp.com",
    "wikipedia.org",
];

const TIER_2_DOMAINS: &[&str] = &[
    "bbc.com",
    "bbc.co.uk",
    "cnn.com",
    "nytimes.com",
    "washingtonpost.com",
    "wsj.com",
    "ft.com",
    "theguardian.com",
    "economist.com",
    "bloomberg.com",
    "cnbc.com",
    "marketwatch.com",
    "techcrunch.com",
    "wired.com",
    "theverge.com",
];

const TIER_3_DOMAINS: &[&str] = &[
    "coindesk.com",
    "cointelegraph.com",
    "theblock.co",
    "decrypt.co",
    "bitcoinmagazine.com",
    "coingecko.com",
    "coinmarketcap.com",
    "tradingview.com",
    "investopedia.com",
    "forbes.com",
    "fortune.com",
    "seekingalpha.com",
    "yahoo.com",
];

/// Social and user-generated.
const TIER_4_DOMAINS: &[&str] = &[
    "twitter.com",
    "x.com",
    "reddit.com",
    "medium.com",
    "substack.com",
    "discord.com",
    "telegram.org",
];

/// Checked in order; the first matching group wins.
const SOURCE_TYPE_MARKERS: &[(SourceType, &[&str])] = &[
    (SourceType::Official, &[".gov", "sec.", "federal", "treasury"]),
    (SourceType::WireService, &["reuters", "apnews", "afp"]),
    (
        SourceType::MajorNews,
        &[
            "bbc",
            "cnn",
            "nytimes",
            "wsj",
            "bloomberg",
            "theguardian",
            "ft.com",
            "washingtonpost",
        ],
    ),
    (
        SourceType::Financial,
        &["tradingview", "yahoo", "marketwatch", "seekingalpha"],
    ),
    (
        SourceType::Crypto,
        &[
            "coindesk",
            "cointelegraph",
            "coingecko",
            "coinmarketcap",
            "theblock",
            "decrypt",
            "bitcoin",
        ],
    ),
    (
        SourceType::Social,
        &["twitter", "x.com", "reddit", "discord", "telegram"],
    ),
    (SourceType::Academic, &[".edu", ".ac.", "arxiv", "scholar"]),
    (SourceType::Blog, &["medium", "substack", "blog"]),
];

const TOP_DOMAINS_LIMIT: usize = 10;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Official,
    WireService,
    MajorNews,
    Financial,
    Crypto,
    Social,
    Academic,
    Blog,
    Forum,
    #[default]
    Unknown,
}

/// Five-band credibility of a visited domain.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DomainTier {
    #[serde(rename = "tier_1")]
    Tier1,
    #[serde(rename = "tier_2")]
    Tier2,
    #[serde(rename = "tier_3")]
    Tier3,
    #[serde(rename = "tier_4")]
    Tier4,
    #[default]
    #[serde(rename = "tier_5")]
    Tier5,
}

impl DomainTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            DomainTier::Tier1
        } else if score >= 0.7 {
            DomainTier::Tier2
        } else if score >= 0.5 {
            DomainTier::Tier3
        } else if score >= 0.3 {
            DomainTier::Tier4
        } else {
            DomainTier::Tier5
        }
    }
}

fn default_score() -> f64 {
    0.5
}

/// A page an agent visited while researching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteVisit {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub visited_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_snippet: String,
    /// Lowercased network location of `url`.
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub credibility_tier: DomainTier,
    #[serde(default = "default_score")]
    pub credibility_score: f64,
    #[serde(default = "default_score")]
    pub relevance_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub facts_extracted: Vec<String>,
}

impl WebsiteVisit {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            domain: url_domain(&url),
            url,
            title: title.into(),
            visited_at: Utc::now(),
            content_snippet: String::new(),
            source_type: SourceType::Unknown,
            credibility_tier: DomainTier::Tier5,
            credibility_score: default_score(),
            relevance_score: default_score(),
            agent_id: None,
            facts_extracted: Vec::new(),
        }
    }

    pub fn with_scores(mut self, credibility: f64, relevance: f64) -> Self {
        self.credibility_score = credibility;
        self.relevance_score = relevance;
        self
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance_score = relevance;
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.content_snippet = snippet.into();
        self
    }

    pub fn with_fact(mut self, fact: impl Into<String>) -> Self {
        self.facts_extracted.push(fact.into());
        self
    }

    pub fn at(mut self, visited_at: DateTime<Utc>) -> Self {
        self.visited_at = visited_at;
        self
    }

    fn combined_score(&self) -> f64 {
        self.credibility_score * self.relevance_score
    }
}

/// Network location of `url` (`[userinfo@]host[:port]`), lowercased.
///
/// Scheme-relative input (`//host/path`) is read as `http`. Default ports are
/// dropped. Empty when `url` does not parse or has no host.
pub fn url_domain(url: &str) -> String {
    let parsed = Url::parse(url).or_else(|err| match err {
        ParseError::RelativeUrlWithoutBase if url.starts_with("//") => {
            Url::parse(&format!("http:{url}"))
        }
        other => Err(other),
    });
    let Ok(parsed) = parsed else {
        return String::new();
    };
    let Some(host) = parsed.host_str() else {
        return String::new();
    };

    let mut netloc = String::new();
    if !parsed.username().is_empty() || parsed.password().is_some() {
        netloc.push_str(parsed.username());
        if let Some(password) = parsed.password() {
            netloc.push(':');
            netloc.push_str(password);
        }
        netloc.push('@');
    }
    netloc.push_str(host);
    if let Some(port) = parsed.port() {
        netloc.push_str(&format!(":{port}"));
    }
    netloc.to_lowercase()
}

/// Credibility score in [0, 1] for a visited domain.
pub fn domain_credibility(domain: &str) -> f64 {
    if domain.is_empty() {
        return 0.3;
    }
    let domain = domain.to_lowercase();
    let matches = |patterns: &[&str]| patterns.iter().any(|p| domain.contains(p));

    if matches(TIER_1_DOMAINS) {
        0.95
    } else if matches(TIER_2_DOMAINS) {
        0.82
    } else if matches(TIER_3_DOMAINS) {
        0.67
    } else if matches(TIER_4_DOMAINS) {
        0.45
    } else if domain.contains(".edu") || domain.contains(".ac.") {
        0.75
    } else if domain.contains(".org") {
        0.55
    } else {
        0.35
    }
}

pub fn categorize_domain(domain: &str) -> SourceType {
    let domain = domain.to_lowercase();
    if domain.is_empty() {
        return SourceType::Unknown;
    }
    SOURCE_TYPE_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| domain.contains(m)))
        .map(|(source_type, _)| *source_type)
        .unwrap_or_default()
}

/// Aggregate view over a tracker's visits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisitStatistics {
    pub total_visits: usize,
    pub unique_domains: usize,
    /// Rounded to three decimals.
    pub avg_credibility: f64,
    pub tier_distribution: BTreeMap<DomainTier, usize>,
    pub type_distribution: BTreeMap<SourceType, usize>,
    /// Sorted, at most ten.
    pub top_domains: Vec<String>,
}

/// Collects the website visits of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteTracker {
    pub agent_id: String,
    #[serde(default)]
    pub visits: Vec<WebsiteVisit>,
}

impl WebsiteTracker {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            visits: Vec::new(),
        }
    }

    /// Record `visit`, scoring and categorizing it from its URL's domain.
    pub fn add_visit(&mut self, mut visit: WebsiteVisit) -> &WebsiteVisit {
        visit.domain = url_domain(&visit.url);
        visit.credibility_score = domain_credibility(&visit.domain);
        visit.credibility_tier = DomainTier::from_score(visit.credibility_score);
        visit.source_type = categorize_domain(&visit.domain);
        visit.agent_id = Some(self.agent_id.clone());

        debug!(
            agent_id = %self.agent_id,
            domain = %visit.domain,
            credibility = visit.credibility_score,
            source_type = ?visit.source_type,
            "website visit recorded"
        );

        self.visits.push(visit);
        &self.visits[self.visits.len() - 1]
    }

    /// Visits at or above `min_credibility`, best credibility times
    /// relevance first. Ties keep visit order.
    pub fn top_sources(&self, limit: usize, min_credibility: f64) -> Vec<&WebsiteVisit> {
        let mut filtered: Vec<&WebsiteVisit> = self
            .visits
            .iter()
            .filter(|v| v.credibility_score >= min_credibility)
            .collect();
        filtered.sort_by(|a, b| b.combined_score().total_cmp(&a.combined_score()));
        filtered.truncate(limit);
        filtered
    }

    pub fn by_tier(&self, tier: DomainTier) -> Vec<&WebsiteVisit> {
        self.visits
            .iter()
            .filter(|v| v.credibility_tier == tier)
            .collect()
    }

    pub fn by_source_type(&self, source_type: SourceType) -> Vec<&WebsiteVisit> {
        self.visits
            .iter()
            .filter(|v| v.source_type == source_type)
            .collect()
    }

    pub fn statistics(&self) -> VisitStatistics {
        if self.visits.is_empty() {
            return VisitStatistics::default();
        }

        let domains: BTreeSet<&str> = self
            .visits
            .iter()
            .map(|v| v.domain.as_str())
            .filter(|d| !d.is_empty())
            .collect();

        let total = ordered_sum(self.visits.iter().map(|v| v.credibility_score).collect());
        let avg = total / self.visits.len() as f64;

        let mut tier_distribution = BTreeMap::new();
        let mut type_distribution = BTreeMap::new();
        for visit in &self.visits {
            *tier_distribution.entry(visit.credibility_tier).or_insert(0) += 1;
            *type_distribution.entry(visit.source_type).or_insert(0) += 1;
        }

        VisitStatistics {
            total_visits: self.visits.len(),
            unique_domains: domains.len(),
            avg_credibility: (avg * 1000.0).round() / 1000.0,
            tier_distribution,
            type_distribution,
            top_domains: domains
                .into_iter()
                .take(TOP_DOMAINS_LIMIT)
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn into_visits(self) -> Vec<WebsiteVisit> {
        self.visits
    }
}
