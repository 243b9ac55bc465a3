use std::sync::LazyLock;

use graft_core::DetectionResult;
use regex::Regex;
use url::Url;

// Base-58 alphabet (no 0, O, I, l), 32-44 chars: the shape of a Solana mint.
static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("address regex"));

const SEGMENT_DELIMITER: char = '_';

enum Extraction {
    /// The first path component after the prefix; when it contains `_` the
    /// address is whatever follows the last one (sites prepend a numeric
    /// list id, e.g. `251185_<address>`).
    Segment,
    /// The first path component with a fixed trailing suffix removed.
    StripSuffix(&'static str),
}

struct SiteRule {
    host: &'static str,
    prefix: &'static str,
    extraction: Extraction,
}

const SITE_RULES: &[SiteRule] = &[
    SiteRule {
        host: "gmgn.ai",
        prefix: "/sol/token/",
        extraction: Extraction::Segment,
    },
    SiteRule {
        host: "debot.ai",
        prefix: "/token/solana/",
        extraction: Extraction::Segment,
    },
    SiteRule {
        host: "www.xxyy.io",
        prefix: "/sol/",
        extraction: Extraction::Segment,
    },
    SiteRule {
        host: "axiom.trade",
        prefix: "/meme/",
        extraction: Extraction::Segment,
    },
    SiteRule {
        host: "dbotx.com",
        prefix: "/token/solana/",
        extraction: Extraction::Segment,
    },
    SiteRule {
        host: "www.defined.fi",
        prefix: "/sol/",
        extraction: Extraction::Segment,
    },
    SiteRule {
        host: "ave.ai",
        prefix: "/token/",
        extraction: Extraction::StripSuffix("-solana"),
    },
];

/// Whether the URL belongs to a site the widget gets grafted onto at all.
pub fn is_supported(raw_url: &str) -> bool {
    match Url::parse(raw_url) {
        Ok(url) => rule_for(&url).is_some(),
        Err(_) => false,
    }
}

pub fn is_valid_address(candidate: &str) -> bool {
    ADDRESS_RE.is_match(candidate)
}

/// Never errors: malformed URLs, unsupported hosts, and candidates failing
/// validation all come back as "nothing detected".
pub fn detect(raw_url: &str) -> DetectionResult {
    let raw_address = extract_candidate(raw_url);
    let is_valid = raw_address.as_deref().map(is_valid_address).unwrap_or(false);
    DetectionResult {
        raw_address,
        is_valid,
    }
}

pub fn token_address(raw_url: &str) -> Option<String> {
    let result = detect(raw_url);
    if result.is_valid {
        result.raw_address
    } else {
        None
    }
}

fn rule_for(url: &Url) -> Option<&'static SiteRule> {
    let host = url.host_str()?;
    SITE_RULES
        .iter()
        .find(|rule| rule.host == host && url.path().starts_with(rule.prefix))
}

fn extract_candidate(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let rule = rule_for(&url)?;

    let rest = &url.path()[rule.prefix.len()..];
    let segment = rest.split('/').next().unwrap_or("");
    if segment.is_empty() {
        return None;
    }

    let candidate = match rule.extraction {
        Extraction::Segment => segment.rsplit(SEGMENT_DELIMITER).next().unwrap_or(segment),
        Extraction::StripSuffix(suffix) => segment.strip_suffix(suffix).unwrap_or(segment),
    };

    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}
