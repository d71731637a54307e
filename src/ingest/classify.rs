//! Decides whether a response body is worth handing to the JSON parser.
//!
//! Relays and CDNs answer with HTML when the origin is down or when a bot
//! filter steps in. Those bodies are recognised here, before parsing, so they
//! surface as a blocked source instead of a confusing parse error.

/// Which kind of non-JSON page was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    None,
    /// CDN / bot-protection interstitial or edge error page.
    ProtectionBlock,
    AccessDenied,
    GenericNonJson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_json_like: bool,
    pub block_reason: BlockReason,
}

impl Classification {
    const JSON_LIKE: Classification = Classification {
        is_json_like: true,
        block_reason: BlockReason::None,
    };
}

const DOCUMENT_PREFIXES: &[&str] = &[
    "<!doctype",
    "<html",
    "<head",
    "<body",
    "<?xml",
    "<title",
    "<meta",
];

const PROTECTION_FINGERPRINTS: &[&str] = &[
    "cloudflare",
    "cf-ray",
    "ray id",
    "cf-error",
    "attention required",
    "checking your browser",
    "ddos protection",
    "error 1020",
    "error 520",
    "error 521",
    "error 522",
    "error 523",
    "error 524",
    "error 525",
    "error 526",
    "origin is unreachable",
    "web server is down",
];

const ACCESS_FINGERPRINTS: &[&str] = &[
    "access denied",
    "403 forbidden",
    "not authorized",
    "permission denied",
    "forbidden",
];

/// Classifies (already preprocessed) response text. Never parses it.
pub fn classify(text: &str) -> Classification {
    let lower = text.trim().to_ascii_lowercase();

    if !looks_like_markup(&lower) {
        return Classification::JSON_LIKE;
    }

    let block_reason = if contains_any(&lower, PROTECTION_FINGERPRINTS) {
        BlockReason::ProtectionBlock
    } else if contains_any(&lower, ACCESS_FINGERPRINTS) {
        BlockReason::AccessDenied
    } else {
        BlockReason::GenericNonJson
    };

    Classification {
        is_json_like: false,
        block_reason,
    }
}

fn looks_like_markup(lower: &str) -> bool {
    if DOCUMENT_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return true;
    }

    if lower.contains("<html") && (lower.contains("<head") || lower.contains("<body")) {
        return true;
    }

    let opens_json = matches!(lower.chars().next(), Some('{') | Some('['));
    !opens_json
        && (lower.contains("<title>") || lower.contains("error") || lower.contains("forbidden"))
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
