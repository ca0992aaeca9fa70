use std::env;
use std::sync::OnceLock;

static STATEGRAPH_VERIFY: OnceLock<bool> = OnceLock::new();

fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

pub(crate) fn verify_enabled() -> bool {
    *STATEGRAPH_VERIFY.get_or_init(|| match env::var("STATEGRAPH_VERIFY") {
        Ok(value) if !value.trim().is_empty() => parse_bool(&value),
        _ => false,
    })
}
