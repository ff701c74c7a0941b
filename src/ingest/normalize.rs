// src/ingest/normalize.rs
use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered removal patterns. Order matters: markdown links must go before bare URLs.
static STRIP: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // [text](https://...)
        r"\[[^\]]+\]\(https?://[^\s)]+\)",
        // ( https://... )
        r"\(\s*https?://[^\s)]+\s*\)",
        // [example.com]
        r"\[\s*[a-zA-Z0-9.-]+\.[a-z]{2,}\s*\]",
        // [📹] [📷] [🖼] [🎥]
        r"\[(?:📹|📷|🖼\x{FE0F}?|🎥)\]",
        r"https?://\S+",
        r"/%[0-9A-Fa-f]{2}",
        r"%[0-9A-Fa-f]{2}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Channel signatures and footers (case-insensitive). Longer variants first.
static SIGNATURES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"_+Farsi_Iranwire_+",
        r"-- _IranintlTV",
        r"VahidHeadline@ \W+",
        r"VahidOnline@ \W+",
        r"VahidOOnLine@ \W+",
        r"VahidHeadline@",
        r"VahidOnline@",
        r"VahidOOnLine@",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static RE_TRAILING: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+\n").unwrap());
static RE_BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Clean a message body: links, URLs, escape junk and signatures out;
/// blank-line runs collapsed; surrounding whitespace trimmed.
pub fn normalize_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut out = raw.to_string();
    for re in STRIP.iter().chain(SIGNATURES.iter()) {
        out = re.replace_all(&out, "").into_owned();
    }

    out = RE_HSPACE.replace_all(&out, " ").into_owned();
    out = RE_TRAILING.replace_all(&out, "\n").into_owned();
    out = RE_BLANKS.replace_all(&out, "\n\n").into_owned();

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_and_bare_urls_are_dropped() {
        let s = "Check [this](https://x.co/a) out https://y.co";
        assert_eq!(normalize_text(s), "Check out");
    }

    #[test]
    fn bracket_junk_and_glyphs_removed() {
        let s = "Report [iranwire.com] [📷] (https://a.b/c) end";
        assert_eq!(normalize_text(s), "Report end");
    }

    #[test]
    fn percent_remnants_removed() {
        assert_eq!(normalize_text("a/%D8b%20c"), "abc");
    }

    #[test]
    fn signatures_case_insensitive() {
        let s = "News body\n\nvahidonline@ 👇\n-- _IranintlTV";
        assert_eq!(normalize_text(s), "News body");
    }

    #[test]
    fn blank_line_runs_collapse() {
        let s = "one\n\n\n  \n\ntwo  \nthree";
        assert_eq!(normalize_text(s), "one\n\ntwo\nthree");
    }
}
