use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// URL slug for a title: lowercase ASCII, diacritics stripped, words joined
/// with single hyphens.
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(cleaned.len());
    for c in cleaned.trim().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}

/// First of `base`, `base-2`, `base-3`, ... for which `taken` is false. An
/// empty `base` is replaced by `fallback`.
pub fn unique_slug(base: &str, fallback: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = if base.is_empty() { fallback } else { base };
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_czech() {
        assert_eq!(slugify("Příměstský tábor 2025"), "primestsky-tabor-2025");
        assert_eq!(slugify("Žluťoučký kůň úpěl ďábelské ódy"), "zlutoucky-kun-upel-dabelske-ody");
    }

    #[test]
    fn test_slugify_punctuation_and_spacing() {
        assert_eq!(slugify("Hello,   World!"), "hello-world");
        assert_eq!(slugify("a - b -- c"), "a-b-c");
        assert_eq!(slugify("  padded  "), "padded");
        assert_eq!(slugify("- Tábor! -"), "tabor");
    }

    #[test]
    fn test_unique_slug() {
        let existing = ["novinky", "novinky-2"];
        let slug = unique_slug("novinky", "clanek", |s| existing.contains(&s));
        assert_eq!(slug, "novinky-3");
        assert_eq!(unique_slug("jine", "clanek", |s| existing.contains(&s)), "jine");
        assert_eq!(unique_slug("", "clanek", |_| false), "clanek");
        assert_eq!(unique_slug("", "udalost", |s| s == "udalost"), "udalost-2");
    }
}
