/// Deterministic naming transforms
///
/// These pure functions are part of the compiler's deterministic-naming
/// contract: the same definition name always yields the same task queue,
/// identifier and workflow class name in generated artifacts.

/// Lowercase slug: non-alphanumeric runs collapse to a single `-`,
/// leading/trailing separators are trimmed, empty input falls back to
/// `"workflow"`.
pub fn slugify(name: &str) -> String {
    let slug = squash(name, '-');
    if slug.is_empty() {
        "workflow".to_string()
    } else {
        slug
    }
}

/// Slug with `_` separators, safe to use as a code identifier: a leading
/// digit is prefixed with `_`, empty input falls back to `"workflow"`.
pub fn identifier_name(name: &str) -> String {
    let ident = squash(name, '_');
    if ident.is_empty() {
        return "workflow".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{ident}")
    } else {
        ident
    }
}

/// Title-cased words concatenated with a `Workflow` suffix,
/// e.g. `"my cool flow"` becomes `"MyCoolFlowWorkflow"`.
pub fn class_case(name: &str) -> String {
    let mut out = String::new();
    for word in name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out.push_str("Workflow");
    out
}

/// Parse an ISO-8601-style duration of the shape
/// `PT(\d+H)?(\d+M)?(\d+S)?` into total seconds.
///
/// Components must appear in H, M, S order; missing components count as
/// zero, so `"PT"` parses to 0. Anything outside the pattern yields `None`.
pub fn parse_duration(s: &str) -> Option<u64> {
    let mut rest = s.strip_prefix("PT")?;
    let mut total: u64 = 0;
    for (unit, secs) in [('H', 3600), ('M', 60), ('S', 1)] {
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        if digits > 0 && rest[digits..].starts_with(unit) {
            let value: u64 = rest[..digits].parse().ok()?;
            total += value * secs;
            rest = &rest[digits + 1..];
        }
    }
    rest.is_empty().then_some(total)
}

fn squash(name: &str, sep: char) -> String {
    let mut out = String::new();
    let mut gap = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if gap && !out.is_empty() {
                out.push(sep);
            }
            gap = false;
            out.push(ch);
        } else {
            gap = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("My Cool Workflow"), "my-cool-workflow");
    }

    #[test]
    fn slugify_collapses_runs_and_trims() {
        assert_eq!(slugify("  Hello --- World!! "), "hello-world");
        assert_eq!(slugify("a"), "a");
    }

    #[test]
    fn slugify_empty_falls_back() {
        assert_eq!(slugify(""), "workflow");
        assert_eq!(slugify("!!!"), "workflow");
    }

    #[test]
    fn identifier_name_prefixes_leading_digit() {
        assert_eq!(identifier_name("123abc"), "_123abc");
        assert_eq!(identifier_name("My Cool Workflow"), "my_cool_workflow");
        assert_eq!(identifier_name(""), "workflow");
    }

    #[test]
    fn class_case_titlecases_and_suffixes() {
        assert_eq!(class_case("my cool flow"), "MyCoolFlowWorkflow");
        assert_eq!(class_case("ETL nightly"), "EtlNightlyWorkflow");
        assert_eq!(class_case(""), "Workflow");
    }

    #[test]
    fn parse_duration_components() {
        assert_eq!(parse_duration("PT1H30M"), Some(5400));
        assert_eq!(parse_duration("PT45S"), Some(45));
        assert_eq!(parse_duration("PT2H"), Some(7200));
        assert_eq!(parse_duration("PT1H2M3S"), Some(3723));
    }

    #[test]
    fn parse_duration_defaults_missing_components_to_zero() {
        assert_eq!(parse_duration("PT"), Some(0));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("garbage"), None);
        assert_eq!(parse_duration("PT5"), None);
        assert_eq!(parse_duration("PT30M1H"), None);
        assert_eq!(parse_duration(""), None);
    }
}
