//! Browser identifier expansion

/// Browser used when none is requested
pub const DEFAULT_BROWSER: &str = "chrome_1440_900";

/// Family shorthands and the browsers they stand for
const BROWSER_FAMILIES: &[(&str, &[&str])] = &[
    (
        "desktop",
        &[
            "chrome_1440_900",
            "firefox_1440_900",
            "safari_1440_900",
            "edge_1440_900",
        ],
    ),
    ("mobile", &["ios_phone", "android_phone"]),
    ("tablet", &["ios_tablet", "android_tablet"]),
];

/// Expand browser arguments into fully qualified identifiers.
///
/// Entries may be comma separated. Family names are replaced in place by
/// their members; everything else passes through. Order is preserved and
/// nothing is deduplicated.
pub fn expand_browsers<S: AsRef<str>>(browsers: &[S]) -> Vec<String> {
    let mut expanded = Vec::new();

    for entry in browsers {
        for name in entry.as_ref().split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match family_members(name) {
                Some(members) => expanded.extend(members.iter().map(|m| m.to_string())),
                None => expanded.push(name.to_string()),
            }
        }
    }

    if expanded.is_empty() {
        expanded.push(DEFAULT_BROWSER.to_string());
    }
    expanded
}

fn family_members(name: &str) -> Option<&'static [&'static str]> {
    BROWSER_FAMILIES
        .iter()
        .find(|(family, _)| family.eq_ignore_ascii_case(name))
        .map(|(_, members)| *members)
}
