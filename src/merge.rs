//! # Metadata Merge
//!
//! Combines the metadata parsed from a module's source script with the
//! module's manifest. The body is never touched.
//!
//! Rules, applied in order:
//!
//! 1. Every dependency URL is appended as a `@require` entry. Duplicates are
//!    kept.
//! 2. The whole list is sorted (stable) by `key + padding + value`, which
//!    orders by key, then by value among repeated keys.
//! 3. Configured fields are applied in reverse declaration order. An existing
//!    entry is overwritten only by a non-empty configured value. A missing
//!    entry is inserted at the front with the configured value, else the
//!    default, else nothing. `@version` is always inserted, even empty, since
//!    the version is filled in later and its position takes part in the
//!    unchanged-build comparison.
//! 4. Fixed fields (name, namespace, version, description, author) keep a
//!    single entry. Repeats left over from the source script are dropped.

use crate::manifest::{BuildInfo, Requires, FIXED_KEYS};
use crate::script::{Document, REQUIRE_KEY, VERSION_KEY};

/// Merge `info` and `requires` into `doc` in place.
pub fn merge(doc: &mut Document, info: &BuildInfo, requires: &Requires) {
    for url in requires.iter() {
        doc.metadata.push(REQUIRE_KEY, url);
    }

    doc.metadata.sort();

    for (key, value) in info.fields().rev() {
        match doc.metadata.position(key) {
            Some(index) => {
                if !value.is_empty() {
                    doc.metadata.set_at(index, value);
                }
            }
            None => {
                let resolved = if value.is_empty() {
                    info.default_for(key).unwrap_or("")
                } else {
                    value
                };
                if !resolved.is_empty() || key == VERSION_KEY {
                    doc.metadata.insert_front(key, resolved);
                }
            }
        }
        if FIXED_KEYS.contains(&key) {
            doc.metadata.retain_first(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{AUTHOR_KEY, NAMESPACE_KEY, NAME_KEY};
    use crate::script::{Document, Metadata};

    fn source(meta: &[(&str, &str)]) -> Document {
        Document::new(
            meta.iter().copied().collect::<Metadata>(),
            vec!["run();".to_string()],
        )
    }

    fn pairs(doc: &Document) -> Vec<(&str, &str)> {
        doc.metadata.iter().collect()
    }

    #[test]
    fn test_merge_inserts_fixed_fields_in_order() {
        let mut doc = source(&[("@match", "https://a/*"), ("@grant", "none")]);
        let info = BuildInfo::new("Demo", "", "", "Does things", "")
            .with_default(NAME_KEY, "demo")
            .with_default(NAMESPACE_KEY, "bid.example")
            .with_default(AUTHOR_KEY, "me");

        merge(&mut doc, &info, &Requires::default());

        assert_eq!(
            pairs(&doc),
            vec![
                ("@name", "Demo"),
                ("@namespace", "bid.example"),
                ("@version", ""),
                ("@description", "Does things"),
                ("@author", "me"),
                ("@grant", "none"),
                ("@match", "https://a/*"),
            ]
        );
        assert_eq!(doc.body, vec!["run();"]);
    }

    #[test]
    fn test_merge_keeps_parsed_value_when_config_empty() {
        let mut doc = source(&[("@description", "from script"), ("@name", "Script")]);
        let info = BuildInfo::new("", "", "", "", "").with_default(NAME_KEY, "demo");

        merge(&mut doc, &info, &Requires::default());

        assert_eq!(doc.metadata.get("@description"), Some("from script"));
        assert_eq!(doc.metadata.get("@name"), Some("Script"));
        assert_eq!(doc.metadata.get_all("@name").count(), 1);
    }

    #[test]
    fn test_merge_overwrites_with_configured_value() {
        let mut doc = source(&[("@name", "Script")]);
        let info = BuildInfo::new("Configured", "", "", "", "");

        merge(&mut doc, &info, &Requires::default());

        assert_eq!(doc.metadata.get("@name"), Some("Configured"));
        assert_eq!(doc.metadata.get_all("@name").count(), 1);
    }

    #[test]
    fn test_merge_collapses_repeated_fixed_key() {
        let mut doc = source(&[("@name", "A"), ("@name", "B"), ("@version", "1"), ("@version", "2")]);
        let info = BuildInfo::new("Configured", "", "", "", "");

        merge(&mut doc, &info, &Requires::default());

        assert_eq!(doc.metadata.get_all("@name").collect::<Vec<_>>(), vec!["Configured"]);
        assert_eq!(doc.metadata.get_all("@version").count(), 1);
    }

    #[test]
    fn test_merge_collapses_repeated_fixed_key_without_config() {
        let mut doc = source(&[("@author", "first"), ("@author", "second")]);
        let info = BuildInfo::new("", "", "", "", "");

        merge(&mut doc, &info, &Requires::default());

        assert_eq!(doc.metadata.get_all("@author").collect::<Vec<_>>(), vec!["first"]);
    }

    #[test]
    fn test_merge_keeps_repeated_extra_keys() {
        let mut doc = source(&[("@match", "https://a/*"), ("@match", "https://b/*")]);
        let info = BuildInfo::new("Demo", "", "", "", "").with_extra("match", "https://c/*");

        merge(&mut doc, &info, &Requires::default());

        assert_eq!(
            doc.metadata.get_all("@match").collect::<Vec<_>>(),
            vec!["https://c/*", "https://b/*"]
        );
    }

    #[test]
    fn test_merge_omits_empty_fields_without_default() {
        let mut doc = source(&[]);
        let info = BuildInfo::new("", "", "", "", "").with_default(NAME_KEY, "demo");

        merge(&mut doc, &info, &Requires::default());

        assert_eq!(pairs(&doc), vec![("@name", "demo"), ("@version", "")]);
    }

    #[test]
    fn test_merge_requires_are_sorted_and_duplicates_kept() {
        let mut doc = source(&[("@require", "https://c/lib.js")]);
        let requires = Requires::new(vec![
            "https://b/lib.js".to_string(),
            "https://a/lib.js".to_string(),
            "https://b/lib.js".to_string(),
        ]);
        let info = BuildInfo::new("", "", "", "", "");

        merge(&mut doc, &info, &requires);

        assert_eq!(
            doc.metadata.get_all("@require").collect::<Vec<_>>(),
            vec![
                "https://a/lib.js",
                "https://b/lib.js",
                "https://b/lib.js",
                "https://c/lib.js"
            ]
        );
    }

    #[test]
    fn test_merge_extras_follow_fixed_fields() {
        let mut doc = source(&[("@grant", "none")]);
        let info = BuildInfo::new("Demo", "", "", "", "")
            .with_extra("description_en", "English")
            .with_extra("grant", "GM_xmlhttpRequest");

        merge(&mut doc, &info, &Requires::default());

        assert_eq!(
            pairs(&doc),
            vec![
                ("@name", "Demo"),
                ("@version", ""),
                ("@description:en", "English"),
                ("@grant", "GM_xmlhttpRequest"),
            ]
        );
    }

    #[test]
    fn test_merge_is_stable_across_runs() {
        let info = BuildInfo::new("Demo", "", "1.0", "", "").with_extra("grant", "none");
        let requires = Requires::new(vec!["https://a/lib.js".to_string()]);

        let mut first = source(&[("@match", "https://x/*"), ("@icon", "i.png")]);
        merge(&mut first, &info, &requires);
        let mut second = source(&[("@icon", "i.png"), ("@match", "https://x/*")]);
        merge(&mut second, &info, &requires);

        assert_eq!(first, second);
    }
}
