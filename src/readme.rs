//! README generation for built modules.
//!
//! Every `readme*.md` file in a module's source directory produces a README
//! of the same name in the build directory: a generated header (name,
//! namespace, author, version, description), the hand-written content, the
//! dependency list and the configured links. The text after `readme` names
//! the locale (`readme_en.md` -> `en`), which selects locale-suffixed
//! metadata such as `@description:en`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Link;
use crate::error::Result;
use crate::manifest::{AUTHOR_KEY, DESCRIPTION_KEY, NAMESPACE_KEY, NAME_KEY};
use crate::script::Document;

const README_PREFIX: &str = "readme";
const README_SUFFIX: &str = ".md";
const DEFAULT_README: &str = "README.md";

/// A hand-written README found next to a module's sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeSource {
    pub file_name: String,
    /// Empty for the default locale.
    pub locale: String,
    pub content: String,
}

/// Extract the locale from a README file name, or `None` when the name is
/// not a README.
///
/// A separator before the locale (`_`, `.`, `-`) is dropped.
pub fn readme_locale(file_name: &str) -> Option<String> {
    let lower = file_name.to_lowercase();
    let middle = lower
        .strip_prefix(README_PREFIX)?
        .strip_suffix(README_SUFFIX)?;
    let locale = match middle.chars().next() {
        Some(c) if !c.is_ascii_lowercase() => &middle[c.len_utf8()..],
        _ => middle,
    };
    Some(locale.to_string())
}

/// Collect the README sources of a module directory, sorted by file name.
pub fn find_sources(module_dir: &Path) -> Result<Vec<ReadmeSource>> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(module_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(locale) = readme_locale(&file_name) {
            let content = fs::read_to_string(entry.path())?;
            sources.push(ReadmeSource {
                file_name,
                locale,
                content,
            });
        }
    }
    sources.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(sources)
}

fn lookup<'a>(doc: &'a Document, key: &str, locale: &str) -> &'a str {
    if !locale.is_empty() {
        if let Some(v) = doc
            .metadata
            .get(&format!("{}:{}", key, locale))
            .filter(|v| !v.is_empty())
        {
            return v;
        }
    }
    doc.metadata.get(key).unwrap_or("")
}

/// Render one README for `module`.
pub fn render(
    module: &str,
    doc: &Document,
    requires: &[&str],
    links: &[Link],
    locale: &str,
    content: &str,
) -> String {
    let mut out = format!(
        "# {}  \n> {}  \n> author: {}  \n> version: {}\n\n__{}__  ",
        lookup(doc, NAME_KEY, locale),
        lookup(doc, NAMESPACE_KEY, locale),
        lookup(doc, AUTHOR_KEY, locale),
        doc.version().unwrap_or(""),
        lookup(doc, DESCRIPTION_KEY, locale),
    );

    if !content.is_empty() {
        out.push_str("\n\n");
        out.push_str(content);
    }

    if !requires.is_empty() {
        out.push_str("\n\n# Require\n");
        let items: Vec<String> = requires
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {}  ", i + 1, r))
            .collect();
        out.push_str(&items.join("\n"));
        out.push('\n');
    }

    if !links.is_empty() {
        out.push_str("\n\n# Link\n");
        for link in links {
            out.push_str(&format!("- [{}]({})  \n", link.title, link.url_for(module)));
        }
    }

    out
}

/// Write the README files of `module` into `dst_dir`, returning their paths.
pub fn generate(
    module: &str,
    doc: &Document,
    requires: &[&str],
    links: &[Link],
    src_dir: &Path,
    dst_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut sources = find_sources(src_dir)?;
    if sources.is_empty() {
        sources.push(ReadmeSource {
            file_name: DEFAULT_README.to_string(),
            locale: String::new(),
            content: String::new(),
        });
    }

    let mut written = Vec::with_capacity(sources.len());
    for source in sources {
        let path = dst_dir.join(&source.file_name);
        let text = render(module, doc, requires, links, &source.locale, &source.content);
        fs::write(&path, text)?;
        log::debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
