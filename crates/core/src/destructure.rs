//! Array-destructuring callback parameters → explicit index reads.
//!
//! Covers the `filter`/`map`/`forEach` callback shapes that show up once
//! classes are gone and the file must run on an ES5 engine.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

static FILTER_ONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.filter\(function\(\[(\w+)\]\)\s*\{").expect("filter pattern"));

static MAP_IDENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.map\(function\(\[(\w+),\s*(\w+)\]\)\s*\{\s*return\s*\[(\w+),\s*(\w+)\];\s*\}\)")
        .expect("identity map pattern")
});

static MAP_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.map\(function\(\[(\w+),\s*(\w+)\]\)\s*\{").expect("map pattern"));

static FOR_EACH_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.forEach\(function\(\[(\w+),\s*(\w+)\]\)\s*\{").expect("forEach pattern"));

/// Apply every rewrite to `text`. Returns the new text and how many
/// callbacks were changed.
pub fn fix_destructuring(text: &str) -> (String, usize) {
    let mut count = 0;

    let text = FILTER_ONE_RE.replace_all(text, |caps: &Captures| {
        count += 1;
        format!(".filter(function(item) {{ var {} = item[0];", &caps[1])
    });

    // `[a, b] => [a, b]` collapses; any other pair body falls through to the next rule.
    let text = MAP_IDENTITY_RE.replace_all(&text, |caps: &Captures| {
        if caps[1] == caps[3] && caps[2] == caps[4] {
            count += 1;
            ".map(function(item) { return [item[0], item[1]]; })".to_string()
        } else {
            caps[0].to_string()
        }
    });

    let text = MAP_PAIR_RE.replace_all(&text, |caps: &Captures| {
        count += 1;
        format!(".map(function(item) {{ var {} = item[0]; var {} = item[1];", &caps[1], &caps[2])
    });

    let text = FOR_EACH_PAIR_RE.replace_all(&text, |caps: &Captures| {
        count += 1;
        format!(".forEach(function(entry) {{ var {} = entry[0]; var {} = entry[1];", &caps[1], &caps[2])
    });

    debug!(rewrites = count, "Fixed destructuring patterns");
    (text.into_owned(), count)
}
