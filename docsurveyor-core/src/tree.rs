//! Structure tree rendering.
//!
//! Only one level of nesting is drawn: top-level collections, then the
//! documents that own subcollections, then those subcollections. Deeper
//! paths are still present in the summaries but are not drawn.

use std::collections::BTreeMap;

use crate::models::CollectionSummary;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

type Subcollections<'a> = BTreeMap<&'a str, &'a CollectionSummary>;

fn label(name: &str, summary: &CollectionSummary) -> String {
    format!("{} ({} documents)", name, summary.display_count())
}

fn connector(is_last: bool) -> &'static str {
    if is_last { LAST_BRANCH } else { BRANCH }
}

fn continuation(is_last: bool) -> &'static str {
    if is_last { SPACE } else { PIPE }
}

/// Renders the collection summaries as a box-drawing tree.
///
/// Siblings are sorted lexicographically regardless of traversal order.
/// Returns an empty string when there are no top-level collections.
pub fn build_tree(summaries: &BTreeMap<String, CollectionSummary>) -> String {
    let mut top_level: BTreeMap<&str, &CollectionSummary> = BTreeMap::new();
    let mut nested: BTreeMap<&str, BTreeMap<&str, Subcollections<'_>>> = BTreeMap::new();

    for (path, summary) in summaries {
        let segments: Vec<&str> = path.split('/').collect();
        match *segments.as_slice() {
            [collection] => {
                top_level.insert(collection, summary);
            }
            [collection, document, subcollection] => {
                nested
                    .entry(collection)
                    .or_default()
                    .entry(document)
                    .or_default()
                    .insert(subcollection, summary);
            }
            _ => {}
        }
    }

    let mut lines = Vec::new();
    let top_count = top_level.len();
    for (i, (collection, summary)) in top_level.iter().enumerate() {
        let top_last = i + 1 == top_count;
        lines.push(format!("{}{}", connector(top_last), label(collection, summary)));

        let Some(documents) = nested.get(collection) else {
            continue;
        };
        let top_prefix = continuation(top_last);
        let document_count = documents.len();
        for (j, (document, subcollections)) in documents.iter().enumerate() {
            let document_last = j + 1 == document_count;
            lines.push(format!("{}{}{}", top_prefix, connector(document_last), document));

            let document_prefix = format!("{}{}", top_prefix, continuation(document_last));
            let sub_count = subcollections.len();
            for (k, (subcollection, sub_summary)) in subcollections.iter().enumerate() {
                lines.push(format!(
                    "{}{}{}",
                    document_prefix,
                    connector(k + 1 == sub_count),
                    label(subcollection, sub_summary)
                ));
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentCount;

    fn summary(path: &str, sampled: usize, counted: Option<DocumentCount>) -> (String, CollectionSummary) {
        let mut s = CollectionSummary::new(path);
        s.sampled_docs = sampled;
        s.counted = counted;
        (path.to_string(), s)
    }

    #[test]
    fn test_empty_tree() {
        assert_eq!(build_tree(&BTreeMap::new()), "");
    }

    #[test]
    fn test_tree_layout() {
        let summaries: BTreeMap<_, _> = [
            summary("users", 2, Some(DocumentCount::Exact(3))),
            summary("users/bob/orders", 1, None),
            summary("users/alice/orders", 2, None),
            summary("users/alice/likes", 0, Some(DocumentCount::Unknown)),
            summary("audit", 0, Some(DocumentCount::AtLeast(1000))),
        ]
        .into_iter()
        .collect();

        let expected = [
            "├── audit (1000+ documents)",
            "└── users (3 documents)",
            "    ├── alice",
            "    │   ├── likes (0 documents)",
            "    │   └── orders (2 documents)",
            "    └── bob",
            "        └── orders (1 documents)",
        ]
        .join("\n");

        assert_eq!(build_tree(&summaries), expected);
    }

    #[test]
    fn test_non_last_top_level_uses_pipe() {
        let summaries: BTreeMap<_, _> = [
            summary("a", 1, None),
            summary("a/d1/sub", 1, None),
            summary("b", 1, None),
        ]
        .into_iter()
        .collect();

        let expected = [
            "├── a (1 documents)",
            "│   └── d1",
            "│       └── sub (1 documents)",
            "└── b (1 documents)",
        ]
        .join("\n");

        assert_eq!(build_tree(&summaries), expected);
    }

    #[test]
    fn test_deeper_paths_not_drawn() {
        let summaries: BTreeMap<_, _> = [
            summary("a", 1, None),
            summary("a/d1/sub", 1, None),
            summary("a/d1/sub/d2/deep", 1, None),
        ]
        .into_iter()
        .collect();

        assert!(!build_tree(&summaries).contains("deep"));
    }
}
