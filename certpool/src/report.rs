//! Text and JSON views of a [`Forest`].

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::certificate::{Certificate, CertificateKind};
use crate::forest::Forest;
use crate::pool::CertId;

/// Render the forest depth first, one certificate per line.
///
/// ```text
/// - Root (NZ)
///   - Intermediate (NZ)
///     X leaf.example (NZ) - certificate has expired. Not After: ...
/// ```
pub fn render_tree(forest: &Forest, now: DateTime<Utc>) -> String {
    forest
        .walk()
        .map(|(depth, id)| {
            let cert = &forest.pool()[id];
            let indent = "  ".repeat(depth);
            match cert.is_valid_at(now) {
                Ok(()) => format!("{indent}- {cert}\n"),
                Err(e) => format!("{indent}X {cert} - {e}\n"),
            }
        })
        .collect()
}

/// Bundle level counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub parse_errors: usize,
    pub expired: usize,
    pub invalid: usize,
}

impl Summary {
    pub fn from_forest(forest: &Forest, now: DateTime<Utc>) -> Self {
        let pool = forest.pool();
        Self {
            total: pool.total(),
            accepted: pool.len(),
            duplicates: pool.duplicates(),
            parse_errors: pool.parse_errors(),
            expired: pool.count_expired(now),
            invalid: pool.count_invalid(now),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total certificates: {}", self.total)?;
        writeln!(f, "Accepted: {}", self.accepted)?;
        writeln!(f, "Duplicates: {}", self.duplicates)?;
        writeln!(f, "Parse errors: {}", self.parse_errors)?;
        writeln!(f, "Expired: {}", self.expired)?;
        write!(f, "Invalid: {}", self.invalid)
    }
}

/// Serializable forest, for JSON output.
#[derive(Debug, Serialize)]
pub struct TreeReport {
    pub summary: Summary,
    pub roots: Vec<Node>,
}

#[derive(Debug, Serialize)]
pub struct Node {
    /// Position in the bundle after duplicates were dropped.
    pub index: usize,
    pub name: String,
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub kind: CertificateKind,
    pub not_before: String,
    pub not_after: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl TreeReport {
    pub fn new(forest: &Forest, now: DateTime<Utc>) -> Self {
        // open nodes of the current path, deepest last
        let mut path: Vec<Node> = Vec::new();
        let mut roots = Vec::new();

        for (depth, id) in forest.walk() {
            while path.len() > depth {
                close(&mut path, &mut roots);
            }
            path.push(Node::new(forest, id, now));
        }
        while !path.is_empty() {
            close(&mut path, &mut roots);
        }

        Self {
            summary: Summary::from_forest(forest, now),
            roots,
        }
    }
}

fn close(path: &mut Vec<Node>, roots: &mut Vec<Node>) {
    if let Some(node) = path.pop() {
        match path.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

impl Node {
    /// A node without children.
    fn new(forest: &Forest, id: CertId, now: DateTime<Utc>) -> Self {
        let cert: &Certificate = &forest.pool()[id];
        let error = cert.is_valid_at(now).err().map(|e| e.to_string());
        Self {
            index: id.index(),
            name: cert.display_name().to_string(),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial: cert.serial().to_string(),
            kind: cert.kind(),
            not_before: timestamp(cert.validity().not_before()),
            not_after: timestamp(cert.validity().not_after()),
            valid: error.is_none(),
            error,
            parents: cert.parents().iter().map(CertId::index).collect(),
            children: Vec::new(),
        }
    }
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestBuilder;
    use crate::testing::*;

    fn forest(pems: &[&str]) -> Forest {
        ForestBuilder::default().build(crate::bundle::load(bundle(pems).as_bytes()))
    }

    #[test]
    fn test_render_tree() {
        let forest = forest(&[ROOT_A, INTER_A, LEAF_A, ORPHAN, EXPIRED]);
        let rendered = render_tree(&forest, now());

        assert_eq!(
            rendered,
            "- Pemtools Test Root A (NZ)\n\
             \x20 - Pemtools Test Intermediate A (NZ)\n\
             \x20   - leaf.pemtools.test (NZ)\n\
             \x20 X expired.pemtools.test (NZ) - certificate has expired. Not After: 2021-01-01 00:00:00 UTC\n\
             X orphan.pemtools.test (DE) - no issuer certificate found for \"Pemtools Test Root B\"\n"
        );
    }

    #[test]
    fn test_render_tree_visits_children_of_invalid_nodes() {
        // inter_a has no issuer here but leaf_a still hangs below it
        let forest = forest(&[INTER_A, LEAF_A]);
        let rendered = render_tree(&forest, now());
        let lines = rendered.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("X Pemtools Test Intermediate A"));
        assert_eq!(lines[1], "  - leaf.pemtools.test (NZ)");
    }

    #[test]
    fn test_summary() {
        let forest = forest(&[ROOT_A, GARBAGE, INTER_A, ROOT_A, EXPIRED, ORPHAN]);
        let summary = Summary::from_forest(&forest, now());

        assert_eq!(
            summary,
            Summary {
                total: 6,
                accepted: 4,
                duplicates: 1,
                parse_errors: 1,
                expired: 1,
                invalid: 2,
            }
        );
        assert!(summary.to_string().starts_with("Total certificates: 6\n"));
        assert!(summary.to_string().ends_with("Invalid: 2"));
    }

    #[test]
    fn test_tree_report_json() {
        let forest = forest(&[ROOT_A, INTER_A, ORPHAN]);
        let report = TreeReport::new(&forest, now());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["summary"]["accepted"], 3);
        assert_eq!(json["roots"].as_array().unwrap().len(), 2);

        let root = &json["roots"][0];
        assert_eq!(root["name"], "Pemtools Test Root A");
        assert_eq!(root["kind"], "root_ca");
        assert_eq!(root["valid"], true);
        assert!(root.get("error").is_none());
        assert_eq!(root["children"][0]["name"], "Pemtools Test Intermediate A");
        assert_eq!(root["children"][0]["parents"][0], 0);

        let orphan = &json["roots"][1];
        assert_eq!(orphan["valid"], false);
        assert!(orphan["error"].as_str().unwrap().contains("no issuer"));
        assert!(orphan["not_after"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_tree_report_nesting_follows_walk() {
        let forest = forest(&[ROOT_A, INTER_A, LEAF_A, EXPIRED, ORPHAN]);
        let report = TreeReport::new(&forest, now());

        fn names(nodes: &[Node]) -> Vec<&str> {
            nodes.iter().map(|n| n.name.as_str()).collect()
        }
        assert_eq!(
            names(&report.roots),
            vec!["Pemtools Test Root A", "orphan.pemtools.test"]
        );
        let root = &report.roots[0];
        assert_eq!(
            names(&root.children),
            vec!["Pemtools Test Intermediate A", "expired.pemtools.test"]
        );
        assert_eq!(names(&root.children[0].children), vec!["leaf.pemtools.test"]);
        assert!(root.children[1].children.is_empty());
        assert!(report.roots[1].children.is_empty());
    }
}
