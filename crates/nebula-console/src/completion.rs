//! Keyword completion for interactive mode.
//!
//! The grammar is a fixed two-level prefix tree: a leading statement keyword
//! and the keywords allowed right after it. It only drives suggestions; lines
//! are never validated against it.

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

type Grammar = &'static [(&'static str, &'static [&'static str])];

const NEBULA_GRAMMAR: Grammar = &[
    (
        "SHOW",
        &[
            "HOSTS", "SPACES", "PARTS", "TAGS", "EDGES", "USERS", "ROLES", "USER", "CONFIGS",
        ],
    ),
    ("DESCRIBE", &["TAG", "EDGE", "SPACE"]),
    ("DESC", &["TAG", "EDGE", "SPACE"]),
    ("GET", &["CONFIGS"]),
    ("CREATE", &["SPACE", "TAG", "EDGE", "USER"]),
    ("DROP", &["SPACE", "TAG", "EDGE", "USER"]),
    ("ALTER", &["USER", "TAG", "EDGE"]),
    ("INSERT", &["VERTEX", "EDGE"]),
    ("UPDATE", &["CONFIGS", "VERTEX", "EDGE"]),
    ("UPSERT", &["VERTEX", "EDGE"]),
    ("DELETE", &["VERTEX", "EDGE"]),
    ("GRANT", &["ROLE"]),
    ("REVOKE", &["ROLE"]),
    ("CHANGE", &["PASSWORD"]),
    ("USE", &[]),
    ("EXIT", &[]),
    ("QUIT", &[]),
];

/// Immutable keyword tree shared by reference.
#[derive(Debug, Clone, Copy)]
pub struct CompletionTree {
    grammar: Grammar,
}

impl CompletionTree {
    pub fn nebula() -> Self {
        Self {
            grammar: NEBULA_GRAMMAR,
        }
    }

    /// Keywords that may complete `word`, given the complete tokens before it.
    ///
    /// Matching is case-insensitive; candidates are returned in grammar order.
    pub fn candidates(&self, preceding: &[&str], word: &str) -> Vec<&'static str> {
        let keywords: &[&'static str] = match preceding {
            [] => return filter_prefix(self.grammar.iter().map(|(kw, _)| *kw), word),
            [first] => match self
                .grammar
                .iter()
                .find(|(kw, _)| kw.eq_ignore_ascii_case(first))
            {
                Some((_, children)) => *children,
                None => &[],
            },
            _ => &[],
        };
        filter_prefix(keywords.iter().copied(), word)
    }
}

fn filter_prefix(keywords: impl Iterator<Item = &'static str>, word: &str) -> Vec<&'static str> {
    let word = word.to_ascii_uppercase();
    keywords.filter(|kw| kw.starts_with(&word)).collect()
}

/// rustyline helper wiring the keyword tree into tab completion.
pub struct ConsoleHelper {
    tree: CompletionTree,
}

impl ConsoleHelper {
    pub fn new(tree: CompletionTree) -> Self {
        Self { tree }
    }
}

impl Helper for ConsoleHelper {}

impl Highlighter for ConsoleHelper {}

impl Hinter for ConsoleHelper {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Validator for ConsoleHelper {}

impl Completer for ConsoleHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace())
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &line[start..pos];
        let preceding: Vec<&str> = line[..start].split_whitespace().collect();

        let pairs = self
            .tree
            .candidates(&preceding, word)
            .into_iter()
            .map(|kw| Pair {
                display: kw.to_string(),
                replacement: kw.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_token_completes_statement_keywords() {
        let tree = CompletionTree::nebula();
        assert_eq!(tree.candidates(&[], "sh"), vec!["SHOW"]);
        assert_eq!(tree.candidates(&[], "DES"), vec!["DESCRIBE", "DESC"]);
        assert_eq!(tree.candidates(&[], "u"), vec!["UPDATE", "UPSERT", "USE"]);
        assert!(tree.candidates(&[], "zzz").is_empty());
        assert_eq!(tree.candidates(&[], "").len(), NEBULA_GRAMMAR.len());
    }

    #[test]
    fn second_token_completes_children() {
        let tree = CompletionTree::nebula();
        assert_eq!(tree.candidates(&["show"], "s"), vec!["SPACES"]);
        assert_eq!(tree.candidates(&["SHOW"], "USER"), vec!["USERS", "USER"]);
        assert_eq!(tree.candidates(&["create"], ""), vec!["SPACE", "TAG", "EDGE", "USER"]);
        assert!(tree.candidates(&["GO"], "").is_empty());
        assert!(tree.candidates(&["USE"], "").is_empty());
    }

    #[test]
    fn deeper_tokens_get_no_suggestions() {
        let tree = CompletionTree::nebula();
        assert!(tree.candidates(&["CREATE", "TAG"], "").is_empty());
    }

    #[test]
    fn helper_replaces_only_the_current_word() {
        let helper = ConsoleHelper::new(CompletionTree::nebula());
        let history = rustyline::history::DefaultHistory::new();
        let ctx = Context::new(&history);

        let (start, pairs) = helper.complete("show sp", 7, &ctx).unwrap();
        assert_eq!(start, 5);
        let replacements: Vec<&str> = pairs.iter().map(|p| p.replacement.as_str()).collect();
        assert_eq!(replacements, vec!["SPACES"]);

        let (start, pairs) = helper.complete("dro", 3, &ctx).unwrap();
        assert_eq!(start, 0);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].display, "DROP");
    }
}
