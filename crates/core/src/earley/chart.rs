//! Chart construction shared by the parser and the completer.
//!
//! Item sets are built left to right. Each item keeps every way it was
//! reached as a [`Link`] so that all derivations can be recovered later
//! without re-parsing.

use std::collections::HashMap;
use std::sync::Arc;

use crate::grammar::{Grammar, Rule, Symbol};
use crate::lexer::Token;

/// Position of an item: (set index, item index within the set).
pub type ItemRef = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    /// Index of the scanned token.
    Token(usize),
    /// A complete item for the nonterminal before the dot.
    Item(ItemRef),
}

/// One way an item was advanced: from `prev` (same rule, one dot back)
/// over `child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub prev: ItemRef,
    pub child: Child,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub rule: Arc<Rule>,
    pub dot: usize,
    pub origin: usize,
    pub links: Vec<Link>,
    /// Rules whose prediction introduced this item, in discovery order.
    pub predicted_by: Vec<Arc<Rule>>,
}

impl Item {
    pub fn is_complete(&self) -> bool {
        self.dot == self.rule.symbols.len()
    }

    pub fn next_symbol(&self) -> Option<&Symbol> {
        self.rule.symbols.get(self.dot)
    }
}

type Key = (usize, usize, usize);

fn rule_key(rule: &Arc<Rule>) -> usize {
    Arc::as_ptr(rule) as usize
}

#[derive(Debug, Default)]
pub struct ItemSet {
    pub items: Vec<Item>,
    index: HashMap<Key, usize>,
}

impl ItemSet {
    /// Add an item or merge into an existing one. Returns its index.
    fn add(
        &mut self,
        rule: &Arc<Rule>,
        dot: usize,
        origin: usize,
        link: Option<Link>,
        predicted_by: &[Arc<Rule>],
    ) -> usize {
        let key = (rule_key(rule), dot, origin);
        let index = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.items.push(Item {
                    rule: Arc::clone(rule),
                    dot,
                    origin,
                    links: Vec::new(),
                    predicted_by: Vec::new(),
                });
                let i = self.items.len() - 1;
                self.index.insert(key, i);
                i
            }
        };
        let item = &mut self.items[index];
        if let Some(link) = link {
            if !item.links.contains(&link) {
                item.links.push(link);
            }
        }
        for by in predicted_by {
            if !item.predicted_by.iter().any(|r| Arc::ptr_eq(r, by)) {
                item.predicted_by.push(Arc::clone(by));
            }
        }
        index
    }
}

#[derive(Debug)]
pub struct Chart {
    pub sets: Vec<ItemSet>,
}

impl Chart {
    /// Build item sets `S_0 ..= S_limit` for `start` over `tokens`.
    ///
    /// Stops early when a set ends up empty; the returned chart then has
    /// fewer than `limit + 1` sets.
    pub fn build(grammar: &Grammar, start: &str, tokens: &[Token], limit: usize) -> Chart {
        let limit = limit.min(tokens.len());
        let mut sets: Vec<ItemSet> = (0..=limit).map(|_| ItemSet::default()).collect();
        for rule in grammar.rules_for(start) {
            sets[0].add(rule, 0, 0, None, &[]);
        }

        for i in 0..=limit {
            if sets[i].items.is_empty() {
                sets.truncate(i);
                break;
            }
            let mut j = 0;
            while j < sets[i].items.len() {
                let item = &sets[i].items[j];
                let rule = Arc::clone(&item.rule);
                let (dot, origin) = (item.dot, item.origin);
                let predicted_by = item.predicted_by.clone();

                match rule.symbols.get(dot) {
                    None => Self::complete(&mut sets, i, j, &rule, origin),
                    Some(Symbol::NonTerminal(name)) => {
                        let by = [Arc::clone(&rule)];
                        for predicted in grammar.rules_for(name) {
                            sets[i].add(predicted, 0, i, None, &by);
                        }
                    }
                    Some(Symbol::Terminal(spec)) => {
                        if i < limit && spec.matches(&tokens[i]) {
                            let link = Link {
                                prev: (i, j),
                                child: Child::Token(i),
                            };
                            sets[i + 1].add(&rule, dot + 1, origin, Some(link), &predicted_by);
                        }
                    }
                }
                j += 1;
            }
        }
        Chart { sets }
    }

    /// Advance every item in `S_origin` waiting on the rule just completed
    /// at `(i, j)`. Rules are never empty, so `origin < i`.
    fn complete(sets: &mut [ItemSet], i: usize, j: usize, rule: &Arc<Rule>, origin: usize) {
        let mut waiting = Vec::new();
        for (k, parent) in sets[origin].items.iter().enumerate() {
            if let Some(Symbol::NonTerminal(name)) = parent.next_symbol() {
                if *name == rule.name {
                    waiting.push((
                        Arc::clone(&parent.rule),
                        parent.dot,
                        parent.origin,
                        k,
                        parent.predicted_by.clone(),
                    ));
                }
            }
        }
        for (parent_rule, dot, parent_origin, k, predicted_by) in waiting {
            let link = Link {
                prev: (origin, k),
                child: Child::Item((i, j)),
            };
            sets[i].add(&parent_rule, dot + 1, parent_origin, Some(link), &predicted_by);
        }
    }

    pub fn item(&self, at: ItemRef) -> Option<&Item> {
        self.sets.get(at.0)?.items.get(at.1)
    }

    /// Number of tokens the chart got through.
    pub fn reached(&self) -> usize {
        self.sets.len().saturating_sub(1)
    }

    /// Complete items for `start` spanning the whole of `S_0 .. S_end`.
    pub fn finished(&self, start: &str, end: usize) -> Vec<ItemRef> {
        let Some(set) = self.sets.get(end) else {
            return Vec::new();
        };
        set.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.origin == 0 && item.is_complete() && item.rule.name == start)
            .map(|(j, _)| (end, j))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Action, Rule};
    use crate::lexer::{tokenize, TokenKind};

    fn grammar() -> Grammar {
        Grammar::from_rules([
            Rule::new("e", vec![Symbol::nt("e"), Symbol::word("+"), Symbol::nt("e")], Action::Nothing),
            Rule::new("e", vec![Symbol::token(TokenKind::Number)], Action::Number),
        ])
        .expect("grammar")
    }

    #[test]
    fn recognizes_full_input() {
        let tokens = tokenize("1 + 2");
        let g = grammar();
        let chart = Chart::build(&g, "e", &tokens, tokens.len());
        assert_eq!(chart.reached(), 3);
        assert_eq!(chart.finished("e", 3).len(), 1);
    }

    #[test]
    fn ambiguity_is_kept_as_links() {
        let tokens = tokenize("1 + 2 + 3");
        let g = grammar();
        let chart = Chart::build(&g, "e", &tokens, tokens.len());
        let done = chart.finished("e", 5);
        assert_eq!(done.len(), 1);
        let item = chart.item(done[0]).expect("item");
        assert_eq!(item.links.len(), 2);
    }

    #[test]
    fn dead_chart_stops_early() {
        let tokens = tokenize("1 2");
        let g = grammar();
        let chart = Chart::build(&g, "e", &tokens, tokens.len());
        assert_eq!(chart.reached(), 1);
        assert!(chart.finished("e", 2).is_empty());
    }
}
