//! Parse trees recovered from a chart, and their evaluation.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use super::chart::{Chart, Child, ItemRef};
use crate::action::{Eval, Value};
use crate::grammar::Rule;

/// Derivations beyond this many are not enumerated.
pub const MAX_DERIVATIONS: usize = 64;

#[derive(Debug, Clone)]
pub enum Node {
    Token(usize),
    Tree(Rc<ParseTree>),
}

#[derive(Debug, Clone)]
pub struct ParseTree {
    pub rule: Arc<Rule>,
    pub children: Vec<Node>,
}

impl ParseTree {
    /// Evaluate bottom-up, applying each rule's action to its evaluated
    /// children.
    pub fn process(&self, eval: &mut Eval<'_>) -> Value {
        let children = self
            .children
            .iter()
            .map(|child| match child {
                Node::Token(i) => Value::Token(*i),
                Node::Tree(tree) => tree.process(eval),
            })
            .collect();
        eval.apply(&self.rule.action, children)
    }
}

type Sequences = Rc<Vec<Vec<Node>>>;

/// Enumerates derivations of chart items in link order, sharing
/// sub-results between alternatives.
pub struct Forest<'c> {
    chart: &'c Chart,
    trees: HashMap<ItemRef, Rc<Vec<Rc<ParseTree>>>>,
    sequences: HashMap<ItemRef, Sequences>,
    active: HashSet<ItemRef>,
}

impl<'c> Forest<'c> {
    pub fn new(chart: &'c Chart) -> Self {
        Forest {
            chart,
            trees: HashMap::new(),
            sequences: HashMap::new(),
            active: HashSet::new(),
        }
    }

    /// Every derivation of the complete item at `at`, up to
    /// [`MAX_DERIVATIONS`].
    pub fn trees(&mut self, at: ItemRef) -> Rc<Vec<Rc<ParseTree>>> {
        if let Some(done) = self.trees.get(&at) {
            return Rc::clone(done);
        }
        let Some(item) = self.chart.item(at) else {
            return Rc::new(Vec::new());
        };
        // a derivation that contains itself contributes nothing new
        if !self.active.insert(at) {
            return Rc::new(Vec::new());
        }
        let rule = Arc::clone(&item.rule);
        let trees: Vec<Rc<ParseTree>> = self
            .sequences(at)
            .iter()
            .map(|children| {
                Rc::new(ParseTree {
                    rule: Arc::clone(&rule),
                    children: children.clone(),
                })
            })
            .collect();
        self.active.remove(&at);
        let trees = Rc::new(trees);
        self.trees.insert(at, Rc::clone(&trees));
        trees
    }

    /// Child sequences for the symbols before the dot of `at`.
    fn sequences(&mut self, at: ItemRef) -> Sequences {
        if let Some(done) = self.sequences.get(&at) {
            return Rc::clone(done);
        }
        let Some(item) = self.chart.item(at) else {
            return Rc::new(Vec::new());
        };
        if item.dot == 0 {
            return Rc::new(vec![Vec::new()]);
        }

        let links = item.links.clone();
        let mut out: Vec<Vec<Node>> = Vec::new();
        'links: for link in links {
            let prefixes = self.sequences(link.prev);
            let children: Vec<Node> = match link.child {
                Child::Token(i) => vec![Node::Token(i)],
                Child::Item(child) => self.trees(child).iter().cloned().map(Node::Tree).collect(),
            };
            for prefix in prefixes.iter() {
                for child in &children {
                    if out.len() >= MAX_DERIVATIONS {
                        break 'links;
                    }
                    let mut seq = Vec::with_capacity(prefix.len() + 1);
                    seq.extend(prefix.iter().cloned());
                    seq.push(child.clone());
                    out.push(seq);
                }
            }
        }
        let out = Rc::new(out);
        self.sequences.insert(at, Rc::clone(&out));
        out
    }
}
