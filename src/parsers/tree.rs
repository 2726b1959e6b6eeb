// Copyright 2020 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Derivation trees rebuilt from a finished chart.
//!
//! A tree owns all of its nodes. Children are held by index, and each node
//! keeps the index of its parent, so there are no reference cycles.
//!
//! Leaves are labeled with the category that was scanned. The chart does not
//! keep tokens, so a token consumed by an error rule shows up as an
//! `<error>` leaf, not as the token itself.

use std::{
  collections::HashSet,
  hash::{Hash, Hasher},
};

use im::Vector;

use crate::{
  chart::{Chart, State, StateId},
  grammar::Category,
  utils::{render_pretty, ToDoc},
};

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
  #[error("building a tree from the active state {state} is not implemented")]
  NotImplemented { state: State },
  #[error("state {state} was advanced but has no recorded basis")]
  MissingBasis { state: State },
  #[error("the derivation of {state} is cyclic")]
  CyclicDerivation { state: State },
  #[error("no complete parse spans the input")]
  NoParse,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
struct NodeData {
  category: Category,
  parent: Option<NodeId>,
  children: Vector<NodeId>,
}

/// A single derivation tree. The root is always the first node.
#[derive(Clone, Debug)]
pub struct ParseTree {
  nodes: Vec<NodeData>,
}

impl ParseTree {
  fn add_node(&mut self, category: Category, parent: Option<NodeId>) -> NodeId {
    let id = NodeId(self.nodes.len());
    self.nodes.push(NodeData {
      category,
      parent,
      children: Vector::new(),
    });
    if let Some(parent) = parent {
      self.nodes[parent.0].children.push_back(id);
    }
    id
  }

  pub fn root(&self) -> Subtree {
    self.get(NodeId(0))
  }

  pub fn get(&self, id: NodeId) -> Subtree {
    assert!(
      id.0 < self.nodes.len(),
      "Invalid node index: {} where tree size is {}",
      id.0,
      self.nodes.len()
    );
    Subtree { tree: self, id }
  }

  /// Returns the number of nodes in the tree.
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn to_pretty(&self) -> String {
    render_pretty(self, 80)
  }
}

impl PartialEq for ParseTree {
  fn eq(&self, other: &Self) -> bool {
    self.root() == other.root()
  }
}

impl Eq for ParseTree {}

impl Hash for ParseTree {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.root().hash(state)
  }
}

impl std::fmt::Display for ParseTree {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "{}", self.root())
  }
}

impl ToDoc for ParseTree {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    self.root().to_doc(da)
  }
}

/// A view of one node of a `ParseTree`.
#[derive(Copy, Clone)]
pub struct Subtree<'a> {
  tree: &'a ParseTree,
  id: NodeId,
}

impl<'a> Subtree<'a> {
  fn data(&self) -> &'a NodeData {
    &self.tree.nodes[self.id.0]
  }

  pub fn id(&self) -> NodeId {
    self.id
  }

  pub fn category(&self) -> &'a Category {
    &self.data().category
  }

  pub fn parent(&self) -> Option<Subtree<'a>> {
    let tree = self.tree;
    self.data().parent.map(|id| Subtree { tree, id })
  }

  pub fn children(&self) -> impl Iterator<Item = Subtree<'a>> + 'a {
    let tree = self.tree;
    self.data().children.iter().map(move |&id| Subtree { tree, id })
  }

  pub fn is_leaf(&self) -> bool {
    self.data().children.is_empty()
  }
}

// Two subtrees are equal if their categories, their parents' categories and
// their children are equal.
impl PartialEq for Subtree<'_> {
  fn eq(&self, other: &Self) -> bool {
    self.category() == other.category()
      && self.parent().map(|p| p.category())
        == other.parent().map(|p| p.category())
      && self.children().eq(other.children())
  }
}

impl Eq for Subtree<'_> {}

impl Hash for Subtree<'_> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.category().hash(state);
    self.parent().map(|p| p.category()).hash(state);
    for child in self.children() {
      child.hash(state);
    }
  }
}

impl std::fmt::Debug for Subtree<'_> {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "Subtree({:?}, {})", self.id, self)
  }
}

impl std::fmt::Display for Subtree<'_> {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "[{}", self.category())?;
    for child in self.children() {
      write!(fmt, "{}", child)?;
    }
    fmt.write_str("]")
  }
}

impl ToDoc for Subtree<'_> {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    let head = da.text(format!("[{}", self.category()));
    if self.is_leaf() {
      return head.append(da.text("]"));
    }
    head
      .append(
        da.concat(
          self
            .children()
            .map(|child| da.softline_().append(child.to_doc(da))),
        )
        .nest(2),
      )
      .append(da.text("]"))
      .group()
  }
}

// ----------------

enum Basis {
  Completed(StateId),
  Scanned(Category),
}

enum Step {
  Enter { id: StateId, parent: Option<NodeId> },
  Leaf { category: Category, parent: Option<NodeId> },
  Leave(StateId),
}

struct TreeBuilder<'c, S> {
  chart: &'c Chart<S>,
  tree: ParseTree,
  path: HashSet<StateId>,
}

impl<'c, S> TreeBuilder<'c, S> {
  fn bases(&self, id: StateId) -> Result<Vec<Basis>, TreeError> {
    let mut bases = Vec::new();
    let mut current = id;
    while self.chart.state(current).dot() > 0 {
      let link = self.chart.links(current).first().ok_or_else(|| {
        TreeError::MissingBasis {
          state: self.chart.state(current).clone(),
        }
      })?;
      bases.push(match link.completed {
        Some(child) => Basis::Completed(child),
        None => {
          let predecessor = self.chart.state(link.predecessor);
          let category = predecessor.active_category().cloned().ok_or_else(
            || TreeError::MissingBasis {
              state: predecessor.clone(),
            },
          )?;
          Basis::Scanned(category)
        }
      });
      current = link.predecessor;
    }
    bases.reverse();
    Ok(bases)
  }

  // Depth first over an explicit stack of steps.
  fn build(&mut self, root: StateId) -> Result<(), TreeError> {
    let chart = self.chart;
    let mut stack = vec![Step::Enter {
      id: root,
      parent: None,
    }];

    while let Some(step) = stack.pop() {
      let (id, parent) = match step {
        Step::Enter { id, parent } => (id, parent),
        Step::Leaf { category, parent } => {
          self.tree.add_node(category, parent);
          continue;
        }
        Step::Leave(id) => {
          self.path.remove(&id);
          continue;
        }
      };

      let state = chart.state(id);
      if !state.is_completed() {
        return Err(TreeError::NotImplemented {
          state: state.clone(),
        });
      }
      if !self.path.insert(id) {
        return Err(TreeError::CyclicDerivation {
          state: state.clone(),
        });
      }

      let bases = self.bases(id)?;
      stack.push(Step::Leave(id));
      if *state.rule().left() == Category::Start {
        for basis in bases.into_iter().rev() {
          if let Basis::Completed(child) = basis {
            stack.push(Step::Enter { id: child, parent });
          }
        }
      } else {
        let left = state.rule().left().clone();
        let node = Some(self.tree.add_node(left, parent));
        for basis in bases.into_iter().rev() {
          stack.push(match basis {
            Basis::Completed(child) => Step::Enter {
              id: child,
              parent: node,
            },
            Basis::Scanned(category) => Step::Leaf {
              category,
              parent: node,
            },
          });
        }
      }
    }
    Ok(())
  }
}

/// Builds a derivation tree for the completed state `id`.
///
/// Where a state was reached in more than one way, the first recorded link
/// is followed. A completed state of the implicit start rule is not part of
/// the tree; its child becomes the root. A token scanned through the `Error`
/// category becomes an `<error>` leaf.
pub fn new_parse_tree<S>(
  chart: &Chart<S>,
  id: StateId,
) -> Result<ParseTree, TreeError> {
  let mut builder = TreeBuilder {
    chart,
    tree: ParseTree { nodes: Vec::new() },
    path: HashSet::new(),
  };
  builder.build(id)?;
  if builder.tree.is_empty() {
    return Err(TreeError::MissingBasis {
      state: chart.state(id).clone(),
    });
  }
  log::trace!(
    "Built a tree of {} nodes from {}.",
    builder.tree.len(),
    chart.state(id)
  );
  Ok(builder.tree)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    chart::Link,
    grammar::{NonTerminal, Rule, Terminal},
    semiring::ProbabilitySemiring,
  };
  use std::sync::Arc;

  fn nt(name: &str) -> Category {
    Category::NonTerm(NonTerminal::new(name))
  }

  fn t(name: &str) -> Category {
    Category::Term(Terminal::new(name))
  }

  fn rule(left: Category, right: Vec<Category>) -> Arc<Rule> {
    Arc::new(Rule::new(left, right, 1.0))
  }

  // Builds the chart states of `<start> -> NP` over `NP -> the boy` by hand.
  fn noun_phrase_chart() -> (Chart<ProbabilitySemiring>, StateId) {
    let mut chart = Chart::new(ProbabilitySemiring);
    let top = rule(Category::Start, vec![nt("NP")]);
    let np = rule(nt("NP"), vec![t("the"), t("boy")]);

    let (top0, _) =
      chart.add_state(State::create(0, 0, 0, top.clone()), 1.0, 1.0, None);
    let (np0, _) =
      chart.add_state(State::create(0, 0, 0, np.clone()), 1.0, 1.0, None);
    let (np1, _) = chart.add_state(
      State::create(1, 0, 1, np.clone()),
      1.0,
      1.0,
      Some(Link::scanned(np0)),
    );
    let (np2, _) = chart.add_state(
      State::create(2, 0, 2, np),
      1.0,
      1.0,
      Some(Link::scanned(np1)),
    );
    let (top2, _) = chart.add_state(
      State::create(2, 0, 1, top),
      1.0,
      1.0,
      Some(Link::completed(top0, np2)),
    );
    (chart, top2)
  }

  #[test]
  fn rebuilds_scanned_leaves() {
    let (chart, top) = noun_phrase_chart();
    let tree = new_parse_tree(&chart, top).unwrap();
    assert_eq!(tree.to_string(), "[NP[the][boy]]");
    assert_eq!(tree.len(), 3);

    let root = tree.root();
    assert_eq!(root.category(), &nt("NP"));
    assert!(root.parent().is_none());
    let children: Vec<_> = root.children().collect();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].category(), &t("the"));
    assert_eq!(children[1].parent().map(|p| p.id()), Some(root.id()));
    assert!(children[1].is_leaf());
  }

  #[test]
  fn trees_compare_structurally() {
    let (chart, top) = noun_phrase_chart();
    let a = new_parse_tree(&chart, top).unwrap();
    let b = new_parse_tree(&chart, top).unwrap();
    assert_eq!(a, b);

    let children: Vec<_> = a.root().children().collect();
    assert_ne!(children[0], children[1]);

    let mut set = HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
  }

  #[test]
  fn pretty_rendering_nests_children() {
    let (chart, top) = noun_phrase_chart();
    let tree = new_parse_tree(&chart, top).unwrap();
    assert_eq!(tree.to_pretty(), "[NP[the][boy]]");
  }

  #[test]
  fn active_states_are_not_supported() {
    let mut chart = Chart::new(ProbabilitySemiring);
    let np = rule(nt("NP"), vec![t("the"), t("boy")]);
    let (id, _) = chart.add_state(State::create(1, 0, 1, np), 1.0, 1.0, None);
    assert!(matches!(
      new_parse_tree(&chart, id),
      Err(TreeError::NotImplemented { .. })
    ));
  }

  #[test]
  fn completed_state_without_links_is_inconsistent() {
    let mut chart = Chart::new(ProbabilitySemiring);
    let np = rule(nt("NP"), vec![t("the"), t("boy")]);
    let (id, _) = chart.add_state(State::create(2, 0, 2, np), 1.0, 1.0, None);
    assert!(matches!(
      new_parse_tree(&chart, id),
      Err(TreeError::MissingBasis { .. })
    ));
  }

  #[test]
  fn cyclic_links_are_detected() {
    let mut chart = Chart::new(ProbabilitySemiring);
    let a_to_b = rule(nt("A"), vec![nt("B")]);
    let b_to_a = rule(nt("B"), vec![nt("A")]);

    let (a0, _) =
      chart.add_state(State::create(0, 0, 0, a_to_b.clone()), 1.0, 1.0, None);
    let (b0, _) =
      chart.add_state(State::create(0, 0, 0, b_to_a.clone()), 1.0, 1.0, None);
    let a1 = State::create(1, 0, 1, a_to_b);
    let b1 = State::create(1, 0, 1, b_to_a);
    let (a1_id, _) = chart.add_state(a1.clone(), 1.0, 1.0, None);
    let (b1_id, _) =
      chart.add_state(b1, 1.0, 1.0, Some(Link::completed(b0, a1_id)));
    chart.add_state(a1, 1.0, 1.0, Some(Link::completed(a0, b1_id)));

    assert!(matches!(
      new_parse_tree(&chart, a1_id),
      Err(TreeError::CyclicDerivation { .. })
    ));
  }

  #[test]
  fn error_leaves_carry_the_error_category() {
    let mut chart = Chart::new(ProbabilitySemiring);
    let recover = rule(nt("R"), vec![Category::Error]);
    let (r0, _) =
      chart.add_state(State::create(0, 0, 0, recover.clone()), 1.0, 0.1, None);
    let (r1, _) = chart.add_state(
      State::create(1, 0, 1, recover),
      1.0,
      0.1,
      Some(Link::scanned(r0)),
    );

    let tree = new_parse_tree(&chart, r1).unwrap();
    assert_eq!(tree.to_string(), "[R[<error>]]");
    let leaf = tree.root().children().next().unwrap();
    assert_eq!(leaf.category(), &Category::Error);
  }

  // `E -> n E | n` over a long input, chained by hand.
  #[test]
  fn deep_derivations_are_rebuilt() {
    const DEPTH: usize = 50_000;
    let mut chart = Chart::new(ProbabilitySemiring);
    let more = rule(nt("E"), vec![t("n"), nt("E")]);
    let last = rule(nt("E"), vec![t("n")]);

    let (first, _) = chart.add_state(
      State::create(DEPTH - 1, DEPTH - 1, 0, last.clone()),
      1.0,
      1.0,
      None,
    );
    let (mut below, _) = chart.add_state(
      State::create(DEPTH, DEPTH - 1, 1, last),
      1.0,
      1.0,
      Some(Link::scanned(first)),
    );
    for i in (0..DEPTH - 1).rev() {
      let (predicted, _) = chart.add_state(
        State::create(i, i, 0, more.clone()),
        1.0,
        1.0,
        None,
      );
      let (scanned, _) = chart.add_state(
        State::create(i + 1, i, 1, more.clone()),
        1.0,
        1.0,
        Some(Link::scanned(predicted)),
      );
      let (done, _) = chart.add_state(
        State::create(DEPTH, i, 2, more.clone()),
        1.0,
        1.0,
        Some(Link::completed(scanned, below)),
      );
      below = done;
    }

    let tree = new_parse_tree(&chart, below).unwrap();
    assert_eq!(tree.len(), 2 * DEPTH);
    let mut steps = 0;
    let mut node = tree.root();
    while let Some(child) = node.children().last() {
      assert_eq!(node.category(), &nt("E"));
      node = child;
      steps += 1;
    }
    assert_eq!(steps, DEPTH);
    assert_eq!(node.category(), &t("n"));
  }
}
