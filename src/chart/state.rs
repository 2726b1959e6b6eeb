// Copyright 2019 Google LLC
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

//! Earley items and the records a chart keeps for them.

use std::sync::Arc;

use crate::grammar::{Category, Rule};

/// An Earley item.
///
/// A state tracks how much of a rule has been matched by the input ending at
/// `position`, where the match started at `rule_start`. For example:
///
/// ```text
/// [0, 2] S => NP . VP
/// ```
///
/// This indicates that `NP` was matched on the input between 0 and 2, and
/// the rule still expects a `VP`.
///
/// Scores are not part of a state. Two states are equal iff their position,
/// rule start, dot and rule are equal.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct State {
  position: usize,
  rule_start: usize,
  dot: usize,
  rule: Arc<Rule>,
}

impl State {
  /// Creates a state. `dot` must be in the range `[0, rule.len()]`.
  pub fn create(
    position: usize,
    rule_start: usize,
    dot: usize,
    rule: Arc<Rule>,
  ) -> Self {
    assert!(
      dot <= rule.len(),
      "dot {} is past the end of rule `{}`",
      dot,
      rule
    );
    assert!(rule_start <= position);
    State {
      position,
      rule_start,
      dot,
      rule,
    }
  }

  pub fn position(&self) -> usize {
    self.position
  }

  pub fn rule_start(&self) -> usize {
    self.rule_start
  }

  pub fn dot(&self) -> usize {
    self.dot
  }

  pub fn rule(&self) -> &Arc<Rule> {
    &self.rule
  }

  pub fn is_completed(&self) -> bool {
    self.dot == self.rule.len()
  }

  /// Returns the category right after the dot, or `None` if the state is
  /// completed.
  pub fn active_category(&self) -> Option<&Category> {
    self.rule.category_at(self.dot)
  }

  /// Returns this state with the dot moved over one category, ending at
  /// `next_position`. Returns `None` if the state is already completed.
  pub fn advance(&self, next_position: usize) -> Option<State> {
    if self.is_completed() {
      return None;
    }
    Some(State::create(
      next_position,
      self.rule_start,
      self.dot + 1,
      self.rule.clone(),
    ))
  }
}

impl std::fmt::Display for State {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(
      fmt,
      "[{}, {}] {} =>",
      self.rule_start,
      self.position,
      self.rule.left()
    )?;
    for (i, cat) in self.rule.right().iter().enumerate() {
      if i == self.dot {
        fmt.write_str(" .")?;
      }
      write!(fmt, " {}", cat)?;
    }
    if self.is_completed() {
      fmt.write_str(" .")?;
    }
    Ok(())
  }
}

/// A handle to a state record within a `Chart`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StateId(pub(crate) usize);

impl StateId {
  pub fn index(self) -> usize {
    self.0
  }
}

/// One way a state was reached.
///
/// `predecessor` is the state whose dot was advanced. `completed` is the
/// completed state that advanced it, or `None` if it was advanced by
/// scanning a token.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Link {
  pub predecessor: StateId,
  pub completed: Option<StateId>,
}

impl Link {
  pub fn scanned(predecessor: StateId) -> Self {
    Link {
      predecessor,
      completed: None,
    }
  }

  pub fn completed(predecessor: StateId, completed: StateId) -> Self {
    Link {
      predecessor,
      completed: Some(completed),
    }
  }
}

/// The data a chart keeps for each state: its scores and the links it was
/// reached through, in the order they were first recorded.
#[derive(Clone, Debug)]
pub struct StateRecord {
  pub(crate) state: State,
  pub(crate) forward: f64,
  pub(crate) inner: f64,
  pub(crate) links: Vec<Link>,
}

impl StateRecord {
  pub fn state(&self) -> &State {
    &self.state
  }

  pub fn forward_score(&self) -> f64 {
    self.forward
  }

  pub fn inner_score(&self) -> f64 {
    self.inner
  }

  pub fn links(&self) -> &[Link] {
    &self.links
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::{NonTerminal, Terminal};

  fn np_rule() -> Arc<Rule> {
    Arc::new(Rule::new(
      NonTerminal::new("NP"),
      vec![
        Category::Term(Terminal::new("the")),
        Category::Term(Terminal::new("boy")),
      ],
      1.0,
    ))
  }

  #[test]
  fn identity_is_the_four_fields() {
    let rule = np_rule();
    let a = State::create(1, 0, 1, rule.clone());
    assert_eq!(a, State::create(1, 0, 1, np_rule()));
    assert_ne!(a, State::create(1, 0, 0, rule.clone()));
    assert_ne!(a, State::create(2, 0, 1, rule.clone()));
    assert_ne!(a, State::create(1, 1, 1, rule));
  }

  #[test]
  fn advance_moves_dot_and_keeps_origin() {
    let start = State::create(3, 3, 0, np_rule());
    assert_eq!(
      start.active_category(),
      Some(&Category::Term(Terminal::new("the")))
    );
    let next = start.advance(4).unwrap();
    assert_eq!(next.position(), 4);
    assert_eq!(next.rule_start(), 3);
    assert_eq!(next.dot(), 1);
    let done = next.advance(5).unwrap();
    assert!(done.is_completed());
    assert_eq!(done.active_category(), None);
    assert_eq!(done.advance(6), None);
    assert_eq!(done.to_string(), "[3, 5] NP => the boy .");
    assert_eq!(next.to_string(), "[3, 4] NP => the . boy");
  }

  #[test]
  #[should_panic]
  fn dot_past_end_panics() {
    State::create(0, 0, 3, np_rule());
  }
}
