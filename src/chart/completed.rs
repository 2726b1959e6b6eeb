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

use std::collections::{HashMap, HashSet};

use crate::{chart::State, grammar::Category, utils::WasChanged};

#[derive(Clone, Debug, Default)]
struct PositionEntry {
  all: HashSet<State>,
  not_unit_productions: HashSet<State>,
  by_left: HashMap<Category, HashSet<State>>,
  error_rules: usize,
}

/// Indexes of the completed states in a chart, by the position they end at.
///
/// Positions are dense, so each index is a vector slot per position.
/// Queries for positions or left sides that were never populated return an
/// empty set.
#[derive(Clone, Debug, Default)]
pub struct CompletedStates {
  positions: Vec<PositionEntry>,
  empty: HashSet<State>,
}

impl CompletedStates {
  pub fn new() -> Self {
    CompletedStates::default()
  }

  fn entry(&self, position: usize) -> Option<&PositionEntry> {
    self.positions.get(position)
  }

  fn entry_mut(&mut self, position: usize) -> &mut PositionEntry {
    if self.positions.len() <= position {
      self.positions.resize_with(position + 1, PositionEntry::default);
    }
    &mut self.positions[position]
  }

  /// Records `state` if it is completed. Does nothing otherwise.
  ///
  /// A state already recorded is left alone, so repeated completions of the
  /// same item do not count twice.
  pub fn add_if_completed(&mut self, state: &State) -> WasChanged {
    if !state.is_completed() {
      return WasChanged::Unchanged;
    }

    let entry = self.entry_mut(state.position());
    if !entry.all.insert(state.clone()) {
      return WasChanged::Unchanged;
    }

    let rule = state.rule();
    if !rule.is_unit_production() {
      entry.not_unit_productions.insert(state.clone());
    }
    entry
      .by_left
      .entry(rule.left().clone())
      .or_default()
      .insert(state.clone());
    if rule.is_error_rule() {
      entry.error_rules += 1;
    }

    log::trace!("Indexed completed state {}.", state);
    WasChanged::Changed
  }

  /// Returns every completed state ending at `position`.
  pub fn completed_states(&self, position: usize) -> &HashSet<State> {
    self.entry(position).map_or(&self.empty, |e| &e.all)
  }

  /// Returns the completed states ending at `position` whose rule is not a
  /// unit production.
  pub fn completed_states_that_are_not_unit_productions(
    &self,
    position: usize,
  ) -> &HashSet<State> {
    self
      .entry(position)
      .map_or(&self.empty, |e| &e.not_unit_productions)
  }

  /// Returns the completed states ending at `position` whose rule has
  /// `left` as its left side.
  pub fn completed_states_for(
    &self,
    position: usize,
    left: &Category,
  ) -> &HashSet<State> {
    self
      .entry(position)
      .and_then(|e| e.by_left.get(left))
      .unwrap_or(&self.empty)
  }

  /// Returns how many completed states ending at `position` use an error
  /// rule.
  pub fn completed_error_rules_count(&self, position: usize) -> usize {
    self.entry(position).map_or(0, |e| e.error_rules)
  }
}
