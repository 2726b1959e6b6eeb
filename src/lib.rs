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

//! A weighted Earley chart parser.
//!
//! Scores are computed in a pluggable semiring (see `semiring`), so the same
//! chart gives total probabilities, log costs, best derivations or plain
//! recognition. A finished chart answers queries about completed states by
//! position and left side, and can rebuild derivation trees.
//!
//! ```rust
//! # use weighted_earley::{grammar::examples, parsers::ParseOptions, *};
//! let g = examples::make_sentence();
//! let tokens: Vec<_> = ["the", "boy", "left"]
//!   .iter()
//!   .map(|w| TokenWithCategories::literal(w))
//!   .collect();
//! let result = EarleyParser::new(&g, ProbabilitySemiring)
//!   .parse(&tokens, &ParseOptions::new());
//! assert_eq!(result.score(), 1.0);
//! assert_eq!(
//!   result.parse_tree().unwrap().to_string(),
//!   "[S[NP[the][boy]][VP[left]]]"
//! );
//! ```

#[macro_use]
extern crate derivative;

pub mod chart;
pub mod grammar;
pub mod parsers;
pub mod scan;
pub mod semiring;
pub mod token;
pub mod utils;

pub use crate::{
  chart::{Chart, CompletedStates, Link, State, StateId},
  grammar::{Category, Grammar, NonTerminal, Rule, Terminal},
  parsers::{
    earley::{EarleyParser, ParseResult},
    tree::{ParseTree, Subtree, TreeError},
  },
  semiring::{
    BooleanSemiring, LogSemiring, ProbabilitySemiring, Semiring,
    ViterbiSemiring,
  },
  token::{ScanProbability, Token, TokenWithCategories},
};
