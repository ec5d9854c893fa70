// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod models;
pub mod utils;
pub mod ident;
pub mod loaders;
pub mod resolve;
pub mod ledger;
pub mod emit;
pub mod pipeline;
pub mod writer;
pub mod commands;
