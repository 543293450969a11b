// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side queries. Every function takes a `SqliteConnection` and uses the
//! Diesel DSL.

pub mod agenda;
pub mod audit;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod history;
pub mod students;
