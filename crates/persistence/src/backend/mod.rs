// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Connection setup that cannot be written in Diesel DSL.
//!
//! Domain reads and writes live in `queries/` and `mutations/`.

pub mod sqlite;
