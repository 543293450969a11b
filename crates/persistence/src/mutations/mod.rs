// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write-side operations. Commits that change booking state run in a single
//! `IMMEDIATE` transaction together with their audit event.

pub mod attendance;
pub mod audit;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod maintenance;

pub use auth::NewPortalUser;
