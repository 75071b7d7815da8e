// GRC ACL
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Access control roles, propagation and permission evaluation
//!
//! A person's effective permissions on an object are the union of their
//! global role, the access control roles they hold on that object, and the
//! grants propagated from roles held on related objects.

pub mod audit;
pub mod cache;
pub mod evaluator;
pub mod manager;
pub mod permissions;
pub mod propagation;
pub mod roles;
pub mod system;

pub use audit::*;
pub use cache::*;
pub use evaluator::*;
pub use manager::*;
pub use permissions::*;
pub use propagation::*;
pub use roles::*;
pub use system::*;
