// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod expense;
pub mod money;
pub mod user;

pub use expense::{AddExpenseRequest, ExpenseEntry, ExpenseRecord};
pub use user::{Credential, UserRecord};
