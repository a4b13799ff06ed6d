// Copyright (C) 2026  The dosstub developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::registers::RegisterValue;

/// Values pushed by `push` and `call`.
///
/// The stack isn't backed by memory and doesn't follow `SP`. Entries keep their symbolic or
/// concrete state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    entries: Vec<RegisterValue>,
}

impl Stack {
    pub fn new() -> Self {
        Stack::default()
    }

    pub fn push(&mut self, value: RegisterValue) {
        self.entries.push(value);
    }

    /// Removes the most recently pushed value. Returns `None` if the stack is empty.
    pub fn pop(&mut self) -> Option<RegisterValue> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates from the bottom to the top of the stack.
    pub fn iter(&self) -> impl Iterator<Item = &RegisterValue> {
        self.entries.iter()
    }
}
