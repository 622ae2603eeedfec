// SPDX-License-Identifier: MIT

pub mod adk;
pub mod strategist;
