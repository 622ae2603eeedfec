// SPDX-License-Identifier: MIT

//! Console collaborator for the requirements loop

use crate::adk::error::StrategistError;
use dialoguer::Input;

/// `prompt(text) -> raw response`. Implementations may block.
pub trait Console: Send + Sync {
    fn prompt(&self, text: &str) -> Result<String, StrategistError>;
}

/// Interactive terminal prompt
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn prompt(&self, text: &str) -> Result<String, StrategistError> {
        println!();
        let answer: String = Input::new()
            .with_prompt(text)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| StrategistError::Console(e.to_string()))?;
        Ok(answer)
    }
}
