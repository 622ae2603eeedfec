// SPDX-License-Identifier: MIT

//! Web collaborators and the tools research agents can call

pub mod fetch;
pub mod registry;
pub mod research;
pub mod search;

pub use fetch::{extract_text, fetch_all, FetchOutcome, HttpFetcher, WebFetcher};
pub use registry::ToolRegistry;
pub use research::ResearchTool;
pub use search::TavilySearchTool;
