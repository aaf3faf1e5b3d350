//! # Prompt Templates
//!
//! Default prompt templates for the query-generation task. The server can
//! override both through `config.yml` or `prompt.yml`.

pub mod tasks;
