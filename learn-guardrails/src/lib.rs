//! Validation layers applied to untrusted oracle output.
//!
//! A raw completion passes through [`parse_response`], the template's
//! JSON-Schema via [`SchemaCache`], [`enforce_guardrails`], and finally the
//! technique's [`DomainContract`]. Every layer reports failures as a
//! [`ContentViolation`], which callers may retry.

#![warn(missing_docs, clippy::pedantic)]

mod diagnostics;
mod domain;
mod guardrails;
mod parser;
mod schema;

pub use diagnostics::{
    ContentViolation, Diagnostic, ROOT_PATH, ValidationOutcome, ValidationStage,
    join_diagnostics, pointer_to_path,
};
pub use domain::{
    CoachResult, DecodeContract, DomainContract, Flashcard, FlashcardsContract, FlashcardsResult,
    MnemonicResult, StoryResult, builtin_contract,
};
pub use guardrails::enforce_guardrails;
pub use parser::parse_response;
pub use schema::{SchemaCache, SchemaError};
