//! # rulestore-core
//!
//! Rule types shared by every rulestore crate:
//!
//! - [`CasbinRule`]: a policy type plus up to six positional values, and its
//!   explicit mapping to and from store documents
//! - [`RuleFilter`]: the descriptor for partial policy loads
//! - policy line formatting ([`format_policy_line`])

pub mod error;
pub mod filter;
pub mod line;
pub mod rule;

pub use bson;

pub use error::{CoreError, Result};
pub use filter::RuleFilter;
pub use line::{escape_token, format_policy_line};
pub use rule::{
    CasbinRule, ID_FIELD, MAX_FIELDS, PTYPE_FIELD, VALUE_FIELDS, section_of, value_field,
};
