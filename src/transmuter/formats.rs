//! Output formats for syntax trees
//!
//! - treeviz: indented one-node-per-line view for humans and snapshot tests
//! - json: structured output for downstream tooling

pub mod json;
pub mod registry;
pub mod treeviz;

pub use json::{to_json_value, JsonFormatter};
pub use registry::{FormatError, FormatParams, FormatRegistry, Formatter};
pub use treeviz::{to_treeviz_str, to_treeviz_str_with_params, TreevizFormatter};
