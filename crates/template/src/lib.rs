//! Declarative template mapping for markweave documents.
//!
//! A host document defines templates and instantiates them:
//!
//! ```xml
//! <template id="list"><ul><li></li></ul></template>
//!
//! <template-instance src="items.xml" using="list">
//!   <map from="item" to="li" multiple="true">
//!     <sort asc="."/>
//!   </map>
//! </template-instance>
//! ```
//!
//! [`expand_document`] replaces every instance with its template, rewritten by
//! the mapping program inside the instance. [`run_template`] runs a single
//! program against documents the caller already holds.

mod context;
mod error;
mod format;
mod instance;
mod interpreter;
mod program;
mod relurl;
mod sort;

pub use context::{DEFAULT_DATETIME_PATTERN, TemplateContext};
pub use error::TemplateError;
pub use format::{Format, FormatScope, Item};
pub use instance::{TemplateRegistry, expand_document};
pub use interpreter::{Interpreter, context_node, run_template};
pub use program::{DataSource, Dispatch, Instruction, MapInstruction, Program, SortInstruction};
pub use relurl::link_relative;
pub use sort::{SortKey, SortKeys, SortOrder, sort_by_keys};
