//! Tree module: hierarchy assembly and tree state for admin screens.
//!
//! Pure data transformations over parent-pointer record sets (teams,
//! menus). Nothing here performs I/O or knows about rendering.
//!
//! - [`assemble`]: flat records to an ordered forest
//! - [`filter`] / [`filter_by_keyword`]: pruning that keeps ancestors
//! - [`ExpansionState`]: which node ids are expanded
//! - [`TreeView`]: per-screen state built on the above
//!
//! # Example
//!
//! ```ignore
//! use openerp_tree::{assemble, filter_by_keyword, ExpansionState};
//!
//! let forest = assemble(menus);
//! let expansion = ExpansionState::from_forest(&forest);
//! let visible = filter_by_keyword(&forest, "report");
//! ```

pub mod assemble;
pub mod expansion;
pub mod filter;
pub mod record;
pub mod view;

pub use assemble::assemble;
pub use expansion::{ExpansionState, VisibleRow};
pub use filter::{filter, filter_by_keyword, KeywordMatcher};
pub use record::{collect_ids, count, find, Forest, Searchable, TreeNode, TreeRecord};
pub use view::TreeView;
