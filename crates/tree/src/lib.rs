//! Property model for the grid engine
//!
//! Values, value types, shared choice lists and the node arena. Nothing in
//! here knows about pixels; layout and painting live in `tiny-ui`.

pub mod choices;
pub mod error;
pub mod nav;
pub mod node;
pub mod records;
pub mod text;
pub mod tree;
pub mod value;
pub mod value_type;

pub use choices::{ChoiceEntry, ChoiceRegistry, ChoiceSet};
pub use error::{GridError, Result};
pub use nav::{IterOrder, IterSpec, NodeIter};
pub use node::{Attributes, NodeFlags, NodeId, NodeKind, NodeSpec, PropertyNode};
pub use records::{records_from_json, records_to_json, PropertyRecord};
pub use tree::{PropertyTree, TreeOrder};
pub use value::{ValueKind, Variant};
pub use value_type::{Aggregate, ValueType, ValueTypeRegistry, CATEGORY_TAG};
