//! Linear-KV Store - A serialized key/value register with idempotent writes.
//!
//! Every operation executes inside one global critical section and is
//! recorded in an [`OperationLog`](linear_kv_core::OperationLog) together with
//! the interval in which it ran. Because the linearization point of each
//! operation lies inside that critical section, the store's own execution
//! order is always a valid linearization; the recorded history lets an
//! external checker confirm this from timestamps alone.
//!
//! # Example
//!
//! ```
//! use linear_kv_store::Store;
//! use linear_kv_core::Outcome;
//!
//! let store = Store::new();
//! assert_eq!(store.put("req-1", "a", "x").unwrap(), Outcome::Ok);
//! assert_eq!(store.put("req-1", "a", "x").unwrap(), Outcome::Duplicate);
//!
//! let read = store.get("a", None).unwrap();
//! assert_eq!(read.value.as_deref(), Some("x"));
//! assert_eq!(store.history().len(), 3);
//! ```

pub mod store;

pub use store::{ReadResult, Store};
