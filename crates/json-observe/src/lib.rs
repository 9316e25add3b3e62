//! Observable object/array graphs that report every mutation as a patch.
//!
//! A [`Graph`] stores plain containers (objects and arrays) in an arena and
//! lets any of them be observed. Mutations made through the graph, however
//! deep and through however many shared references, are reported to the
//! subscribers of every observed ancestor as [`Patch`]es whose paths are
//! JSON Pointers relative to that ancestor.
//!
//! # Modules
//!
//! | Module    | Contents                                              |
//! |-----------|-------------------------------------------------------|
//! | `value`   | [`Value`], [`Node`], [`NodeId`]: raw storage            |
//! | `graph`   | [`Graph`], [`Observable`]: registry, dispatch, fan-out  |
//! | `handler` | [`Handler`], [`ParentLink`], [`Subscriber`]             |
//! | `object`  | object property traps                                  |
//! | `array`   | index traps and the mutating array methods             |
//! | `patch`   | [`Patch`] and JSON Pointer formatting                  |
//! | `config`  | [`Config`], [`ExcludeProperty`], [`ObserveOptions`]     |
//!
//! # Example
//!
//! ```
//! use json_observe::{Config, Graph, ObserveOptions, Subscriber};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut graph = Graph::new(Config::default().with_splice(true));
//! let list = graph.observe_json(&json!([1, 2, 3]), ObserveOptions::default()).unwrap();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! graph.subscribe(list, Subscriber::infallible(move |p| sink.borrow_mut().push(p.to_json())));
//!
//! graph.push(list, vec![4.into()]).unwrap();
//! assert_eq!(
//!     seen.borrow()[0],
//!     json!({"op": "splice", "path": "/3", "remove": 0, "add": [4]})
//! );
//! ```

pub mod array;
pub mod config;
pub mod error;
pub mod graph;
pub mod handler;
pub mod object;
pub mod patch;
pub mod util;
pub mod value;

pub use config::{Config, ExcludeProperty, ObserveOptions};
pub use error::{ObserveError, SubscriberError};
pub use graph::{Graph, Observable};
pub use handler::{Handler, HandlerId, HandlerKind, ParentLink, Subscriber};
pub use patch::{format_pointer, Patch, Path};
pub use value::{ArrayNode, Node, NodeId, Value};
