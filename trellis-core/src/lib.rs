//! Trellis Core
//!
//! This crate provides the core runtime for the Trellis reactive renderer.
//! It implements:
//!
//! - Reactive primitives (signals, memos, effects, scopes)
//! - Declarative tag trees built onto a pluggable output platform
//! - Conditional rendering and keyed lists with cached item outputs
//! - An in-memory DOM platform with region patching
//! - Async loaders driven by tokio
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Core reactive primitives and dependency tracking
//! - `graph`: Computational dependency graph implementation
//! - `tag`: Tag descriptors, handler chains and the builder
//! - `conditional` / `list`: Dynamic children and their memoized outputs
//! - `dom`: The DOM platform, prop setter cache and region patcher
//! - `loader`: Async producers exposed as reactive state
//!
//! # Example
//!
//! ```rust
//! use trellis_core::dom::{Dom, DomRenderer};
//! use trellis_core::list::list;
//! use trellis_core::reactive::Signal;
//! use trellis_core::tag::Child;
//!
//! let renderer = DomRenderer::new();
//! let items = Signal::new(vec![1, 2]);
//!
//! let tag = renderer
//!     .tag("p")
//!     .unwrap()
//!     .child(list(items.clone(), |n: &i32| Child::<Dom>::from(n * 10)));
//! let p = renderer.build(&tag);
//! assert_eq!(p.text_content(), "1020");
//!
//! // Updating the signal patches the list in place
//! items.set(vec![2, 3]);
//! assert_eq!(p.text_content(), "2030");
//! ```

pub mod conditional;
pub mod config;
pub mod dom;
pub mod error;
pub mod graph;
pub mod helpers;
pub mod list;
pub mod loader;
pub mod reactive;
pub mod tag;

pub use config::RenderConfig;
pub use error::RenderError;
