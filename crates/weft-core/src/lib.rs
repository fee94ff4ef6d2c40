//! # weft-core
//!
//! Generation-based dependency-injection wiring engine.
//!
//! Handles:
//! - **Definition**: Component definitions, constructor descriptors, and parameter specs.
//! - **Validator**: Registration-time single-constructor checks.
//! - **Registry**: Built instances by concrete type and by capability, plus named values.
//! - **Resolver**: Computes each generation of satisfiable definitions.
//! - **Builder**: Instantiates a definition from registry contents.
//! - **Graph**: Dependency graph diagnosis of a stuck wiring set.
//! - **Plan**: Dry-run preview of the generations `wire()` would build.
//! - **Container**: The public register / wire / resolve surface.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use weft_core::container::Container;
//! use weft_core::definition::{Definition, ParamSpec};
//!
//! struct Logger;
//! struct Service {
//!     logger: Arc<Logger>,
//! }
//!
//! let mut container = Container::new();
//! container
//!     .register_definitions([
//!         Definition::of::<Logger>().constructor(vec![], |_| Ok(Logger)).build(),
//!         Definition::of::<Service>()
//!             .constructor(vec![ParamSpec::of_type::<Logger>("logger")], |args| {
//!                 Ok(Service { logger: args.take()? })
//!             })
//!             .build(),
//!     ])
//!     .expect("single constructors");
//! container.wire().expect("acyclic graph");
//!
//! let service = container.resolve::<Service>().expect("service");
//! let logger = container.resolve::<Logger>().expect("logger");
//! assert!(Arc::ptr_eq(&service.logger, &logger));
//! ```

pub mod builder;
pub mod container;
pub mod definition;
pub mod graph;
pub mod plan;
pub mod registry;
pub mod resolver;
pub mod validator;
