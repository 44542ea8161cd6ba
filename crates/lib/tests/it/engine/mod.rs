//! Engine object model integration tests

mod defaults;
mod objects;
