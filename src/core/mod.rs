// Core modules: value model, JSON codec, legacy accessors, query builder, and errors.
pub mod decode;
pub mod encode;
pub mod envelope;
pub mod error;
pub mod interop;
pub mod legacy;
pub mod query;
pub mod scan;
pub mod value;
