pub mod completion;
pub mod object_store;
pub mod speech;
