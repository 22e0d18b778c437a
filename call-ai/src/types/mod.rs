pub mod completion;
pub mod transcript;
