pub mod pipeline;
pub mod repl;
