pub mod analyzers;
pub mod charts;
pub mod output;
pub mod parser;
pub mod temporal;
