// twgen — twiddle factor generator
//
// Library root. Reads the DFT parameters from a VHDL constants package,
// builds the twiddle table, and emits it as a VHDL package.

pub mod ast;
pub mod config;
pub mod diag;
pub mod emit;
pub mod fixed;
pub mod lexer;
pub mod parser;
pub mod pass;
pub mod pipeline;
pub mod reader;
pub mod twiddle;
