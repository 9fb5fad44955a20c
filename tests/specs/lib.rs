//! End-to-end tests driving the compiled `sfbridge` binary.

#[cfg(test)]
mod cli;
