mod common;

mod help;
mod init;
mod model;
