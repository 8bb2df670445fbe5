//! Shared input handling for the sandbox binaries: a file path argument,
//! or the submission on stdin.

use std::env;
use std::fs;
use std::io::{self, Read};

pub fn read_submission() -> io::Result<String> {
    match env::args().nth(1) {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
