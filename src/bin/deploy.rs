use std::io::Read;

use evm_tools::{deploy, logging, DeployError};
use tracing::level_filters::LevelFilter;

fn main() {
    logging::init(LevelFilter::WARN);

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        die(&e.to_string());
    }

    match deploy::wrap_hex(&input) {
        Ok(code) => println!("{code}"),
        Err(e @ DeployError::PrefixTooLong(_)) => panic!("{e}"),
        Err(e) => die(&e.to_string()),
    }
}

fn die(msg: &str) -> ! {
    println!("{msg}");
    std::process::exit(1);
}
