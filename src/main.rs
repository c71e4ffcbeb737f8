use std::env;
use std::process;

use delivery_dispatch::{cli, logging};

fn main() {
    logging::init(&logging::level_from_env());
    let args: Vec<String> = env::args().collect();
    process::exit(cli::run_with_args(&args));
}
