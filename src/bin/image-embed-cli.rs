// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use image_embed_node::cli::{execute, parse_args, ParseExit};
use image_embed_node::logging;

fn main() {
    dotenv::dotenv().ok();

    // Logging goes to stderr; stdout is reserved for the JSON result
    if let Err(e) = logging::init(logging::CLI_FILTER) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    let output = match parse_args(std::env::args_os()) {
        Ok(cli) => execute(cli),
        Err(ParseExit::Display(err)) => err.exit(),
        Err(ParseExit::Usage(output)) => output,
    };

    println!("{}", output.body);
    std::process::exit(output.exit_code);
}
