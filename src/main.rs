use bcl_rust::{load, printer};

use std::io::{self, Read};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let input = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("error: cannot read {}: {}", path, err);
                std::process::exit(1);
            }
        },
        None => {
            let mut buf = String::new();
            if let Err(err) = io::stdin().read_to_string(&mut buf) {
                eprintln!("error: cannot read stdin: {}", err);
                std::process::exit(1);
            }
            buf
        }
    };

    match load(&input) {
        Ok(doc) => {
            print!("{}", printer::dump(&doc));
        }
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("{}", err.context_line(&input));
            std::process::exit(1);
        }
    }
}
