#![cfg_attr(test, allow(dead_code))]

use std::env;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use grove::{reader, writer};

fn process_input<R>(input: R)
where
    R: Read,
{
    let mut input = input;
    let mut data = String::new();

    if let Err(e) = input.read_to_string(&mut data) {
        eprintln!("Can't read: {}", e);
        process::exit(1);
    }

    let package = reader::parse(&data).unwrap_or_else(|e| {
        eprintln!("Unable to parse: {}", e);
        process::exit(1);
    });

    let doc = package.as_document();

    let out = io::stdout();
    let mut out = out.lock();
    writer::format_document(&doc, &mut out).expect("Can't output");
    writeln!(out).expect("Can't output");
}

fn main() {
    let mut args: Vec<_> = env::args().collect();

    if args.len() != 2 {
        eprintln!("usage: {} FILE", args[0]);
        process::exit(1);
    }

    let filename = args.remove(1);

    if filename == "-" {
        process_input(io::stdin());
    } else {
        let file = File::open(&filename).unwrap_or_else(|e| {
            eprintln!("Can't open {}: {}", filename, e);
            process::exit(1);
        });
        process_input(file);
    }
}
