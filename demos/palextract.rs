//! Dump the raw 6-bit palette of an MPSShow slide.

extern crate env_logger;
extern crate mpsshow;

use std::env;
use std::path::{Path,PathBuf};
use mpsshow::MpsFile;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 || args.len() > 3 {
        usage();
        return;
    }

    let filename = &args[0];
    let index = match args[1].parse::<usize>() {
        Ok(n) if n > 0 => n - 1,
        _ => {
            usage();
            return;
        },
    };

    let mps = match MpsFile::open(Path::new(filename)) {
        Ok(mps) => mps,
        Err(e) => {
            println!("Error reading {} - {}", filename, e);
            return;
        },
    };

    let outname = match args.get(2) {
        Some(s) => PathBuf::from(s),
        None => match mps.record(index) {
            Ok(rec) => PathBuf::from(format!("{}.PAL", rec.name_lossy())),
            Err(e) => {
                println!("Error occurred - {}", e);
                return;
            },
        },
    };

    match mps.save_palette(index, &outname) {
        Ok(n) => println!("{} -> {} ({} bytes)",
                filename, outname.to_string_lossy(), n),
        Err(e) => println!("Error writing {} - {}",
                outname.to_string_lossy(), e),
    }
}

fn usage() {
    println!("Usage: palextract <MPS file> <index> [output file]");
}
