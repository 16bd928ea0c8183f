//! List and extract the slides of MPSShow containers.

extern crate env_logger;
extern crate mpsshow;

use std::env;
use std::path::{Path,PathBuf};
use mpsshow::{DirectoryRecord,ErrorPolicy,MpsFile,MpsResult};

#[derive(Debug,PartialEq)]
enum Command {
    List,
    ExtractAll,
    /// Slide index from 0, and an optional output file.
    Extract(usize, Option<PathBuf>),
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let cmd = match parse_args(&args) {
        Some(cmd) => cmd,
        None => {
            usage();
            return;
        },
    };

    let filename = &args[0];
    let mut mps = match MpsFile::open(Path::new(filename)) {
        Ok(mps) => mps,
        Err(e) => {
            println!("Error reading {} - {}", filename, e);
            return;
        },
    };

    let res = match cmd {
        Command::List => {
            list(&mps);
            Ok(())
        },
        Command::ExtractAll => extract_all(&mut mps),
        Command::Extract(index, outname) => extract(&mut mps, index, outname),
    };

    if let Err(e) = res {
        println!("Error occurred - {}", e);
    }
}

fn usage() {
    println!("Usage: mpsexplore <MPS file> [index] [output file]");
    println!("  Without an index, lists the slides.");
    println!("  Index 0 extracts every slide, otherwise the slide numbered index.");
    println!("  The output file is ignored when extracting every slide.");
}

/// Parse the arguments following the program name.
fn parse_args(args: &[String]) -> Option<Command> {
    if args.is_empty() || args.len() > 3 {
        return None;
    }

    match args.get(1) {
        None => Some(Command::List),
        Some(arg) => match arg.parse::<usize>() {
            Ok(0) => Some(Command::ExtractAll),
            Ok(n) => Some(Command::Extract(n - 1, args.get(2).map(PathBuf::from))),
            Err(_) => None,
        },
    }
}

fn bmp_name(rec: &DirectoryRecord) -> PathBuf {
    PathBuf::from(format!("{}.BMP", rec.name_lossy()))
}

fn list(mps: &MpsFile) {
    for (i, rec) in mps.records().iter().enumerate() {
        println!("{:2}: {}", i + 1, rec);
    }
}

fn extract(mps: &mut MpsFile, index: usize, outname: Option<PathBuf>)
        -> MpsResult<()> {
    let outname = match outname {
        Some(outname) => outname,
        None => bmp_name(mps.record(index)?),
    };

    mps.save_bmp(index, &outname)?;
    println!("{:2} -> {}", index + 1, outname.to_string_lossy());
    Ok(())
}

fn extract_all(mps: &mut MpsFile)
        -> MpsResult<()> {
    let report = mps.save_all(ErrorPolicy::Skip, |_, rec| bmp_name(rec))?;

    println!("Extracted {} of {} slides", report.saved, mps.len());
    for &(index, ref e) in report.failed.iter() {
        println!("{:2}: {}", index + 1, e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use super::{Command,parse_args};

    fn args(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(&args(&["F15.MPS"])), Some(Command::List));
        assert_eq!(parse_args(&args(&["F15.MPS", "0"])), Some(Command::ExtractAll));
        assert_eq!(parse_args(&args(&["F15.MPS", "3"])), Some(Command::Extract(2, None)));
        assert_eq!(parse_args(&args(&[])), None);
        assert_eq!(parse_args(&args(&["F15.MPS", "x"])), None);
    }

    #[test]
    fn test_parse_args_output_file() {
        assert_eq!(parse_args(&args(&["F15.MPS", "2", "title.bmp"])),
                Some(Command::Extract(1, Some(PathBuf::from("title.bmp")))));

        // Ignored when extracting every slide.
        assert_eq!(parse_args(&args(&["F15.MPS", "0", "title.bmp"])),
                Some(Command::ExtractAll));

        assert_eq!(parse_args(&args(&["F15.MPS", "2", "a.bmp", "b.bmp"])), None);
    }
}
