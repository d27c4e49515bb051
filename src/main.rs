use dataio_reader::{open_stream, Context, FormatVersion, RecordReader};
use std::env;
use std::error::Error;
use std::fs::File;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-record-stream> [--compressed] [--version <X.Y.Z.W>]", args[0]);
        std::process::exit(1);
    }

    let stream_path = &args[1];
    let compressed = args.iter().any(|arg| arg == "--compressed");
    let mut context = Context::new().with_compressed(compressed);

    // Parse --version argument
    if let Some(version_idx) = args.iter().position(|arg| arg == "--version") {
        match args.get(version_idx + 1).map(|s| s.parse::<FormatVersion>()) {
            Some(Ok(version)) => context = context.with_version(version),
            Some(Err(e)) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(1);
            }
            None => {
                eprintln!("ERROR: --version flag requires an argument.");
                std::process::exit(1);
            }
        }
    }

    let file = match File::open(stream_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("ERROR: Failed to open {}: {}", stream_path, e);
            std::process::exit(1);
        }
    };

    println!("Reading record stream: {}", stream_path);
    if let Some(version) = context.version() {
        println!("Format version: {}", version);
    }
    println!("{}", "=".repeat(60));

    let reader = RecordReader::new(open_stream(file, context.is_compressed()), context);
    let mut count = 0usize;
    let mut total_payload = 0usize;

    for result in reader {
        match result {
            Ok(record) => {
                count += 1;
                total_payload += record.size();
                println!(
                    "{:>10}  {}tag={:#05x} level={} size={}",
                    record.offset,
                    "  ".repeat(record.level as usize),
                    record.tag_id,
                    record.level,
                    record.size()
                );
            }
            Err(e) => {
                eprintln!("\nERROR: Failed to read record #{}", count + 1);
                eprintln!("  {}", e);
                let mut source = e.source();
                while let Some(cause) = source {
                    eprintln!("  caused by: {}", cause);
                    source = cause.source();
                }
                std::process::exit(1);
            }
        }
    }

    println!("{}", "=".repeat(60));
    println!("Records: {}", count);
    println!("Total payload: {} bytes", total_payload);
}
