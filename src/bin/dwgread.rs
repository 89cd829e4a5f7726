//! Command-line inspector for DWG files.
//!
//! `dwgread inspect <path>` prints a decode summary: version code,
//! entity counts by type, handle range, and layer count.

use std::collections::BTreeMap;
use std::process::ExitCode;

use dwgread::notification::NotificationType;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("--version") | Some("-V") => {
            println!("dwgread {}", dwgread::VERSION);
            ExitCode::SUCCESS
        }
        Some("inspect") => {
            let Some(path) = args.get(1) else {
                eprintln!("usage: dwgread inspect <path>");
                return ExitCode::from(2);
            };
            inspect(path)
        }
        Some(other) => {
            eprintln!("unknown command: {other}");
            eprintln!("usage: dwgread inspect <path> | dwgread --version");
            ExitCode::from(2)
        }
        None => {
            eprintln!("usage: dwgread inspect <path> | dwgread --version");
            ExitCode::from(2)
        }
    }
}

fn inspect(path: &str) -> ExitCode {
    let document = match dwgread::read(path) {
        Ok(doc) => doc,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    println!("file:     {path}");
    println!(
        "version:  {} ({})",
        document.version,
        document.version.release_name()
    );
    if document.decode_version != document.version {
        println!("decoded:  {} via converter", document.decode_version);
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, record) in document.entities_by_handle.iter() {
        *counts.entry(record.dxftype()).or_default() += 1;
    }

    println!("entities: {}", document.entities_by_handle.len());
    for (dxftype, count) in &counts {
        println!("  {dxftype:<12} {count}");
    }

    let handles: Vec<_> = document.entities_by_handle.keys().collect();
    if let (Some(min), Some(max)) = (handles.iter().min(), handles.iter().max()) {
        println!("handles:  {min} .. {max}");
    }

    println!("layers:   {}", document.layers.len());
    println!("layouts:  {}", document.layout_names().collect::<Vec<_>>().join(", "));

    for notification in &document.notifications {
        if notification.notification_type != NotificationType::Info {
            eprintln!("{notification}");
        }
    }

    ExitCode::SUCCESS
}
