// src/main.rs

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "vsixpack")]
#[command(author, version, about = "Package a VS Code theme extension into a VSIX archive", long_about = None)]
struct Cli {}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _cli = Cli::parse();

    let root = std::env::current_dir()?;
    match vsixpack::commands::package(&root) {
        Ok(output) => {
            let size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
            let name = output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| output.display().to_string());

            println!("Package created: {} ({:.2} KB)", name, size as f64 / 1024.0);
            println!();
            println!("This file can now be uploaded to:");
            println!("- Visual Studio Marketplace: https://marketplace.visualstudio.com/manage");
            println!("- Open VSX Registry: https://open-vsx.org");
            println!();
            println!("Or installed manually with:");
            println!("  code --install-extension {}", name);
            Ok(())
        }
        Err(err) => {
            eprintln!("Packaging failed: {err}");
            std::process::exit(1);
        }
    }
}
