use crate::ca::{LocalCa, WEB_SERVER_TEMPLATE};
use crate::error::Result;
use crate::export::{BundleExporter, DEFAULT_EXPORT_PASSWORD};
use crate::issue::CertificateIssuer;
use crate::pipeline::BatchPipeline;
use crate::report::{Event, Reporter};
use crate::store::FileStore;
use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "certbatch")]
#[command(
    version,
    about = "Batch-issue TLS certificates and export them as PFX bundles",
    long_about = None
)]
pub struct Cli {
    #[arg(
        short,
        long,
        help = "Delimited list of certificate common names (prompts if omitted)"
    )]
    names: Option<String>,

    #[arg(short, long, help = "Delimiter for the name list (prompts if omitted)")]
    delimiter: Option<String>,

    #[arg(
        short,
        long,
        help = "Directory the PFX bundles are written to (default: desktop)"
    )]
    output_dir: Option<PathBuf>,

    #[arg(
        short,
        long,
        default_value = DEFAULT_EXPORT_PASSWORD,
        help = "Password protecting the exported bundles"
    )]
    password: String,

    #[arg(
        short,
        long,
        default_value = WEB_SERVER_TEMPLATE,
        help = "Certificate template name"
    )]
    template: String,

    #[arg(
        long,
        default_value = "certstore",
        help = "Directory backing the machine certificate store"
    )]
    store_dir: PathBuf,

    #[arg(long, default_value = "ca.pem", help = "Issuing CA certificate path")]
    ca_cert: PathBuf,

    #[arg(long, default_value = "ca-key.pem", help = "Issuing CA private key path")]
    ca_key: PathBuf,

    #[arg(
        long,
        default_value = "Batch Issuing CA",
        help = "Common name used when creating a new issuing CA"
    )]
    ca_cn: String,
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let mut ca = load_or_create_ca(&cli)?;
    let store = FileStore::new(&cli.store_dir);
    ca.attach_store(store.clone());

    let output_dir = cli
        .output_dir
        .clone()
        .or_else(dirs::desktop_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir)?;

    let interactive = cli.names.is_none();
    let mut reporter = ConsoleReporter;

    loop {
        let names = match &cli.names {
            Some(names) => names.clone(),
            None => prompt_nonempty(
                "Please enter a delimited list of cert names:",
                "The list cannot be empty",
            )?,
        };
        let delimiter = match &cli.delimiter {
            Some(delim) => delim.clone(),
            None if interactive => prompt_nonempty(
                "Please enter the delimiter for the list of names:",
                "The delimiter cannot be empty",
            )?,
            None => ",".to_string(),
        };

        let issuer = CertificateIssuer::with_template(&cli.template);
        let exporter = BundleExporter::new(&output_dir).with_password(&cli.password);
        let mut pipeline = BatchPipeline::new(&mut ca, &store, issuer, exporter);

        match pipeline.run(&names, &delimiter, &mut reporter) {
            Ok(summary) => println!(
                "\n{} {} of {} certificate(s) exported",
                "Batch complete:".green().bold(),
                summary.exported,
                summary.requested
            ),
            Err(err) => println!("{} {}", "List issue:".red().bold(), err),
        }

        if !interactive || !prompt_yes_no("Would you like to enter more certs (y/n)?")? {
            break;
        }
    }

    Ok(())
}

fn load_or_create_ca(cli: &Cli) -> Result<LocalCa> {
    if cli.ca_cert.exists() && cli.ca_key.exists() {
        return LocalCa::load_pem(&cli.ca_cert, &cli.ca_key);
    }

    let ca = LocalCa::new_root(&cli.ca_cn, 3650)?;
    ca.save_pem(&cli.ca_cert, &cli.ca_key)?;
    println!(
        "{} {}",
        "Issuing CA created:".green().bold(),
        cli.ca_cert.display()
    );
    Ok(ca)
}

struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&mut self, event: Event<'_>) {
        match event {
            Event::DuplicateName(name) => {
                println!("{} {}", "Duplicate value:".yellow(), name);
            }
            Event::StoreEntryRemoved(name) => {
                println!("{} {}", "Certificate removed:".yellow(), name);
            }
            Event::StoreEntrySkipped { name, message } => {
                println!(
                    "{} {} ({})",
                    "Unable to remove cert, skipping re-issue:".yellow(),
                    name,
                    message
                );
            }
            Event::Issued(name) => {
                println!("{} {}", "Certificate issued:".green(), name);
            }
            Event::IssueFailed { name, message } => {
                println!("{} {}: {}", "Enrollment failed:".red(), name, message);
            }
            Event::Exported { path, .. } => {
                println!("{} {}", "Bundle exported:".green(), path.display());
            }
            Event::ExportFailed { name, message } => {
                println!("{} {}: {}", "Export failed:".red(), name, message);
            }
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}   ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    // Only the line ending is trimmed; a delimiter may itself be a space.
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn prompt_nonempty(label: &str, complaint: &str) -> Result<String> {
    loop {
        let value = prompt(label)?;
        if !value.is_empty() {
            return Ok(value);
        }
        println!("{}", complaint);
    }
}

fn prompt_yes_no(label: &str) -> Result<bool> {
    loop {
        match prompt(label)?.to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => println!("Incorrect input"),
        }
    }
}
