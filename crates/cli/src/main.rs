// tablecast CLI - convert HTML tables into styled XLSX workbooks

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use rust_xlsxwriter::Workbook;
use tablecast_engine::StyleCache;
use tablecast_io::xlsx::{document_to_workbook, normalize_line_breaks};

const EXIT_ERROR: u8 = 1;
const EXIT_IO_ERROR: u8 = 3;

#[derive(Parser)]
#[command(name = "tablecast")]
#[command(about = "Convert HTML tables into a styled XLSX workbook")]
#[command(version)]
#[command(after_help = "\
Examples:
  tablecast report.html -o report.xlsx
  curl -s https://example.com/report | tablecast -o report.xlsx
  tablecast report.html -o report.xlsx --sheet-name Quarterly")]
struct Cli {
    /// Input HTML file (omit to read from stdin)
    input: Option<PathBuf>,

    /// Output XLSX file
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Worksheet name
    #[arg(long)]
    sheet_name: Option<String>,

    /// Suppress the conversion summary
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let html = match read_input(cli.input.as_deref()) {
        Ok(html) => html,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_IO_ERROR);
        }
    };

    match convert(&cli, &html) {
        Ok(summary) => {
            if !cli.quiet {
                println!("{summary}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn read_input(input: Option<&Path>) -> Result<String, std::io::Error> {
    match input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut html = String::new();
            std::io::stdin().read_to_string(&mut html)?;
            Ok(html)
        }
    }
}

fn convert(cli: &Cli, html: &str) -> Result<String, String> {
    let html = normalize_line_breaks(html);
    let mut workbook = Workbook::new();
    let mut cache = StyleCache::new();

    let report =
        document_to_workbook(&html, &mut workbook, &mut cache).map_err(|e| e.to_string())?;

    if let Some(name) = &cli.sheet_name {
        workbook
            .worksheet_from_index(0)
            .and_then(|worksheet| worksheet.set_name(name).map(|_| ()))
            .map_err(|e| format!("failed to name worksheet: {e}"))?;
    }

    workbook.save(&cli.output).map_err(|e| e.to_string())?;
    Ok(report.summary())
}
