//! A thin command-line adapter over `sheet_core::Sheet`.
//!
//! All decisions (parsing, evaluation, cycle/error handling) live in the
//! library; this binary only turns stdin lines or a one-shot `-c` command
//! into `Sheet` calls and prints the result.

use anyhow::{bail, Context, Result};
use sheet_core::{Position, Sheet};
use std::env;
use std::io::{self, BufRead};

fn print_usage() {
    eprintln!("Usage: sheet-cli [OPTIONS]");
    eprintln!();
    eprintln!("Reads assignment lines of the form ROW,COL=TEXT from stdin");
    eprintln!("(0-indexed row and column) and prints the resulting sheet.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <ASSIGNMENT>   Apply a single ROW,COL=TEXT assignment and exit");
    eprintln!("  --texts                      Print canonical text instead of evaluated values");
    eprintln!("  -h, --help                   Print help");
}

/// Parse a `ROW,COL=TEXT` assignment line into its parts.
fn parse_assignment(line: &str) -> Result<(Position, &str)> {
    let (coords, text) = line
        .split_once('=')
        .with_context(|| format!("missing '=' in assignment: {:?}", line))?;
    let (row, col) = coords
        .split_once(',')
        .with_context(|| format!("expected ROW,COL before '=': {:?}", coords))?;
    let row: usize = row
        .trim()
        .parse()
        .with_context(|| format!("invalid row: {:?}", row))?;
    let col: usize = col
        .trim()
        .parse()
        .with_context(|| format!("invalid column: {:?}", col))?;
    Ok((Position::new(row, col), text))
}

fn apply_assignment(sheet: &mut Sheet, line: &str) -> Result<()> {
    let (pos, text) = parse_assignment(line)?;
    sheet.set_cell(pos, text)?;
    Ok(())
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let mut command: Option<String> = None;
    let mut print_texts = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    bail!("--command requires an assignment string");
                }
                command = Some(args[i].clone());
            }
            "--texts" => print_texts = true,
            arg => bail!("unknown option: {}", arg),
        }
        i += 1;
    }

    let mut sheet = Sheet::new();

    if let Some(line) = command {
        apply_assignment(&mut sheet, &line)?;
    } else {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.context("reading from stdin")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            apply_assignment(&mut sheet, line)?;
        }
    }

    let rendered = if print_texts {
        sheet.print_texts()?
    } else {
        sheet.print_values()?
    };
    print!("{}", rendered);

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
