//! # photoreport CLI
//!
//! Usage:
//!   photoreport report.json -o relatorio.pdf
//!   cat report.json | photoreport -o relatorio.pdf
//!   photoreport report.json --config layout.json
//!   photoreport report.json --layout > layout.json
//!   photoreport --example > report.json
//!
//! Set `RUST_LOG=debug` for per-page progress.

use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::process;

use photoreport::{Assembler, LayoutConfig, LayoutRecorder};

/// Flags that take a value.
const VALUE_FLAGS: [&str; 2] = ["-o", "--config"];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("✗ {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().skip(1).collect();

    // Handle --example flag
    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_json());
        return Ok(());
    }

    // Read input
    let input = match input_path(&args) {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read input file '{}': {}", path, e))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            buf
        }
    };

    let config = match flag_value(&args, "--config") {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;
            LayoutConfig::from_json(&json)?
        }
        None => LayoutConfig::default(),
    };

    let document = photoreport::parse_document(&input)?;
    let assembler = Assembler::new(config);

    if args.iter().any(|a| a == "--layout") {
        let info = assembler.run(&document, LayoutRecorder::new())?;
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    // Parse output path
    let output_path = flag_value(&args, "-o")
        .map(str::to_string)
        .unwrap_or_else(default_output_name);

    let pdf_bytes = assembler.render_pdf(&document)?;
    fs::write(&output_path, &pdf_bytes)
        .map_err(|e| format!("Failed to write '{}': {}", output_path, e))?;
    eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), output_path);
    Ok(())
}

/// First positional argument, skipping the values of flags that take one.
fn input_path(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with('-') {
            return Some(arg);
        }
    }
    None
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn default_output_name() -> String {
    format!("relatorio-{}.pdf", chrono::Local::now().format("%Y-%m-%d"))
}

fn example_report_json() -> &'static str {
    r##"{
  "name": "Vistoria Técnica - Bloco A",
  "details": {
    "clientName": "Condomínio Jardim das Acácias",
    "number": "NT-2026-014",
    "address": "Rua das Palmeiras, 250 - São Paulo/SP",
    "engineer": "Eng. Maria Souza",
    "crea": "5061234567",
    "description": "Inspeção visual das instalações elétricas do bloco A, com registro fotográfico dos quadros de distribuição e pontos de atenção."
  },
  "pages": [
    {
      "id": "intro",
      "title": "Escopo",
      "content": "Vistoria realizada em 12/02/2026.\nEquipamentos desenergizados durante a inspeção.",
      "photos": [],
      "layout": { "columns": 2 }
    },
    {
      "id": "quadros",
      "title": "Quadros de distribuição",
      "content": "",
      "photos": [
        { "url": "./fotos/qd-01.jpg", "subtitle": "Quadro geral de baixa tensão" },
        { "url": "./fotos/qd-02.jpg", "subtitle": "Disjuntores do 1º pavimento" },
        { "url": "./fotos/qd-03.jpg", "subtitle": "" }
      ],
      "layout": { "columns": 2, "photoOrder": [0, 2, 1] }
    },
    {
      "id": "pontos",
      "title": "Pontos de atenção",
      "content": "Aquecimento identificado no barramento do QD-02.",
      "photos": [
        { "url": "./fotos/barramento.jpg", "subtitle": "Barramento com sinais de aquecimento" }
      ],
      "layout": { "columns": 1 }
    }
  ]
}
"##
}
