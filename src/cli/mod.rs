/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Command line interface
//!
//! `mpdf-rs <description.json>` builds the described magnetic structure,
//! runs the calculator and writes the profile as whitespace separated
//! columns or as JSON. Flags override the values of the description.

use crate::input::{load_description, BuildOptions};
use crate::mpdf::{MpdfParameters, MpdfProfile};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Output formats for the calculated profile
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Columns `r f d total`
    Columns,
    /// The full profile as JSON
    Json,
}

/// Calculate magnetic pair distribution functions
#[derive(Parser, Debug)]
#[command(name = "mpdf-rs")]
#[command(version)]
#[command(about = "Calculate magnetic pair distribution functions", long_about = None)]
pub struct Cli {
    /// JSON run description
    pub description: PathBuf,

    /// Start of the output grid in Å
    #[arg(long)]
    pub rmin: Option<f64>,

    /// End of the output grid in Å
    #[arg(long)]
    pub rmax: Option<f64>,

    /// Output grid step in Å
    #[arg(long)]
    pub rstep: Option<f64>,

    /// Lower edge of the measured Q range in Å⁻¹
    #[arg(long)]
    pub qmin: Option<f64>,

    /// Upper edge of the measured Q range in Å⁻¹ (0 disables the termination filter)
    #[arg(long)]
    pub qmax: Option<f64>,

    /// Gaussian Q-resolution damping in Å⁻¹
    #[arg(long)]
    pub qdamp: Option<f64>,

    /// Scale of the ordered pair term
    #[arg(long)]
    pub ord_scale: Option<f64>,

    /// Scale of the paramagnetic self term
    #[arg(long)]
    pub para_scale: Option<f64>,

    /// Form factor key applied to every species (e.g. Mn2)
    #[arg(long)]
    pub ff_key: Option<String>,

    /// Generation radius in Å applied to every species
    #[arg(long)]
    pub radius: Option<f64>,

    /// Output file (standard output when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Columns)]
    pub format: OutputFormat,

    /// Log debug messages
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Description parameters with the command line overrides applied
    pub fn apply_overrides(&self, params: &mut MpdfParameters) {
        let overrides = [
            (self.rmin, &mut params.rmin),
            (self.rmax, &mut params.rmax),
            (self.rstep, &mut params.rstep),
            (self.qmin, &mut params.qmin),
            (self.qdamp, &mut params.qdamp),
            (self.ord_scale, &mut params.ord_scale),
            (self.para_scale, &mut params.para_scale),
        ];
        for (value, target) in overrides {
            if let Some(value) = value {
                *target = value;
            }
        }
        if self.qmax.is_some() {
            params.qmax = self.qmax;
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions::new(self.ff_key.as_deref(), self.radius)
    }
}

/// Run the calculation described by the command line
pub fn run(cli: &Cli) -> Result<()> {
    let description = load_description(&cli.description)
        .with_context(|| format!("failed to load {}", cli.description.display()))?;

    let mut calculator = description
        .build_calculator(&cli.build_options())
        .context("failed to build the magnetic structure")?;
    cli.apply_overrides(&mut calculator.params);

    let profile = calculator.calc_all().context("mPDF calculation failed")?;
    info!("calculated {} points", profile.len());

    match &cli.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            write_profile(&profile, cli.format, BufWriter::new(file))?;
            info!("wrote {}", path.display());
        }
        None => write_profile(&profile, cli.format, io::stdout().lock())?,
    }
    Ok(())
}

/// Write a profile in the chosen format
pub fn write_profile<W: Write>(profile: &MpdfProfile, format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Columns => {
            writeln!(out, "# r f d total")?;
            for i in 0..profile.len() {
                writeln!(
                    out,
                    "{:.4} {:.8e} {:.8e} {:.8e}",
                    profile.r[i], profile.normalized[i], profile.unnormalized[i], profile.total[i]
                )?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, profile)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
