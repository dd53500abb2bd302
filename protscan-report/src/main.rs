//! Run every protscan analysis for a single protein, print the results, and save them to disk.
//! Only fetching the sequence is required, all later steps print a warning and are skipped when
//! they fail.
use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use context_error::*;
use itertools::Itertools;
use protscan::{
    Endpoints, HttpTransport, ProteinProperties, SequenceFetcher, Stability, Transport,
    blast::{BlastClient, BlastSettings, BlastSummary},
    motif, pfam, structure,
};

mod output;

use output::SavedAnalysis;

#[derive(Debug, Parser)]
#[clap(version, about)]
struct Cli {
    #[clap(default_value = "P69905", help = "The UniProt accession to analyse")]
    uniprot_id: String,
    #[clap(long, default_value = "1A3N", help = "The PDB entry to download and list the chains of")]
    pdb_id: String,
    #[clap(long, default_value = "results", help = "Directory for the analysis results")]
    results_dir: PathBuf,
    #[clap(long, default_value = "data", help = "Directory for downloaded structures")]
    data_dir: PathBuf,
    #[clap(long, default_value_t = 30, help = "Timeout in seconds for every request")]
    timeout: u64,
    #[clap(long, help = "Do not run the BLAST search")]
    skip_blast: bool,
    #[clap(long, default_value_t = 60, help = "Seconds between BLAST status requests")]
    blast_poll_interval: u64,
    #[clap(long, default_value_t = 30, help = "Maximal number of BLAST status requests")]
    blast_max_polls: usize,
    #[clap(long, help = "JSON file overriding the upstream URLs")]
    endpoints: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), BoxedError<'static, protscan::ProtScanError>> {
    let endpoints = cli
        .endpoints
        .as_deref()
        .map_or_else(|| Ok(Endpoints::default()), Endpoints::from_path)?;
    let timeout = Duration::from_secs(cli.timeout);
    let primary = HttpTransport::new(timeout)?;
    let fallback = HttpTransport::insecure(timeout)?;
    let identifier = cli.uniprot_id.trim().to_ascii_uppercase();

    println!("Fetching sequence for {identifier}...");
    let record = SequenceFetcher::new(&primary, &fallback, &endpoints).fetch(&identifier)?;
    println!("Sequence length: {}", record.sequence.len());

    println!("\nCalculating properties...");
    let properties = ProteinProperties::calculate(&record.sequence)?;
    print_properties(&properties);

    println!("\nSearching for N-glycosylation motifs...");
    let sites = motif::n_glycosylation_sites(&record.sequence);
    if sites.is_empty() {
        println!("No N-glycosylation motifs found");
    } else {
        println!(
            "Motif positions: {}",
            sites.iter().map(|site| site.start).join(", ")
        );
    }

    println!("\nLooking up PFAM domains...");
    let accession = record.primary_accession().unwrap_or(identifier.as_str());
    match pfam::fetch_domains(&fallback, &endpoints, accession) {
        Ok(regions) if regions.is_empty() => println!("No PFAM domains found"),
        Ok(regions) => {
            for region in regions {
                println!("Domain: {region}");
            }
        }
        Err(e) => warning(&e),
    }

    if cli.skip_blast {
        println!("\nSkipping BLAST search");
    } else {
        println!("\nRunning BLAST search (this may take a while)...");
        blast(cli, &primary, &endpoints, &record.sequence);
    }

    println!("\nDownloading PDB structure {}...", cli.pdb_id);
    match output::download_structure(&fallback, &endpoints, &cli.pdb_id, &cli.data_dir)
        .and_then(|path| structure::list_chains(&path))
    {
        Ok(chains) => {
            for (_, chain) in chains {
                println!("Chain: {chain}");
            }
        }
        Err(e) => warning(&e),
    }

    let path = output::save_analysis(
        &cli.results_dir,
        &SavedAnalysis::new(&identifier, &properties),
    )?;
    println!("\nResults saved to {}", path.display());
    println!("Analysis complete!");
    Ok(())
}

fn print_properties(properties: &ProteinProperties) {
    let structure = properties.secondary_structure;
    println!("Molecular weight: {} Da", properties.molecular_weight);
    println!("Isoelectric point: {}", properties.isoelectric_point);
    println!("Aromaticity: {}", properties.aromaticity);
    println!(
        "Instability index: {} ({})",
        properties.instability_index,
        properties.stability()
    );
    if properties.stability() == Stability::Unstable {
        println!("The protein is predicted to be unstable in vitro");
    }
    println!(
        "Secondary structure fractions: helix {}, sheet {}, turn {}",
        structure.helix, structure.sheet, structure.turn
    );
}

fn blast(cli: &Cli, transport: &dyn Transport, endpoints: &Endpoints, sequence: &str) {
    let settings = BlastSettings {
        poll_interval: Duration::from_secs(cli.blast_poll_interval),
        max_polls: cli.blast_max_polls,
        ..BlastSettings::default()
    };
    let result = BlastClient::new(transport, &endpoints.blast)
        .search(sequence, &settings, std::thread::sleep)
        .and_then(|xml| output::write_file(&cli.results_dir, "blast.xml", &xml).map(|p| (xml, p)));
    match result {
        Ok((xml, path)) => {
            println!("BLAST results saved to {}", path.display());
            match BlastSummary::from_xml(&xml) {
                Ok(summary) => {
                    println!("BLAST hits: {}", summary.hit_count());
                    for hit in summary.top(5) {
                        println!(
                            "  {} {} (e-value {})",
                            hit.accession,
                            hit.definition,
                            hit.evalue.map_or_else(|| "?".to_string(), |e| e.to_string())
                        );
                    }
                }
                Err(e) => warning(&e),
            }
        }
        Err(e) => warning(&e),
    }
}

fn warning(error: &BoxedError<'static, protscan::ProtScanError>) {
    println!(
        "Warning: {}: {}",
        error.get_short_description(),
        error.get_long_description()
    );
}
