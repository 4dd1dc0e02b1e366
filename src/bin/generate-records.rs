use std::error::Error;
use std::io::{self, Write};

use dotenv::dotenv;
use log::{debug, info, initialize_logger};
use rand::rngs::StdRng;
use rand::SeedableRng;
use structopt::StructOpt;
use time::OffsetDateTime;

use drum_oracle::mutation::evolve;
use drum_oracle::synthesis::synthesize_many;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "generate-records",
    about = "Print a batch of drum records as JSON, optionally evolved over several polls"
)]
struct Opt {
    /// The number of records to synthesize
    #[structopt(default_value = "10")]
    count: usize,

    /// How many times to evolve the batch before printing it
    #[structopt(short, long, default_value = "0")]
    rounds: usize,

    /// The record count to evolve towards (defaults to the batch size)
    #[structopt(short, long)]
    target: Option<usize>,

    /// Seed the generator for reproducible output
    #[structopt(long)]
    seed: Option<u64>,

    /// Pretty-print the JSON
    #[structopt(short, long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let opt = Opt::from_args();

    let logger = initialize_logger();

    let mut rng = match opt.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let now = OffsetDateTime::now_utc();
    let target = opt.target.unwrap_or(opt.count);

    info!(logger, "Synthesizing {} records...", opt.count; "seed" => opt.seed);
    let mut records = synthesize_many(&mut rng, now, opt.count);

    for round in 1..=opt.rounds {
        records = evolve(&mut rng, now, records, target);
        debug!(logger, "Evolved batch"; "round" => round, "count" => records.len());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if opt.pretty {
        serde_json::to_writer_pretty(&mut handle, &records)?;
    } else {
        serde_json::to_writer(&mut handle, &records)?;
    }

    writeln!(handle)?;

    Ok(())
}
