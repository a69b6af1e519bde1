use clap::Parser;
use tracing::{Level, info, warn};

use res_reader::{
    RawRecord, ResourceReader,
    error::FormatResult as Result,
    stream::{is_zstd_path, open_file, open_zstd},
};

use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::path::Path;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "resread", about = "Stream the records of a .resources[.zst] container")]
struct Args {
    /// Input container path (.resources or .resources.zst)
    #[arg(value_name = "FILE")]
    input: String,

    /// Print every record key and type as it is read
    #[arg(long)]
    keys: bool,

    /// Stop after N records (0 = until the end)
    #[arg(long, default_value_t = 0)]
    limit: usize,
}

#[derive(Default)]
struct Stats {
    records: u64,
    payload_bytes: u64,
    by_type: BTreeMap<String, u64>,
}

impl Stats {
    #[inline]
    fn add_record(&mut self, record: &RawRecord) {
        self.records += 1;
        if let Some(b) = record.value.as_bytes() {
            self.payload_bytes += b.len() as u64;
        }
        if let res_reader::ResourceValue::Serialized { data, .. } = &record.value {
            self.payload_bytes += data.len() as u64;
        }
        *self
            .by_type
            .entry(record.value.type_name().to_string())
            .or_default() += 1;
    }

    fn print(&self, secs: f64) {
        info!(
            "read {} records, {:.1} KiB of binary payload in {:.3}s",
            self.records,
            self.payload_bytes as f64 / 1024.0,
            secs
        );
        for (ty, n) in &self.by_type {
            info!("  {n:>8}  {ty}");
        }
    }
}

fn run<R: Read + Seek>(reader: ResourceReader<R>, args: &Args) -> Result<()> {
    let header = reader.header();
    info!(
        "resource set v{} with {} records, {} user types",
        header.version,
        header.len(),
        header.types.len()
    );

    let start = Instant::now();
    let mut stats = Stats::default();

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("stopped after {} records: {e}", stats.records);
                break;
            }
        };
        if args.keys {
            println!("{}\t{}", record.key, record.value.type_name());
        }
        stats.add_record(&record);

        if args.limit != 0 && stats.records as usize >= args.limit {
            break;
        }
    }

    stats.print(start.elapsed().as_secs_f64());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
    let args = Args::parse();

    info!("Reading container: {}", args.input);

    let path = Path::new(&args.input);
    if is_zstd_path(path) {
        run(open_zstd(path)?, &args)
    } else {
        run(open_file(path)?, &args)
    }
}
