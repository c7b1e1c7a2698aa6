mod parser;
mod render;

use bauplan::{Buffer, ByteOrder, Decoder, Plan, Registry, Value};
use std::io::{self, Read};
use std::fs;
use std::path::PathBuf;
use anyhow::{Context, Result, anyhow};
use log::{debug, LevelFilter};
use structopt::StructOpt;

use render::{Layout, Named};

/// Decode and print binary records described by a schema
#[derive(StructOpt)]
#[structopt(name = "bq", author = "Liv Fischer")]
struct Opt {
    /// schema file declaring the records
    #[structopt(short, long, parse(from_os_str))]
    schema: PathBuf,
    /// record to decode stdin as
    #[structopt(short, long)]
    record: String,
    /// multi-byte fields are big endian instead of little endian
    #[structopt(short, long)]
    big_endian: bool,
    /// print the plan of the record instead of decoding
    #[structopt(short, long)]
    plan: bool,
    /// decode consecutive records until stdin is exhausted
    #[structopt(short, long)]
    all: bool,
    /// log planning and decoding
    #[structopt(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    env_logger::Builder::new()
        .filter_level(if opt.verbose { LevelFilter::Debug } else { LevelFilter::Warn })
        .parse_default_env()
        .init();

    let text = fs::read_to_string(&opt.schema).with_context(|| format!("Failed to read schema {}", opt.schema.display()))?;
    let schema = parser::parse(&text).context("Invalid schema")?;
    let record = schema.record(&opt.record)?;
    let registry = Registry::with_byte_order(if opt.big_endian { ByteOrder::Big } else { ByteOrder::Little });
    let plan = registry.plan_for(&record).with_context(|| format!("Cannot plan record {}", opt.record))?;

    if opt.plan {
        print!("{}", Layout(&plan));
        return Ok(());
    }

    let mut bytes = Vec::new();
    io::stdin().read_to_end(&mut bytes).context("Failed to read stdin")?;
    debug!("read {} bytes", bytes.len());
    for value in decode_stream(&plan, bytes, opt.all)? {
        println!("{}", Named::new(&plan, &value));
    }
    Ok(())
}

/// Decodes one record from `bytes`, or with `all` as many as follow each other
fn decode_stream(plan: &Plan, bytes: Vec<u8>, all: bool) -> Result<Vec<Value>> {
    let mut buf = Buffer::from_bytes(bytes);
    let mut values = Vec::new();
    loop {
        let start = buf.position();
        let value = Decoder::decode(plan, &mut buf).with_context(|| format!("Decoding error in record {}", values.len()))?;
        values.push(value);
        match (buf.remaining(), all) {
            (0, _) => return Ok(values),
            (_, true) if buf.position() > start => continue,
            (n, _) => return Err(anyhow!("{} trailing bytes after {} at position {}", n, plan.name(), buf.position())),
        }
    }
}
