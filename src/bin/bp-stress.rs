use clap::{Arg, ArgAction, ArgMatches, Command};
use lightning_pool::raster::rect_tier;
use lightning_pool::{
    tier, Error, MultiBufferPool, MultiBytePool, MultiMmapBytePool, MultiRgbaPool, PoolOptions,
    PoolStats, Rect, Result,
};
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Pool stress driver
///
/// Hammers a tiered pool from several threads with random request sizes and
/// prints per-bucket hit/miss/return/discard counters.

fn main() {
    let matches = create_cli().get_matches();
    init_logging(matches.get_flag("json"));

    if let Err(e) = run_command(matches) {
        eprintln!("Error: {}", e);
        std::process::exit(e.error_code().abs());
    }
}

fn init_logging(json_output: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lightning_pool=info,bp_stress=info,warn"));

    if json_output {
        let fmt_layer = fmt::layer().json().with_target(true).with_thread_names(true);
        Registry::default().with(env_filter).with(fmt_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true).with_thread_names(true);
        Registry::default().with(env_filter).with(fmt_layer).init();
    }
}

fn common_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("threads")
            .help("Worker threads")
            .long("threads")
            .short('t')
            .value_parser(clap::value_parser!(usize))
            .default_value("4"),
    )
    .arg(
        Arg::new("iterations")
            .help("get/put cycles per thread")
            .long("iterations")
            .short('n')
            .value_parser(clap::value_parser!(usize))
            .default_value("100000"),
    )
    .arg(
        Arg::new("capacity")
            .help("Pooled objects per bucket")
            .long("capacity")
            .value_parser(clap::value_parser!(usize))
            .default_value("64"),
    )
    .arg(
        Arg::new("options")
            .help("JSON file with pool options")
            .long("options"),
    )
}

fn create_cli() -> Command {
    Command::new("bp-stress")
        .about("Stress driver for lightning_pool")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("json")
                .help("Emit logs as JSON")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(common_args(
            Command::new("byte").about("Fixed-length byte buffers over 1 KiB..64 KiB buckets"),
        ))
        .subcommand(common_args(
            Command::new("buffer").about("Growable buffers over 1 KiB..64 KiB buckets"),
        ))
        .subcommand(common_args(
            Command::new("mmap").about("Mapped byte buffers over 4 KiB..1 MiB buckets"),
        ))
        .subcommand(common_args(
            Command::new("raster").about("RGBA images over common video frame sizes"),
        ))
}

struct Params {
    threads: usize,
    iterations: usize,
    capacity: usize,
    options: PoolOptions,
}

fn params(matches: &ArgMatches) -> Result<Params> {
    let options = match matches.get_one::<String>("options") {
        Some(path) => PoolOptions::from_json_file(path)?,
        None => PoolOptions::default(),
    };
    Ok(Params {
        threads: *matches.get_one::<usize>("threads").unwrap_or(&4),
        iterations: *matches.get_one::<usize>("iterations").unwrap_or(&100_000),
        capacity: *matches.get_one::<usize>("capacity").unwrap_or(&64),
        options,
    })
}

fn run_command(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("byte", sub)) => cmd_byte(&params(sub)?),
        Some(("buffer", sub)) => cmd_buffer(&params(sub)?),
        Some(("mmap", sub)) => cmd_mmap(&params(sub)?),
        Some(("raster", sub)) => cmd_raster(&params(sub)?),
        Some((name, _)) => Err(Error::Config(format!("unknown command: {}", name))),
        None => Err(Error::Config("no command given".to_string())),
    }
}

/// Run `work` on `threads` scoped threads, `iterations` times each.
fn drive<F>(p: &Params, work: F) -> Duration
where
    F: Fn(&mut rand::rngs::ThreadRng) + Sync,
{
    let start = Instant::now();
    std::thread::scope(|s| {
        for _ in 0..p.threads {
            s.spawn(|| {
                let mut rng = rand::rng();
                for _ in 0..p.iterations {
                    work(&mut rng);
                }
            });
        }
    });
    start.elapsed()
}

fn report(name: &str, p: &Params, elapsed: Duration, buckets: &[(String, PoolStats)]) {
    let ops = (p.threads * p.iterations) as f64;
    info!(
        pool = name,
        threads = p.threads,
        iterations = p.iterations,
        elapsed_ms = elapsed.as_millis() as u64,
        "stress run finished"
    );

    println!("=== {} ===", name);
    println!("  Threads:    {}", p.threads);
    println!("  Iterations: {}", p.iterations);
    println!("  Duration:   {:?}", elapsed);
    println!("  Throughput: {:.0} ops/sec", ops / elapsed.as_secs_f64().max(f64::EPSILON));
    println!();
    println!(
        "  {:<14} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
        "bucket", "size", "hits", "misses", "returns", "discards", "drops", "hit%"
    );
    for (label, s) in buckets {
        println!(
            "  {:<14} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>7.1}%",
            label,
            s.size,
            s.hits,
            s.misses,
            s.returns,
            s.discards,
            s.drops,
            s.hit_rate() * 100.0
        );
    }
}

const BYTE_TIERS: [usize; 4] = [1024, 4096, 16 * 1024, 64 * 1024];

fn cmd_byte(p: &Params) -> Result<()> {
    let sizes: Vec<_> = BYTE_TIERS.iter().map(|s| tier(p.capacity, *s)).collect();
    let pool = MultiBytePool::new(&sizes, &p.options);

    let elapsed = drive(p, |rng| {
        // sizes above 64 KiB fall back to unpooled buffers
        let size = rng.random_range(1..=80 * 1024);
        let mut r = pool.get_ref(size);
        if let Some(data) = r.get_mut() {
            data[0] = 1;
        }
    });

    let labels: Vec<String> = pool.sizes().iter().map(|t| t.buf_size.to_string()).collect();
    report("byte", p, elapsed, &labels.into_iter().zip(pool.stats()).collect::<Vec<_>>());
    Ok(())
}

fn cmd_buffer(p: &Params) -> Result<()> {
    let sizes: Vec<_> = BYTE_TIERS.iter().map(|s| tier(p.capacity, *s)).collect();
    let pool = MultiBufferPool::new(&sizes, &p.options);

    let elapsed = drive(p, |rng| {
        let size = rng.random_range(1..=64 * 1024);
        let mut buf = pool.get(size);
        // 1% of buffers outgrow max_buf_size
        let fill = if rng.random_range(0..100) == 0 { size * 4 } else { size };
        buf.resize(fill, 0);
        pool.put(buf);
    });

    let labels: Vec<String> = pool.sizes().iter().map(|t| t.buf_size.to_string()).collect();
    report("buffer", p, elapsed, &labels.into_iter().zip(pool.stats()).collect::<Vec<_>>());
    Ok(())
}

fn cmd_mmap(p: &Params) -> Result<()> {
    let sizes: Vec<_> = [4096usize, 64 * 1024, 1024 * 1024]
        .iter()
        .map(|s| tier(p.capacity, *s))
        .collect();
    let pool = MultiMmapBytePool::new(&sizes, &p.options);

    let elapsed = drive(p, |rng| {
        let size = rng.random_range(1..=1024 * 1024);
        let mut r = pool.get_ref(size);
        if let Some(buf) = r.get_mut() {
            buf[size - 1] = 1;
        }
    });

    let labels: Vec<String> = pool.sizes().iter().map(|t| t.buf_size.to_string()).collect();
    report("mmap", p, elapsed, &labels.into_iter().zip(pool.stats()).collect::<Vec<_>>());
    Ok(())
}

fn cmd_raster(p: &Params) -> Result<()> {
    let frames = [(640, 360), (360, 640), (1280, 720), (720, 1280), (1920, 1080)];
    let sizes: Vec<_> = frames
        .iter()
        .map(|(w, h)| rect_tier(p.capacity, Rect::with_size(*w, *h)))
        .collect();
    let pool = MultiRgbaPool::new(&sizes, &p.options);

    let elapsed = drive(p, |rng| {
        let (w, h) = frames[rng.random_range(0..frames.len())];
        let rect = Rect::with_size(rng.random_range(1..=w), rng.random_range(1..=h));
        let mut r = pool.get_ref(rect);
        if let Some(img) = r.get_mut() {
            img.set_pixel(0, 0, [255, 255, 255, 255]);
        }
    });

    let labels: Vec<String> = pool.rects().iter().map(|r| format!("{}x{}", r.dx(), r.dy())).collect();
    report("raster", p, elapsed, &labels.into_iter().zip(pool.stats()).collect::<Vec<_>>());
    Ok(())
}
