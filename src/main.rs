use granular_field::snapshot::Snapshot;
use granular_field::statistics::{mean_attribute, FieldStatistics};
use granular_field::{
    fill_gaps, partition_particles, windowed_mean, ParticleStore, PostprocessConfig, SECTION_SLOT,
};

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "granular_field")]
struct Opt {
    /// Particle snapshot, JSON or MessagePack (`.dat`).
    #[structopt(short, long)]
    snapshot: PathBuf,
    /// JSON post-processing settings. Defaults are used when omitted.
    #[structopt(short, long)]
    config: Option<PathBuf>,
    /// Directory receiving `field.dat` and `labelled.json`.
    #[structopt(short, long)]
    output: PathBuf,
}

fn read_snapshot(path: &Path) -> eyre::Result<Snapshot> {
    let bytes = std::fs::read(path)
        .wrap_err_with(|| format!("Failed to read snapshot file: {:?}", path))?;
    if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::from_slice(&bytes).wrap_err("Serde failed to deserialize JSON snapshot.")
    } else {
        rmp_serde::from_read_ref(&bytes).wrap_err("Failed to decode MessagePack snapshot.")
    }
}

fn read_config(path: Option<&Path>) -> eyre::Result<PostprocessConfig> {
    let path = match path {
        Some(path) => path,
        None => return Ok(PostprocessConfig::default()),
    };
    let json = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read JSON settings file: {:?}", path))?;
    PostprocessConfig::from_json(&json).wrap_err("Serde failed to deserialize JSON settings.")
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = Opt::from_args();

    let config = read_config(opt.config.as_deref())?;
    let mut snapshot = read_snapshot(&opt.snapshot)?;
    let (domain, _) = snapshot.crop()?;
    config.validate(&domain)?;

    let particles = &mut snapshot.particles;
    let partition = partition_particles(particles, &domain, &config.layers, &config.sections)?;

    for band in &partition.sections.bands {
        let members = particles.select(
            SECTION_SLOT,
            &band.label,
            domain.bounds.start.y..=domain.bounds.end.y,
        );
        if let Some(mean) = mean_attribute(&*particles, &config.attribute, &members)? {
            tracing::info!(section = %band.label, particles = members.len(), mean, "section average");
        }
    }

    let values = particles.attribute(&config.attribute)?;
    let mut grid = windowed_mean(&particles.positions(), &values, &domain.bounds, &config.window)?;
    if let Some(method) = config.interpolation {
        fill_gaps(&mut grid, method);
    }

    let stats = FieldStatistics::of(&grid);
    tracing::info!(
        rows = grid.rows,
        cols = grid.cols,
        missing = stats.missing,
        gaps = stats.gaps,
        min = ?stats.min,
        max = ?stats.max,
        mean = ?stats.mean,
        "field summary"
    );

    std::fs::create_dir_all(&opt.output)
        .wrap_err_with(|| format!("Failed to create output directory: {:?}", opt.output))?;

    let field_path = opt.output.join("field.dat");
    let mut writer = std::fs::File::create(&field_path)
        .wrap_err_with(|| format!("Failed to create {:?}", field_path))?;
    rmp_serde::encode::write_named(&mut writer, &grid)
        .wrap_err_with(|| format!("Failed to encode field grid to {:?}", field_path))?;

    let labelled_path = opt.output.join("labelled.json");
    let json = serde_json::to_vec(&snapshot).wrap_err("Serde failed to serialize the labelled snapshot.")?;
    std::fs::write(&labelled_path, json)
        .wrap_err_with(|| format!("Failed to write {:?}", labelled_path))?;

    Ok(())
}
