//! Command dispatch: settings, services and terminal output per subcommand

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{MapKind, MapSpec};
use crate::cli::args::{Cli, Commands, ConfigCommands, MapArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings, UlamSampling};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see --help".to_string(),
        ));
    };
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "settings loaded");

    match command {
        Commands::Tower { map, depth } => _tower(settings, map, *depth),
        Commands::Assemble {
            map,
            order,
            depth,
            passes,
            output,
        } => _assemble(settings, map, *order, *depth, *passes, output.as_deref()),
        Commands::Ulam {
            map,
            bins,
            samples,
            random,
            seed,
            output,
        } => _ulam(settings, map, *bins, *samples, *random, *seed, output.as_deref()),
        Commands::Compare { map } => _compare(settings, map),
        Commands::Config { command } => _config(settings, command),
        Commands::Completion { .. } => Ok(()),
    }
}

fn require_positive(flag: &str, value: usize) -> CliResult<()> {
    if value == 0 {
        return Err(CliError::InvalidArgs(format!("{flag} must be at least 1")));
    }
    Ok(())
}

fn map_spec(args: &MapArgs) -> CliResult<MapSpec> {
    let kind: MapKind = args.map.parse()?;
    Ok(MapSpec {
        kind,
        slope: args.slope,
        peak: args.peak,
        height: args.height,
    })
}

#[instrument(skip(settings))]
fn _tower(mut settings: Settings, map: &MapArgs, depth: Option<usize>) -> CliResult<()> {
    if let Some(d) = depth {
        settings.tower.depth = d;
    }
    require_positive("depth", settings.tower.depth)?;
    let spec = map_spec(map)?;
    let branches = spec.branches()?;
    let container = ServiceContainer::new(settings);
    let tower = container
        .transfer
        .build_tower(&branches, container.settings.tower.depth)?;

    output::header(&format!(
        "{} tower: {} domains (depth {}, {} traversal)",
        spec,
        tower.len(),
        container.settings.tower.depth,
        container.settings.tower.traversal
    ));
    for (i, (domain, pass)) in tower.domains().iter().zip(tower.passes()).enumerate() {
        output::detail(&format!("D{i} = {domain}  [pass {pass}]"));
    }
    for (b, branch) in branches.iter().enumerate() {
        let edges = tower.edges(b);
        output::action(&branch.name, &format!("{} edges", edges.len()));
        for (target, source) in edges {
            output::detail(&format!("D{source} -> D{target}"));
        }
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _assemble(
    mut settings: Settings,
    map: &MapArgs,
    order: Option<usize>,
    depth: Option<usize>,
    passes: Option<usize>,
    out: Option<&Path>,
) -> CliResult<()> {
    if let Some(k) = order {
        settings.approximation.order = k;
    }
    if let Some(d) = depth {
        settings.tower.depth = d;
    }
    if let Some(p) = passes {
        settings.approximation.refinement_passes = p;
    }
    require_positive("order", settings.approximation.order)?;
    require_positive("depth", settings.tower.depth)?;
    require_positive("passes", settings.approximation.refinement_passes)?;
    let spec = map_spec(map)?;
    let branches = spec.branches()?;
    let container = ServiceContainer::new(settings);
    let k = container.settings.approximation.order;
    let result = container.transfer.approx_super_adjacency(
        &branches,
        k,
        k,
        container.settings.tower.depth,
    )?;

    let (rows, cols) = result.shape();
    output::header(&format!("{spec} super adjacency"));
    output::detail(&format!("domains:   {}", result.tower.len()));
    output::detail(&format!("order:     {}", result.order));
    output::detail(&format!("passes:    {}", result.passes));
    output::detail(&format!("shape:     {rows} x {cols}"));
    output::detail(&format!("frobenius: {:.12}", result.frobenius_norm()));
    let stats = container.transfer.cache_stats();
    debug!(hits = stats.hits, misses = stats.misses, "block cache");

    if let Some(path) = out {
        let written = container.matrices.write(path, &result.matrix)?;
        output::success(&format!("wrote {}", written.display()));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip(settings))]
fn _ulam(
    mut settings: Settings,
    map: &MapArgs,
    bins: Option<usize>,
    samples: Option<usize>,
    random: bool,
    seed: Option<u64>,
    out: Option<&Path>,
) -> CliResult<()> {
    if let Some(b) = bins {
        settings.ulam.bins = b;
    }
    if let Some(m) = samples {
        settings.ulam.samples = m;
    }
    if random {
        settings.ulam.sampling = UlamSampling::Uniform;
    }
    if let Some(s) = seed {
        settings.ulam.seed = s;
    }
    require_positive("bins", settings.ulam.bins)?;
    require_positive("samples", settings.ulam.samples)?;
    let spec = map_spec(map)?;
    let piecewise = crate::domain::PiecewiseMap::new(spec.branches()?);
    let container = ServiceContainer::new(settings);
    let matrix = container.transfer.approx_ulams(&piecewise)?;

    output::header(&format!("{spec} Ulam matrix"));
    output::detail(&format!("shape:    {} x {}", matrix.nrows(), matrix.ncols()));
    output::detail(&format!("sampling: {:?}", container.settings.ulam.sampling()));

    if let Some(path) = out {
        let written = container.matrices.write(path, &matrix)?;
        output::success(&format!("wrote {}", written.display()));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _compare(settings: Settings, map: &MapArgs) -> CliResult<()> {
    let spec = map_spec(map)?;
    let branches = spec.branches()?;
    let container = ServiceContainer::new(settings);
    let cmp = container.transfer.compare(branches)?;

    output::header(&format!("{spec}: spectral vs Ulam"));
    output::action(
        "chebyshev",
        &format!(
            "{} x {} over {} domains, frobenius {:.12}",
            cmp.super_shape.0, cmp.super_shape.1, cmp.domains, cmp.super_norm
        ),
    );
    output::action(
        "ulam",
        &format!(
            "{} x {}, row sums in [{:.12}, {:.12}]",
            cmp.ulam_shape.0, cmp.ulam_shape.1, cmp.ulam_row_sum_min, cmp.ulam_row_sum_max
        ),
    );
    Ok(())
}

fn _config(settings: Settings, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path: PathBuf = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path()
            };
            let container = ServiceContainer::new(settings);
            if container.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .map_err(|e| InfraError::io(format!("create parent of {}", path.display()), e))?;
            container
                .fs
                .write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => output::action("global", &p.display()),
                None => output::warning("no global config directory on this platform"),
            }
            output::action("local", &local_config_path().display());
            Ok(())
        }
    }
}
