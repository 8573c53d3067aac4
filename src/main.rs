use clap::{Parser, Subcommand, ValueEnum};
use split_cluster::io::{leaf_names, read_names, read_pp_table, read_tree, write_clusters, write_pairs_tsv};
use split_cluster::{ClusterConfig, ClusterError, Clusterer, SupportMethod};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Cluster taxa by collapsing tree splits that posterior probabilities do not support.
///
/// Run `pairs` first to learn which taxon pairs need a posterior probability,
/// compute them externally, then run `cluster` with the resulting table.
#[derive(Parser, Debug)]
#[command(name = "split-cluster", version, about = "Tree-guided clustering of taxa from pairwise posterior probabilities")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Quiet mode: only warnings and errors are logged
    #[arg(short = 'q', long = "quiet", global = true, default_value_t = false)]
    quiet: bool,
}

#[derive(clap::Args, Debug)]
struct TreeArgs {
    /// Newick or NEXUS tree file (may be .gz)
    #[arg(short = 't', long = "tree")]
    tree: PathBuf,

    /// Taxon names, one per line; fixes taxon order. Defaults to the sorted leaf names
    #[arg(short = 'n', long = "names")]
    names: Option<PathBuf>,

    /// Approximate number of pairs sampled per split
    #[arg(short = 'k', long = "pairs-per-split", default_value_t = ClusterConfig::default().approx_pairs)]
    approx_pairs: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the taxon pairs that need posterior probabilities
    Pairs {
        #[command(flatten)]
        tree: TreeArgs,

        /// Output TSV of name pairs (`-` for stdout, `.gz` to compress)
        #[arg(short = 'o', long = "output", default_value = "-")]
        output: PathBuf,
    },
    /// Cluster taxa given a table of posterior probabilities
    Cluster {
        #[command(flatten)]
        tree: TreeArgs,

        /// TSV of `name_a<TAB>name_b<TAB>pp` covering every requested pair (may be .gz)
        #[arg(short = 'p', long = "pp")]
        pp: PathBuf,

        /// Support threshold: splits whose support falls below it are kept as cluster boundaries
        #[arg(long = "threshold")]
        threshold: f64,

        /// Support statistic
        #[arg(long = "method", value_enum, default_value_t = MethodArg::Mean)]
        method: MethodArg,

        /// Log the support of every split
        #[arg(long = "report", default_value_t = false)]
        report: bool,

        /// Output file, one tab-separated cluster per line (`-` for stdout)
        #[arg(short = 'o', long = "output", default_value = "-")]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MethodArg { Mean }

impl From<MethodArg> for SupportMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Mean => SupportMethod::Mean,
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    let log_level = std::env::var("SPLIT_CLUSTER_LOG").unwrap_or_else(|_| default_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args.command) {
        eprintln!("Error: {e}");
        let exit_code = match e {
            ClusterError::UnknownMethod(_) | ClusterError::InvalidSampleCount(_) | ClusterError::InvalidThreshold(_) => 2,
            ClusterError::Io(_) => 3,
            _ => 4,
        };
        std::process::exit(exit_code);
    }
}

fn run(command: Command) -> split_cluster::Result<()> {
    match command {
        Command::Pairs { tree, output } => {
            let clusterer = load_clusterer(&tree)?;
            let pairs = clusterer.pairs_to_calculate()?;

            let t = Instant::now();
            write_pairs_tsv(&output, clusterer.names(), &pairs)?;
            info!("Wrote {} pairs to {:?} in {:.3}s", pairs.len(), output, t.elapsed().as_secs_f64());
        }
        Command::Cluster { tree, pp, threshold, method, report, output } => {
            let clusterer = load_clusterer(&tree)?;
            let required = clusterer.pairs_to_calculate()?;
            let method = SupportMethod::from(method);

            let t0 = Instant::now();
            let pp = read_pp_table(&pp, clusterer.names(), &required)?;
            info!("Read posterior probabilities for {} pairs in {:.3}s", required.len(), t0.elapsed().as_secs_f64());

            if report {
                for (idx, split) in clusterer.splits().iter().enumerate() {
                    if let Some(support) = clusterer.split_support(idx, pp.as_slice(), method)? {
                        info!(
                            "split {idx}: {}|{} taxa, {method} support {support:.4}",
                            split.left().len(),
                            split.right().len()
                        );
                    }
                }
            }

            let t1 = Instant::now();
            let partition = clusterer.produce_clusters(pp.as_slice(), threshold, method)?;
            info!("Built {} clusters at threshold {threshold} in {:.3}s", partition.len(), t1.elapsed().as_secs_f64());

            write_clusters(&output, clusterer.names(), &partition)?;
        }
    }
    Ok(())
}

fn load_clusterer(args: &TreeArgs) -> split_cluster::Result<Clusterer> {
    let t0 = Instant::now();
    let tree = read_tree(&args.tree)?;
    let names = match &args.names {
        Some(path) => read_names(path)?,
        None => leaf_names(&tree)?,
    };
    info!("Read tree with {} taxa in {:.3}s", names.len(), t0.elapsed().as_secs_f64());

    let t1 = Instant::now();
    let mut clusterer = Clusterer::new(ClusterConfig::default().with_approx_pairs(args.approx_pairs))?;
    clusterer.add_names(names)?;
    clusterer.add_tree(&tree)?;
    info!("Extracted {} splits in {:.3}s", clusterer.splits().len(), t1.elapsed().as_secs_f64());

    Ok(clusterer)
}
