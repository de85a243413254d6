use clap::*;
use igevo::libs::lineage::{
    hamming_components, read_clones, read_germlines, reconcile_components, CloneArena,
    CloneStore, ComponentProcessor, LineageForest, ReconcileContext, ReconcileOptions,
    SharedShmReconstructor, ShmEdgeConstructor,
};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("tree")
        .about("Build clonal lineage trees")
        .after_help(
            r###"
Splits the clones into components of related CDR3s, then builds one
lineage forest per component. Clones with identical V/J mutations are
grouped, groups are ordered by mutation containment, and missing common
ancestors are synthesized to join the remaining roots.

Input files:
* germlines: gene, segment (V|J), CDR3 anchor, germline sequence
* clones:    name, V gene, J gene, read sequence

Output (tsv):
#component  parent  child  length  kind  added_v_shms  added_j_shms
Roots have parent '*'. Two summary lines follow:
#reconstructed  <ancestors synthesized>
#rejected       <merge attempts declined>

Examples:
1. Trees of the test clones:
   igevo tree tests/igevo/germlines.tsv tests/igevo/clones.tsv

2. Newick, 4 threads:
   igevo tree tests/igevo/germlines.tsv tests/igevo/clones.tsv --format newick --parallel 4

"###,
        )
        .arg(
            Arg::new("format")
                .long("format")
                .num_args(1)
                .value_parser(["tsv", "newick"])
                .default_value("tsv")
                .help("Output format"),
        );
    common_args(cmd)
}

/// Inputs and reconciliation knobs shared with `rhomb`.
pub fn common_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("germlines")
            .required(true)
            .num_args(1)
            .index(1)
            .help("Germline V/J table"),
    )
    .arg(
        Arg::new("clones")
            .required(true)
            .num_args(1)
            .index(2)
            .help("Clone table"),
    )
    .arg(
        Arg::new("tau")
            .long("tau")
            .num_args(1)
            .default_value("1")
            .value_parser(value_parser!(usize))
            .help("Max CDR3 Hamming distance between related clones"),
    )
    .arg(
        Arg::new("no_ancestors")
            .long("no-ancestors")
            .action(ArgAction::SetTrue)
            .help("Skip ancestor synthesis"),
    )
    .arg(
        Arg::new("parallel")
            .long("parallel")
            .short('p')
            .num_args(1)
            .default_value("1")
            .value_parser(value_parser!(usize))
            .help("Number of threads"),
    )
    .arg(
        Arg::new("outfile")
            .long("outfile")
            .short('o')
            .num_args(1)
            .default_value("stdout")
            .help("Output filename. [stdout] for screen"),
    )
}

/// Read the inputs and reconcile every component.
pub fn build_forests(
    args: &ArgMatches,
) -> anyhow::Result<(CloneArena, Vec<LineageForest>, ReconcileContext)> {
    let germlines = args.get_one::<String>("germlines").unwrap();
    let clones = args.get_one::<String>("clones").unwrap();
    let opt_tau = *args.get_one::<usize>("tau").unwrap();
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    let options = ReconcileOptions {
        reconstruct_ancestors: !args.get_flag("no_ancestors"),
        ..Default::default()
    };

    let table = read_germlines(germlines)?;
    let mut arena = read_clones(clones, &table)?;
    let components = hamming_components(&arena, arena.ids(), opt_tau)?;
    log::info!("{} clones in {} components", arena.len(), components.len());

    let edge_constructor = ShmEdgeConstructor;
    let reconstructor = SharedShmReconstructor;
    let processor =
        ComponentProcessor::new(&edge_constructor, &reconstructor, &table).with_options(options);
    let mut ctx = ReconcileContext::new();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build()?;
    let forests =
        pool.install(|| reconcile_components(&mut arena, components, &processor, &mut ctx))?;

    Ok((arena, forests, ctx))
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    let opt_format = args.get_one::<String>("format").unwrap();

    //----------------------------
    // Operating
    //----------------------------
    let (arena, forests, ctx) = build_forests(args)?;

    //----------------------------
    // Output
    //----------------------------
    if opt_format == "newick" {
        for forest in &forests {
            writer.write_fmt(format_args!("{}\n", forest.tree.to_newick(&arena)))?;
        }
    } else {
        writer.write_fmt(format_args!(
            "#component\tparent\tchild\tlength\tkind\tadded_v_shms\tadded_j_shms\n"
        ))?;
        for (i, forest) in forests.iter().enumerate() {
            for row in forest.tree.to_tsv_rows(&arena) {
                writer.write_fmt(format_args!("{}\t{}\n", i + 1, row))?;
            }
        }
    }
    writer.write_fmt(format_args!("#reconstructed\t{}\n", ctx.reconstructed))?;
    writer.write_fmt(format_args!("#rejected\t{}\n", ctx.rejected))?;

    Ok(())
}
