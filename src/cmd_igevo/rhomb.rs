use clap::*;
use igevo::libs::lineage::{find_parallel_rhombs, ShmEdgeConstructor};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("rhomb")
        .about("Find parallel mutations in lineage trees")
        .after_help(
            r###"
Builds the same trees as `igevo tree`, then looks for clones reachable
along two lineages: the tree path through their parent, and a direct
ancestor on a sibling branch. Mutations gained on the intermediate edges
of both sides arose in parallel.

Output, one block per rhomb:
>component  ancestor  descendant  minimal_parallel_shms
Side 1: <edges and added V mutations, ancestor first>
Side 2: ...

Examples:
1. Rhombs with at least 2 parallel mutations:
   igevo rhomb tests/igevo/germlines.tsv tests/igevo/clones.tsv --min-shms 2

"###,
        )
        .arg(
            Arg::new("min_shms")
                .long("min-shms")
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Report rhombs with at least this many parallel SHMs"),
        );
    super::tree::common_args(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    let opt_min_shms = *args.get_one::<usize>("min_shms").unwrap();

    //----------------------------
    // Operating
    //----------------------------
    let (arena, forests, _) = super::tree::build_forests(args)?;
    let constructor = ShmEdgeConstructor;

    //----------------------------
    // Output
    //----------------------------
    let mut count = 0;
    for (i, forest) in forests.iter().enumerate() {
        for rhomb in find_parallel_rhombs(&arena, &forest.tree, &constructor)? {
            let parallel = rhomb.minimal_number_parallel_shms();
            if parallel < opt_min_shms {
                continue;
            }
            let (ancestor, descendant) = match (rhomb.ancestor(), rhomb.descendant()) {
                (Some(a), Some(d)) => (a, d),
                _ => continue,
            };
            writer.write_fmt(format_args!(
                ">{}\t{}\t{}\t{}\n{}\n",
                i + 1,
                arena[ancestor].name,
                arena[descendant].name,
                parallel,
                rhomb
            ))?;
            count += 1;
        }
    }
    log::info!("{} rhombs reported", count);

    Ok(())
}
