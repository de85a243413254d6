extern crate clap;
use clap::*;

mod cmd_igevo;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let app = Command::new("igevo")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`igevo` - Clonal lineage trees for immune repertoires")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_igevo::tree::make_subcommand())
        .subcommand(cmd_igevo::rhomb::make_subcommand())
        .after_help(
            r###"Subcommands:

* tree  - Build lineage trees, synthesizing missing ancestors
* rhomb - Report parallel mutations between converging lineages

Set RUST_LOG=info (or debug) for progress messages.

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("tree", sub_matches)) => cmd_igevo::tree::execute(sub_matches),
        Some(("rhomb", sub_matches)) => cmd_igevo::rhomb::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
