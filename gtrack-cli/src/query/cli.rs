use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const QUERY_CMD: &str = "query";

pub fn create_query_cli() -> Command {
    Command::new(QUERY_CMD)
        .author("Databio")
        .about("Print the features of a BED file that overlap one or more regions, with display rows")
        .arg_required_else_help(true)
        .arg(arg!(-b --bed <bed> "BED file to read features from (may be gzipped)"))
        .arg(
            Arg::new("region")
                .short('r')
                .long("region")
                .required(true)
                .action(ArgAction::Append)
                .help("Region as chr:start-end, a bare chromosome, or `all` for the whole genome. Repeatable"),
        )
        .arg(
            arg!(--"max-rows" <max_rows> "Cap on display rows per chromosome")
                .required(false)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--"visibility-window" <visibility_window> "Visibility window in bases; 0 or negative loads whole chromosomes")
                .required(false)
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
        )
        .arg(arg!(--"chrom-sizes" <chrom_sizes> "chrom.sizes file, needed for name aliasing and `all`").required(false))
        .arg(arg!(-c --config <config> "Source config file (toml, json or yaml)").required(false))
}
