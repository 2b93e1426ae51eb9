//! `notion-bootstrap template` command - print a CSV header for a collection

use miette::Result;

use crate::cli::helpers::csv_line;
use crate::core::collection::Collection;

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Collection to print the template for
    #[arg(value_enum)]
    pub collection: Collection,

    /// Print the header only, without the example row
    #[arg(long)]
    pub header_only: bool,
}

pub fn run(args: TemplateArgs) -> Result<()> {
    print!("{}", render(args.collection, args.header_only));
    Ok(())
}

fn render(collection: Collection, header_only: bool) -> String {
    let mut out = csv_line(collection.columns().iter().map(|c| c.name));
    out.push('\n');
    if !header_only {
        out.push_str(&csv_line(collection.example_row().iter().copied()));
        out.push('\n');
    }
    out
}
