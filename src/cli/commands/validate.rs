//! `notion-bootstrap validate` command - check the CSV files without a token

use console::style;
use miette::{miette, Result};
use std::collections::HashMap;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::{GlobalOpts, InputArgs};
use crate::core::collection::Collection;
use crate::core::config::Config;
use crate::core::sheet::SheetSet;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let paths = args.input.paths(&config);
    let sheets = SheetSet::load(&paths)?;

    let mut builder = Builder::default();
    builder.push_record(["Collection", "File", "Rows", "Data source"]);
    let mut problems = Vec::new();

    for collection in Collection::IMPORT_ORDER {
        let rows = sheets.rows(collection);
        builder.push_record([
            collection.label().to_string(),
            truncate_str(&paths.path(collection).display().to_string(), 48),
            rows.len().to_string(),
            collection.title().to_string(),
        ]);

        let mut seen: HashMap<String, u64> = HashMap::new();
        for row in rows {
            match collection.natural_key(row) {
                None => problems.push(format!(
                    "{}:{} missing value for {}",
                    collection.file_name(),
                    row.line(),
                    collection.key_columns().join(" / ")
                )),
                Some(key) => {
                    if let Some(first) = seen.get(&key) {
                        problems.push(format!(
                            "{}:{} duplicate key '{}' (first seen on line {})",
                            collection.file_name(),
                            row.line(),
                            key,
                            first
                        ));
                    } else {
                        seen.insert(key, row.line());
                    }
                }
            }
        }
    }

    if !global.quiet {
        println!("{}", builder.build().with(Style::markdown()));
        println!();
    }

    for problem in &problems {
        println!("{} {}", style("✗").red(), problem);
    }

    if !problems.is_empty() {
        return Err(miette!("Validation found {} problem(s)", problems.len()));
    }

    if !global.quiet {
        println!(
            "{} CSV files are valid. Share these data sources with your integration: {}",
            style("✓").green(),
            Collection::IMPORT_ORDER
                .iter()
                .map(|c| style(c.title()).cyan().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}
