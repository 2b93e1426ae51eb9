use clap::Parser;
use miette::Result;
use notion_bootstrap::cli::{setup_logging, Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` terminates quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    setup_logging(&global);

    match cli.command {
        Commands::Run(args) => notion_bootstrap::cli::commands::run::run(args, &global),
        Commands::Validate(args) => notion_bootstrap::cli::commands::validate::run(args, &global),
        Commands::Template(args) => notion_bootstrap::cli::commands::template::run(args),
        Commands::Completions(args) => notion_bootstrap::cli::commands::completions::run(args),
    }
}
