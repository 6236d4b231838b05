use clap::Parser;
use corpweb::cli::{commands, Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
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

    // RUST_LOG wins over --verbose
    let default_level = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Company(cmd) => commands::company::run(cmd, &global),
        Commands::Link(cmd) => commands::link::run(cmd, &global),
        Commands::Issue(cmd) => commands::issue::run(cmd, &global),
        Commands::IssueType(cmd) => commands::issue_type::run(cmd, &global),
        Commands::Category(cmd) => commands::category::run(cmd, &global),
        Commands::Family(cmd) => commands::family::run(cmd, &global),
        Commands::Ancestors(cmd) => commands::ancestors::run(cmd, &global),
        Commands::Validate(args) => commands::validate::run(args, &global),
        Commands::Cache(cmd) => commands::cache::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
