use clap::{CommandFactory, Parser};
use factotum::cli::CliArgs;

pub fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if let Some(shell) = args.print_completions {
        let mut cmd = CliArgs::command();
        clap_complete::generate(shell, &mut cmd, "fauth", &mut std::io::stdout());
        return Ok(());
    }

    if args.print_manpage {
        let man = clap_mangen::Man::new(CliArgs::command());
        man.render(&mut std::io::stdout())?;
        return Ok(());
    }

    env_logger::Builder::new()
        .filter_level(args.get_log_level().unwrap_or(log::LevelFilter::Warn))
        .init();

    args.run()
}
