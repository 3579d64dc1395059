mod commands;
mod terminal;

use std::time::Duration;

use commands::{CommandLine, Commands, discover, dns, info, show};
use lanprobe_common::config::Config;
use terminal::{banner, logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.quiet);
    banner::show(commands.no_banner, commands.quiet);

    let quiet = commands.quiet;
    let result = match commands.command {
        Commands::Info => info::info(quiet),
        Commands::Discover {
            target,
            timeout,
            workers,
            port,
            no_dns,
            nameserver,
            save,
        } => {
            print::header("getting ready for discovery", quiet);
            let cfg = Config {
                no_dns,
                quiet,
                no_banner: commands.no_banner,
                timeout: Duration::from_millis(timeout),
                workers,
                probe_port: port,
                nameserver,
                ..Config::default()
            };
            discover::discover(target, &cfg, save.as_deref()).await
        }
        Commands::Dns {
            domain,
            record_type,
            timeout,
            nameserver,
        } => {
            print::header("dns lookup", quiet);
            dns::dns(&domain, &record_type, Duration::from_millis(timeout), nameserver, quiet).await
        }
        Commands::Show { file } => show::show(&file, quiet),
    };

    if quiet == 0 {
        print::print(&print::rule('═').to_string());
    }
    result
}
