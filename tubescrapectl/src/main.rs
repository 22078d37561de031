use clap::Parser;

fn main() {
    let cli = tubescrapectl::Cli::parse();
    tubescrapectl::init_tracing(cli.verbose);
    if let Err(err) = tubescrapectl::run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
