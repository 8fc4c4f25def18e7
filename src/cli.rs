//! Command-line argument parsing for CourtWatch

/// Parsed command line flags
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub once: bool,
    pub validate: bool,
    pub dry_run: bool,
    pub help: bool,
}

pub fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from(&args)
}

/// Parse an argument vector (first element is the program name). Unknown flags are ignored.
pub fn parse_args_from(args: &[String]) -> Args {
    let mut result = Args::default();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--once" => result.once = true,
            "--validate" => result.validate = true,
            "--dry-run" => result.dry_run = true,
            "--help" | "-h" => result.help = true,
            _ => {}
        }
    }

    result
}

pub fn print_help() {
    println!("CourtWatch - court availability watcher\n");
    println!("USAGE:");
    println!("    courtwatch [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    --once        Run a single scan and exit");
    println!("    --validate    Validate configuration and exit");
    println!("    --dry-run     Print free slots without notifying, saving or committing");
    println!("    --help, -h    Show this help message\n");
    println!("ENVIRONMENT:");
    println!("    See .env.example for configuration variables");
}
