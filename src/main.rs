use parkdaily::cli;

fn main() {
    std::process::exit(cli::run());
}
